//! Scene Description Tests
//!
//! Tests for:
//! - Hand-written JSON scenes with defaulted fields
//! - Serialize / deserialize round trip of a built scene
//! - JSON scenes flatten like their hand-built equivalent

use glam::{Mat4, Vec3};

use umbra::errors::UmbraError;
use umbra::ingest;
use umbra::scene::{LightDesc, LightKind, MeshDesc, NodeDesc, Projection, SceneDescription};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// ============================================================================
// Parsing
// ============================================================================

#[test]
fn minimal_json_scene_parses() {
    init_logger();
    let json = r#"{
        "nodes": [
            { "name": "root", "children": [1] },
            { "mesh": 0 }
        ],
        "meshes": [{
            "primitives": [{
                "positions": [[0, 0, 0], [1, 0, 0], [0, 1, 0]],
                "normals": [[0, 0, 1], [0, 0, 1], [0, 0, 1]],
                "tex_coords": [[0, 0], [1, 0], [0, 1]],
                "indices": [0, 1, 2]
            }]
        }]
    }"#;

    let desc = SceneDescription::from_json_str(json).unwrap();
    assert_eq!(desc.nodes.len(), 2);
    assert_eq!(desc.nodes[0].transform, Mat4::IDENTITY);
    assert!(desc.roots.is_empty());

    // Without explicit roots, node 0 is the only node that is nobody's child.
    let scene = ingest::flatten(&desc).unwrap();
    assert_eq!(scene.draw_calls.len(), 1);
    assert_eq!(scene.draw_calls[0].instance_count, 1);
    assert_eq!(scene.indices, vec![0, 1, 2]);
}

#[test]
fn malformed_json_is_reported() {
    init_logger();
    assert!(matches!(
        SceneDescription::from_json_str("{ \"nodes\": 3 }"),
        Err(UmbraError::Json(_))
    ));
}

#[test]
fn missing_file_is_io_error() {
    init_logger();
    assert!(matches!(
        SceneDescription::from_json_file("does/not/exist.json"),
        Err(UmbraError::Io(_))
    ));
}

// ============================================================================
// Round Trip
// ============================================================================

#[test]
fn built_scene_survives_json() {
    init_logger();
    let mut desc = SceneDescription::new();
    let cube = desc.add_mesh(MeshDesc::cube(2.0));
    let light = desc.add_light(LightDesc::new_spot(Vec3::new(1.0, 0.9, 0.8), 3.0, Some(15.0), 0.3, 0.5));
    desc.add_root(
        NodeDesc::new()
            .with_name("cube")
            .with_mesh(cube)
            .with_transform(Mat4::from_rotation_y(0.5)),
    );
    desc.add_root(
        NodeDesc::new()
            .with_light(light)
            .with_transform(Mat4::from_translation(Vec3::new(0.0, 4.0, 0.0))),
    );

    let json = desc.to_json_string().unwrap();
    let parsed = SceneDescription::from_json_str(&json).unwrap();

    assert_eq!(parsed.roots, desc.roots);
    assert_eq!(parsed.meshes, desc.meshes);
    assert_eq!(parsed.nodes[0].name.as_deref(), Some("cube"));
    assert!(parsed.nodes[0].transform.abs_diff_eq(desc.nodes[0].transform, 1e-6));
    assert!(matches!(
        parsed.lights[0].kind,
        LightKind::Spot { range: Some(r), .. } if (r - 15.0).abs() < 1e-6
    ));

    let original = ingest::flatten(&desc).unwrap();
    let reparsed = ingest::flatten(&parsed).unwrap();
    assert_eq!(original.stats(), reparsed.stats());
    assert_eq!(original.indices, reparsed.indices);
}

#[test]
fn camera_projection_serializes_with_kind() {
    init_logger();
    let mut desc = SceneDescription::new();
    desc.add_camera(umbra::scene::CameraDesc::perspective(1.0, None, 0.1, None));

    let parsed = SceneDescription::from_json_str(&desc.to_json_string().unwrap()).unwrap();
    assert!(matches!(
        parsed.cameras[0].projection,
        Projection::Perspective { aspect_ratio: None, zfar: None, .. }
    ));
}

// ============================================================================
// glTF Import
// ============================================================================

#[cfg(feature = "gltf")]
mod gltf_import {
    use super::*;

    /// A single triangle with a perspective camera, written as `.gltf` + `.bin`.
    fn write_triangle_gltf(dir: &std::path::Path) -> std::path::PathBuf {
        let positions: [[f32; 3]; 3] = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        let normals: [[f32; 3]; 3] = [[0.0, 0.0, 1.0]; 3];
        let tex_coords: [[f32; 2]; 3] = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]];
        let indices: [u16; 4] = [0, 1, 2, 0];

        let mut bin = Vec::new();
        for v in positions.iter().flatten().chain(normals.iter().flatten()).chain(tex_coords.iter().flatten()) {
            bin.extend_from_slice(&v.to_le_bytes());
        }
        for i in indices {
            bin.extend_from_slice(&i.to_le_bytes());
        }
        assert_eq!(bin.len(), 104);
        std::fs::write(dir.join("triangle.bin"), &bin).unwrap();

        let json = r#"{
            "asset": { "version": "2.0" },
            "scene": 0,
            "scenes": [{ "nodes": [0, 1] }],
            "nodes": [
                { "name": "tri", "mesh": 0, "translation": [0.0, 0.0, -2.0] },
                { "camera": 0 }
            ],
            "cameras": [{
                "type": "perspective",
                "perspective": { "yfov": 0.8, "znear": 0.1 }
            }],
            "meshes": [{
                "primitives": [{
                    "attributes": { "POSITION": 0, "NORMAL": 1, "TEXCOORD_0": 2 },
                    "indices": 3
                }]
            }],
            "buffers": [{ "uri": "triangle.bin", "byteLength": 104 }],
            "bufferViews": [
                { "buffer": 0, "byteOffset": 0, "byteLength": 36 },
                { "buffer": 0, "byteOffset": 36, "byteLength": 36 },
                { "buffer": 0, "byteOffset": 72, "byteLength": 24 },
                { "buffer": 0, "byteOffset": 96, "byteLength": 6 }
            ],
            "accessors": [
                { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
                  "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0] },
                { "bufferView": 1, "componentType": 5126, "count": 3, "type": "VEC3" },
                { "bufferView": 2, "componentType": 5126, "count": 3, "type": "VEC2" },
                { "bufferView": 3, "componentType": 5123, "count": 3, "type": "SCALAR" }
            ]
        }"#;
        let path = dir.join("triangle.gltf");
        std::fs::write(&path, json).unwrap();
        path
    }

    #[test]
    fn triangle_imports_and_flattens() -> anyhow::Result<()> {
        init_logger();
        let dir = std::env::temp_dir().join(format!("umbra-gltf-{}", std::process::id()));
        std::fs::create_dir_all(&dir)?;
        let path = write_triangle_gltf(&dir);

        let desc = umbra::assets::loaders::gltf::import(&path)?;
        assert_eq!(desc.roots, vec![0, 1]);
        assert_eq!(desc.nodes[0].name.as_deref(), Some("tri"));
        assert_eq!(desc.meshes[0].primitives[0].indices.as_deref(), Some(&[0, 1, 2][..]));
        assert!(matches!(
            desc.cameras[0].projection,
            Projection::Perspective { zfar: None, .. }
        ));

        let scene = ingest::flatten(&desc)?;
        assert_eq!(scene.draw_calls.len(), 1);
        assert_eq!(scene.vertices.len(), 3);

        std::fs::remove_dir_all(&dir)?;
        Ok(())
    }

    #[test]
    fn missing_gltf_fails() {
        init_logger();
        assert!(umbra::assets::loaders::gltf::import("does/not/exist.gltf").is_err());
    }
}
