//! Scene Ingestion Tests
//!
//! Tests for:
//! - Mesh deduplication and instancing (one draw call per primitive, k instances)
//! - Index and draw-call bounds of the flattened arrays
//! - Default light and camera synthesis
//! - The two-cube reference scene
//! - Failure modes (malformed meshes, index overflow, orthographic cameras,
//!   singular light transforms, cyclic hierarchies)
//! - Uploaded camera matrices

use glam::{Mat4, Vec3, Vec4};

use umbra::errors::UmbraError;
use umbra::ingest::{
    self, DEFAULT_SAMPLER, DrawCall, FlattenedScene, IngestOptions, MIRROR_CORRECTION, NO_MATERIAL,
    SamplerTexturePair, TextureSlot,
};
use umbra::renderer::core::resources::camera_matrices;
use umbra::scene::{
    CameraDesc, LightDesc, MaterialDesc, MeshDesc, NodeDesc, PrimitiveDesc, SamplerDesc,
    SceneDescription, TextureDesc, TextureInfo,
};

const EPSILON: f32 = 1e-5;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn mat_approx(a: Mat4, b: Mat4) -> bool {
    a.abs_diff_eq(b, EPSILON)
}

fn assert_bounds(scene: &FlattenedScene) {
    for &index in &scene.indices {
        assert!((index as usize) < scene.vertices.len(), "index {index} out of range");
    }
    for draw in &scene.draw_calls {
        assert!((draw.first_index + draw.index_count) as usize <= scene.indices.len());
        assert!((draw.first_instance + draw.instance_count) as usize <= scene.transforms.len());
        assert_eq!(draw.base_vertex, 0);
    }
    assert_eq!(scene.transforms.len(), scene.instance_properties.len());
}

/// Two nodes sharing the cube mesh, at x = -2 and x = +2.
fn two_cubes() -> SceneDescription {
    let mut desc = SceneDescription::new();
    let cube = desc.add_mesh(MeshDesc::cube(1.0));
    desc.add_root(
        NodeDesc::new()
            .with_mesh(cube)
            .with_transform(Mat4::from_translation(Vec3::new(-2.0, 0.0, 0.0))),
    );
    desc.add_root(
        NodeDesc::new()
            .with_mesh(cube)
            .with_transform(Mat4::from_translation(Vec3::new(2.0, 0.0, 0.0))),
    );
    desc
}

// ============================================================================
// Reference Scene
// ============================================================================

#[test]
fn two_cube_scene_layout() {
    init_logger();
    let scene = ingest::flatten(&two_cubes()).unwrap();

    assert_eq!(scene.vertices.len(), 8);
    assert_eq!(scene.indices.len(), 36);
    assert_eq!(
        scene.draw_calls,
        vec![DrawCall {
            index_count: 36,
            instance_count: 2,
            first_index: 0,
            base_vertex: 0,
            first_instance: 0,
        }]
    );
    assert_eq!(scene.transforms.len(), 2);
    assert!(mat_approx(
        scene.transforms[0],
        MIRROR_CORRECTION * Mat4::from_translation(Vec3::new(-2.0, 0.0, 0.0))
    ));
    assert!(mat_approx(
        scene.transforms[1],
        MIRROR_CORRECTION * Mat4::from_translation(Vec3::new(2.0, 0.0, 0.0))
    ));
    assert!(scene.instance_properties.iter().all(|p| p.material_index == NO_MATERIAL));
    assert_bounds(&scene);
}

// ============================================================================
// Deduplication & Instancing
// ============================================================================

#[test]
fn mesh_referenced_k_times_is_stored_once() {
    init_logger();
    let mut desc = SceneDescription::new();
    let triangle = desc.add_mesh(MeshDesc::triangle());
    let group = desc.add_root(NodeDesc::new().with_name("group"));
    for i in 0..5 {
        let child = desc.add_node(
            NodeDesc::new()
                .with_mesh(triangle)
                .with_transform(Mat4::from_translation(Vec3::new(i as f32, 0.0, 0.0))),
        );
        desc.attach(child, group);
    }

    let scene = ingest::flatten(&desc).unwrap();
    assert_eq!(scene.vertices.len(), 3);
    assert_eq!(scene.indices.len(), 3);
    assert_eq!(scene.draw_calls.len(), 1);
    assert_eq!(scene.draw_calls[0].instance_count, 5);
    assert_eq!(scene.transforms.len(), 5);
    assert_bounds(&scene);
}

#[test]
fn interleaved_meshes_keep_instances_contiguous() {
    init_logger();
    let mut desc = SceneDescription::new();
    let cube = desc.add_mesh(MeshDesc::cube(1.0));
    let triangle = desc.add_mesh(MeshDesc::triangle());
    for (i, mesh) in [cube, triangle, cube, triangle, cube].into_iter().enumerate() {
        desc.add_root(
            NodeDesc::new()
                .with_mesh(mesh)
                .with_transform(Mat4::from_translation(Vec3::new(0.0, i as f32, 0.0))),
        );
    }

    let scene = ingest::flatten(&desc).unwrap();
    assert_eq!(scene.draw_calls.len(), 2);

    let cube_draw = scene.draw_calls[0];
    let triangle_draw = scene.draw_calls[1];
    assert_eq!((cube_draw.first_instance, cube_draw.instance_count), (0, 3));
    assert_eq!((triangle_draw.first_instance, triangle_draw.instance_count), (3, 2));

    // Triangle indices are rebased past the cube's 8 vertices.
    let first = triangle_draw.first_index as usize;
    assert_eq!(&scene.indices[first..first + 3], &[8, 9, 10]);

    // Cube instances in visit order: y = 0, 2, 4.
    let ys: Vec<f32> = scene.transforms[..3].iter().map(|m| m.w_axis.y).collect();
    assert_eq!(ys, vec![0.0, 2.0, 4.0]);
    assert_bounds(&scene);
}

#[test]
fn world_transform_accumulates_parent_first() {
    init_logger();
    let mut desc = SceneDescription::new();
    let triangle = desc.add_mesh(MeshDesc::triangle());
    let parent = desc.add_root(NodeDesc::new().with_transform(Mat4::from_scale(Vec3::splat(2.0))));
    let child = desc.add_node(
        NodeDesc::new()
            .with_mesh(triangle)
            .with_transform(Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0))),
    );
    desc.attach(child, parent);

    let options = IngestOptions {
        root_correction: Mat4::IDENTITY,
        ..Default::default()
    };
    let scene = ingest::flatten_with(&desc, &options).unwrap();
    assert!(mat_approx(
        scene.transforms[0],
        Mat4::from_scale(Vec3::splat(2.0)) * Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0))
    ));
    assert!((scene.transforms[0].w_axis.truncate() - Vec3::new(2.0, 0.0, 0.0)).length() < EPSILON);
}

// ============================================================================
// Defaults
// ============================================================================

#[test]
fn empty_scene_gets_default_light_and_camera() {
    init_logger();
    let scene = ingest::flatten(&SceneDescription::new()).unwrap();

    let options = IngestOptions::default();
    assert_eq!(scene.lights, vec![ingest::default_light(&options)]);
    assert_eq!(scene.cameras, vec![ingest::default_camera(&options)]);
    assert!(scene.draw_calls.is_empty());
    assert_eq!(scene.lights[0].kind, 0);
}

#[test]
fn scene_lights_suppress_the_default() {
    init_logger();
    let mut desc = two_cubes();
    let light = desc.add_light(LightDesc::new_point(Vec3::ONE, 5.0, Some(10.0)));
    desc.add_root(
        NodeDesc::new()
            .with_light(light)
            .with_transform(Mat4::from_translation(Vec3::new(0.0, 3.0, 0.0))),
    );

    let scene = ingest::flatten(&desc).unwrap();
    assert_eq!(scene.lights.len(), 1);
    assert_eq!(scene.lights[0].kind, 1);
    assert_eq!(scene.lights[0].shadow_layer, 0);
    assert!((scene.lights[0].position() - Vec3::new(0.0, 3.0, 0.0)).length() < EPSILON);
    assert_eq!(scene.cameras.len(), 1);
}

// ============================================================================
// Materials
// ============================================================================

#[test]
fn materials_share_sampler_texture_pairs() {
    init_logger();
    let mut desc = two_cubes();
    let image = desc.add_image("checker.png");
    let normal_image = desc.add_image("normal.png");
    let sampler = desc.add_sampler(SamplerDesc::default());
    let with_sampler = desc.add_texture(TextureDesc {
        sampler: Some(sampler),
        image,
    });
    let without_sampler = desc.add_texture(TextureDesc {
        sampler: None,
        image: normal_image,
    });

    let a = desc.add_material(
        MaterialDesc::new([1.0; 4])
            .with_base_color_texture(TextureInfo::new(with_sampler))
            .with_normal_texture(TextureInfo::new(without_sampler)),
    );
    desc.add_material(MaterialDesc::new([0.5; 4]).with_base_color_texture(TextureInfo::new(with_sampler)));
    desc.meshes[0].primitives[0].material = Some(a);

    let scene = ingest::flatten(&desc).unwrap();
    assert_eq!(
        scene.sampler_texture_pairs,
        vec![
            SamplerTexturePair {
                sampler_index: sampler as u32,
                texture_index: image as u32,
            },
            SamplerTexturePair {
                sampler_index: DEFAULT_SAMPLER,
                texture_index: normal_image as u32,
            },
        ]
    );
    assert_eq!(scene.materials[0].texture(TextureSlot::BaseColor).index, 0);
    assert_eq!(scene.materials[0].texture(TextureSlot::Normal).index, 1);
    assert_eq!(scene.materials[1].texture(TextureSlot::BaseColor).index, 0);
    assert!(!scene.materials[1].texture(TextureSlot::Normal).is_some());
    assert_eq!(scene.texture_uris, vec!["checker.png", "normal.png"]);
    assert!(scene.instance_properties.iter().all(|p| p.material_index == a as u32));
}

// ============================================================================
// Failure Modes
// ============================================================================

#[test]
fn missing_attribute_is_malformed() {
    init_logger();
    let mut desc = SceneDescription::new();
    let mut primitive = MeshDesc::triangle().primitives.remove(0);
    primitive.normals = None;
    let mesh = desc.add_mesh(MeshDesc::new(vec![primitive]));
    desc.add_root(NodeDesc::new().with_mesh(mesh));

    assert!(matches!(
        ingest::flatten(&desc),
        Err(UmbraError::MalformedMesh { mesh: 0, primitive: 0, .. })
    ));
}

#[test]
fn index_outside_primitive_is_malformed() {
    init_logger();
    let mut desc = SceneDescription::new();
    let mut primitive = MeshDesc::triangle().primitives.remove(0);
    primitive.indices = Some(vec![0, 1, 3]);
    let mesh = desc.add_mesh(MeshDesc::new(vec![primitive]));
    desc.add_root(NodeDesc::new().with_mesh(mesh));

    assert!(matches!(
        ingest::flatten(&desc),
        Err(UmbraError::MalformedMesh { .. })
    ));
}

#[test]
fn too_many_vertices_overflow_u16_indices() {
    init_logger();
    let count = 70_000;
    let primitive = PrimitiveDesc::new(
        vec![[0.0; 3]; count],
        vec![[0.0, 0.0, 1.0]; count],
        vec![[0.0; 2]; count],
        vec![0, 1, (count - 1) as u32],
    );
    let mut desc = SceneDescription::new();
    let mesh = desc.add_mesh(MeshDesc::new(vec![primitive]));
    desc.add_root(NodeDesc::new().with_mesh(mesh));

    assert!(matches!(
        ingest::flatten(&desc),
        Err(UmbraError::IndexOverflow { vertex }) if vertex == count - 1
    ));
}

#[test]
fn orthographic_camera_is_rejected() {
    init_logger();
    let mut desc = SceneDescription::new();
    let camera = desc.add_camera(CameraDesc::orthographic(1.0, 1.0, 0.1, 10.0));
    desc.add_root(NodeDesc::new().with_camera(camera));

    assert!(matches!(
        ingest::flatten(&desc),
        Err(UmbraError::UnsupportedCamera { camera: 0, .. })
    ));
}

#[test]
fn singular_light_transform_is_rejected() {
    init_logger();
    let mut desc = SceneDescription::new();
    let light = desc.add_light(LightDesc::new_directional(Vec3::ONE, 1.0));
    let node = desc.add_root(
        NodeDesc::new()
            .with_light(light)
            .with_transform(Mat4::from_scale(Vec3::ZERO)),
    );

    assert!(matches!(
        ingest::flatten(&desc),
        Err(UmbraError::MatrixDecomposition { node: n }) if n == node
    ));
}

#[test]
fn cycles_are_rejected() {
    init_logger();
    let mut desc = SceneDescription::new();
    let a = desc.add_root(NodeDesc::new());
    let b = desc.add_node(NodeDesc::new());
    desc.attach(b, a);
    desc.attach(a, b);

    assert!(matches!(
        ingest::flatten(&desc),
        Err(UmbraError::InvalidSceneGraph(_))
    ));
}

#[test]
fn dangling_mesh_reference_is_out_of_bounds() {
    init_logger();
    let mut desc = SceneDescription::new();
    desc.add_root(NodeDesc::new().with_mesh(4));

    assert!(matches!(
        ingest::flatten(&desc),
        Err(UmbraError::IndexOutOfBounds { index: 4, .. })
    ));
}

#[test]
fn millimetre_scaled_parent_keeps_lights_and_cameras() {
    init_logger();
    let mut desc = SceneDescription::new();
    let light = desc.add_light(LightDesc::new_point(Vec3::ONE, 5.0, None));
    let camera = desc.add_camera(CameraDesc::perspective(0.8, Some(1.0), 0.1, None));
    let lamp = desc.add_node(
        NodeDesc::new()
            .with_light(light)
            .with_transform(Mat4::from_translation(Vec3::new(0.0, 2000.0, 0.0))),
    );
    let eye = desc.add_node(
        NodeDesc::new()
            .with_camera(camera)
            .with_transform(Mat4::from_translation(Vec3::new(0.0, 0.0, 5000.0))),
    );
    desc.add_root(
        NodeDesc::new()
            .with_transform(Mat4::from_scale(Vec3::splat(0.001)))
            .with_children([lamp, eye]),
    );

    let scene = ingest::flatten(&desc).unwrap();
    assert_eq!(scene.lights.len(), 1);
    assert_eq!(scene.cameras.len(), 1);
    assert!((scene.lights[0].position() - Vec3::new(0.0, 2.0, 0.0)).length() < EPSILON);
    assert!((scene.cameras[0].position - Vec3::new(0.0, 0.0, -5.0)).length() < EPSILON);
}

// ============================================================================
// Cameras
// ============================================================================

#[test]
fn uploaded_camera_matrix_is_projection_times_view() {
    init_logger();
    let mut desc = two_cubes();
    let camera = desc.add_camera(CameraDesc::perspective(0.8, Some(1.5), 0.1, Some(50.0)));
    let eye = Mat4::from_translation(Vec3::new(0.0, 1.0, 6.0));
    desc.add_root(NodeDesc::new().with_camera(camera).with_transform(eye));

    let scene = ingest::flatten(&desc).unwrap();
    assert_eq!(scene.cameras.len(), 1);

    let world = MIRROR_CORRECTION * eye;
    let expected = Mat4::perspective_rh(0.8, 1.5, 0.1, 50.0) * world.inverse();
    let uploaded = camera_matrices(&scene.cameras, 1.0);
    assert!(mat_approx(uploaded[0], expected));

    // The camera position itself lands on the view axis.
    let clip = uploaded[0] * (world * Vec4::new(0.0, 0.0, -1.0, 1.0));
    assert!((clip.x / clip.w).abs() < EPSILON);
    assert!((clip.y / clip.w).abs() < EPSILON);
}

#[test]
fn camera_without_aspect_follows_the_surface() {
    init_logger();
    let mut desc = two_cubes();
    let camera = desc.add_camera(CameraDesc::perspective(0.8, None, 0.1, Some(50.0)));
    let eye = Mat4::from_translation(Vec3::new(0.0, 1.0, 6.0));
    desc.add_root(NodeDesc::new().with_camera(camera).with_transform(eye));

    let scene = ingest::flatten(&desc).unwrap();
    let view = (MIRROR_CORRECTION * eye).inverse();

    for surface_aspect in [1.0, 2.0, 0.5] {
        let expected = Mat4::perspective_rh(0.8, surface_aspect, 0.1, 50.0) * view;
        let uploaded = camera_matrices(&scene.cameras, surface_aspect);
        assert!(mat_approx(uploaded[0], expected), "aspect {surface_aspect}");
    }
}

#[test]
fn explicit_aspect_ignores_the_surface() {
    init_logger();
    let mut desc = two_cubes();
    let camera = desc.add_camera(CameraDesc::perspective(0.8, Some(1.5), 0.1, None));
    desc.add_root(NodeDesc::new().with_camera(camera));

    let scene = ingest::flatten(&desc).unwrap();
    assert_eq!(
        camera_matrices(&scene.cameras, 1.0),
        camera_matrices(&scene.cameras, 3.0)
    );
}

#[test]
fn default_camera_follows_the_surface() {
    init_logger();
    let scene = ingest::flatten(&two_cubes()).unwrap();
    let camera = scene.cameras[0];
    assert_eq!(camera.lens.aspect_ratio, None);

    let wide = camera_matrices(&scene.cameras, 2.0)[0];
    let expected = Mat4::perspective_rh(camera.lens.yfov, 2.0, 0.1, 100.0) * camera.view;
    assert!(mat_approx(wide, expected));
}
