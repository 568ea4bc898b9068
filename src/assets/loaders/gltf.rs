//! glTF 2.0 importer.
//!
//! Reads a `.gltf` / `.glb` file into a [`SceneDescription`]. Node indices, mesh
//! indices and the texture/sampler/image tables keep their glTF numbering, so the
//! resulting description can be flattened without any remapping.
//!
//! Supported: the default scene's node hierarchy, triangle-list primitives with
//! POSITION/NORMAL/TEXCOORD_0, PBR metallic-roughness materials, perspective and
//! orthographic cameras, and `KHR_lights_punctual`. Images must be referenced by URI;
//! buffer-view images are rejected.

use std::path::Path;

use glam::{Mat4, Vec3};

use crate::errors::{Result, UmbraError};
use crate::scene::{
    AddressMode, CameraDesc, FilterMode, LightDesc, MaterialDesc, MeshDesc, NodeDesc,
    PrimitiveDesc, SamplerDesc, SceneDescription, TextureDesc, TextureInfo,
};

/// Imports the glTF file at `path`.
pub fn import(path: impl AsRef<Path>) -> Result<SceneDescription> {
    let path = path.as_ref();
    let gltf::Gltf { document, blob } = gltf::Gltf::open(path)?;
    let base_path = path.parent().unwrap_or(Path::new("./"));
    let buffers = gltf::import_buffers(&document, Some(base_path), blob)?;

    let unsupported: Vec<_> = document
        .extensions_used()
        .filter(|ext| *ext != "KHR_lights_punctual")
        .collect();
    if !unsupported.is_empty() {
        log::warn!(
            "{} uses unsupported extensions {:?}; they are ignored",
            path.display(),
            unsupported
        );
    }

    let mut desc = SceneDescription::new();

    for image in document.images() {
        match image.source() {
            gltf::image::Source::Uri { uri, .. } => {
                desc.add_image(uri);
            }
            gltf::image::Source::View { .. } => {
                return Err(UmbraError::UnsupportedImage {
                    uri: image
                        .name()
                        .map_or_else(|| format!("image #{}", image.index()), str::to_string),
                    reason: "images embedded in buffer views are not supported".to_string(),
                });
            }
        }
    }

    for sampler in document.samplers() {
        desc.add_sampler(convert_sampler(&sampler));
    }

    for texture in document.textures() {
        desc.add_texture(TextureDesc {
            sampler: texture.sampler().index(),
            image: texture.source().index(),
        });
    }

    for material in document.materials() {
        desc.add_material(convert_material(&material));
    }

    for mesh in document.meshes() {
        desc.add_mesh(convert_mesh(&mesh, &buffers));
    }

    for camera in document.cameras() {
        desc.add_camera(convert_camera(&camera));
    }

    if let Some(lights) = document.lights() {
        for light in lights {
            desc.add_light(convert_light(&light));
        }
    }

    for node in document.nodes() {
        let mut entry = NodeDesc::new()
            .with_transform(Mat4::from_cols_array_2d(&node.transform().matrix()))
            .with_children(node.children().map(|child| child.index()));
        entry.name = node.name().map(str::to_string);
        entry.mesh = node.mesh().map(|mesh| mesh.index());
        entry.camera = node.camera().map(|camera| camera.index());
        entry.light = node.light().map(|light| light.index());
        desc.add_node(entry);
    }

    if let Some(scene) = document.default_scene().or_else(|| document.scenes().next()) {
        desc.roots = scene.nodes().map(|node| node.index()).collect();
    }

    log::info!(
        "Imported {}: {} nodes, {} meshes, {} materials, {} images",
        path.display(),
        desc.nodes.len(),
        desc.meshes.len(),
        desc.materials.len(),
        desc.images.len()
    );

    Ok(desc)
}

fn convert_sampler(sampler: &gltf::texture::Sampler) -> SamplerDesc {
    use gltf::texture::{MagFilter, MinFilter, WrappingMode};

    let wrap = |mode: WrappingMode| match mode {
        WrappingMode::ClampToEdge => AddressMode::ClampToEdge,
        WrappingMode::MirroredRepeat => AddressMode::MirroredRepeat,
        WrappingMode::Repeat => AddressMode::Repeat,
    };

    let (min_filter, mipmap_filter) = match sampler.min_filter() {
        Some(MinFilter::Nearest | MinFilter::NearestMipmapNearest) => {
            (FilterMode::Nearest, FilterMode::Nearest)
        }
        Some(MinFilter::NearestMipmapLinear) => (FilterMode::Nearest, FilterMode::Linear),
        Some(MinFilter::LinearMipmapNearest) => (FilterMode::Linear, FilterMode::Nearest),
        Some(MinFilter::Linear | MinFilter::LinearMipmapLinear) | None => {
            (FilterMode::Linear, FilterMode::Linear)
        }
    };

    SamplerDesc {
        mag_filter: match sampler.mag_filter() {
            Some(MagFilter::Nearest) => FilterMode::Nearest,
            Some(MagFilter::Linear) | None => FilterMode::Linear,
        },
        min_filter,
        mipmap_filter,
        address_mode_u: wrap(sampler.wrap_s()),
        address_mode_v: wrap(sampler.wrap_t()),
    }
}

fn texture_info(texture: &gltf::Texture, tex_coord: u32) -> TextureInfo {
    TextureInfo {
        texture: texture.index(),
        tex_coord,
    }
}

fn convert_material(material: &gltf::Material) -> MaterialDesc {
    let pbr = material.pbr_metallic_roughness();

    MaterialDesc {
        name: material.name().map(str::to_string),
        base_color_factor: pbr.base_color_factor(),
        metallic_factor: pbr.metallic_factor(),
        roughness_factor: pbr.roughness_factor(),
        emissive_factor: material.emissive_factor(),
        base_color_texture: pbr
            .base_color_texture()
            .map(|info| texture_info(&info.texture(), info.tex_coord())),
        metallic_roughness_texture: pbr
            .metallic_roughness_texture()
            .map(|info| texture_info(&info.texture(), info.tex_coord())),
        normal_texture: material
            .normal_texture()
            .map(|info| texture_info(&info.texture(), info.tex_coord())),
        occlusion_texture: material
            .occlusion_texture()
            .map(|info| texture_info(&info.texture(), info.tex_coord())),
        emissive_texture: material
            .emissive_texture()
            .map(|info| texture_info(&info.texture(), info.tex_coord())),
    }
}

/// Missing attributes stay `None` so ingestion reports them against the right primitive.
fn convert_mesh(mesh: &gltf::Mesh, buffers: &[gltf::buffer::Data]) -> MeshDesc {
    let primitives = mesh
        .primitives()
        .filter(|primitive| {
            let triangles = primitive.mode() == gltf::mesh::Mode::Triangles;
            if !triangles {
                log::warn!(
                    "Mesh #{} primitive #{}: {:?} topology skipped",
                    mesh.index(),
                    primitive.index(),
                    primitive.mode()
                );
            }
            triangles
        })
        .map(|primitive| {
            let reader =
                primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| data.0.as_slice()));
            PrimitiveDesc {
                positions: reader.read_positions().map(Iterator::collect),
                normals: reader.read_normals().map(Iterator::collect),
                tex_coords: reader
                    .read_tex_coords(0)
                    .map(|coords| coords.into_f32().collect()),
                indices: reader
                    .read_indices()
                    .map(|indices| indices.into_u32().collect()),
                material: primitive.material().index(),
            }
        })
        .collect();

    MeshDesc {
        name: mesh.name().map(str::to_string),
        primitives,
    }
}

fn convert_camera(camera: &gltf::Camera) -> CameraDesc {
    let mut desc = match camera.projection() {
        gltf::camera::Projection::Perspective(p) => {
            CameraDesc::perspective(p.yfov(), p.aspect_ratio(), p.znear(), p.zfar())
        }
        gltf::camera::Projection::Orthographic(o) => {
            CameraDesc::orthographic(o.xmag(), o.ymag(), o.znear(), o.zfar())
        }
    };
    desc.name = camera.name().map(str::to_string);
    desc
}

fn convert_light(light: &gltf::khr_lights_punctual::Light) -> LightDesc {
    use gltf::khr_lights_punctual::Kind;

    let color = Vec3::from_array(light.color());
    let mut desc = match light.kind() {
        Kind::Directional => LightDesc::new_directional(color, light.intensity()),
        Kind::Point => LightDesc::new_point(color, light.intensity(), light.range()),
        Kind::Spot {
            inner_cone_angle,
            outer_cone_angle,
        } => LightDesc::new_spot(
            color,
            light.intensity(),
            light.range(),
            inner_cone_angle,
            outer_cone_angle,
        ),
    };
    desc.name = light.name().map(str::to_string);
    desc
}
