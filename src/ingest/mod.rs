//! Scene Ingestion
//!
//! Flattens a hierarchical [`SceneDescription`] into the contiguous host arrays the
//! GPU pipeline consumes.
//!
//! # Overview
//!
//! A single depth-first walk accumulates world transforms and collects:
//!
//! - Vertex and 16-bit index data, one range per unique mesh primitive
//! - One [`DrawCall`] per unique primitive, instanced once per referencing node
//! - Lights (with precomputed light-space matrices) and perspective cameras
//!
//! Materials are converted afterwards; their texture references are resolved into a
//! deduplicated [`SamplerTexturePair`] table so downstream passes touch each physical
//! texture once per frame.
//!
//! When the scene contains no light or no camera, a fixed default is appended
//! ([`default_light`], [`default_camera`]).

mod draw_calls;
mod materials;
mod traversal;
pub mod types;

use glam::{Mat4, Vec3};

pub use draw_calls::{DrawCallArena, DrawCallId, LaidOutDraws};
pub use types::{
    CameraData, DEFAULT_SAMPLER, DrawCall, GpuLight, GpuMaterial, InstanceProperty, MaterialFlags,
    NO_MATERIAL, NO_TEXTURE, PerspectiveLens, SamplerTexturePair, TextureRef, TextureSlot, Vertex,
};

use crate::errors::Result;
use crate::scene::{CameraDesc, LightDesc, SamplerDesc, SceneDescription};

use materials::PairInterner;
use traversal::Flattener;

/// Root correction applied before any node transform: mirrors the Z axis.
pub const MIRROR_CORRECTION: Mat4 = Mat4::from_cols_array(&[
    1.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, -1.0, 0.0, //
    0.0, 0.0, 0.0, 1.0,
]);

/// Knobs for [`flatten_with`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IngestOptions {
    /// Aspect ratio for cameras that do not specify one. The uploader replaces it
    /// with the surface aspect ratio; see [`CameraData::view_projection_for`].
    pub aspect_ratio: f32,
    /// Parent transform of every root node.
    pub root_correction: Mat4,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            aspect_ratio: 16.0 / 9.0,
            root_correction: MIRROR_CORRECTION,
        }
    }
}

impl IngestOptions {
    #[must_use]
    pub fn with_aspect_ratio(mut self, aspect_ratio: f32) -> Self {
        self.aspect_ratio = aspect_ratio;
        self
    }
}

/// Host-side result of ingestion, ready to be uploaded.
#[derive(Debug, Clone, Default)]
pub struct FlattenedScene {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u16>,
    /// One world transform per instance, contiguous per draw call.
    pub transforms: Vec<Mat4>,
    /// Parallel to `transforms`.
    pub instance_properties: Vec<InstanceProperty>,
    pub draw_calls: Vec<DrawCall>,
    pub lights: Vec<GpuLight>,
    pub cameras: Vec<CameraData>,
    pub materials: Vec<GpuMaterial>,
    pub sampler_texture_pairs: Vec<SamplerTexturePair>,
    pub texture_uris: Vec<String>,
    pub samplers: Vec<SamplerDesc>,
}

/// Summary counts of a [`FlattenedScene`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SceneStats {
    pub vertices: usize,
    pub indices: usize,
    pub draw_calls: usize,
    pub instances: usize,
    pub lights: usize,
    pub cameras: usize,
    pub materials: usize,
    pub sampler_texture_pairs: usize,
    pub textures: usize,
}

impl std::fmt::Display for SceneStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} vertices, {} indices, {} draw calls ({} instances), {} lights, {} cameras, \
             {} materials, {} texture pairs over {} textures",
            self.vertices,
            self.indices,
            self.draw_calls,
            self.instances,
            self.lights,
            self.cameras,
            self.materials,
            self.sampler_texture_pairs,
            self.textures
        )
    }
}

impl FlattenedScene {
    #[must_use]
    pub fn stats(&self) -> SceneStats {
        SceneStats {
            vertices: self.vertices.len(),
            indices: self.indices.len(),
            draw_calls: self.draw_calls.len(),
            instances: self.transforms.len(),
            lights: self.lights.len(),
            cameras: self.cameras.len(),
            materials: self.materials.len(),
            sampler_texture_pairs: self.sampler_texture_pairs.len(),
            textures: self.texture_uris.len(),
        }
    }
}

/// Flattens `desc` with [`IngestOptions::default`].
pub fn flatten(desc: &SceneDescription) -> Result<FlattenedScene> {
    flatten_with(desc, &IngestOptions::default())
}

pub fn flatten_with(desc: &SceneDescription, options: &IngestOptions) -> Result<FlattenedScene> {
    let mut flattener = Flattener::new(desc, options);
    flattener.walk()?;

    let Flattener {
        vertices,
        indices,
        arena,
        mut lights,
        mut cameras,
        ..
    } = flattener;

    if lights.is_empty() {
        log::info!("Scene has no lights, adding the default directional light");
        lights.push(default_light(options));
    }
    if cameras.is_empty() {
        log::info!("Scene has no cameras, adding the default camera");
        cameras.push(default_camera(options));
    }

    let mut interner = PairInterner::default();
    let materials = materials::convert_materials(desc, &mut interner)?;

    let LaidOutDraws {
        draw_calls,
        transforms,
        instance_properties,
    } = arena.finish();

    let scene = FlattenedScene {
        vertices,
        indices,
        transforms,
        instance_properties,
        draw_calls,
        lights,
        cameras,
        materials,
        sampler_texture_pairs: interner.into_pairs(),
        texture_uris: desc.images.clone(),
        samplers: desc.samplers.clone(),
    };

    log::info!("Flattened scene: {}", scene.stats());
    Ok(scene)
}

/// Local transform of the default light: pointing down and away at 45 degrees.
fn default_light_transform() -> Mat4 {
    Mat4::from_rotation_x(-std::f32::consts::FRAC_PI_4)
}

/// Local transform of the default camera: at (0, 0, 5) looking at the origin.
fn default_camera_transform() -> Mat4 {
    Mat4::look_at_rh(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y).inverse()
}

/// `root_correction * local`, or `local` alone when the correction is singular.
fn corrected(options: &IngestOptions, local: Mat4) -> Mat4 {
    let world = options.root_correction * local;
    if world.is_finite() && world.determinant().abs() > f32::EPSILON {
        world
    } else {
        local
    }
}

/// The directional light appended to scenes without lights.
#[must_use]
pub fn default_light(options: &IngestOptions) -> GpuLight {
    let world = corrected(options, default_light_transform());
    let desc = LightDesc::new_directional(Vec3::ONE, 1.0);
    traversal::convert_light(usize::MAX, &desc, world, 0)
        .unwrap_or_else(|_| unreachable!("default light transform is invertible"))
}

/// The camera appended to scenes without cameras.
#[must_use]
pub fn default_camera(options: &IngestOptions) -> CameraData {
    let world = corrected(options, default_camera_transform());
    let desc = CameraDesc::perspective(std::f32::consts::FRAC_PI_4, None, 0.1, Some(100.0));
    traversal::convert_camera(usize::MAX, usize::MAX, &desc, world, options)
        .unwrap_or_else(|_| unreachable!("default camera is perspective and invertible"))
}
