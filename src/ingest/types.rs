//! Host-side records with the exact memory layout the shader programs expect.
//!
//! Every struct here is `#[repr(C)]` + [`bytemuck::Pod`] so the flattened arrays can be
//! uploaded with a single `bytemuck::cast_slice`. Field order and padding mirror the
//! WGSL declarations in `renderer/pipeline/shaders/chunks/common.wgsl`.

use bitflags::bitflags;
use glam::{Mat4, Vec3};

/// Sentinel material index for primitives without a material.
pub const NO_MATERIAL: u32 = u32::MAX;
/// Sentinel texture index for empty material slots.
pub const NO_TEXTURE: u32 = u32::MAX;
/// Sentinel sampler index selecting the synthetic default sampler.
pub const DEFAULT_SAMPLER: u32 = u32::MAX;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coord: [f32; 2],
}

impl Vertex {
    pub const ATTRIBUTES: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x3,
        2 => Float32x2
    ];

    #[must_use]
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Indexed, instanced draw. Layout-compatible with `wgpu::util::DrawIndexedIndirectArgs`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DrawCall {
    pub index_count: u32,
    pub instance_count: u32,
    pub first_index: u32,
    pub base_vertex: i32,
    pub first_instance: u32,
}

impl DrawCall {
    #[inline]
    #[must_use]
    pub fn index_range(&self) -> std::ops::Range<u32> {
        self.first_index..self.first_index + self.index_count
    }

    #[inline]
    #[must_use]
    pub fn instance_range(&self) -> std::ops::Range<u32> {
        self.first_instance..self.first_instance + self.instance_count
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceProperty {
    pub material_index: u32,
    pub _pad: [u32; 3],
}

impl InstanceProperty {
    #[must_use]
    pub const fn new(material_index: u32) -> Self {
        Self {
            material_index,
            _pad: [0; 3],
        }
    }
}

impl Default for InstanceProperty {
    fn default() -> Self {
        Self::new(NO_MATERIAL)
    }
}

/// One light as seen by the shadow, lighting and shadow-composite programs.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuLight {
    /// `projection(light) * inverse(world)`.
    pub light_space: Mat4,
    pub position: [f32; 3],
    /// 0 directional, 1 point, 2 spot.
    pub kind: u32,
    /// Euler angles (XYZ order, radians) of the light's world rotation.
    pub rotation: [f32; 3],
    pub intensity: f32,
    pub color: [f32; 3],
    /// 0.0 means unbounded.
    pub range: f32,
    /// World-space direction the light points at (-Z of its node).
    pub direction: [f32; 3],
    pub inner_cone: f32,
    pub outer_cone: f32,
    /// Shadow-map layer (the light's index). Only layers below the pool size are rendered.
    pub shadow_layer: i32,
    pub _pad: [u32; 2],
}

impl GpuLight {
    #[inline]
    #[must_use]
    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }

    #[inline]
    #[must_use]
    pub fn direction(&self) -> Vec3 {
        Vec3::from_array(self.direction)
    }
}

/// Index of a texture slot inside [`GpuMaterial::textures`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum TextureSlot {
    BaseColor = 0,
    MetallicRoughness = 1,
    Normal = 2,
    Occlusion = 3,
    Emissive = 4,
}

impl TextureSlot {
    pub const COUNT: usize = 5;

    #[must_use]
    pub const fn flag(self) -> MaterialFlags {
        match self {
            Self::BaseColor => MaterialFlags::BASE_COLOR_TEXTURE,
            Self::MetallicRoughness => MaterialFlags::METALLIC_ROUGHNESS_TEXTURE,
            Self::Normal => MaterialFlags::NORMAL_TEXTURE,
            Self::Occlusion => MaterialFlags::OCCLUSION_TEXTURE,
            Self::Emissive => MaterialFlags::EMISSIVE_TEXTURE,
        }
    }
}

bitflags! {
    /// "Has texture" bits of a material, one per [`TextureSlot`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MaterialFlags: u32 {
        const BASE_COLOR_TEXTURE         = 1 << 0;
        const METALLIC_ROUGHNESS_TEXTURE = 1 << 1;
        const NORMAL_TEXTURE             = 1 << 2;
        const OCCLUSION_TEXTURE          = 1 << 3;
        const EMISSIVE_TEXTURE           = 1 << 4;
    }
}

/// A material slot's texture: index into the sampler-texture pair table plus UV set.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TextureRef {
    pub index: u32,
    pub uv_set: u32,
}

impl TextureRef {
    pub const NONE: Self = Self {
        index: NO_TEXTURE,
        uv_set: 0,
    };

    #[inline]
    #[must_use]
    pub const fn is_some(&self) -> bool {
        self.index != NO_TEXTURE
    }
}

impl Default for TextureRef {
    fn default() -> Self {
        Self::NONE
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuMaterial {
    pub base_color_factor: [f32; 4],
    pub emissive_factor: [f32; 3],
    pub metallic: f32,
    pub roughness: f32,
    /// Raw [`MaterialFlags`] bits.
    pub flags: u32,
    pub _pad0: [u32; 2],
    pub textures: [TextureRef; TextureSlot::COUNT],
    pub _pad1: [u32; 2],
}

impl GpuMaterial {
    #[inline]
    #[must_use]
    pub fn flags(&self) -> MaterialFlags {
        MaterialFlags::from_bits_truncate(self.flags)
    }

    #[inline]
    #[must_use]
    pub fn texture(&self, slot: TextureSlot) -> TextureRef {
        self.textures[slot as usize]
    }
}

impl Default for GpuMaterial {
    fn default() -> Self {
        Self {
            base_color_factor: [1.0; 4],
            emissive_factor: [0.0; 3],
            metallic: 1.0,
            roughness: 1.0,
            flags: 0,
            _pad0: [0; 2],
            textures: [TextureRef::NONE; TextureSlot::COUNT],
            _pad1: [0; 2],
        }
    }
}

/// One unique (sampler, image) combination referenced by at least one material.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SamplerTexturePair {
    /// Index into the sampler table, or [`DEFAULT_SAMPLER`].
    pub sampler_index: u32,
    /// Index into the texture URI table.
    pub texture_index: u32,
}

/// Perspective parameters of a camera, kept so that the projection can follow the
/// surface it is rendered to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerspectiveLens {
    pub yfov: f32,
    /// `None` takes the aspect ratio of whatever the camera renders into.
    pub aspect_ratio: Option<f32>,
    pub znear: f32,
    /// `None` builds an infinite far plane.
    pub zfar: Option<f32>,
}

impl PerspectiveLens {
    /// Right-handed, depth 0..1 projection. `fallback_aspect` applies when the lens
    /// has no aspect ratio of its own.
    #[must_use]
    pub fn projection(&self, fallback_aspect: f32) -> Mat4 {
        let aspect = self.aspect_ratio.unwrap_or(fallback_aspect);
        match self.zfar {
            Some(zfar) => Mat4::perspective_rh(self.yfov, aspect, self.znear, zfar),
            None => Mat4::perspective_infinite_rh(self.yfov, aspect, self.znear),
        }
    }
}

/// Host form of a camera. Only its `projection * view` reaches the GPU.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraData {
    /// Projection at the ingestion aspect ratio.
    pub projection: Mat4,
    pub view: Mat4,
    pub position: Vec3,
    pub forward: Vec3,
    pub lens: PerspectiveLens,
}

impl CameraData {
    #[inline]
    #[must_use]
    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }

    /// `projection * view` for a target of `surface_aspect` (width / height).
    #[inline]
    #[must_use]
    pub fn view_projection_for(&self, surface_aspect: f32) -> Mat4 {
        self.lens.projection(surface_aspect) * self.view
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gpu_layouts_match_wgsl_sizes() {
        assert_eq!(std::mem::size_of::<Vertex>(), 32);
        assert_eq!(std::mem::size_of::<DrawCall>(), 20);
        assert_eq!(std::mem::size_of::<InstanceProperty>(), 16);
        assert_eq!(std::mem::size_of::<GpuLight>(), 144);
        assert_eq!(std::mem::size_of::<GpuMaterial>(), 96);
        assert_eq!(std::mem::size_of::<SamplerTexturePair>(), 8);
    }

    #[test]
    fn draw_call_ranges() {
        let call = DrawCall {
            index_count: 6,
            instance_count: 2,
            first_index: 3,
            base_vertex: 0,
            first_instance: 4,
        };
        assert_eq!(call.index_range(), 3..9);
        assert_eq!(call.instance_range(), 4..6);
    }
}
