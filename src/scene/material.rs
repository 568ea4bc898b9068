use serde::{Deserialize, Serialize};

/// Reference from a material slot to a texture table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextureInfo {
    /// Index into [`crate::scene::SceneDescription::textures`].
    pub texture: usize,
    /// Texture coordinate set. Only set 0 is carried by the vertex format.
    #[serde(default)]
    pub tex_coord: u32,
}

impl TextureInfo {
    #[must_use]
    pub const fn new(texture: usize) -> Self {
        Self {
            texture,
            tex_coord: 0,
        }
    }
}

/// PBR metallic-roughness material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialDesc {
    pub name: Option<String>,
    pub base_color_factor: [f32; 4],
    pub metallic_factor: f32,
    pub roughness_factor: f32,
    pub emissive_factor: [f32; 3],
    pub base_color_texture: Option<TextureInfo>,
    pub metallic_roughness_texture: Option<TextureInfo>,
    pub normal_texture: Option<TextureInfo>,
    pub occlusion_texture: Option<TextureInfo>,
    pub emissive_texture: Option<TextureInfo>,
}

impl Default for MaterialDesc {
    fn default() -> Self {
        Self {
            name: None,
            base_color_factor: [1.0; 4],
            metallic_factor: 1.0,
            roughness_factor: 1.0,
            emissive_factor: [0.0; 3],
            base_color_texture: None,
            metallic_roughness_texture: None,
            normal_texture: None,
            occlusion_texture: None,
            emissive_texture: None,
        }
    }
}

impl MaterialDesc {
    #[must_use]
    pub fn new(base_color_factor: [f32; 4]) -> Self {
        Self {
            base_color_factor,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_base_color_texture(mut self, info: TextureInfo) -> Self {
        self.base_color_texture = Some(info);
        self
    }

    #[must_use]
    pub fn with_normal_texture(mut self, info: TextureInfo) -> Self {
        self.normal_texture = Some(info);
        self
    }
}

/// A texture is an image paired with an optional sampler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextureDesc {
    /// Index into [`crate::scene::SceneDescription::samplers`]; `None` selects the default sampler.
    #[serde(default)]
    pub sampler: Option<usize>,
    /// Index into [`crate::scene::SceneDescription::images`].
    pub image: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    Nearest,
    #[default]
    Linear,
}

impl From<FilterMode> for wgpu::FilterMode {
    fn from(mode: FilterMode) -> Self {
        match mode {
            FilterMode::Nearest => wgpu::FilterMode::Nearest,
            FilterMode::Linear => wgpu::FilterMode::Linear,
        }
    }
}

impl From<FilterMode> for wgpu::MipmapFilterMode {
    fn from(mode: FilterMode) -> Self {
        match mode {
            FilterMode::Nearest => wgpu::MipmapFilterMode::Nearest,
            FilterMode::Linear => wgpu::MipmapFilterMode::Linear,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressMode {
    ClampToEdge,
    MirroredRepeat,
    #[default]
    Repeat,
}

impl From<AddressMode> for wgpu::AddressMode {
    fn from(mode: AddressMode) -> Self {
        match mode {
            AddressMode::ClampToEdge => wgpu::AddressMode::ClampToEdge,
            AddressMode::MirroredRepeat => wgpu::AddressMode::MirrorRepeat,
            AddressMode::Repeat => wgpu::AddressMode::Repeat,
        }
    }
}

/// Sampling state for one sampler table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerDesc {
    pub mag_filter: FilterMode,
    pub min_filter: FilterMode,
    pub mipmap_filter: FilterMode,
    pub address_mode_u: AddressMode,
    pub address_mode_v: AddressMode,
}
