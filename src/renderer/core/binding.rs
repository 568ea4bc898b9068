//! Binding Registry
//!
//! Every GPU resource a pass can bind is named by a [`ResourceId`]. The id fixes
//! the binding slot (its integer value), the shader stages that see it and the
//! kind of binding, so two passes that share an id always agree on the layout
//! entry. WGSL programs declare `@group(0) @binding(<id>)` accordingly.
//!
//! ```rust,ignore
//! use umbra::renderer::core::binding::{BindingRegistry, ResourceId};
//!
//! let layout = BindingRegistry::layout(
//!     device,
//!     "Lighting Layout",
//!     &[ResourceId::Viewport, ResourceId::Light, ResourceId::PositionTarget],
//! );
//! ```

use wgpu::ShaderStages;

/// Logical resources shared between passes. The discriminant is the binding slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u32)]
pub enum ResourceId {
    /// `array<mat4x4<f32>>`, one `projection * view` per camera.
    Camera = 0,
    /// Per-frame constants (`FrameUniforms`).
    Viewport = 1,
    Transforms = 2,
    InstanceProperties = 3,
    Materials = 4,
    /// One `GpuLight`, bound per shadow-map layer or lighting dispatch.
    Light = 5,
    /// Every `GpuLight`.
    Lights = 6,
    ShadowMaps = 7,
    DepthSampler = 8,
    /// Source texture of one sampler-texture pair.
    ColorTexture = 9,
    /// Sampler of one sampler-texture pair.
    Sampler = 10,
    /// Per-dispatch constants (`DispatchParams`).
    DispatchParams = 11,
    PositionTarget = 12,
    NormalTarget = 13,
    BaseColorTarget = 14,
    TexCoordTarget = 15,
    BaseColorTextureIds = 16,
    NormalTextureIds = 17,
    ColorAccumulator = 18,
    NormalAccumulator = 19,
    LightAccumulator = 20,
    /// Sampled view of [`ResourceId::LightAccumulator`].
    LightingResult = 21,
    ShadowFactor = 22,
    /// Sampled view of [`ResourceId::ShadowFactor`].
    ShadowFactorResult = 23,
    FinalColorTarget = 24,
    /// Sampled view of [`ResourceId::FinalColorTarget`].
    FinalColor = 25,
}

impl ResourceId {
    pub const ALL: [Self; 26] = [
        Self::Camera,
        Self::Viewport,
        Self::Transforms,
        Self::InstanceProperties,
        Self::Materials,
        Self::Light,
        Self::Lights,
        Self::ShadowMaps,
        Self::DepthSampler,
        Self::ColorTexture,
        Self::Sampler,
        Self::DispatchParams,
        Self::PositionTarget,
        Self::NormalTarget,
        Self::BaseColorTarget,
        Self::TexCoordTarget,
        Self::BaseColorTextureIds,
        Self::NormalTextureIds,
        Self::ColorAccumulator,
        Self::NormalAccumulator,
        Self::LightAccumulator,
        Self::LightingResult,
        Self::ShadowFactor,
        Self::ShadowFactorResult,
        Self::FinalColorTarget,
        Self::FinalColor,
    ];

    #[inline]
    #[must_use]
    pub const fn slot(self) -> u32 {
        self as u32
    }
}

/// What kind of binding a resource occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    UniformBuffer,
    StorageBuffer {
        read_only: bool,
    },
    SampledTexture {
        sample_type: wgpu::TextureSampleType,
        dimension: wgpu::TextureViewDimension,
    },
    StorageTexture {
        format: wgpu::TextureFormat,
        access: wgpu::StorageTextureAccess,
    },
    Sampler(wgpu::SamplerBindingType),
}

impl ResourceKind {
    const UNFILTERABLE_2D: Self = Self::SampledTexture {
        sample_type: wgpu::TextureSampleType::Float { filterable: false },
        dimension: wgpu::TextureViewDimension::D2,
    };

    const FILTERABLE_2D: Self = Self::SampledTexture {
        sample_type: wgpu::TextureSampleType::Float { filterable: true },
        dimension: wgpu::TextureViewDimension::D2,
    };

    #[must_use]
    pub fn binding_type(self) -> wgpu::BindingType {
        match self {
            Self::UniformBuffer => wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            Self::StorageBuffer { read_only } => wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            Self::SampledTexture {
                sample_type,
                dimension,
            } => wgpu::BindingType::Texture {
                sample_type,
                view_dimension: dimension,
                multisampled: false,
            },
            Self::StorageTexture { format, access } => wgpu::BindingType::StorageTexture {
                access,
                format,
                view_dimension: wgpu::TextureViewDimension::D2,
            },
            Self::Sampler(ty) => wgpu::BindingType::Sampler(ty),
        }
    }
}

/// Registry answer for one id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutEntry {
    pub binding: u32,
    pub visibility: ShaderStages,
    pub kind: ResourceKind,
}

impl LayoutEntry {
    #[must_use]
    pub fn to_wgpu(self) -> wgpu::BindGroupLayoutEntry {
        wgpu::BindGroupLayoutEntry {
            binding: self.binding,
            visibility: self.visibility,
            ty: self.kind.binding_type(),
            count: None,
        }
    }
}

/// Formats of the screen-sized targets, shared by the registry and the passes
/// that allocate them.
pub mod formats {
    pub const POSITION: wgpu::TextureFormat = wgpu::TextureFormat::Rgba32Float;
    pub const BASE_COLOR: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
    pub const NORMAL: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
    /// `xy` texture coordinate, `z` base-color pair id, `w` normal pair id.
    pub const TEX_COORD: wgpu::TextureFormat = wgpu::TextureFormat::Rgba32Float;
    pub const DEPTH: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
    pub const ACCUMULATOR: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
    pub const LIGHT_ACCUMULATOR: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
    pub const SHADOW_FACTOR: wgpu::TextureFormat = wgpu::TextureFormat::R32Float;
    pub const FINAL_COLOR: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
    pub const SHADOW_MAP: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
}

/// Static id → layout table plus layout/bind-group helpers.
pub struct BindingRegistry;

impl BindingRegistry {
    /// Looks up the layout entry of `id`.
    #[must_use]
    pub fn layout_entry(id: ResourceId) -> LayoutEntry {
        use ResourceId as R;

        let vertex = ShaderStages::VERTEX;
        let fragment = ShaderStages::FRAGMENT;
        let compute = ShaderStages::COMPUTE;

        let (visibility, kind) = match id {
            R::Camera => (vertex, ResourceKind::StorageBuffer { read_only: true }),
            R::Viewport => (vertex | fragment | compute, ResourceKind::UniformBuffer),
            R::Transforms => (vertex, ResourceKind::StorageBuffer { read_only: true }),
            R::InstanceProperties => (
                vertex | fragment,
                ResourceKind::StorageBuffer { read_only: true },
            ),
            R::Materials => (
                fragment | compute,
                ResourceKind::StorageBuffer { read_only: true },
            ),
            R::Light => (vertex | compute, ResourceKind::UniformBuffer),
            R::Lights => (compute, ResourceKind::StorageBuffer { read_only: true }),
            R::ShadowMaps => (
                compute,
                ResourceKind::SampledTexture {
                    sample_type: wgpu::TextureSampleType::Depth,
                    dimension: wgpu::TextureViewDimension::D2Array,
                },
            ),
            R::DepthSampler => (
                compute,
                ResourceKind::Sampler(wgpu::SamplerBindingType::Comparison),
            ),
            R::ColorTexture => (compute, ResourceKind::FILTERABLE_2D),
            R::Sampler => (
                compute | fragment,
                ResourceKind::Sampler(wgpu::SamplerBindingType::Filtering),
            ),
            R::DispatchParams => (compute, ResourceKind::UniformBuffer),
            R::PositionTarget
            | R::NormalTarget
            | R::BaseColorTarget
            | R::TexCoordTarget
            | R::LightingResult
            | R::ShadowFactorResult => (compute, ResourceKind::UNFILTERABLE_2D),
            R::BaseColorTextureIds | R::NormalTextureIds => {
                (compute, ResourceKind::StorageBuffer { read_only: false })
            }
            R::ColorAccumulator | R::NormalAccumulator => (
                compute,
                ResourceKind::StorageTexture {
                    format: formats::ACCUMULATOR,
                    access: wgpu::StorageTextureAccess::ReadWrite,
                },
            ),
            R::LightAccumulator => (
                compute,
                ResourceKind::StorageTexture {
                    format: formats::LIGHT_ACCUMULATOR,
                    access: wgpu::StorageTextureAccess::ReadWrite,
                },
            ),
            R::ShadowFactor => (
                compute,
                ResourceKind::StorageTexture {
                    format: formats::SHADOW_FACTOR,
                    access: wgpu::StorageTextureAccess::WriteOnly,
                },
            ),
            R::FinalColorTarget => (
                compute,
                ResourceKind::StorageTexture {
                    format: formats::FINAL_COLOR,
                    access: wgpu::StorageTextureAccess::WriteOnly,
                },
            ),
            R::FinalColor => (fragment, ResourceKind::FILTERABLE_2D),
        };

        LayoutEntry {
            binding: id.slot(),
            visibility,
            kind,
        }
    }

    /// Layout entries for `ids`, sorted by slot.
    ///
    /// # Panics
    ///
    /// Panics if an id appears more than once.
    #[must_use]
    pub fn entries(ids: &[ResourceId]) -> Vec<LayoutEntry> {
        let mut entries: Vec<LayoutEntry> = ids.iter().map(|&id| Self::layout_entry(id)).collect();
        entries.sort_by_key(|entry| entry.binding);

        if let Some(pair) = entries.windows(2).find(|w| w[0].binding == w[1].binding) {
            panic!("resource bound twice in one layout: slot {}", pair[0].binding);
        }

        entries
    }

    pub fn layout(device: &wgpu::Device, label: &str, ids: &[ResourceId]) -> wgpu::BindGroupLayout {
        let entries: Vec<wgpu::BindGroupLayoutEntry> = Self::entries(ids)
            .into_iter()
            .map(LayoutEntry::to_wgpu)
            .collect();

        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(label),
            entries: &entries,
        })
    }

    /// Creates a bind group whose entries use the registry slots of their ids.
    pub fn bind_group(
        device: &wgpu::Device,
        label: &str,
        layout: &wgpu::BindGroupLayout,
        resources: &[(ResourceId, wgpu::BindingResource<'_>)],
    ) -> wgpu::BindGroup {
        let entries: Vec<wgpu::BindGroupEntry<'_>> = resources
            .iter()
            .map(|(id, resource)| wgpu::BindGroupEntry {
                binding: id.slot(),
                resource: resource.clone(),
            })
            .collect();

        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &entries,
        })
    }
}
