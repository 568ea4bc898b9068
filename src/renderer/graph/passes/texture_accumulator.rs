//! Texture Accumulator Pass
//!
//! Resolves material textures in screen space. Each unique sampler-texture pair
//! gets one compute dispatch that samples its texture at every pixel whose
//! base-color or normal id names the pair. The first dispatch of a frame writes
//! every texel; later dispatches read-modify-write. With no pairs a single
//! dispatch with id `0` (which matches nothing) still clears the accumulators.
//! After the last dispatch both texture-id buffers are zeroed, so a schedule that
//! runs the accumulator again before the next Geometry pass resolves nothing.
//!
//! [`resolve_texel`] is the per-texel rule of the program, kept on the host for
//! tests.

use crate::errors::Result;
use crate::renderer::core::binding::{BindingRegistry, ResourceId, formats};
use crate::renderer::core::context::GpuContext;
use crate::renderer::core::resources::GpuTexture;
use crate::renderer::core::uniforms::DispatchParams;
use crate::renderer::graph::context::{FrameContext, SetupContext};
use crate::renderer::graph::node::RenderNode;
use crate::renderer::graph::passes::geometry::GBuffer;
use crate::renderer::graph::targets;
use crate::renderer::pipeline::shader_manager::ShaderLibrary;

const BINDINGS: [ResourceId; 9] = [
    ResourceId::Viewport,
    ResourceId::ColorTexture,
    ResourceId::Sampler,
    ResourceId::DispatchParams,
    ResourceId::TexCoordTarget,
    ResourceId::BaseColorTextureIds,
    ResourceId::NormalTextureIds,
    ResourceId::ColorAccumulator,
    ResourceId::NormalAccumulator,
];

/// Color and normal accumulators (`Rgba8Unorm`, alpha `1` where resolved).
#[derive(Clone)]
pub struct Accumulators {
    pub color: GpuTexture,
    pub normal: GpuTexture,
}

/// Accumulator contents of one pixel.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AccumulatedTexel {
    pub color: [f32; 4],
    pub normal: [f32; 4],
}

/// Value an accumulator texel holds before any pair resolved it.
pub const CLEARED_TEXEL: AccumulatedTexel = AccumulatedTexel {
    color: [0.0; 4],
    normal: [0.0; 4],
};

#[must_use]
pub fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// One dispatch applied to one pixel.
///
/// - `params`: the dispatch (`id` = pair index + 1, `first` = overwrite)
/// - `base_color_id` / `normal_id`: the pixel's entries in the id buffers
/// - `previous`: accumulator contents before the dispatch
/// - `sample`: the pair's texture sampled at the pixel's uv
#[must_use]
pub fn resolve_texel(
    params: DispatchParams,
    base_color_id: u32,
    normal_id: u32,
    previous: AccumulatedTexel,
    sample: [f32; 4],
) -> AccumulatedTexel {
    let mut texel = if params.first != 0 {
        CLEARED_TEXEL
    } else {
        previous
    };

    let matches = |id: u32| params.id != 0 && id == params.id;

    if matches(base_color_id) {
        texel.color = [
            srgb_to_linear(sample[0]),
            srgb_to_linear(sample[1]),
            srgb_to_linear(sample[2]),
            1.0,
        ];
    }
    if matches(normal_id) {
        texel.normal = [sample[0], sample[1], sample[2], 1.0];
    }
    texel
}

/// Dispatches recorded for `pair_count` pairs: ids `1..=pair_count`, or a single
/// id-`0` dispatch when there are none. Only the first one overwrites.
#[must_use]
pub fn dispatch_schedule(pair_count: usize) -> Vec<DispatchParams> {
    if pair_count == 0 {
        return vec![DispatchParams::new(0, true)];
    }
    (0..pair_count as u32)
        .map(|index| DispatchParams::new(index + 1, index == 0))
        .collect()
}

pub struct TextureAccumulatorPass {
    pipeline: wgpu::ComputePipeline,
    layout: wgpu::BindGroupLayout,
}

impl TextureAccumulatorPass {
    pub fn new(ctx: &GpuContext, shaders: &mut ShaderLibrary) -> Result<Self> {
        let device = &ctx.device;
        let module = shaders.module(device, "texture_accumulator")?;
        let layout = BindingRegistry::layout(device, "Texture Accumulator Layout", &BINDINGS);
        let pipeline = targets::compute_pipeline(device, "Texture Accumulator", &module, &layout);

        log::debug!("Texture accumulator pass created");
        Ok(Self { pipeline, layout })
    }

    pub fn setup(self, ctx: &SetupContext<'_>, gbuffer: &GBuffer) -> Result<ReadyTextureAccumulatorPass> {
        let device = ctx.device();
        let scene = ctx.scene;

        let accumulators = Accumulators {
            color: targets::screen_texture(
                ctx.gpu,
                "Color Accumulator",
                formats::ACCUMULATOR,
                targets::STORAGE_TARGET | wgpu::TextureUsages::COPY_SRC,
            ),
            normal: targets::screen_texture(
                ctx.gpu,
                "Normal Accumulator",
                formats::ACCUMULATOR,
                targets::STORAGE_TARGET | wgpu::TextureUsages::COPY_SRC,
            ),
        };

        let schedule = dispatch_schedule(scene.sampler_texture_pairs.len());
        let bind_groups = schedule
            .iter()
            .map(|&params| {
                let (texture, sampler) = match params.id.checked_sub(1) {
                    Some(index) => scene.pair_resources(scene.sampler_texture_pairs[index as usize]),
                    None => (&scene.fallback_texture.view, &scene.default_sampler),
                };
                let params_buffer =
                    targets::dispatch_params_buffer(device, &format!("Accumulator Params {}", params.id), params);

                BindingRegistry::bind_group(
                    device,
                    &format!("Texture Accumulator BindGroup {}", params.id),
                    &self.layout,
                    &[
                        (ResourceId::Viewport, ctx.frame_uniforms.as_entire_binding()),
                        (ResourceId::ColorTexture, wgpu::BindingResource::TextureView(texture)),
                        (ResourceId::Sampler, wgpu::BindingResource::Sampler(sampler)),
                        (ResourceId::DispatchParams, params_buffer.as_entire_binding()),
                        (
                            ResourceId::TexCoordTarget,
                            wgpu::BindingResource::TextureView(&gbuffer.tex_coord.view),
                        ),
                        (
                            ResourceId::BaseColorTextureIds,
                            gbuffer.base_color_ids.as_entire_binding(),
                        ),
                        (ResourceId::NormalTextureIds, gbuffer.normal_ids.as_entire_binding()),
                        (
                            ResourceId::ColorAccumulator,
                            wgpu::BindingResource::TextureView(&accumulators.color.view),
                        ),
                        (
                            ResourceId::NormalAccumulator,
                            wgpu::BindingResource::TextureView(&accumulators.normal.view),
                        ),
                    ],
                )
            })
            .collect::<Vec<_>>();

        log::debug!("Texture accumulator pass: {} dispatches", bind_groups.len());

        Ok(ReadyTextureAccumulatorPass {
            pipeline: self.pipeline,
            bind_groups,
            accumulators,
            texture_ids: [gbuffer.base_color_ids.clone(), gbuffer.normal_ids.clone()],
            size: ctx.gpu.size(),
        })
    }
}

pub struct ReadyTextureAccumulatorPass {
    pipeline: wgpu::ComputePipeline,
    bind_groups: Vec<wgpu::BindGroup>,
    accumulators: Accumulators,
    /// Base-color and normal id buffers of the G-buffer.
    texture_ids: [wgpu::Buffer; 2],
    size: (u32, u32),
}

impl ReadyTextureAccumulatorPass {
    #[inline]
    #[must_use]
    pub fn accumulators(&self) -> &Accumulators {
        &self.accumulators
    }
}

impl RenderNode for ReadyTextureAccumulatorPass {
    fn name(&self) -> &'static str {
        "TextureAccumulator"
    }

    fn run(&self, _ctx: &FrameContext<'_>, encoder: &mut wgpu::CommandEncoder) {
        targets::dispatch_each(
            encoder,
            "Texture Accumulator",
            &self.pipeline,
            &self.bind_groups,
            self.size,
        );

        for ids in &self.texture_ids {
            encoder.clear_buffer(ids, 0, None);
        }
    }
}
