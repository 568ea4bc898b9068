//! Composite Pass
//!
//! `albedo × (ambient + lighting × visibility)` per covered pixel, where albedo is
//! the base-color factor modulated by the resolved base-color texture. Uncovered
//! pixels take the clear color.

use crate::errors::Result;
use crate::renderer::core::binding::{BindingRegistry, ResourceId, formats};
use crate::renderer::core::context::GpuContext;
use crate::renderer::core::resources::GpuTexture;
use crate::renderer::graph::context::{FrameContext, SetupContext};
use crate::renderer::graph::node::RenderNode;
use crate::renderer::graph::passes::geometry::GBuffer;
use crate::renderer::graph::passes::texture_accumulator::Accumulators;
use crate::renderer::graph::targets;
use crate::renderer::pipeline::shader_manager::ShaderLibrary;

const BINDINGS: [ResourceId; 7] = [
    ResourceId::Viewport,
    ResourceId::PositionTarget,
    ResourceId::BaseColorTarget,
    ResourceId::ColorAccumulator,
    ResourceId::LightingResult,
    ResourceId::ShadowFactorResult,
    ResourceId::FinalColorTarget,
];

/// Inputs the composite reads, all produced earlier in the frame.
pub struct CompositeInputs<'a> {
    pub gbuffer: &'a GBuffer,
    pub accumulators: &'a Accumulators,
    pub lighting: &'a GpuTexture,
    pub shadow_factor: &'a GpuTexture,
}

pub struct CompositePass {
    pipeline: wgpu::ComputePipeline,
    layout: wgpu::BindGroupLayout,
}

impl CompositePass {
    pub fn new(ctx: &GpuContext, shaders: &mut ShaderLibrary) -> Result<Self> {
        let device = &ctx.device;
        let module = shaders.module(device, "composite")?;
        let layout = BindingRegistry::layout(device, "Composite Layout", &BINDINGS);
        let pipeline = targets::compute_pipeline(device, "Composite", &module, &layout);

        log::debug!("Composite pass created");
        Ok(Self { pipeline, layout })
    }

    pub fn setup(self, ctx: &SetupContext<'_>, inputs: &CompositeInputs<'_>) -> Result<ReadyCompositePass> {
        let output = targets::screen_texture(
            ctx.gpu,
            "Final Color",
            formats::FINAL_COLOR,
            targets::STORAGE_TARGET | wgpu::TextureUsages::COPY_SRC,
        );

        let view = wgpu::BindingResource::TextureView;
        let bind_group = BindingRegistry::bind_group(
            ctx.device(),
            "Composite BindGroup",
            &self.layout,
            &[
                (ResourceId::Viewport, ctx.frame_uniforms.as_entire_binding()),
                (ResourceId::PositionTarget, view(&inputs.gbuffer.position.view)),
                (ResourceId::BaseColorTarget, view(&inputs.gbuffer.base_color.view)),
                (ResourceId::ColorAccumulator, view(&inputs.accumulators.color.view)),
                (ResourceId::LightingResult, view(&inputs.lighting.view)),
                (ResourceId::ShadowFactorResult, view(&inputs.shadow_factor.view)),
                (ResourceId::FinalColorTarget, view(&output.view)),
            ],
        );

        Ok(ReadyCompositePass {
            pipeline: self.pipeline,
            bind_group,
            output,
            size: ctx.gpu.size(),
        })
    }
}

pub struct ReadyCompositePass {
    pipeline: wgpu::ComputePipeline,
    bind_group: wgpu::BindGroup,
    output: GpuTexture,
    size: (u32, u32),
}

impl ReadyCompositePass {
    /// The final color texture (`Rgba8Unorm`, copyable for readback).
    #[inline]
    #[must_use]
    pub fn output(&self) -> &GpuTexture {
        &self.output
    }
}

impl RenderNode for ReadyCompositePass {
    fn name(&self) -> &'static str {
        "Composite"
    }

    fn run(&self, _ctx: &FrameContext<'_>, encoder: &mut wgpu::CommandEncoder) {
        targets::dispatch_each(encoder, "Composite", &self.pipeline, [&self.bind_group], self.size);
    }
}
