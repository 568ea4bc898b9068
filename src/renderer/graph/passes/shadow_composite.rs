//! Shadow Composite Pass
//!
//! Projects every covered pixel into the shadow map of each light that owns a
//! layer and writes the averaged visibility (`R32Float`, `1` = fully lit).

use crate::errors::Result;
use crate::renderer::core::binding::{BindingRegistry, ResourceId, formats};
use crate::renderer::core::context::GpuContext;
use crate::renderer::core::resources::GpuTexture;
use crate::renderer::graph::context::{FrameContext, SetupContext};
use crate::renderer::graph::node::RenderNode;
use crate::renderer::graph::passes::geometry::GBuffer;
use crate::renderer::graph::passes::shadow_map::ShadowMaps;
use crate::renderer::graph::targets;
use crate::renderer::pipeline::shader_manager::ShaderLibrary;

const BINDINGS: [ResourceId; 6] = [
    ResourceId::Viewport,
    ResourceId::Lights,
    ResourceId::ShadowMaps,
    ResourceId::DepthSampler,
    ResourceId::PositionTarget,
    ResourceId::ShadowFactor,
];

pub struct ShadowCompositePass {
    pipeline: wgpu::ComputePipeline,
    layout: wgpu::BindGroupLayout,
}

impl ShadowCompositePass {
    pub fn new(ctx: &GpuContext, shaders: &mut ShaderLibrary) -> Result<Self> {
        let device = &ctx.device;
        let module = shaders.module(device, "shadow_composite")?;
        let layout = BindingRegistry::layout(device, "Shadow Composite Layout", &BINDINGS);
        let pipeline = targets::compute_pipeline(device, "Shadow Composite", &module, &layout);

        log::debug!("Shadow composite pass created");
        Ok(Self { pipeline, layout })
    }

    pub fn setup(
        self,
        ctx: &SetupContext<'_>,
        gbuffer: &GBuffer,
        shadow_maps: &ShadowMaps,
    ) -> Result<ReadyShadowCompositePass> {
        let output = targets::screen_texture(
            ctx.gpu,
            "Shadow Factor",
            formats::SHADOW_FACTOR,
            targets::STORAGE_TARGET,
        );

        let bind_group = BindingRegistry::bind_group(
            ctx.device(),
            "Shadow Composite BindGroup",
            &self.layout,
            &[
                (ResourceId::Viewport, ctx.frame_uniforms.as_entire_binding()),
                (ResourceId::Lights, ctx.scene.lights_buffer.as_entire_binding()),
                (
                    ResourceId::ShadowMaps,
                    wgpu::BindingResource::TextureView(&shadow_maps.array_view),
                ),
                (
                    ResourceId::DepthSampler,
                    wgpu::BindingResource::Sampler(&shadow_maps.sampler),
                ),
                (
                    ResourceId::PositionTarget,
                    wgpu::BindingResource::TextureView(&gbuffer.position.view),
                ),
                (ResourceId::ShadowFactor, wgpu::BindingResource::TextureView(&output.view)),
            ],
        );

        Ok(ReadyShadowCompositePass {
            pipeline: self.pipeline,
            bind_group,
            output,
            size: ctx.gpu.size(),
        })
    }
}

pub struct ReadyShadowCompositePass {
    pipeline: wgpu::ComputePipeline,
    bind_group: wgpu::BindGroup,
    output: GpuTexture,
    size: (u32, u32),
}

impl ReadyShadowCompositePass {
    /// The per-pixel visibility texture.
    #[inline]
    #[must_use]
    pub fn output(&self) -> &GpuTexture {
        &self.output
    }
}

impl RenderNode for ReadyShadowCompositePass {
    fn name(&self) -> &'static str {
        "ShadowComposite"
    }

    fn run(&self, _ctx: &FrameContext<'_>, encoder: &mut wgpu::CommandEncoder) {
        targets::dispatch_each(
            encoder,
            "Shadow Composite",
            &self.pipeline,
            [&self.bind_group],
            self.size,
        );
    }
}
