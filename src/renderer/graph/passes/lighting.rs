//! Lighting Pass
//!
//! One compute dispatch per light into an `Rgba16Float` accumulation texture.
//! Dispatch 0 overwrites, later dispatches add. Normal-map samples from the
//! normal accumulator perturb the G-buffer normal.

use wgpu::util::DeviceExt;

use crate::errors::Result;
use crate::ingest::GpuLight;
use crate::renderer::core::binding::{BindingRegistry, ResourceId, formats};
use crate::renderer::core::context::GpuContext;
use crate::renderer::core::resources::GpuTexture;
use crate::renderer::core::uniforms::DispatchParams;
use crate::renderer::graph::context::{FrameContext, SetupContext};
use crate::renderer::graph::node::RenderNode;
use crate::renderer::graph::passes::geometry::GBuffer;
use crate::renderer::graph::passes::texture_accumulator::Accumulators;
use crate::renderer::graph::targets;
use crate::renderer::pipeline::shader_manager::ShaderLibrary;

const BINDINGS: [ResourceId; 7] = [
    ResourceId::Viewport,
    ResourceId::Light,
    ResourceId::DispatchParams,
    ResourceId::PositionTarget,
    ResourceId::NormalTarget,
    ResourceId::NormalAccumulator,
    ResourceId::LightAccumulator,
];

pub struct LightingPass {
    pipeline: wgpu::ComputePipeline,
    layout: wgpu::BindGroupLayout,
}

impl LightingPass {
    pub fn new(ctx: &GpuContext, shaders: &mut ShaderLibrary) -> Result<Self> {
        let device = &ctx.device;
        let module = shaders.module(device, "lighting")?;
        let layout = BindingRegistry::layout(device, "Lighting Layout", &BINDINGS);
        let pipeline = targets::compute_pipeline(device, "Lighting", &module, &layout);

        log::debug!("Lighting pass created");
        Ok(Self { pipeline, layout })
    }

    pub fn setup(
        self,
        ctx: &SetupContext<'_>,
        gbuffer: &GBuffer,
        accumulators: &Accumulators,
    ) -> Result<ReadyLightingPass> {
        let device = ctx.device();

        let output = targets::screen_texture(
            ctx.gpu,
            "Light Accumulator",
            formats::LIGHT_ACCUMULATOR,
            targets::STORAGE_TARGET,
        );

        // A scene without lights still gets one clearing dispatch.
        let placeholder;
        let light_buffers: Vec<&wgpu::Buffer> = if ctx.scene.light_buffers.is_empty() {
            placeholder = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Unlit Light"),
                contents: bytemuck::bytes_of(&<GpuLight as bytemuck::Zeroable>::zeroed()),
                usage: wgpu::BufferUsages::UNIFORM,
            });
            vec![&placeholder]
        } else {
            ctx.scene.light_buffers.iter().collect()
        };

        let bind_groups = light_buffers
            .iter()
            .enumerate()
            .map(|(index, light_buffer)| {
                let params = DispatchParams::new(index as u32, index == 0);
                let params_buffer =
                    targets::dispatch_params_buffer(device, &format!("Lighting Params {index}"), params);

                BindingRegistry::bind_group(
                    device,
                    &format!("Lighting BindGroup {index}"),
                    &self.layout,
                    &[
                        (ResourceId::Viewport, ctx.frame_uniforms.as_entire_binding()),
                        (ResourceId::Light, light_buffer.as_entire_binding()),
                        (ResourceId::DispatchParams, params_buffer.as_entire_binding()),
                        (
                            ResourceId::PositionTarget,
                            wgpu::BindingResource::TextureView(&gbuffer.position.view),
                        ),
                        (
                            ResourceId::NormalTarget,
                            wgpu::BindingResource::TextureView(&gbuffer.normal.view),
                        ),
                        (
                            ResourceId::NormalAccumulator,
                            wgpu::BindingResource::TextureView(&accumulators.normal.view),
                        ),
                        (
                            ResourceId::LightAccumulator,
                            wgpu::BindingResource::TextureView(&output.view),
                        ),
                    ],
                )
            })
            .collect::<Vec<_>>();

        log::debug!("Lighting pass: {} dispatches", bind_groups.len());

        Ok(ReadyLightingPass {
            pipeline: self.pipeline,
            bind_groups,
            output,
            size: ctx.gpu.size(),
        })
    }
}

pub struct ReadyLightingPass {
    pipeline: wgpu::ComputePipeline,
    bind_groups: Vec<wgpu::BindGroup>,
    output: GpuTexture,
    size: (u32, u32),
}

impl ReadyLightingPass {
    /// The light accumulation texture.
    #[inline]
    #[must_use]
    pub fn output(&self) -> &GpuTexture {
        &self.output
    }
}

impl RenderNode for ReadyLightingPass {
    fn name(&self) -> &'static str {
        "Lighting"
    }

    fn run(&self, _ctx: &FrameContext<'_>, encoder: &mut wgpu::CommandEncoder) {
        targets::dispatch_each(encoder, "Lighting", &self.pipeline, &self.bind_groups, self.size);
    }
}
