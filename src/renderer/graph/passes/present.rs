//! Present Pass
//!
//! Draws a full-screen triangle sampling the final color into the surface view.

use crate::errors::Result;
use crate::renderer::core::binding::{BindingRegistry, ResourceId};
use crate::renderer::core::context::GpuContext;
use crate::renderer::core::resources::GpuTexture;
use crate::renderer::graph::context::{FrameContext, SetupContext};
use crate::renderer::graph::node::RenderNode;
use crate::renderer::pipeline::shader_manager::ShaderLibrary;

const BINDINGS: [ResourceId; 2] = [ResourceId::Sampler, ResourceId::FinalColor];

pub struct PresentPass {
    pipeline: wgpu::RenderPipeline,
    layout: wgpu::BindGroupLayout,
}

impl PresentPass {
    pub fn new(ctx: &GpuContext, shaders: &mut ShaderLibrary) -> Result<Self> {
        let device = &ctx.device;
        let module = shaders.module(device, "present")?;
        let layout = BindingRegistry::layout(device, "Present Layout", &BINDINGS);

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Present Pipeline Layout"),
            bind_group_layouts: &[Some(&layout)],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Present Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &module,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &module,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: ctx.surface_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        log::debug!("Present pass created for {:?}", ctx.surface_format);
        Ok(Self { pipeline, layout })
    }

    pub fn setup(self, ctx: &SetupContext<'_>, final_color: &GpuTexture) -> Result<ReadyPresentPass> {
        let device = ctx.device();
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Present Sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let bind_group = BindingRegistry::bind_group(
            device,
            "Present BindGroup",
            &self.layout,
            &[
                (ResourceId::Sampler, wgpu::BindingResource::Sampler(&sampler)),
                (
                    ResourceId::FinalColor,
                    wgpu::BindingResource::TextureView(&final_color.view),
                ),
            ],
        );

        Ok(ReadyPresentPass {
            pipeline: self.pipeline,
            bind_group,
        })
    }
}

pub struct ReadyPresentPass {
    pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,
}

impl RenderNode for ReadyPresentPass {
    fn name(&self) -> &'static str {
        "Present"
    }

    fn run(&self, ctx: &FrameContext<'_>, encoder: &mut wgpu::CommandEncoder) {
        let Some(surface_view) = ctx.surface_view else {
            return;
        };

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Present Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: surface_view,
                resolve_target: None,
                depth_slice: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.bind_group, &[]);
        pass.draw(0..3, 0..1);
    }
}
