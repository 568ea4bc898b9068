//! Shadow Map Pass
//!
//! Renders depth for the first `shadow_map_pool_size` lights into layer `i` of a
//! `Depth32Float` 2D array, one render pass per layer, front faces culled.

use crate::errors::Result;
use crate::ingest::{DrawCall, Vertex};
use crate::renderer::core::binding::{BindingRegistry, ResourceId, formats};
use crate::renderer::core::context::GpuContext;
use crate::renderer::graph::context::{FrameContext, SetupContext};
use crate::renderer::graph::node::RenderNode;
use crate::renderer::pipeline::shader_manager::ShaderLibrary;

const BINDINGS: [ResourceId; 2] = [ResourceId::Transforms, ResourceId::Light];

/// Depth array plus everything needed to sample it.
#[derive(Clone)]
pub struct ShadowMaps {
    pub texture: wgpu::Texture,
    /// `D2Array` view over every layer.
    pub array_view: wgpu::TextureView,
    /// Comparison sampler (`LessEqual`).
    pub sampler: wgpu::Sampler,
    /// Lights that own a layer: `min(light_count, pool_size)`.
    pub count: u32,
}

pub struct ShadowMapPass {
    pipeline: wgpu::RenderPipeline,
    layout: wgpu::BindGroupLayout,
}

impl ShadowMapPass {
    pub fn new(ctx: &GpuContext, shaders: &mut ShaderLibrary) -> Result<Self> {
        let device = &ctx.device;
        let module = shaders.module(device, "shadow")?;
        let layout = BindingRegistry::layout(device, "Shadow Map Layout", &BINDINGS);

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Shadow Map Pipeline Layout"),
            bind_group_layouts: &[Some(&layout)],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Shadow Map Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &module,
                entry_point: Some("vs_main"),
                buffers: &[Vertex::layout()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: None,
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Front),
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: formats::SHADOW_MAP,
                depth_write_enabled: Some(true),
                depth_compare: Some(wgpu::CompareFunction::LessEqual),
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState {
                    constant: 2,
                    slope_scale: 2.0,
                    clamp: 0.0,
                },
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        log::debug!("Shadow map pass created");
        Ok(Self { pipeline, layout })
    }

    pub fn setup(self, ctx: &SetupContext<'_>) -> Result<ReadyShadowMapPass> {
        let device = ctx.device();
        let scene = ctx.scene;
        let pool_size = ctx.settings.shadow_map_pool_size;
        let resolution = ctx.settings.shadow_map_resolution;

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Shadow Map Array"),
            size: wgpu::Extent3d {
                width: resolution,
                height: resolution,
                depth_or_array_layers: pool_size,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: formats::SHADOW_MAP,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });

        let array_view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("Shadow Map Array View"),
            dimension: Some(wgpu::TextureViewDimension::D2Array),
            base_array_layer: 0,
            array_layer_count: Some(pool_size),
            ..Default::default()
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Shadow Comparison Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            compare: Some(wgpu::CompareFunction::LessEqual),
            ..Default::default()
        });

        // Layer i belongs to light i.
        let layers = scene
            .light_buffers
            .iter()
            .take(pool_size as usize)
            .enumerate()
            .map(|(layer, light_buffer)| {
                let view = texture.create_view(&wgpu::TextureViewDescriptor {
                    label: Some(&format!("Shadow Map Layer {layer}")),
                    dimension: Some(wgpu::TextureViewDimension::D2),
                    base_array_layer: layer as u32,
                    array_layer_count: Some(1),
                    ..Default::default()
                });
                let bind_group = BindingRegistry::bind_group(
                    device,
                    &format!("Shadow Map BindGroup {layer}"),
                    &self.layout,
                    &[
                        (ResourceId::Transforms, scene.transform_buffer.as_entire_binding()),
                        (ResourceId::Light, light_buffer.as_entire_binding()),
                    ],
                );
                ShadowLayer { view, bind_group }
            })
            .collect::<Vec<_>>();

        log::debug!(
            "Shadow map pass: {} of {pool_size} layers in use at {resolution}²",
            layers.len()
        );

        Ok(ReadyShadowMapPass {
            pipeline: self.pipeline,
            maps: ShadowMaps {
                texture,
                array_view,
                sampler,
                count: layers.len() as u32,
            },
            layers,
            vertex_buffer: scene.vertex_buffer.clone(),
            index_buffer: scene.index_buffer.clone(),
            draw_calls: scene.draw_calls.clone(),
        })
    }
}

struct ShadowLayer {
    view: wgpu::TextureView,
    bind_group: wgpu::BindGroup,
}

pub struct ReadyShadowMapPass {
    pipeline: wgpu::RenderPipeline,
    maps: ShadowMaps,
    layers: Vec<ShadowLayer>,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    draw_calls: Vec<DrawCall>,
}

impl ReadyShadowMapPass {
    #[inline]
    #[must_use]
    pub fn shadow_maps(&self) -> &ShadowMaps {
        &self.maps
    }
}

impl RenderNode for ReadyShadowMapPass {
    fn name(&self) -> &'static str {
        "ShadowMap"
    }

    fn run(&self, _ctx: &FrameContext<'_>, encoder: &mut wgpu::CommandEncoder) {
        for layer in &self.layers {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Shadow Depth Pass"),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &layer.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &layer.bind_group, &[]);
            pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
            pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint16);

            for draw in &self.draw_calls {
                pass.draw_indexed(draw.index_range(), draw.base_vertex, draw.instance_range());
            }
        }
    }
}
