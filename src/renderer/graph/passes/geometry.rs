//! Geometry Pass
//!
//! Rasterizes every draw call into the G-buffer:
//!
//! | Target | Format | Content |
//! |--------|--------|---------|
//! | position | `Rgba32Float` | world position, `w = 1` where covered |
//! | base color | `Rgba8Unorm` | material base-color factor |
//! | normal | `Rgba16Float` | world normal |
//! | tex coord | `Rgba32Float` | uv, base-color pair id, normal pair id |
//! | depth | `Depth32Float` | |
//!
//! A compute dispatch then copies the depth-tested pair ids into two
//! screen-sized `u32` buffers (`0` = no texture) that the accumulator reads.

use crate::errors::Result;
use crate::ingest::{DrawCall, Vertex};
use crate::renderer::core::binding::{BindingRegistry, ResourceId, formats};
use crate::renderer::core::context::GpuContext;
use crate::renderer::core::resources::GpuTexture;
use crate::renderer::graph::context::{FrameContext, SetupContext};
use crate::renderer::graph::node::RenderNode;
use crate::renderer::graph::targets;
use crate::renderer::pipeline::shader_manager::ShaderLibrary;

const SCENE_BINDINGS: [ResourceId; 5] = [
    ResourceId::Camera,
    ResourceId::Viewport,
    ResourceId::Transforms,
    ResourceId::InstanceProperties,
    ResourceId::Materials,
];

const RESOLVE_BINDINGS: [ResourceId; 4] = [
    ResourceId::Viewport,
    ResourceId::TexCoordTarget,
    ResourceId::BaseColorTextureIds,
    ResourceId::NormalTextureIds,
];

/// Screen-sized outputs of the geometry pass.
#[derive(Clone)]
pub struct GBuffer {
    pub position: GpuTexture,
    pub base_color: GpuTexture,
    pub normal: GpuTexture,
    pub tex_coord: GpuTexture,
    pub depth: GpuTexture,
    /// Base-color pair id per pixel (pair index + 1, `0` = none).
    pub base_color_ids: wgpu::Buffer,
    /// Normal-map pair id per pixel (pair index + 1, `0` = none).
    pub normal_ids: wgpu::Buffer,
}

impl GBuffer {
    fn new(ctx: &GpuContext) -> Self {
        let attachment = wgpu::TextureUsages::RENDER_ATTACHMENT
            | wgpu::TextureUsages::TEXTURE_BINDING
            | wgpu::TextureUsages::COPY_SRC;
        let id_buffer = |label: &str| {
            ctx.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size: ctx.pixel_count() * 4,
                usage: wgpu::BufferUsages::STORAGE
                    | wgpu::BufferUsages::COPY_SRC
                    | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        };

        Self {
            position: targets::screen_texture(ctx, "GBuffer Position", formats::POSITION, attachment),
            base_color: targets::screen_texture(ctx, "GBuffer Base Color", formats::BASE_COLOR, attachment),
            normal: targets::screen_texture(ctx, "GBuffer Normal", formats::NORMAL, attachment),
            tex_coord: targets::screen_texture(ctx, "GBuffer TexCoord", formats::TEX_COORD, attachment),
            depth: targets::screen_texture(ctx, "GBuffer Depth", formats::DEPTH, attachment),
            base_color_ids: id_buffer("Base Color Texture Ids"),
            normal_ids: id_buffer("Normal Texture Ids"),
        }
    }
}

/// Unconfigured geometry pass: shader modules and layouts.
pub struct GeometryPass {
    pipeline: wgpu::RenderPipeline,
    resolve_pipeline: wgpu::ComputePipeline,
    layout: wgpu::BindGroupLayout,
    resolve_layout: wgpu::BindGroupLayout,
}

impl GeometryPass {
    pub fn new(ctx: &GpuContext, shaders: &mut ShaderLibrary) -> Result<Self> {
        let device = &ctx.device;
        let module = shaders.module(device, "geometry")?;
        let resolve_module = shaders.module(device, "id_resolve")?;

        let layout = BindingRegistry::layout(device, "Geometry Layout", &SCENE_BINDINGS);
        let resolve_layout = BindingRegistry::layout(device, "Id Resolve Layout", &RESOLVE_BINDINGS);

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Geometry Pipeline Layout"),
            bind_group_layouts: &[Some(&layout)],
            immediate_size: 0,
        });

        let color_target = |format| {
            Some(wgpu::ColorTargetState {
                format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })
        };

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Geometry Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &module,
                entry_point: Some("vs_main"),
                buffers: &[Vertex::layout()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &module,
                entry_point: Some("fs_main"),
                targets: &[
                    color_target(formats::POSITION),
                    color_target(formats::BASE_COLOR),
                    color_target(formats::NORMAL),
                    color_target(formats::TEX_COORD),
                ],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: formats::DEPTH,
                depth_write_enabled: Some(true),
                depth_compare: Some(wgpu::CompareFunction::Less),
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        let resolve_pipeline = targets::compute_pipeline(device, "Id Resolve", &resolve_module, &resolve_layout);

        log::debug!("Geometry pass created");
        Ok(Self {
            pipeline,
            resolve_pipeline,
            layout,
            resolve_layout,
        })
    }

    /// Allocates the G-buffer and binds the scene.
    pub fn setup(self, ctx: &SetupContext<'_>) -> Result<ReadyGeometryPass> {
        let device = ctx.device();
        let scene = ctx.scene;
        let gbuffer = GBuffer::new(ctx.gpu);

        let bind_group = BindingRegistry::bind_group(
            device,
            "Geometry BindGroup",
            &self.layout,
            &[
                (ResourceId::Camera, scene.camera_buffer.as_entire_binding()),
                (ResourceId::Viewport, ctx.frame_uniforms.as_entire_binding()),
                (ResourceId::Transforms, scene.transform_buffer.as_entire_binding()),
                (
                    ResourceId::InstanceProperties,
                    scene.instance_property_buffer.as_entire_binding(),
                ),
                (ResourceId::Materials, scene.material_buffer.as_entire_binding()),
            ],
        );

        let resolve_bind_group = BindingRegistry::bind_group(
            device,
            "Id Resolve BindGroup",
            &self.resolve_layout,
            &[
                (ResourceId::Viewport, ctx.frame_uniforms.as_entire_binding()),
                (
                    ResourceId::TexCoordTarget,
                    wgpu::BindingResource::TextureView(&gbuffer.tex_coord.view),
                ),
                (
                    ResourceId::BaseColorTextureIds,
                    gbuffer.base_color_ids.as_entire_binding(),
                ),
                (ResourceId::NormalTextureIds, gbuffer.normal_ids.as_entire_binding()),
            ],
        );

        Ok(ReadyGeometryPass {
            pipeline: self.pipeline,
            resolve_pipeline: self.resolve_pipeline,
            bind_group,
            resolve_bind_group,
            vertex_buffer: scene.vertex_buffer.clone(),
            index_buffer: scene.index_buffer.clone(),
            draw_calls: scene.draw_calls.clone(),
            size: ctx.gpu.size(),
            gbuffer,
        })
    }
}

pub struct ReadyGeometryPass {
    pipeline: wgpu::RenderPipeline,
    resolve_pipeline: wgpu::ComputePipeline,
    bind_group: wgpu::BindGroup,
    resolve_bind_group: wgpu::BindGroup,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    draw_calls: Vec<DrawCall>,
    size: (u32, u32),
    gbuffer: GBuffer,
}

impl ReadyGeometryPass {
    #[inline]
    #[must_use]
    pub fn gbuffer(&self) -> &GBuffer {
        &self.gbuffer
    }
}

impl RenderNode for ReadyGeometryPass {
    fn name(&self) -> &'static str {
        "Geometry"
    }

    fn run(&self, _ctx: &FrameContext<'_>, encoder: &mut wgpu::CommandEncoder) {
        let clear = |view| {
            Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                depth_slice: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    store: wgpu::StoreOp::Store,
                },
            })
        };

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Geometry Pass"),
                color_attachments: &[
                    clear(&self.gbuffer.position.view),
                    clear(&self.gbuffer.base_color.view),
                    clear(&self.gbuffer.normal.view),
                    clear(&self.gbuffer.tex_coord.view),
                ],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.gbuffer.depth.view,
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
            pass.set_bind_group(0, &self.bind_group, &[]);
            pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
            pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint16);

            for draw in &self.draw_calls {
                pass.draw_indexed(draw.index_range(), draw.base_vertex, draw.instance_range());
            }
        }

        targets::dispatch_each(
            encoder,
            "Id Resolve",
            &self.resolve_pipeline,
            [&self.resolve_bind_group],
            self.size,
        );
    }
}
