//! Frame Pipeline
//!
//! [`FramePipelineBuilder`] holds the seven Unconfigured passes. Setting it up
//! against an uploaded [`GpuScene`] allocates every screen-sized target and bind
//! group once and yields a [`FramePipeline`], which records the Ready passes into a
//! caller-supplied encoder every frame.
//!
//! ```rust,ignore
//! let pipeline = FramePipelineBuilder::new(&ctx, settings)?.setup(&scene)?;
//!
//! let mut encoder = ctx.device.create_command_encoder(&Default::default());
//! pipeline.execute(&mut encoder, Some(&surface_view));
//! ctx.queue.submit([encoder.finish()]);
//! ```

use wgpu::util::DeviceExt;

use crate::errors::Result;
use crate::renderer::core::context::GpuContext;
use crate::renderer::core::error_scope;
use crate::renderer::core::resources::{GpuScene, GpuTexture};
use crate::renderer::core::uniforms::FrameUniforms;
use crate::renderer::graph::context::{FrameContext, SetupContext};
use crate::renderer::graph::node::RenderNode;
use crate::renderer::graph::passes::{
    Accumulators, CompositeInputs, CompositePass, GBuffer, GeometryPass, LightingPass, PresentPass,
    ReadyCompositePass, ReadyGeometryPass, ReadyLightingPass, ReadyPresentPass,
    ReadyShadowCompositePass, ReadyShadowMapPass, ReadyTextureAccumulatorPass,
    ShadowCompositePass, ShadowMapPass, TextureAccumulatorPass,
};
use crate::renderer::graph::stage::{self, PassKind};
use crate::renderer::pipeline::shader_manager::{ShaderDefines, ShaderLibrary, WORKGROUP_SIZE};
use crate::renderer::settings::{MAX_SHADOW_MAPS, RendererSettings};

/// Unconfigured pipeline: settings validated, shaders compiled, pipelines created.
pub struct FramePipelineBuilder {
    ctx: GpuContext,
    settings: RendererSettings,
    geometry: GeometryPass,
    shadow_map: ShadowMapPass,
    texture_accumulator: TextureAccumulatorPass,
    lighting: LightingPass,
    shadow_composite: ShadowCompositePass,
    composite: CompositePass,
    present: PresentPass,
}

impl FramePipelineBuilder {
    pub fn new(ctx: &GpuContext, settings: RendererSettings) -> Result<Self> {
        settings.validate()?;

        let mut shaders = ShaderLibrary::new(
            settings.shader_dir.clone(),
            ShaderDefines {
                workgroup_size: WORKGROUP_SIZE,
                max_shadow_maps: MAX_SHADOW_MAPS,
            },
        )?;

        let builder = error_scope::capture_setup(&ctx.device, "pipeline creation", || {
            Ok(Self {
                geometry: GeometryPass::new(ctx, &mut shaders)?,
                shadow_map: ShadowMapPass::new(ctx, &mut shaders)?,
                texture_accumulator: TextureAccumulatorPass::new(ctx, &mut shaders)?,
                lighting: LightingPass::new(ctx, &mut shaders)?,
                shadow_composite: ShadowCompositePass::new(ctx, &mut shaders)?,
                composite: CompositePass::new(ctx, &mut shaders)?,
                present: PresentPass::new(ctx, &mut shaders)?,
                ctx: ctx.clone(),
                settings,
            })
        })?;

        log::info!(
            "Frame pipeline created ({} shader modules)",
            shaders.module_count()
        );
        Ok(builder)
    }

    /// Binds `scene` and allocates the screen-sized targets.
    pub fn setup(self, scene: &GpuScene) -> Result<FramePipeline> {
        let Self {
            ctx,
            settings,
            geometry,
            shadow_map,
            texture_accumulator,
            lighting,
            shadow_composite,
            composite,
            present,
        } = self;

        let uniforms = FrameUniforms::new(
            &settings,
            ctx.size(),
            scene.camera_count(),
            scene.lights.len(),
            scene.sampler_texture_pairs.len(),
        );

        error_scope::capture_setup(&ctx.device, "pipeline setup", || {
            let frame_uniforms = ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Frame Uniforms"),
                contents: bytemuck::bytes_of(&uniforms),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });

            let setup = SetupContext {
                gpu: &ctx,
                scene,
                settings: &settings,
                frame_uniforms: &frame_uniforms,
            };

            let geometry = geometry.setup(&setup)?;
            let shadow_map = shadow_map.setup(&setup)?;
            let texture_accumulator = texture_accumulator.setup(&setup, geometry.gbuffer())?;
            let lighting = lighting.setup(&setup, geometry.gbuffer(), texture_accumulator.accumulators())?;
            let shadow_composite =
                shadow_composite.setup(&setup, geometry.gbuffer(), shadow_map.shadow_maps())?;
            let composite = composite.setup(
                &setup,
                &CompositeInputs {
                    gbuffer: geometry.gbuffer(),
                    accumulators: texture_accumulator.accumulators(),
                    lighting: lighting.output(),
                    shadow_factor: shadow_composite.output(),
                },
            )?;
            let present = present.setup(&setup, composite.output())?;

            log::info!(
                "Frame pipeline ready: {}x{}, {} draw calls, {} lights ({} shadowed), {} texture pairs",
                uniforms.width,
                uniforms.height,
                scene.draw_calls.len(),
                uniforms.light_count,
                uniforms.shadow_count,
                uniforms.pair_count
            );

            Ok(FramePipeline {
                geometry,
                shadow_map,
                texture_accumulator,
                lighting,
                shadow_composite,
                composite,
                present,
                frame_uniforms,
                uniforms,
            })
        })
    }
}

/// Ready pipeline. Recording never allocates.
pub struct FramePipeline {
    geometry: ReadyGeometryPass,
    shadow_map: ReadyShadowMapPass,
    texture_accumulator: ReadyTextureAccumulatorPass,
    lighting: ReadyLightingPass,
    shadow_composite: ReadyShadowCompositePass,
    composite: ReadyCompositePass,
    present: ReadyPresentPass,
    frame_uniforms: wgpu::Buffer,
    uniforms: FrameUniforms,
}

impl FramePipeline {
    fn node(&self, kind: PassKind) -> &dyn RenderNode {
        match kind {
            PassKind::Geometry => &self.geometry,
            PassKind::ShadowMap => &self.shadow_map,
            PassKind::TextureAccumulator => &self.texture_accumulator,
            PassKind::Lighting => &self.lighting,
            PassKind::ShadowComposite => &self.shadow_composite,
            PassKind::Composite => &self.composite,
            PassKind::Present => &self.present,
        }
    }

    /// Records one frame in [`PassKind::ORDER`]. Present is skipped when
    /// `surface_view` is `None`.
    pub fn execute(&self, encoder: &mut wgpu::CommandEncoder, surface_view: Option<&wgpu::TextureView>) {
        debug_assert_eq!(stage::validate_order(&PassKind::ORDER), Ok(()));
        self.record(encoder, surface_view, &PassKind::ORDER);
    }

    /// Records `passes` in the given order.
    ///
    /// Schedules that fail [`stage::validate_order`] are still recorded (with a
    /// warning); passes then read whatever their inputs held before.
    pub fn execute_passes(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        surface_view: Option<&wgpu::TextureView>,
        passes: &[PassKind],
    ) {
        if let Err(violation) = stage::validate_order(passes) {
            log::warn!("Recording an invalid pass schedule: {violation}");
        }
        self.record(encoder, surface_view, passes);
    }

    fn record(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        surface_view: Option<&wgpu::TextureView>,
        passes: &[PassKind],
    ) {
        let ctx = FrameContext { surface_view };
        for &kind in passes {
            let node = self.node(kind);
            encoder.push_debug_group(node.name());
            node.run(&ctx, encoder);
            encoder.pop_debug_group();
        }
    }

    #[inline]
    #[must_use]
    pub fn uniforms(&self) -> &FrameUniforms {
        &self.uniforms
    }

    /// Uniform buffer bound as `ResourceId::Viewport`.
    #[inline]
    #[must_use]
    pub fn frame_uniform_buffer(&self) -> &wgpu::Buffer {
        &self.frame_uniforms
    }

    #[inline]
    #[must_use]
    pub fn gbuffer(&self) -> &GBuffer {
        self.geometry.gbuffer()
    }

    /// Color and normal accumulators written by the texture accumulator.
    #[inline]
    #[must_use]
    pub fn accumulators(&self) -> &Accumulators {
        self.texture_accumulator.accumulators()
    }

    /// Composited image, copyable for readback.
    #[inline]
    #[must_use]
    pub fn final_color(&self) -> &GpuTexture {
        self.composite.output()
    }
}
