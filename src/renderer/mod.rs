//! Rendering System
//!
//! - [`core`]: GPU context, binding registry, resource upload, error scopes
//! - [`pipeline`]: shader library and WGSL programs
//! - [`graph`]: the frame pipeline and its passes
//! - [`settings`]: renderer configuration
//!
//! [`Renderer`] ties them together for hosts that only want to submit frames:
//!
//! ```rust,ignore
//! let ctx = GpuContext::new(&adapter, device, queue, surface_format, width, height)?;
//! let scene = GpuScene::upload(&ctx, &ingest::flatten(&description)?, &FileImageLoader::new("assets"))?;
//! let renderer = Renderer::new(ctx, RendererSettings::default(), &scene)?;
//!
//! // every frame
//! renderer.render(&surface_texture.texture.create_view(&Default::default()))?;
//! ```

pub mod core;
pub mod graph;
pub mod pipeline;
pub mod settings;

pub use self::core::binding::{BindingRegistry, LayoutEntry, ResourceId, ResourceKind};
pub use self::core::context::GpuContext;
pub use self::core::resources::GpuScene;
pub use graph::{FramePipeline, FramePipelineBuilder, PassKind};
pub use settings::RendererSettings;

use crate::errors::{Result, UmbraError};

/// Owns a ready [`FramePipeline`] and submits one encoder per frame.
pub struct Renderer {
    ctx: GpuContext,
    settings: RendererSettings,
    pipeline: FramePipeline,
}

impl Renderer {
    pub fn new(ctx: GpuContext, settings: RendererSettings, scene: &GpuScene) -> Result<Self> {
        let pipeline = FramePipelineBuilder::new(&ctx, settings.clone())?.setup(scene)?;
        scene.write_cameras(&ctx);
        Ok(Self {
            ctx,
            settings,
            pipeline,
        })
    }

    /// Records and submits one frame into `surface_view`.
    ///
    /// Fails with [`UmbraError::DeviceLost`] once the device is gone, and with
    /// [`UmbraError::FrameValidation`] when `validate_frames` is set and the frame
    /// raised a validation error.
    pub fn render(&self, surface_view: &wgpu::TextureView) -> Result<()> {
        self.ctx.check_device()?;

        let submit = || {
            let mut encoder = self
                .ctx
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Frame Encoder"),
                });
            self.pipeline.execute(&mut encoder, Some(surface_view));
            self.ctx.queue.submit(std::iter::once(encoder.finish()));
            Ok(())
        };

        if self.settings.validate_frames {
            core::error_scope::capture(
                &self.ctx.device,
                |message| {
                    log::error!("Frame validation error: {message}");
                    UmbraError::FrameValidation(message)
                },
                submit,
            )
        } else {
            submit()
        }
    }

    /// Rebuilds every screen-sized target for a new surface size and re-projects
    /// the cameras that follow the surface aspect ratio.
    pub fn resize(&mut self, width: u32, height: u32, scene: &GpuScene) -> Result<()> {
        if (width.max(1), height.max(1)) == self.ctx.size() {
            return Ok(());
        }
        let ctx = self.ctx.resized(width, height);
        self.pipeline = FramePipelineBuilder::new(&ctx, self.settings.clone())?.setup(scene)?;
        scene.write_cameras(&ctx);
        self.ctx = ctx;
        log::info!("Resized to {}x{}", self.ctx.width, self.ctx.height);
        Ok(())
    }

    #[inline]
    #[must_use]
    pub fn context(&self) -> &GpuContext {
        &self.ctx
    }

    #[inline]
    #[must_use]
    pub fn settings(&self) -> &RendererSettings {
        &self.settings
    }

    #[inline]
    #[must_use]
    pub fn pipeline(&self) -> &FramePipeline {
        &self.pipeline
    }
}
