//! Pass Contexts
//!
//! Two phase-separated views of the shared state:
//!
//! - [`SetupContext`]: handed to every `setup` call. Carries the GPU context,
//!   the uploaded scene and the frame uniform buffer. Passes allocate their
//!   targets and build bind groups here.
//! - [`FrameContext`]: handed to every `run` call. Read-only; carries what
//!   changes from frame to frame (the surface view).

use crate::renderer::core::context::GpuContext;
use crate::renderer::core::resources::GpuScene;
use crate::renderer::settings::RendererSettings;

/// Shared inputs of the setup phase.
pub struct SetupContext<'a> {
    pub gpu: &'a GpuContext,
    pub scene: &'a GpuScene,
    pub settings: &'a RendererSettings,
    /// Uniform buffer holding `FrameUniforms`, bound as `ResourceId::Viewport`.
    pub frame_uniforms: &'a wgpu::Buffer,
}

impl SetupContext<'_> {
    #[inline]
    #[must_use]
    pub fn device(&self) -> &wgpu::Device {
        &self.gpu.device
    }
}

/// Per-frame inputs of the record phase.
#[derive(Clone, Copy, Default)]
pub struct FrameContext<'a> {
    /// View the present pass draws into. `None` skips presentation.
    pub surface_view: Option<&'a wgpu::TextureView>,
}
