//! Uniform blocks written by the pipeline itself (as opposed to scene data).

use crate::renderer::settings::RendererSettings;

/// Per-frame constants bound as [`ResourceId::Viewport`](super::binding::ResourceId::Viewport).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FrameUniforms {
    pub width: u32,
    pub height: u32,
    pub active_camera: u32,
    pub light_count: u32,
    /// Lights with a shadow-map layer: `min(light_count, shadow_map_pool_size)`.
    pub shadow_count: u32,
    pub pair_count: u32,
    pub _pad: [u32; 2],
    pub ambient: [f32; 4],
    pub clear_color: [f32; 4],
}

impl FrameUniforms {
    #[must_use]
    pub fn new(
        settings: &RendererSettings,
        (width, height): (u32, u32),
        camera_count: usize,
        light_count: usize,
        pair_count: usize,
    ) -> Self {
        let last_camera = camera_count.saturating_sub(1) as u32;
        let [r, g, b] = settings.ambient;
        let [cr, cg, cb, ca] = settings.clear_color;

        Self {
            width,
            height,
            active_camera: settings.active_camera.min(last_camera),
            light_count: light_count as u32,
            shadow_count: (light_count as u32).min(settings.shadow_map_pool_size),
            pair_count: pair_count as u32,
            _pad: [0; 2],
            ambient: [r, g, b, 0.0],
            clear_color: [cr as f32, cg as f32, cb as f32, ca as f32],
        }
    }
}

/// Per-dispatch constants of the accumulator and lighting passes.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DispatchParams {
    /// Pair index + 1 (accumulator) or light index (lighting).
    pub id: u32,
    /// Non-zero for the first dispatch of the frame, which overwrites instead of accumulating.
    pub first: u32,
    pub _pad: [u32; 2],
}

impl DispatchParams {
    #[must_use]
    pub const fn new(id: u32, first: bool) -> Self {
        Self {
            id,
            first: first as u32,
            _pad: [0; 2],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_camera_is_clamped() {
        let settings = RendererSettings {
            active_camera: 9,
            ..Default::default()
        };
        let uniforms = FrameUniforms::new(&settings, (640, 480), 2, 6, 0);
        assert_eq!(uniforms.active_camera, 1);
        assert_eq!(uniforms.shadow_count, 4);
        assert_eq!(std::mem::size_of::<FrameUniforms>(), 64);
    }
}
