//! Renderer Settings
//!
//! Configuration consumed when the frame pipeline is built.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use umbra::renderer::RendererSettings;
//!
//! // Defaults: 4 shadow maps at 2048², black background
//! let settings = RendererSettings::default();
//!
//! // Fewer, smaller shadow maps and a custom shader directory
//! let settings = RendererSettings {
//!     shadow_map_pool_size: 2,
//!     shadow_map_resolution: 1024,
//!     shader_dir: Some("assets/shaders".into()),
//!     ..Default::default()
//! };
//!
//! // Or from disk
//! let settings = RendererSettings::from_json_file("renderer.json")?;
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{Result, UmbraError};

/// Upper bound on the shadow-map array; keeps the depth array within common
/// `max_texture_array_layers` limits.
pub const MAX_SHADOW_MAPS: u32 = 16;

// ---------------------------------------------------------------------------
// RendererSettings
// ---------------------------------------------------------------------------

/// Global configuration for pipeline setup.
///
/// # Fields
///
/// | Field                   | Description                                   | Default        |
/// |-------------------------|-----------------------------------------------|----------------|
/// | `shadow_map_pool_size`  | Lights that get a shadow map (N)              | `4`            |
/// | `shadow_map_resolution` | Edge length of each shadow map in texels      | `2048`         |
/// | `clear_color`           | Background color of the G-buffer              | Black          |
/// | `ambient`               | Ambient light added before shadowing          | `[0.03; 3]`    |
/// | `active_camera`         | Index into the flattened camera list          | `0`            |
/// | `shader_dir`            | Directory searched before embedded shaders    | `None`         |
/// | `validate_frames`       | Wrap each frame in a validation error scope   | `true`         |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererSettings {
    // === Shadows ===
    /// Number of lights, counted from the first, that render a shadow map.
    pub shadow_map_pool_size: u32,

    /// Width and height of each shadow-map layer.
    pub shadow_map_resolution: u32,

    // === Shading ===
    /// Linear RGBA clear color of the base-color target.
    pub clear_color: [f64; 4],

    /// Linear RGB ambient term of the composite.
    pub ambient: [f32; 3],

    /// Camera used for the geometry pass.
    ///
    /// Out-of-range indices are clamped to the last camera at upload time.
    pub active_camera: u32,

    // === Tooling ===
    /// Shader files found here take precedence over the embedded copies.
    pub shader_dir: Option<PathBuf>,

    /// Capture validation errors per frame and return them from `Renderer::render`.
    pub validate_frames: bool,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            shadow_map_pool_size: 4,
            shadow_map_resolution: 2048,
            clear_color: [0.0, 0.0, 0.0, 1.0],
            ambient: [0.03; 3],
            active_camera: 0,
            shader_dir: None,
            validate_frames: true,
        }
    }
}

impl RendererSettings {
    pub fn from_json_str(source: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(source)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_json_str(&source)
    }

    /// Rejects values the pipeline cannot be built with.
    pub fn validate(&self) -> Result<()> {
        if self.shadow_map_pool_size == 0 || self.shadow_map_pool_size > MAX_SHADOW_MAPS {
            return Err(UmbraError::InvalidSettings(format!(
                "shadow_map_pool_size must be in 1..={MAX_SHADOW_MAPS}, got {}",
                self.shadow_map_pool_size
            )));
        }
        if self.shadow_map_resolution == 0 || !self.shadow_map_resolution.is_power_of_two() {
            return Err(UmbraError::InvalidSettings(format!(
                "shadow_map_resolution must be a non-zero power of two, got {}",
                self.shadow_map_resolution
            )));
        }
        if self.clear_color.iter().any(|c| !(0.0..=1.0).contains(c)) {
            return Err(UmbraError::InvalidSettings(
                "clear_color components must lie in [0, 1]".to_string(),
            ));
        }
        if self.ambient.iter().any(|c| !c.is_finite() || *c < 0.0) {
            return Err(UmbraError::InvalidSettings(
                "ambient components must be finite and non-negative".to_string(),
            ));
        }
        Ok(())
    }

    #[inline]
    #[must_use]
    pub fn clear_color(&self) -> wgpu::Color {
        let [r, g, b, a] = self.clear_color;
        wgpu::Color { r, g, b, a }
    }
}
