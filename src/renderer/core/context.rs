//! GPU Context
//!
//! The [`GpuContext`] holds the device handles every other component is built
//! against. Device and surface acquisition happen outside this crate; the host
//! hands over the adapter, a ready device, its queue and the presentable surface's
//! format and size.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::errors::{Result, UmbraError};
use crate::renderer::core::binding::formats;

/// Device features the frame pipeline cannot run without.
///
/// Read-write storage access to `Rgba8Unorm`/`Rgba16Float` accumulators is an
/// adapter-specific format capability.
pub const REQUIRED_FEATURES: wgpu::Features =
    wgpu::Features::TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES;

/// Bytes per sample written by the geometry pass across its four color targets.
pub const GBUFFER_BYTES_PER_SAMPLE: u32 = 48;

/// How the pipeline uses each screen-sized or shadow format.
const FORMAT_REQUIREMENTS: [(wgpu::TextureFormat, FormatUse); 10] = [
    (formats::POSITION, FormatUse::RenderTarget),
    (formats::BASE_COLOR, FormatUse::RenderTarget),
    (formats::NORMAL, FormatUse::RenderTarget),
    (formats::TEX_COORD, FormatUse::RenderTarget),
    (formats::DEPTH, FormatUse::RenderTarget),
    (formats::SHADOW_MAP, FormatUse::RenderTarget),
    (formats::ACCUMULATOR, FormatUse::ReadWriteStorage),
    (formats::LIGHT_ACCUMULATOR, FormatUse::ReadWriteStorage),
    (formats::SHADOW_FACTOR, FormatUse::WriteStorage),
    (formats::FINAL_COLOR, FormatUse::WriteStorage),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FormatUse {
    RenderTarget,
    ReadWriteStorage,
    WriteStorage,
}

impl FormatUse {
    const fn describe(self) -> &'static str {
        match self {
            Self::RenderTarget => "a render attachment",
            Self::ReadWriteStorage => "a read-write storage texture",
            Self::WriteStorage => "a storage texture",
        }
    }

    fn supported_by(self, features: wgpu::TextureFormatFeatures) -> bool {
        match self {
            Self::RenderTarget => features
                .allowed_usages
                .contains(wgpu::TextureUsages::RENDER_ATTACHMENT),
            Self::ReadWriteStorage => {
                features
                    .allowed_usages
                    .contains(wgpu::TextureUsages::STORAGE_BINDING)
                    && features
                        .flags
                        .contains(wgpu::TextureFormatFeatureFlags::STORAGE_READ_WRITE)
            }
            Self::WriteStorage => features
                .allowed_usages
                .contains(wgpu::TextureUsages::STORAGE_BINDING),
        }
    }
}

/// Checks every target format against the adapter's per-format capabilities.
///
/// `format_features` is usually `|f| adapter.get_texture_format_features(f)`.
/// Fails with [`UmbraError::UnsupportedFormat`] naming the first format the
/// pipeline cannot use.
pub fn check_format_support(
    format_features: impl Fn(wgpu::TextureFormat) -> wgpu::TextureFormatFeatures,
) -> Result<()> {
    for (format, usage) in FORMAT_REQUIREMENTS {
        if !usage.supported_by(format_features(format)) {
            return Err(UmbraError::UnsupportedFormat {
                format,
                usage: usage.describe(),
            });
        }
    }
    Ok(())
}

/// Core GPU handles shared by the uploader and every pass.
///
/// - `device`: GPU device for resource creation
/// - `queue`: command submission queue
/// - `surface_format`: format of the views handed to the present pass
/// - `width` / `height`: size of all screen-sized targets
#[derive(Clone)]
pub struct GpuContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub surface_format: wgpu::TextureFormat,
    pub width: u32,
    pub height: u32,
    lost: Arc<AtomicBool>,
    lost_reason: Arc<Mutex<Option<String>>>,
}

impl GpuContext {
    /// Wraps a device created from `adapter`.
    ///
    /// Fails with [`UmbraError::MissingFeature`] when the device was created without
    /// [`REQUIRED_FEATURES`], with [`UmbraError::UnsupportedFormat`] when the adapter
    /// cannot render or store one of the target formats, or with
    /// [`UmbraError::InvalidSettings`] when its limits cannot hold the G-buffer.
    pub fn new(
        adapter: &wgpu::Adapter,
        device: wgpu::Device,
        queue: wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        let missing = REQUIRED_FEATURES - device.features();
        if !missing.is_empty() {
            return Err(UmbraError::MissingFeature(missing));
        }
        check_format_support(|format| adapter.get_texture_format_features(format))?;

        let limit = device.limits().max_color_attachment_bytes_per_sample;
        if limit < GBUFFER_BYTES_PER_SAMPLE {
            return Err(UmbraError::InvalidSettings(format!(
                "device allows {limit} color attachment bytes per sample, the G-buffer needs {GBUFFER_BYTES_PER_SAMPLE}"
            )));
        }

        let lost = Arc::new(AtomicBool::new(false));
        let lost_reason = Arc::new(Mutex::new(None));
        {
            let lost = Arc::clone(&lost);
            let lost_reason = Arc::clone(&lost_reason);
            device.set_device_lost_callback(move |reason, message| {
                log::error!("Device lost ({reason:?}): {message}");
                *lost_reason.lock() = Some(format!("{reason:?}: {message}"));
                lost.store(true, Ordering::Release);
            });
        }

        Ok(Self {
            device,
            queue,
            surface_format,
            width: width.max(1),
            height: height.max(1),
            lost,
            lost_reason,
        })
    }

    /// Returns a copy sized for a new surface. Device handles are shared.
    #[must_use]
    pub fn resized(&self, width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            ..self.clone()
        }
    }

    /// Returns the current surface dimensions.
    #[inline]
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Width over height of the surface.
    #[inline]
    #[must_use]
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    #[inline]
    #[must_use]
    pub fn pixel_count(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// Fails with [`UmbraError::DeviceLost`] once the device-lost callback fired.
    pub fn check_device(&self) -> Result<()> {
        if self.lost.load(Ordering::Acquire) {
            let reason = self
                .lost_reason
                .lock()
                .clone()
                .unwrap_or_else(|| "unknown reason".to_string());
            return Err(UmbraError::DeviceLost(reason));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_support(_: wgpu::TextureFormat) -> wgpu::TextureFormatFeatures {
        wgpu::TextureFormatFeatures {
            allowed_usages: wgpu::TextureUsages::all(),
            flags: wgpu::TextureFormatFeatureFlags::all(),
        }
    }

    #[test]
    fn capable_adapter_passes() {
        assert!(check_format_support(full_support).is_ok());
    }

    #[test]
    fn unrenderable_float_target_is_named() {
        let result = check_format_support(|format| {
            let mut features = full_support(format);
            if format == wgpu::TextureFormat::Rgba32Float {
                features.allowed_usages -= wgpu::TextureUsages::RENDER_ATTACHMENT;
            }
            features
        });

        let err = result.unwrap_err();
        assert!(matches!(
            err,
            UmbraError::UnsupportedFormat {
                format: wgpu::TextureFormat::Rgba32Float,
                usage: "a render attachment",
            }
        ));
        assert!(err.to_string().contains("Rgba32Float"));
    }

    #[test]
    fn accumulators_need_read_write_storage() {
        let result = check_format_support(|format| {
            let mut features = full_support(format);
            features.flags -= wgpu::TextureFormatFeatureFlags::STORAGE_READ_WRITE;
            features
        });
        assert!(matches!(
            result,
            Err(UmbraError::UnsupportedFormat {
                format: wgpu::TextureFormat::Rgba8Unorm,
                ..
            })
        ));
    }
}
