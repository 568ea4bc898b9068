use std::path::{Path, PathBuf};

use image::ImageFormat;

use crate::errors::{Result, UmbraError};

/// Decoded RGBA8 pixels ready for a `Rgba8Unorm` texture upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    /// Tightly packed rows, 4 bytes per texel.
    pub pixels: Vec<u8>,
}

impl DecodedImage {
    /// A single-texel image, used as a stand-in for padding slots.
    #[must_use]
    pub fn solid(rgba: [u8; 4]) -> Self {
        Self {
            width: 1,
            height: 1,
            pixels: rgba.to_vec(),
        }
    }

    #[must_use]
    pub fn bytes_per_row(&self) -> u32 {
        self.width * 4
    }
}

/// Resolves a texture URI from the scene into decoded pixels.
///
/// The uploader calls this once per entry of the texture URI table.
pub trait ImageLoader {
    fn load(&self, uri: &str) -> Result<DecodedImage>;
}

/// Loads images from disk relative to a root directory using the `image` crate.
#[derive(Debug, Clone)]
pub struct FileImageLoader {
    root_path: PathBuf,
}

impl FileImageLoader {
    /// `path` may be the scene file itself or the directory containing it.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let root_path = if path.is_file() {
            path.parent().unwrap_or(Path::new(".")).to_path_buf()
        } else {
            path.to_path_buf()
        };
        Self { root_path }
    }

    #[inline]
    #[must_use]
    pub fn root_path(&self) -> &Path {
        &self.root_path
    }
}

impl ImageLoader for FileImageLoader {
    fn load(&self, uri: &str) -> Result<DecodedImage> {
        let path = self.root_path.join(uri);

        let format = ImageFormat::from_path(&path).map_err(|err| UmbraError::UnsupportedImage {
            uri: uri.to_string(),
            reason: err.to_string(),
        })?;
        if !format.reading_enabled() {
            return Err(UmbraError::UnsupportedImage {
                uri: uri.to_string(),
                reason: format!("{format:?} decoding is not enabled"),
            });
        }

        let bytes = std::fs::read(&path)?;
        let image = image::load_from_memory_with_format(&bytes, format)?.into_rgba8();

        log::debug!(
            "Decoded image '{}' ({}x{})",
            uri,
            image.width(),
            image.height()
        );

        Ok(DecodedImage {
            width: image.width(),
            height: image.height(),
            pixels: image.into_raw(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_container_is_unsupported() {
        let loader = FileImageLoader::new(".");
        let result = loader.load("textures/albedo.ktx2");
        assert!(matches!(result, Err(UmbraError::UnsupportedImage { .. })));
    }

    #[test]
    fn solid_image_is_one_texel() {
        let image = DecodedImage::solid([255, 0, 0, 255]);
        assert_eq!(image.bytes_per_row(), 4);
        assert_eq!(image.pixels.len(), 4);
    }
}
