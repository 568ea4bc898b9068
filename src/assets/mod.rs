//! Asset input: image decoding and scene-file importers.

pub mod image;
pub mod loaders;

pub use image::{DecodedImage, FileImageLoader, ImageLoader};
