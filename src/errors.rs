//! Error Types
//!
//! This module defines the error types used throughout the renderer.
//!
//! # Overview
//!
//! The main error type [`UmbraError`] covers all failure modes including:
//! - Scene ingestion failures (malformed meshes, unsupported cameras, bad transforms)
//! - Asset loading and decoding errors
//! - GPU setup errors captured through validation error scopes
//! - Per-frame runtime errors and device loss
//!
//! # Usage
//!
//! All public APIs return [`Result<T>`] which is an alias for `std::result::Result<T, UmbraError>`.
//!
//! ```rust,ignore
//! use umbra::errors::Result;
//!
//! fn load() -> Result<()> {
//!     let scene = umbra::ingest::flatten(&description)?;
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// The main error type for the renderer.
#[derive(Error, Debug)]
pub enum UmbraError {
    // ========================================================================
    // Scene Ingestion Errors
    // ========================================================================
    /// A mesh primitive lacks a required attribute or its index accessor.
    #[error("Malformed mesh {mesh} (primitive {primitive}): {reason}")]
    MalformedMesh {
        mesh: usize,
        primitive: usize,
        reason: String,
    },

    /// The flattened vertex array grew beyond what 16-bit indices can address.
    #[error("Index overflow: vertex {vertex} cannot be addressed by a 16-bit index buffer")]
    IndexOverflow { vertex: usize },

    /// Only perspective cameras can be ingested.
    #[error("Unsupported camera {camera}: {kind} projection")]
    UnsupportedCamera { camera: usize, kind: &'static str },

    /// A node's world transform could not be decomposed into translation/rotation/scale.
    #[error("Matrix decomposition failed for node {node}")]
    MatrixDecomposition { node: usize },

    /// The node hierarchy is not a forest (cycle or shared child).
    #[error("Invalid scene graph: {0}")]
    InvalidSceneGraph(String),

    /// A reference into one of the description tables is out of range.
    #[error("Index out of bounds: {context} (index: {index})")]
    IndexOutOfBounds {
        /// Description of what was being accessed
        context: &'static str,
        /// The invalid index
        index: usize,
    },

    // ========================================================================
    // Asset Loading Errors
    // ========================================================================
    /// Image container the configured loader cannot decode.
    #[error("Unsupported image '{uri}': {reason}")]
    UnsupportedImage { uri: String, reason: String },

    /// Image decoding error.
    #[error("Image decode error: {0}")]
    ImageDecode(String),

    /// glTF parsing or loading error.
    #[cfg(feature = "gltf")]
    #[error("glTF error: {0}")]
    Gltf(String),

    /// File I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    // ========================================================================
    // GPU Setup Errors
    // ========================================================================
    /// A shader program was not found in the override directory nor in the embedded set.
    #[error("Shader not found: {0}")]
    ShaderNotFound(String),

    /// A shader template failed to render.
    #[error("Shader template '{name}' failed: {message}")]
    ShaderTemplate { name: String, message: String },

    /// The device lacks a feature the pipeline depends on.
    #[error("Missing device feature: {0:?}")]
    MissingFeature(wgpu::Features),

    /// The adapter cannot use a target format the way the pipeline needs it.
    #[error("Texture format {format:?} cannot be used as {usage} on this adapter")]
    UnsupportedFormat {
        format: wgpu::TextureFormat,
        usage: &'static str,
    },

    /// A validation or out-of-memory error was raised while creating GPU objects.
    #[error("GPU validation error during {stage}: {message}")]
    GpuValidation { stage: &'static str, message: String },

    /// Renderer settings failed validation.
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    // ========================================================================
    // Runtime Errors
    // ========================================================================
    /// A validation error was captured while recording or submitting a frame.
    #[error("Frame validation error: {0}")]
    FrameValidation(String),

    /// The device was lost. The session cannot continue.
    #[error("Device lost: {0}")]
    DeviceLost(String),
}

// ============================================================================
// Convenient conversion implementations
// ============================================================================

impl From<image::ImageError> for UmbraError {
    fn from(err: image::ImageError) -> Self {
        UmbraError::ImageDecode(err.to_string())
    }
}

#[cfg(feature = "gltf")]
impl From<gltf::Error> for UmbraError {
    fn from(err: gltf::Error) -> Self {
        UmbraError::Gltf(err.to_string())
    }
}

/// Alias for `Result<T, UmbraError>`.
pub type Result<T> = std::result::Result<T, UmbraError>;
