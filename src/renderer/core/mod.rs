//! GPU core
//!
//! - [`GpuContext`]: device, queue and surface description handed in by the host
//! - [`binding`]: the binding registry
//! - [`resources`]: the one-shot scene uploader
//! - [`uniforms`]: pipeline-owned uniform blocks
//! - [`error_scope`]: validation error capture

pub mod binding;
pub mod context;
pub mod error_scope;
pub mod resources;
pub mod uniforms;

pub use binding::{BindingRegistry, ResourceId};
pub use context::GpuContext;
pub use resources::{GpuScene, GpuTexture};
