//! Frame pipeline
//!
//! - [`FramePipelineBuilder`] / [`FramePipeline`]: setup and per-frame recording
//! - [`PassKind`]: fixed pass order and read/write declarations
//! - [`RenderNode`]: the record interface of every Ready pass
//! - [`passes`]: the seven passes

pub mod context;
pub mod frame;
pub mod node;
pub mod passes;
pub mod stage;
pub mod targets;

pub use context::{FrameContext, SetupContext};
pub use frame::{FramePipeline, FramePipelineBuilder};
pub use node::RenderNode;
pub use stage::{FrameResource, OrderViolation, PassKind, validate_order};
