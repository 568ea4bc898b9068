//! Render Node Trait
//!
//! Every Ready pass implements [`RenderNode`]. Nodes only record commands; all
//! allocation happened when the pass was set up.

use super::context::FrameContext;

pub trait RenderNode {
    /// Returns the node name, used for debug groups.
    fn name(&self) -> &'static str;

    /// Records the pass into `encoder`.
    ///
    /// Must not allocate GPU objects or submit.
    fn run(&self, ctx: &FrameContext<'_>, encoder: &mut wgpu::CommandEncoder);
}
