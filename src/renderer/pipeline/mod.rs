//! Shader programs
//!
//! - [`shader_manager`]: template rendering and module cache
//! - `shaders/`: one WGSL program per pass plus shared `chunks/`

pub mod shader_manager;

pub use shader_manager::{ShaderDefines, ShaderLibrary, WORKGROUP_SIZE};
