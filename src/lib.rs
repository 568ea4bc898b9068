#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

pub mod assets;
pub mod errors;
pub mod ingest;
pub mod renderer;
pub mod scene;

pub use assets::{DecodedImage, FileImageLoader, ImageLoader};
pub use errors::{Result, UmbraError};
pub use ingest::{FlattenedScene, IngestOptions, flatten, flatten_with};
pub use renderer::{
    FramePipeline, FramePipelineBuilder, GpuContext, GpuScene, PassKind, Renderer, RendererSettings,
};
pub use scene::{CameraDesc, LightDesc, MaterialDesc, MeshDesc, NodeDesc, SceneDescription};
