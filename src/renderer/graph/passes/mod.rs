//! Frame passes, each with an Unconfigured (`XxxPass`) and a Ready
//! (`ReadyXxxPass`) type. `setup` consumes the former and returns the latter.

pub mod composite;
pub mod geometry;
pub mod lighting;
pub mod present;
pub mod shadow_composite;
pub mod shadow_map;
pub mod texture_accumulator;

pub use composite::{CompositeInputs, CompositePass, ReadyCompositePass};
pub use geometry::{GBuffer, GeometryPass, ReadyGeometryPass};
pub use lighting::{LightingPass, ReadyLightingPass};
pub use present::{PresentPass, ReadyPresentPass};
pub use shadow_composite::{ReadyShadowCompositePass, ShadowCompositePass};
pub use shadow_map::{ReadyShadowMapPass, ShadowMapPass, ShadowMaps};
pub use texture_accumulator::{Accumulators, ReadyTextureAccumulatorPass, TextureAccumulatorPass};
