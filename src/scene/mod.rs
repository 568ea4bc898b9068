//! Scene Description
//!
//! Host-side input format consumed by [`crate::ingest::flatten`]:
//! - [`SceneDescription`]: flat tables of nodes, meshes, lights, cameras, materials
//! - [`NodeDesc`]: local transform plus optional mesh/light/camera references
//! - [`MeshDesc`] / [`PrimitiveDesc`]: raw attribute and index streams
//! - [`LightDesc`], [`CameraDesc`], [`MaterialDesc`], [`TextureDesc`], [`SamplerDesc`]
//!
//! A description can be built by hand, deserialized from JSON, or produced by the
//! glTF importer in [`crate::assets::loaders::gltf`].

pub mod camera;
pub mod light;
pub mod material;
pub mod mesh;
pub mod node;

pub use camera::{CameraDesc, Projection};
pub use light::{LightDesc, LightKind};
pub use material::{AddressMode, FilterMode, MaterialDesc, SamplerDesc, TextureDesc, TextureInfo};
pub use mesh::{MeshDesc, PrimitiveDesc};
pub use node::{NodeDesc, SceneDescription};
