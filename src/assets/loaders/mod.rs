#[cfg(feature = "gltf")]
pub mod gltf;
