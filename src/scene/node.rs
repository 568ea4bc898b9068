use std::path::Path;

use glam::Mat4;
use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::scene::{CameraDesc, LightDesc, MaterialDesc, MeshDesc, SamplerDesc, TextureDesc};

/// A node of the scene hierarchy.
///
/// Nodes reference their children by index into [`SceneDescription::nodes`] and
/// may carry at most one mesh, one light and one camera.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeDesc {
    pub name: Option<String>,
    /// Local transform relative to the parent (column-major).
    pub transform: Mat4,
    pub children: Vec<usize>,
    pub mesh: Option<usize>,
    pub light: Option<usize>,
    pub camera: Option<usize>,
}

impl Default for NodeDesc {
    fn default() -> Self {
        Self {
            name: None,
            transform: Mat4::IDENTITY,
            children: Vec::new(),
            mesh: None,
            light: None,
            camera: None,
        }
    }
}

impl NodeDesc {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_transform(mut self, transform: Mat4) -> Self {
        self.transform = transform;
        self
    }

    #[must_use]
    pub fn with_mesh(mut self, mesh: usize) -> Self {
        self.mesh = Some(mesh);
        self
    }

    #[must_use]
    pub fn with_light(mut self, light: usize) -> Self {
        self.light = Some(light);
        self
    }

    #[must_use]
    pub fn with_camera(mut self, camera: usize) -> Self {
        self.camera = Some(camera);
        self
    }

    #[must_use]
    pub fn with_children(mut self, children: impl IntoIterator<Item = usize>) -> Self {
        self.children.extend(children);
        self
    }

    /// Label used in log messages.
    #[must_use]
    pub fn label(&self, index: usize) -> String {
        match &self.name {
            Some(name) => format!("'{name}' (#{index})"),
            None => format!("#{index}"),
        }
    }
}

/// The complete hierarchical scene handed to ingestion.
///
/// All cross references are plain indices into the tables below, mirroring
/// the layout of interchange formats such as glTF.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneDescription {
    pub nodes: Vec<NodeDesc>,
    /// Nodes traversed as roots. Each root is visited once, in order.
    pub roots: Vec<usize>,
    pub meshes: Vec<MeshDesc>,
    pub lights: Vec<LightDesc>,
    pub cameras: Vec<CameraDesc>,
    pub materials: Vec<MaterialDesc>,
    pub textures: Vec<TextureDesc>,
    pub samplers: Vec<SamplerDesc>,
    /// Image file paths, relative to the scene file.
    pub images: Vec<String>,
}

impl SceneDescription {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(source: &str) -> Result<Self> {
        Ok(serde_json::from_str(source)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_json_str(&source)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Appends a node and returns its index. The node is not attached anywhere.
    pub fn add_node(&mut self, node: NodeDesc) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    /// Appends a node and registers it as a traversal root.
    pub fn add_root(&mut self, node: NodeDesc) -> usize {
        let index = self.add_node(node);
        self.roots.push(index);
        index
    }

    pub fn attach(&mut self, child: usize, parent: usize) {
        self.nodes[parent].children.push(child);
    }

    pub fn add_mesh(&mut self, mesh: MeshDesc) -> usize {
        self.meshes.push(mesh);
        self.meshes.len() - 1
    }

    pub fn add_light(&mut self, light: LightDesc) -> usize {
        self.lights.push(light);
        self.lights.len() - 1
    }

    pub fn add_camera(&mut self, camera: CameraDesc) -> usize {
        self.cameras.push(camera);
        self.cameras.len() - 1
    }

    pub fn add_material(&mut self, material: MaterialDesc) -> usize {
        self.materials.push(material);
        self.materials.len() - 1
    }

    pub fn add_image(&mut self, uri: impl Into<String>) -> usize {
        self.images.push(uri.into());
        self.images.len() - 1
    }

    pub fn add_sampler(&mut self, sampler: SamplerDesc) -> usize {
        self.samplers.push(sampler);
        self.samplers.len() - 1
    }

    pub fn add_texture(&mut self, texture: TextureDesc) -> usize {
        self.textures.push(texture);
        self.textures.len() - 1
    }
}
