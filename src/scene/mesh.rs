use serde::{Deserialize, Serialize};

/// One drawable piece of a mesh.
///
/// Attribute streams are optional here so that incomplete source assets can be
/// represented; ingestion rejects primitives missing any of them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrimitiveDesc {
    pub positions: Option<Vec<[f32; 3]>>,
    pub normals: Option<Vec<[f32; 3]>>,
    pub tex_coords: Option<Vec<[f32; 2]>>,
    pub indices: Option<Vec<u32>>,
    /// Index into [`crate::scene::SceneDescription::materials`].
    pub material: Option<usize>,
}

impl PrimitiveDesc {
    #[must_use]
    pub fn new(
        positions: Vec<[f32; 3]>,
        normals: Vec<[f32; 3]>,
        tex_coords: Vec<[f32; 2]>,
        indices: Vec<u32>,
    ) -> Self {
        Self {
            positions: Some(positions),
            normals: Some(normals),
            tex_coords: Some(tex_coords),
            indices: Some(indices),
            material: None,
        }
    }

    #[must_use]
    pub fn with_material(mut self, material: usize) -> Self {
        self.material = Some(material);
        self
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.as_ref().map_or(0, Vec::len)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshDesc {
    pub name: Option<String>,
    pub primitives: Vec<PrimitiveDesc>,
}

impl MeshDesc {
    #[must_use]
    pub fn new(primitives: Vec<PrimitiveDesc>) -> Self {
        Self {
            name: None,
            primitives,
        }
    }

    /// Axis-aligned cube with 8 shared corner vertices and 12 triangles.
    ///
    /// Normals point away from the center, so faces are smooth-shaded.
    #[must_use]
    pub fn cube(size: f32) -> Self {
        let h = size / 2.0;
        let positions = vec![
            [-h, -h, h],
            [h, -h, h],
            [h, h, h],
            [-h, h, h],
            [-h, -h, -h],
            [h, -h, -h],
            [h, h, -h],
            [-h, h, -h],
        ];

        let inv_len = 1.0 / 3.0_f32.sqrt();
        let normals = positions
            .iter()
            .map(|p| {
                [
                    p[0].signum() * inv_len,
                    p[1].signum() * inv_len,
                    p[2].signum() * inv_len,
                ]
            })
            .collect();

        let tex_coords = vec![
            [0.0, 1.0],
            [1.0, 1.0],
            [1.0, 0.0],
            [0.0, 0.0],
            [1.0, 1.0],
            [0.0, 1.0],
            [0.0, 0.0],
            [1.0, 0.0],
        ];

        // Counter-clockwise when viewed from outside.
        let indices = vec![
            0, 1, 2, 2, 3, 0, // +Z
            5, 4, 7, 7, 6, 5, // -Z
            3, 2, 6, 6, 7, 3, // +Y
            4, 5, 1, 1, 0, 4, // -Y
            1, 5, 6, 6, 2, 1, // +X
            4, 0, 3, 3, 7, 4, // -X
        ];

        Self {
            name: Some("Cube".to_string()),
            primitives: vec![PrimitiveDesc::new(positions, normals, tex_coords, indices)],
        }
    }

    /// Single triangle in the XY plane facing +Z.
    #[must_use]
    pub fn triangle() -> Self {
        Self {
            name: Some("Triangle".to_string()),
            primitives: vec![PrimitiveDesc::new(
                vec![[-0.5, -0.5, 0.0], [0.5, -0.5, 0.0], [0.0, 0.5, 0.0]],
                vec![[0.0, 0.0, 1.0]; 3],
                vec![[0.0, 1.0], [1.0, 1.0], [0.5, 0.0]],
                vec![0, 1, 2],
            )],
        }
    }
}
