//! Depth-first walk over the node hierarchy.

use std::f32::consts::{FRAC_PI_2, PI};

use glam::{EulerRot, Mat3, Mat4, Vec3};
use smallvec::SmallVec;

use crate::errors::{Result, UmbraError};
use crate::scene::{CameraDesc, LightDesc, LightKind, Projection, SceneDescription};

use super::IngestOptions;
use super::draw_calls::{DrawCallArena, DrawCallId};
use super::types::{CameraData, GpuLight, NO_MATERIAL, PerspectiveLens, Vertex};

/// Half extent of the orthographic volume used for directional shadows.
const DIRECTIONAL_SHADOW_EXTENT: f32 = 50.0;
const DIRECTIONAL_SHADOW_DEPTH: f32 = 100.0;
const LIGHT_ZNEAR: f32 = 0.05;
/// Far plane for point and spot lights without a range.
const LIGHT_DEFAULT_FAR: f32 = 100.0;
/// Smallest accepted `det / max_axis_length³` of a world transform's linear part.
/// Uniform scale leaves the ratio at 1; a collapsed axis drives it to 0.
const RELATIVE_SINGULAR_EPSILON: f32 = 1e-6;

/// Mutable state accumulated while walking one scene.
pub(crate) struct Flattener<'a> {
    desc: &'a SceneDescription,
    options: &'a IngestOptions,
    pub(crate) vertices: Vec<Vertex>,
    pub(crate) indices: Vec<u16>,
    pub(crate) arena: DrawCallArena,
    pub(crate) lights: Vec<GpuLight>,
    pub(crate) cameras: Vec<CameraData>,
    visited: Vec<bool>,
}

impl<'a> Flattener<'a> {
    pub(crate) fn new(desc: &'a SceneDescription, options: &'a IngestOptions) -> Self {
        Self {
            desc,
            options,
            vertices: Vec::new(),
            indices: Vec::new(),
            arena: DrawCallArena::new(),
            lights: Vec::new(),
            cameras: Vec::new(),
            visited: vec![false; desc.nodes.len()],
        }
    }

    /// Visits every node reachable from the roots, parents before children.
    pub(crate) fn walk(&mut self) -> Result<()> {
        let desc = self.desc;
        let roots = self.roots()?;

        let mut stack: Vec<(usize, Mat4)> = roots
            .iter()
            .rev()
            .map(|&root| (root, self.options.root_correction))
            .collect();

        while let Some((node_index, parent_world)) = stack.pop() {
            if std::mem::replace(&mut self.visited[node_index], true) {
                return Err(UmbraError::InvalidSceneGraph(format!(
                    "node {} is reachable more than once",
                    desc.nodes[node_index].label(node_index)
                )));
            }

            let node = &desc.nodes[node_index];
            let world = parent_world * node.transform;
            self.visit(node_index, world)?;

            for &child in node.children.iter().rev() {
                if child >= desc.nodes.len() {
                    return Err(UmbraError::IndexOutOfBounds {
                        context: "node child",
                        index: child,
                    });
                }
                stack.push((child, world));
            }
        }

        Ok(())
    }

    /// Explicit roots, or every node that is nobody's child when none are given.
    fn roots(&self) -> Result<Vec<usize>> {
        let node_count = self.desc.nodes.len();

        if !self.desc.roots.is_empty() {
            if let Some(&bad) = self.desc.roots.iter().find(|&&r| r >= node_count) {
                return Err(UmbraError::IndexOutOfBounds {
                    context: "scene root",
                    index: bad,
                });
            }
            return Ok(self.desc.roots.clone());
        }

        let mut is_child = vec![false; node_count];
        for node in &self.desc.nodes {
            for &child in &node.children {
                if let Some(flag) = is_child.get_mut(child) {
                    *flag = true;
                }
            }
        }

        let roots: Vec<usize> = (0..node_count).filter(|&i| !is_child[i]).collect();
        if roots.is_empty() && node_count > 0 {
            return Err(UmbraError::InvalidSceneGraph(
                "every node is somebody's child; the hierarchy has no root".to_string(),
            ));
        }
        Ok(roots)
    }

    fn visit(&mut self, node_index: usize, world: Mat4) -> Result<()> {
        let desc = self.desc;
        let node = &desc.nodes[node_index];
        let mut matched = false;

        if let Some(mesh) = node.mesh {
            self.visit_mesh(mesh, world)?;
            matched = true;
        }

        if let Some(light) = node.light {
            let light = desc.lights.get(light).ok_or(UmbraError::IndexOutOfBounds {
                context: "node light",
                index: light,
            })?;
            let shadow_layer = self.lights.len() as i32;
            self.lights
                .push(convert_light(node_index, light, world, shadow_layer)?);
            matched = true;
        }

        if let Some(camera) = node.camera {
            let camera_desc = desc.cameras.get(camera).ok_or(UmbraError::IndexOutOfBounds {
                context: "node camera",
                index: camera,
            })?;
            self.cameras.push(convert_camera(
                node_index,
                camera,
                camera_desc,
                world,
                self.options,
            )?);
            matched = true;
        }

        if !matched {
            if node.children.is_empty() {
                log::warn!(
                    "Skipping node {}: no mesh, light or camera",
                    node.label(node_index)
                );
            } else {
                log::debug!("Node {} only groups children", node.label(node_index));
            }
        }

        Ok(())
    }

    fn visit_mesh(&mut self, mesh_index: usize, world: Mat4) -> Result<()> {
        if mesh_index >= self.desc.meshes.len() {
            return Err(UmbraError::IndexOutOfBounds {
                context: "node mesh",
                index: mesh_index,
            });
        }

        if self.arena.mesh_draw_calls(mesh_index).is_none() {
            self.append_mesh(mesh_index)?;
        }

        let ids: SmallVec<[DrawCallId; 2]> = self
            .arena
            .mesh_draw_calls(mesh_index)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default();

        for id in ids {
            self.arena.push_instance(id, world);
        }
        Ok(())
    }

    /// Appends the vertex and index data of every primitive and registers their draw calls.
    fn append_mesh(&mut self, mesh_index: usize) -> Result<()> {
        let desc = self.desc;
        let mesh = &desc.meshes[mesh_index];
        self.arena.begin_mesh(mesh_index);

        for (primitive_index, primitive) in mesh.primitives.iter().enumerate() {
            let malformed = |reason: &str| UmbraError::MalformedMesh {
                mesh: mesh_index,
                primitive: primitive_index,
                reason: reason.to_string(),
            };

            let positions = primitive
                .positions
                .as_ref()
                .ok_or_else(|| malformed("missing POSITION attribute"))?;
            let normals = primitive
                .normals
                .as_ref()
                .ok_or_else(|| malformed("missing NORMAL attribute"))?;
            let tex_coords = primitive
                .tex_coords
                .as_ref()
                .ok_or_else(|| malformed("missing TEXCOORD_0 attribute"))?;
            let indices = primitive
                .indices
                .as_ref()
                .ok_or_else(|| malformed("missing index accessor"))?;

            if normals.len() != positions.len() || tex_coords.len() != positions.len() {
                return Err(malformed("attribute streams differ in length"));
            }

            let material_index = match primitive.material {
                Some(material) if material >= desc.materials.len() => {
                    return Err(UmbraError::IndexOutOfBounds {
                        context: "primitive material",
                        index: material,
                    });
                }
                Some(material) => material as u32,
                None => NO_MATERIAL,
            };

            let base = self.vertices.len();
            let first_index = self.indices.len() as u32;
            self.indices.reserve(indices.len());

            for &index in indices {
                let index = index as usize;
                if index >= positions.len() {
                    return Err(malformed(&format!(
                        "index {index} outside the primitive's {} vertices",
                        positions.len()
                    )));
                }
                let rebased = base + index;
                let rebased = u16::try_from(rebased)
                    .map_err(|_| UmbraError::IndexOverflow { vertex: rebased })?;
                self.indices.push(rebased);
            }

            self.vertices.extend(
                positions
                    .iter()
                    .zip(normals)
                    .zip(tex_coords)
                    .map(|((&position, &normal), &tex_coord)| Vertex {
                        position,
                        normal,
                        tex_coord,
                    }),
            );

            self.arena.register(
                mesh_index,
                first_index,
                indices.len() as u32,
                material_index,
            );
        }

        Ok(())
    }
}

/// Rejects transforms that contain non-finite values or collapse an axis.
///
/// The determinant is compared relative to the longest basis axis, so small but
/// well-conditioned scales (millimetre units) pass.
fn check_invertible(node_index: usize, world: Mat4) -> Result<()> {
    let singular = Err(UmbraError::MatrixDecomposition { node: node_index });
    if !world.is_finite() {
        return singular;
    }

    let linear = Mat3::from_mat4(world);
    let longest = linear
        .x_axis
        .length()
        .max(linear.y_axis.length())
        .max(linear.z_axis.length());
    if !longest.is_finite() || longest <= 0.0 {
        return singular;
    }

    let conditioning = linear.determinant() / longest.powi(3);
    if !conditioning.is_finite() || conditioning.abs() < RELATIVE_SINGULAR_EPSILON {
        return singular;
    }
    Ok(())
}

/// Projection used to render a light's shadow map.
fn light_projection(kind: &LightKind) -> Mat4 {
    match *kind {
        LightKind::Directional => Mat4::orthographic_rh(
            -DIRECTIONAL_SHADOW_EXTENT,
            DIRECTIONAL_SHADOW_EXTENT,
            -DIRECTIONAL_SHADOW_EXTENT,
            DIRECTIONAL_SHADOW_EXTENT,
            -DIRECTIONAL_SHADOW_DEPTH,
            DIRECTIONAL_SHADOW_DEPTH,
        ),
        LightKind::Point { range } => Mat4::perspective_rh(
            FRAC_PI_2,
            1.0,
            LIGHT_ZNEAR,
            range.unwrap_or(LIGHT_DEFAULT_FAR),
        ),
        LightKind::Spot {
            range, outer_cone, ..
        } => Mat4::perspective_rh(
            (2.0 * outer_cone).clamp(0.01, PI - 0.01),
            1.0,
            LIGHT_ZNEAR,
            range.unwrap_or(LIGHT_DEFAULT_FAR),
        ),
    }
}

pub(crate) fn convert_light(
    node_index: usize,
    light: &LightDesc,
    world: Mat4,
    shadow_layer: i32,
) -> Result<GpuLight> {
    check_invertible(node_index, world)?;

    let (_, rotation, translation) = world.to_scale_rotation_translation();
    if !rotation.is_finite() || !translation.is_finite() {
        return Err(UmbraError::MatrixDecomposition { node: node_index });
    }

    let (rx, ry, rz) = rotation.to_euler(EulerRot::XYZ);
    let direction = (rotation * Vec3::NEG_Z).normalize_or_zero();

    let (inner_cone, outer_cone) = match light.kind {
        LightKind::Spot {
            inner_cone,
            outer_cone,
            ..
        } => (inner_cone, outer_cone),
        _ => (0.0, 0.0),
    };

    Ok(GpuLight {
        light_space: light_projection(&light.kind) * world.inverse(),
        position: translation.to_array(),
        kind: light.kind.code(),
        rotation: [rx, ry, rz],
        intensity: light.intensity,
        color: light.color.to_array(),
        range: light.kind.range().unwrap_or(0.0),
        direction: direction.to_array(),
        inner_cone,
        outer_cone,
        shadow_layer,
        _pad: [0; 2],
    })
}

pub(crate) fn convert_camera(
    node_index: usize,
    camera_index: usize,
    camera: &CameraDesc,
    world: Mat4,
    options: &IngestOptions,
) -> Result<CameraData> {
    let Projection::Perspective {
        yfov,
        aspect_ratio,
        znear,
        zfar,
    } = camera.projection
    else {
        return Err(UmbraError::UnsupportedCamera {
            camera: camera_index,
            kind: camera.projection.kind_name(),
        });
    };

    check_invertible(node_index, world)?;

    let lens = PerspectiveLens {
        yfov,
        aspect_ratio,
        znear,
        zfar,
    };

    Ok(CameraData {
        projection: lens.projection(options.aspect_ratio),
        view: world.inverse(),
        position: world.w_axis.truncate(),
        forward: world.transform_vector3(Vec3::NEG_Z).normalize_or_zero(),
        lens,
    })
}
