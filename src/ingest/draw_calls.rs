//! Mesh → draw-call bookkeeping.
//!
//! Draw calls live in a `Vec` and are addressed by [`DrawCallId`] indices, so the
//! mesh lookup table stays valid while the arena grows.

use glam::Mat4;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use super::types::{DrawCall, InstanceProperty};

/// Stable handle into a [`DrawCallArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DrawCallId(u32);

impl DrawCallId {
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug)]
struct DrawCallEntry {
    first_index: u32,
    index_count: u32,
    material_index: u32,
    instances: SmallVec<[Mat4; 1]>,
}

/// Growable set of draw calls keyed by source mesh.
///
/// Instances are recorded per draw call and only laid out into the flat
/// transform/instance-property arrays by [`DrawCallArena::finish`], which keeps
/// every draw call's instances contiguous regardless of traversal order.
#[derive(Debug, Default)]
pub struct DrawCallArena {
    entries: Vec<DrawCallEntry>,
    by_mesh: FxHashMap<usize, SmallVec<[DrawCallId; 2]>>,
}

/// Flat arrays produced by [`DrawCallArena::finish`].
#[derive(Debug, Default)]
pub struct LaidOutDraws {
    pub draw_calls: Vec<DrawCall>,
    pub transforms: Vec<Mat4>,
    pub instance_properties: Vec<InstanceProperty>,
}

impl DrawCallArena {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw calls already registered for `mesh`, if the mesh has been seen.
    #[must_use]
    pub fn mesh_draw_calls(&self, mesh: usize) -> Option<&[DrawCallId]> {
        self.by_mesh.get(&mesh).map(SmallVec::as_slice)
    }

    /// Marks `mesh` as seen. Must precede [`Self::register`] for that mesh.
    pub fn begin_mesh(&mut self, mesh: usize) {
        self.by_mesh.entry(mesh).or_default();
    }

    /// Registers one primitive of `mesh` as a new draw call with zero instances.
    pub fn register(
        &mut self,
        mesh: usize,
        first_index: u32,
        index_count: u32,
        material_index: u32,
    ) -> DrawCallId {
        let id = DrawCallId(self.entries.len() as u32);
        self.entries.push(DrawCallEntry {
            first_index,
            index_count,
            material_index,
            instances: SmallVec::new(),
        });
        self.by_mesh.entry(mesh).or_default().push(id);
        id
    }

    pub fn push_instance(&mut self, id: DrawCallId, transform: Mat4) {
        self.entries[id.index()].instances.push(transform);
    }

    #[must_use]
    pub fn instance_count(&self, id: DrawCallId) -> u32 {
        self.entries[id.index()].instances.len() as u32
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Lays out all instances contiguously, in draw-call registration order.
    #[must_use]
    pub fn finish(self) -> LaidOutDraws {
        let total_instances = self.entries.iter().map(|e| e.instances.len()).sum();
        let mut out = LaidOutDraws {
            draw_calls: Vec::with_capacity(self.entries.len()),
            transforms: Vec::with_capacity(total_instances),
            instance_properties: Vec::with_capacity(total_instances),
        };

        for entry in self.entries {
            out.draw_calls.push(DrawCall {
                index_count: entry.index_count,
                instance_count: entry.instances.len() as u32,
                first_index: entry.first_index,
                base_vertex: 0,
                first_instance: out.transforms.len() as u32,
            });
            out.instance_properties.extend(
                std::iter::repeat_n(InstanceProperty::new(entry.material_index), entry.instances.len()),
            );
            out.transforms.extend(entry.instances);
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn interleaved_instances_stay_contiguous() {
        let mut arena = DrawCallArena::new();
        let a = arena.register(0, 0, 3, 0);
        let b = arena.register(1, 3, 6, 1);

        let t = |x: f32| Mat4::from_translation(Vec3::new(x, 0.0, 0.0));
        arena.push_instance(a, t(1.0));
        arena.push_instance(b, t(2.0));
        arena.push_instance(a, t(3.0));

        let out = arena.finish();
        assert_eq!(out.draw_calls[0].first_instance, 0);
        assert_eq!(out.draw_calls[0].instance_count, 2);
        assert_eq!(out.draw_calls[1].first_instance, 2);
        assert_eq!(out.transforms, vec![t(1.0), t(3.0), t(2.0)]);
        assert_eq!(out.instance_properties[2].material_index, 1);
    }

    #[test]
    fn ids_remain_valid_after_growth() {
        let mut arena = DrawCallArena::new();
        let first = arena.register(7, 0, 3, 0);
        for mesh in 100..200 {
            arena.register(mesh, 0, 3, 0);
        }
        assert_eq!(arena.mesh_draw_calls(7), Some(&[first][..]));
        arena.push_instance(first, Mat4::IDENTITY);
        assert_eq!(arena.instance_count(first), 1);
    }
}
