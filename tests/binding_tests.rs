//! Binding Registry Tests
//!
//! Tests for:
//! - Slot assignment is independent of request order
//! - Visibility and kind of the shared G-buffer and accumulator ids
//! - Storage-texture formats agree with the target formats

use umbra::renderer::core::binding::{BindingRegistry, ResourceId, ResourceKind, formats};
use wgpu::ShaderStages;

// ============================================================================
// Determinism
// ============================================================================

#[test]
fn same_subset_in_any_order_yields_identical_entries() {
    let forward = [
        ResourceId::Viewport,
        ResourceId::Light,
        ResourceId::DispatchParams,
        ResourceId::PositionTarget,
        ResourceId::NormalTarget,
        ResourceId::LightAccumulator,
    ];
    let mut reversed = forward;
    reversed.reverse();
    let shuffled = [
        ResourceId::NormalTarget,
        ResourceId::Viewport,
        ResourceId::LightAccumulator,
        ResourceId::Light,
        ResourceId::PositionTarget,
        ResourceId::DispatchParams,
    ];

    let expected = BindingRegistry::entries(&forward);
    assert_eq!(BindingRegistry::entries(&reversed), expected);
    assert_eq!(BindingRegistry::entries(&shuffled), expected);

    let slots: Vec<u32> = expected.iter().map(|e| e.binding).collect();
    assert_eq!(slots, vec![1, 5, 11, 12, 13, 20]);
}

#[test]
fn every_id_maps_to_its_discriminant() {
    let entries = BindingRegistry::entries(&ResourceId::ALL);
    assert_eq!(entries.len(), ResourceId::ALL.len());
    for (entry, id) in entries.iter().zip(ResourceId::ALL) {
        assert_eq!(entry.binding, id as u32);
        assert_eq!(entry.to_wgpu().binding, id.slot());
    }
}

#[test]
#[should_panic(expected = "bound twice")]
fn duplicate_request_panics() {
    let _ = BindingRegistry::entries(&[
        ResourceId::Viewport,
        ResourceId::Sampler,
        ResourceId::Viewport,
    ]);
}

// ============================================================================
// Table Contents
// ============================================================================

#[test]
fn gbuffer_targets_are_unfilterable_compute_textures() {
    for id in [
        ResourceId::PositionTarget,
        ResourceId::NormalTarget,
        ResourceId::BaseColorTarget,
        ResourceId::TexCoordTarget,
    ] {
        let entry = BindingRegistry::layout_entry(id);
        assert_eq!(entry.visibility, ShaderStages::COMPUTE);
        assert_eq!(
            entry.kind,
            ResourceKind::SampledTexture {
                sample_type: wgpu::TextureSampleType::Float { filterable: false },
                dimension: wgpu::TextureViewDimension::D2,
            }
        );
    }
}

#[test]
fn accumulators_are_read_write_storage_textures() {
    let color = BindingRegistry::layout_entry(ResourceId::ColorAccumulator);
    assert_eq!(
        color.kind,
        ResourceKind::StorageTexture {
            format: formats::ACCUMULATOR,
            access: wgpu::StorageTextureAccess::ReadWrite,
        }
    );

    let light = BindingRegistry::layout_entry(ResourceId::LightAccumulator);
    assert_eq!(
        light.kind,
        ResourceKind::StorageTexture {
            format: formats::LIGHT_ACCUMULATOR,
            access: wgpu::StorageTextureAccess::ReadWrite,
        }
    );
}

#[test]
fn texture_id_buffers_are_writable() {
    for id in [ResourceId::BaseColorTextureIds, ResourceId::NormalTextureIds] {
        assert_eq!(
            BindingRegistry::layout_entry(id).kind,
            ResourceKind::StorageBuffer { read_only: false }
        );
    }
}

#[test]
fn scene_buffers_reach_the_vertex_stage() {
    for id in [ResourceId::Camera, ResourceId::Transforms, ResourceId::InstanceProperties] {
        let entry = BindingRegistry::layout_entry(id);
        assert!(entry.visibility.contains(ShaderStages::VERTEX), "{id:?}");
        assert_eq!(entry.kind, ResourceKind::StorageBuffer { read_only: true });
    }
    assert!(
        BindingRegistry::layout_entry(ResourceId::Light)
            .visibility
            .contains(ShaderStages::VERTEX)
    );
}

#[test]
fn shadow_maps_sample_as_depth_array_with_comparison() {
    let maps = BindingRegistry::layout_entry(ResourceId::ShadowMaps);
    assert_eq!(
        maps.kind,
        ResourceKind::SampledTexture {
            sample_type: wgpu::TextureSampleType::Depth,
            dimension: wgpu::TextureViewDimension::D2Array,
        }
    );
    assert_eq!(
        BindingRegistry::layout_entry(ResourceId::DepthSampler).kind,
        ResourceKind::Sampler(wgpu::SamplerBindingType::Comparison)
    );
}
