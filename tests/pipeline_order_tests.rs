//! Pass Ordering Tests
//!
//! Tests for:
//! - The fixed frame order satisfies every read-after-write dependency
//! - Reordered schedules report the first hazard
//! - Texture ids are consumed by the accumulator and must be rewritten before reuse
//! - Texture resolution against never-written (zeroed) id buffers leaves the
//!   accumulators at their clear value

use umbra::renderer::core::uniforms::DispatchParams;
use umbra::renderer::graph::passes::texture_accumulator::{
    AccumulatedTexel, CLEARED_TEXEL, dispatch_schedule, resolve_texel,
};
use umbra::renderer::graph::{FrameResource, OrderViolation, PassKind, validate_order};

/// Runs a full accumulator schedule over one pixel.
fn accumulate(pair_count: usize, base_color_id: u32, normal_id: u32, sample: [f32; 4]) -> AccumulatedTexel {
    dispatch_schedule(pair_count)
        .into_iter()
        .fold(AccumulatedTexel { color: [0.3; 4], normal: [0.7; 4] }, |texel, params| {
            resolve_texel(params, base_color_id, normal_id, texel, sample)
        })
}

// ============================================================================
// Frame Order
// ============================================================================

#[test]
fn fixed_order_is_valid() {
    assert_eq!(validate_order(&PassKind::ORDER), Ok(()));
    assert_eq!(PassKind::ORDER.first(), Some(&PassKind::Geometry));
    assert_eq!(PassKind::ORDER.last(), Some(&PassKind::Present));
}

#[test]
fn every_read_has_an_earlier_writer() {
    for (position, pass) in PassKind::ORDER.iter().enumerate() {
        for resource in pass.reads() {
            let writer = PassKind::ORDER[..position]
                .iter()
                .any(|earlier| earlier.writes().contains(resource));
            assert!(writer, "{pass} reads {resource} with no earlier writer");
        }
    }
}

// ============================================================================
// Hazards
// ============================================================================

#[test]
fn accumulator_before_geometry_reads_unwritten_ids() {
    let schedule = [
        PassKind::TextureAccumulator,
        PassKind::Geometry,
        PassKind::ShadowMap,
        PassKind::Lighting,
        PassKind::ShadowComposite,
        PassKind::Composite,
        PassKind::Present,
    ];

    assert_eq!(
        validate_order(&schedule),
        Err(OrderViolation::ReadBeforeWrite {
            pass: PassKind::TextureAccumulator,
            resource: FrameResource::TextureIds,
        })
    );
}

#[test]
fn composite_before_shadows_is_reported() {
    let schedule = [
        PassKind::Geometry,
        PassKind::ShadowMap,
        PassKind::TextureAccumulator,
        PassKind::Lighting,
        PassKind::Composite,
        PassKind::ShadowComposite,
        PassKind::Present,
    ];

    let violation = validate_order(&schedule).unwrap_err();
    assert_eq!(
        violation,
        OrderViolation::ReadBeforeWrite {
            pass: PassKind::Composite,
            resource: FrameResource::ShadowFactor,
        }
    );
    assert_eq!(
        violation.to_string(),
        "Composite reads ShadowFactor before any pass wrote it"
    );
}

// ============================================================================
// Texture Id Consumption
// ============================================================================

#[test]
fn accumulator_consumes_texture_ids() {
    assert_eq!(PassKind::TextureAccumulator.consumes(), &[FrameResource::TextureIds]);
    for pass in PassKind::ORDER {
        if pass != PassKind::TextureAccumulator {
            assert!(pass.consumes().is_empty(), "{pass} consumes a resource");
        }
    }
}

#[test]
fn nothing_after_the_accumulator_reads_texture_ids() {
    let consumer = PassKind::ORDER
        .iter()
        .position(|&pass| pass == PassKind::TextureAccumulator)
        .unwrap();
    for pass in &PassKind::ORDER[consumer + 1..] {
        assert!(
            !pass.reads().contains(&FrameResource::TextureIds),
            "{pass} reads texture ids after they were consumed"
        );
    }
}

// ============================================================================
// Zeroed Id Buffers
// ============================================================================

#[test]
fn zeroed_ids_leave_accumulators_cleared() {
    // Id buffers start zeroed; 0 means "no texture", so no dispatch matches.
    for pair_count in [0, 1, 3] {
        let texel = accumulate(pair_count, 0, 0, [1.0, 0.5, 0.25, 1.0]);
        assert_eq!(texel, CLEARED_TEXEL, "{pair_count} pairs");
    }
}

#[test]
fn written_ids_resolve_their_pair() {
    let texel = accumulate(3, 2, 3, [1.0, 1.0, 1.0, 1.0]);
    assert_eq!(texel.color, [1.0, 1.0, 1.0, 1.0]);
    assert_eq!(texel.normal, [1.0, 1.0, 1.0, 1.0]);
}

#[test]
fn padding_dispatch_matches_nothing() {
    let params = DispatchParams::new(0, true);
    let texel = resolve_texel(params, 0, 0, CLEARED_TEXEL, [1.0; 4]);
    assert_eq!(texel, CLEARED_TEXEL);
}
