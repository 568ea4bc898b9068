//! Pass Ordering
//!
//! `PassKind` names the seven passes of a frame and fixes their execution order.
//! Each pass declares the frame resources it reads and writes, which lets
//! [`validate_order`] reject schedules with read-before-write hazards.
//!
//! `TextureAccumulator` also consumes the texture ids: it zeroes both id buffers
//! after its last dispatch, so the ids only exist between Geometry and the
//! accumulator of the same frame.
//!
//! # Pass Overview
//!
//! | Pass | Reads | Writes |
//! |------|-------|--------|
//! | `Geometry` | - | G-buffer, depth, texture ids |
//! | `ShadowMap` | - | shadow maps |
//! | `TextureAccumulator` | texture ids, G-buffer | color and normal accumulators |
//! | `Lighting` | G-buffer, normal accumulator | light accumulator |
//! | `ShadowComposite` | G-buffer, shadow maps | shadow factor |
//! | `Composite` | G-buffer, color accumulator, light accumulator, shadow factor | final color |
//! | `Present` | final color | surface |

use std::fmt;

use thiserror::Error;

/// Per-frame resources written by one pass and read by later ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameResource {
    GBuffer,
    Depth,
    TextureIds,
    ShadowMaps,
    ColorAccumulator,
    NormalAccumulator,
    LightAccumulator,
    ShadowFactor,
    FinalColor,
    Surface,
}

impl fmt::Display for FrameResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Hash, PartialEq, Eq, Clone, Copy, PartialOrd, Ord)]
#[repr(u8)]
pub enum PassKind {
    Geometry = 0,
    ShadowMap = 1,
    TextureAccumulator = 2,
    Lighting = 3,
    ShadowComposite = 4,
    Composite = 5,
    Present = 6,
}

impl PassKind {
    /// Execution order of a frame.
    pub const ORDER: [Self; 7] = [
        Self::Geometry,
        Self::ShadowMap,
        Self::TextureAccumulator,
        Self::Lighting,
        Self::ShadowComposite,
        Self::Composite,
        Self::Present,
    ];

    #[inline]
    #[must_use]
    pub const fn order(self) -> u8 {
        self as u8
    }

    /// Pass name (for debug groups and logs).
    #[inline]
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Geometry => "Geometry",
            Self::ShadowMap => "ShadowMap",
            Self::TextureAccumulator => "TextureAccumulator",
            Self::Lighting => "Lighting",
            Self::ShadowComposite => "ShadowComposite",
            Self::Composite => "Composite",
            Self::Present => "Present",
        }
    }

    #[must_use]
    pub const fn reads(self) -> &'static [FrameResource] {
        use FrameResource as R;
        match self {
            Self::Geometry | Self::ShadowMap => &[],
            Self::TextureAccumulator => &[R::TextureIds, R::GBuffer],
            Self::Lighting => &[R::GBuffer, R::NormalAccumulator],
            Self::ShadowComposite => &[R::GBuffer, R::ShadowMaps],
            Self::Composite => &[
                R::GBuffer,
                R::ColorAccumulator,
                R::LightAccumulator,
                R::ShadowFactor,
            ],
            Self::Present => &[R::FinalColor],
        }
    }

    #[must_use]
    pub const fn writes(self) -> &'static [FrameResource] {
        use FrameResource as R;
        match self {
            Self::Geometry => &[R::GBuffer, R::Depth, R::TextureIds],
            Self::ShadowMap => &[R::ShadowMaps],
            Self::TextureAccumulator => &[R::ColorAccumulator, R::NormalAccumulator],
            Self::Lighting => &[R::LightAccumulator],
            Self::ShadowComposite => &[R::ShadowFactor],
            Self::Composite => &[R::FinalColor],
            Self::Present => &[R::Surface],
        }
    }

    /// Resources the pass resets after reading them.
    #[must_use]
    pub const fn consumes(self) -> &'static [FrameResource] {
        match self {
            Self::TextureAccumulator => &[FrameResource::TextureIds],
            _ => &[],
        }
    }
}

impl fmt::Display for PassKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// First problem found in a pass schedule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderViolation {
    #[error("{pass} reads {resource} before any pass wrote it")]
    ReadBeforeWrite {
        pass: PassKind,
        resource: FrameResource,
    },

    #[error("{0} is scheduled more than once")]
    Duplicate(PassKind),

    #[error("{0} is never scheduled")]
    Missing(PassKind),
}

/// Checks that `passes` schedules every pass exactly once and that no pass reads a
/// frame resource before it was written earlier in the same frame.
pub fn validate_order(passes: &[PassKind]) -> Result<(), OrderViolation> {
    let mut scheduled = [false; PassKind::ORDER.len()];
    let mut written: Vec<FrameResource> = Vec::new();

    for &pass in passes {
        let seen = &mut scheduled[pass.order() as usize];
        if *seen {
            return Err(OrderViolation::Duplicate(pass));
        }
        *seen = true;

        if let Some(&resource) = pass.reads().iter().find(|r| !written.contains(r)) {
            return Err(OrderViolation::ReadBeforeWrite { pass, resource });
        }
        written.extend_from_slice(pass.writes());
        written.retain(|r| !pass.consumes().contains(r));
    }

    match PassKind::ORDER.iter().find(|p| !scheduled[p.order() as usize]) {
        Some(&missing) => Err(OrderViolation::Missing(missing)),
        None => Ok(()),
    }
}
