use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Punctual light variants.
///
/// Cone angles are in radians, measured from the light's forward axis.
/// A `range` of `None` means the light has no cutoff distance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LightKind {
    Directional,
    Point {
        range: Option<f32>,
    },
    Spot {
        range: Option<f32>,
        inner_cone: f32,
        outer_cone: f32,
    },
}

impl LightKind {
    /// Integer encoding shared with the shader programs.
    #[must_use]
    pub const fn code(&self) -> u32 {
        match self {
            Self::Directional => 0,
            Self::Point { .. } => 1,
            Self::Spot { .. } => 2,
        }
    }

    #[must_use]
    pub fn range(&self) -> Option<f32> {
        match self {
            Self::Directional => None,
            Self::Point { range } | Self::Spot { range, .. } => *range,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightDesc {
    #[serde(default)]
    pub name: Option<String>,
    pub color: Vec3,
    pub intensity: f32,
    #[serde(flatten)]
    pub kind: LightKind,
}

impl LightDesc {
    #[must_use]
    pub fn new_directional(color: Vec3, intensity: f32) -> Self {
        Self {
            name: None,
            color,
            intensity,
            kind: LightKind::Directional,
        }
    }

    #[must_use]
    pub fn new_point(color: Vec3, intensity: f32, range: Option<f32>) -> Self {
        Self {
            name: None,
            color,
            intensity,
            kind: LightKind::Point { range },
        }
    }

    #[must_use]
    pub fn new_spot(
        color: Vec3,
        intensity: f32,
        range: Option<f32>,
        inner_cone: f32,
        outer_cone: f32,
    ) -> Self {
        Self {
            name: None,
            color,
            intensity,
            kind: LightKind::Spot {
                range,
                inner_cone,
                outer_cone,
            },
        }
    }
}
