use serde::{Deserialize, Serialize};

/// Camera projection parameters as they appear in the source asset.
///
/// Angles are in radians. Only [`Projection::Perspective`] survives ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Projection {
    Perspective {
        yfov: f32,
        /// Falls back to the ingestion aspect ratio when absent.
        aspect_ratio: Option<f32>,
        znear: f32,
        /// `None` builds an infinite far plane.
        zfar: Option<f32>,
    },
    Orthographic {
        xmag: f32,
        ymag: f32,
        znear: f32,
        zfar: f32,
    },
}

impl Projection {
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Perspective { .. } => "perspective",
            Self::Orthographic { .. } => "orthographic",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraDesc {
    #[serde(default)]
    pub name: Option<String>,
    pub projection: Projection,
}

impl CameraDesc {
    #[must_use]
    pub fn perspective(yfov: f32, aspect_ratio: Option<f32>, znear: f32, zfar: Option<f32>) -> Self {
        Self {
            name: None,
            projection: Projection::Perspective {
                yfov,
                aspect_ratio,
                znear,
                zfar,
            },
        }
    }

    #[must_use]
    pub fn orthographic(xmag: f32, ymag: f32, znear: f32, zfar: f32) -> Self {
        Self {
            name: None,
            projection: Projection::Orthographic {
                xmag,
                ymag,
                znear,
                zfar,
            },
        }
    }
}
