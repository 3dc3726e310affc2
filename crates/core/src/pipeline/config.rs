use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::detection::domain::region_builder::RegionRatios;
use crate::shared::constants::{DETECTION_RECENCY_SECS, FRAME_DROPOUT_SECS, MIN_FACE_SIDE_PX};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Coordinator tunables. Defaults carry the fixed deployment constants;
/// a JSON file can override any subset of fields.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Frames further apart than this are treated as a stream dropout.
    pub frame_dropout_secs: f64,
    /// Tracker output is trusted only while the last detection is this recent.
    pub detection_recency_secs: f64,
    /// Faces smaller than this in either axis are discarded as noise.
    pub min_face_side_px: i32,
    pub eye: RegionRatios,
    pub mouth: RegionRatios,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            frame_dropout_secs: FRAME_DROPOUT_SECS,
            detection_recency_secs: DETECTION_RECENCY_SECS,
            min_face_side_px: MIN_FACE_SIDE_PX,
            eye: RegionRatios::eye_defaults(),
            mouth: RegionRatios::mouth_defaults(),
        }
    }
}

impl CoordinatorConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        serde_json::from_str(&text).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            source: e,
        })
    }
}
