//! Typed session configuration, passed explicitly at session start.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};
use crate::tracker::{CentroidConfig, TrackerConfig};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Detections below this confidence are dropped before association.
    pub conf_threshold: f32,
    /// Weight placing the representative point between box top (0) and bottom (1).
    pub repspoint_calibration: f32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            conf_threshold: 0.5,
            repspoint_calibration: 0.25,
        }
    }
}

/// Which track associator backend to run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tk_name")]
pub enum TrackerKind {
    #[serde(rename = "ByteTrack")]
    Byte(TrackerConfig),
    Centroid(CentroidConfig),
}

impl Default for TrackerKind {
    fn default() -> Self {
        Self::Byte(TrackerConfig::default())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReIdConfig {
    /// Re-id backends run on every `interval`-th frame.
    pub interval: u32,
    /// Claims below this confidence (0 to 100) never reach the reconciler.
    pub min_confidence: f32,
}

impl Default for ReIdConfig {
    fn default() -> Self {
        Self {
            interval: 1,
            min_confidence: 0.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub detector: DetectorConfig,
    pub tracker: TrackerKind,
    pub reid: ReIdConfig,
}

impl SessionConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config = Self::from_json_str(&std::fs::read_to_string(path)?)?;
        info!(path = %path.display(), tracker = ?config.tracker, "session config loaded");
        Ok(config)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        let d = &self.detector;
        check(
            (0.0..=1.0).contains(&d.conf_threshold),
            "detector.conf_threshold must be in [0, 1]",
        )?;
        check(
            d.repspoint_calibration.is_finite(),
            "detector.repspoint_calibration must be finite",
        )?;

        match &self.tracker {
            TrackerKind::Byte(t) => {
                check(
                    t.track_thresh > 0.0 && t.track_thresh <= 1.0,
                    "tracker.track_thresh must be in (0, 1]",
                )?;
                check(
                    (0.0..=1.0).contains(&t.match_thresh),
                    "tracker.match_thresh must be in [0, 1]",
                )?;
                check(t.frame_rate > 0.0, "tracker.frame_rate must be positive")?;
            }
            TrackerKind::Centroid(c) => {
                check(c.max_distance > 0.0, "tracker.max_distance must be positive")?;
            }
        }

        check(self.reid.interval >= 1, "reid.interval must be at least 1")?;
        check(
            (0.0..=100.0).contains(&self.reid.min_confidence),
            "reid.min_confidence must be in [0, 100]",
        )
    }
}

fn check(ok: bool, msg: &str) -> Result<()> {
    if ok {
        Ok(())
    } else {
        Err(Error::InvalidConfig(msg.to_string()))
    }
}
