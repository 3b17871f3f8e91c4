//! Tunable thresholds for the face tracker.

use serde::{Deserialize, Serialize};

use crate::tracker::error::TrackerError;

/// How detections are assigned to existing tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStrategy {
    /// Detections in input order claim their nearest free track.
    #[default]
    Greedy,
    /// Minimum total distance assignment (Jonker-Volgenant).
    Optimal,
}

/// Configuration for the `TrackerSession`.
///
/// Distances are in pixels. `dedup_distance` is measured in detector space,
/// every other distance in full-resolution space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Factor mapping detector coordinates to full resolution.
    pub upscale_factor: f32,
    pub dedup_distance: f32,
    pub match_distance: f32,
    pub merge_distance: f32,
    /// Merge radius for two unnamed tracks; `None` never merges them.
    pub unknown_merge_distance: Option<f32>,
    /// Maximum comparator distance accepted as an identity match.
    pub tolerance: f32,
    pub smoothing_factor: f32,
    pub decay_factor: f32,
    pub max_tracking_speed: f32,
    pub rapid_movement_threshold: f32,
    pub rapid_movement_damping: f32,
    /// A track is dropped once its missed frames exceed this count.
    pub expiry_threshold: u32,
    pub history_capacity: usize,
    pub confirmation_count: usize,
    pub confirmation_threshold: f32,
    pub assignment: AssignmentStrategy,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            upscale_factor: 4.0,
            dedup_distance: 20.0,
            match_distance: 100.0,
            merge_distance: 60.0,
            unknown_merge_distance: Some(25.0),
            tolerance: 0.5,
            smoothing_factor: 0.5,
            decay_factor: 0.8,
            max_tracking_speed: 40.0,
            rapid_movement_threshold: 25.0,
            rapid_movement_damping: 0.5,
            expiry_threshold: 100,
            history_capacity: 5,
            confirmation_count: 3,
            confirmation_threshold: 0.4,
            assignment: AssignmentStrategy::Greedy,
        }
    }
}

impl TrackerConfig {
    /// Parse a JSON document; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, TrackerError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), TrackerError> {
        let positive = [
            ("upscale_factor", self.upscale_factor),
            ("dedup_distance", self.dedup_distance),
            ("match_distance", self.match_distance),
            ("merge_distance", self.merge_distance),
            ("tolerance", self.tolerance),
            ("max_tracking_speed", self.max_tracking_speed),
            ("rapid_movement_threshold", self.rapid_movement_threshold),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(TrackerError::InvalidConfig(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }

        if let Some(d) = self.unknown_merge_distance {
            if !(d.is_finite() && d > 0.0) {
                return Err(TrackerError::InvalidConfig(format!(
                    "unknown_merge_distance must be positive, got {d}"
                )));
            }
        }

        if !(self.smoothing_factor > 0.0 && self.smoothing_factor <= 1.0) {
            return Err(TrackerError::InvalidConfig(format!(
                "smoothing_factor must be in (0, 1], got {}",
                self.smoothing_factor
            )));
        }

        for (name, value) in [
            ("decay_factor", self.decay_factor),
            ("rapid_movement_damping", self.rapid_movement_damping),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(TrackerError::InvalidConfig(format!(
                    "{name} must be in [0, 1], got {value}"
                )));
            }
        }

        if self.confirmation_count == 0 || self.confirmation_count > self.history_capacity {
            return Err(TrackerError::InvalidConfig(format!(
                "confirmation_count must be in 1..={}, got {}",
                self.history_capacity, self.confirmation_count
            )));
        }

        Ok(())
    }
}
