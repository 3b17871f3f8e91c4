//! Single face track for multi-face tracking.

use std::collections::VecDeque;
use std::time::Instant;

use nalgebra::Vector2;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::tracker::config::TrackerConfig;
use crate::tracker::identity::Identity;
use crate::tracker::rect::FaceBox;
use crate::tracker::smoother::MotionModel;
use crate::tracker::track_state::{TrackState, TrackStatus};

/// Label of a face that has not been resolved to a known identity.
pub const UNKNOWN_NAME: &str = "Unknown";

/// Single face track.
#[derive(Debug, Clone)]
pub struct FaceTrack {
    /// Unique track identifier within the owning session
    pub id: u64,
    /// Resolved identity label
    pub name: String,
    /// Smoothed bounding box
    pub location: FaceBox,
    /// Last detection, or the last predicted box while coasting
    pub raw_location: FaceBox,
    /// Descriptor from the most recent match that carried one
    pub embedding: Option<Array1<f32>>,
    /// Smoothed center displacement per frame (x, y)
    pub velocity: Vector2<f32>,
    /// Recent identity confidences for the current name, oldest first
    pub confidence_history: VecDeque<f32>,
    /// Consecutive frames without a match
    pub missed_frames: u32,
    /// Set once enough consistent matches accumulate; never cleared
    pub is_confirmed: bool,
    /// Time of the last match
    pub last_seen: Instant,
    /// Current lifecycle state
    pub state: TrackState,
    /// Number of detections associated since birth
    pub hits: u32,
}

impl FaceTrack {
    /// Create a new track from an unmatched detection.
    pub fn new(id: u64, location: FaceBox, embedding: Option<Array1<f32>>) -> Self {
        Self {
            id,
            name: UNKNOWN_NAME.to_string(),
            location,
            raw_location: location,
            embedding,
            velocity: Vector2::zeros(),
            confidence_history: VecDeque::new(),
            missed_frames: 0,
            is_confirmed: false,
            last_seen: Instant::now(),
            state: TrackState::New,
            hits: 1,
        }
    }

    /// Mean of the confidence history, 0 when empty.
    pub fn average_confidence(&self) -> f32 {
        if self.confidence_history.is_empty() {
            return 0.0;
        }
        self.confidence_history.iter().sum::<f32>() / self.confidence_history.len() as f32
    }

    pub fn status(&self) -> TrackStatus {
        if self.name == UNKNOWN_NAME {
            TrackStatus::Unknown
        } else if self.is_confirmed {
            TrackStatus::Confirmed
        } else {
            TrackStatus::Tentative
        }
    }

    pub fn is_expired(&self, expiry_threshold: u32) -> bool {
        self.missed_frames > expiry_threshold
    }

    pub(crate) fn push_confidence(&mut self, confidence: f32, capacity: usize) {
        self.confidence_history.push_back(confidence);
        while self.confidence_history.len() > capacity {
            self.confidence_history.pop_front();
        }
    }

    /// Fold a resolved identity into the name and confidence history.
    ///
    /// Unknown resolutions leave both untouched, so one unrecognised frame does
    /// not relabel an identified face. A different name restarts the history,
    /// which only ever holds scores for the current name.
    pub fn apply_identity(&mut self, identity: &Identity, config: &TrackerConfig) {
        let Some(confidence) = identity.confidence else {
            return;
        };

        if identity.name != self.name {
            self.name = identity.name.clone();
            self.confidence_history.clear();
        }
        self.push_confidence(confidence, config.history_capacity);

        if !self.is_confirmed
            && self.confidence_history.len() >= config.confirmation_count
            && self
                .confidence_history
                .iter()
                .all(|&c| c > config.confirmation_threshold)
        {
            self.is_confirmed = true;
            info!(
                track_id = self.id,
                name = %self.name,
                confidence = self.average_confidence(),
                "Track confirmed"
            );
        }
    }

    /// Update the track with a matched detection.
    pub fn update(
        &mut self,
        measurement: FaceBox,
        embedding: Option<Array1<f32>>,
        identity: &Identity,
        motion: &MotionModel,
        config: &TrackerConfig,
    ) {
        let (location, velocity) = motion.update(&self.location, &measurement);
        self.raw_location = measurement;
        self.location = location;
        self.velocity = velocity;
        if embedding.is_some() {
            self.embedding = embedding;
        }

        self.apply_identity(identity, config);

        self.missed_frames = 0;
        self.hits += 1;
        self.last_seen = Instant::now();
        self.state = TrackState::Tracked;
    }

    /// Age the track by one frame without a match.
    pub fn mark_missed(&mut self, motion: &MotionModel) {
        let (location, raw_location, velocity) =
            motion.predict(&self.location, &self.raw_location, &self.velocity);
        self.location = location;
        self.raw_location = raw_location;
        self.velocity = velocity;
        self.missed_frames += 1;
        self.state = TrackState::Lost;
    }

    pub fn mark_removed(&mut self) {
        self.state = TrackState::Removed;
    }

    pub fn snapshot(&self) -> TrackSnapshot {
        TrackSnapshot {
            id: self.id,
            name: self.name.clone(),
            confidence: self.average_confidence(),
            is_confirmed: self.is_confirmed,
            bbox: self.location,
            state: self.state,
            status: self.status(),
            missed_frames: self.missed_frames,
        }
    }
}

/// Read-only view of a track handed back to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackSnapshot {
    pub id: u64,
    pub name: String,
    /// Mean of the confidence history
    pub confidence: f32,
    pub is_confirmed: bool,
    /// Smoothed box
    pub bbox: FaceBox,
    pub state: TrackState,
    pub status: TrackStatus,
    pub missed_frames: u32,
}

impl TrackSnapshot {
    /// Overlay label, e.g. `"Ada (0.87)"`.
    pub fn label(&self) -> String {
        if self.confidence > 0.0 {
            format!("{} ({:.2})", self.name, self.confidence)
        } else {
            self.name.clone()
        }
    }
}
