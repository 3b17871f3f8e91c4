//! Per-camera tracking session: the track registry and its frame lifecycle.

use std::collections::BTreeMap;

use ndarray::Array1;
use tracing::{debug, info, warn};

use crate::tracker::config::{AssignmentStrategy, TrackerConfig};
use crate::tracker::dedup::{dedup_detections, merge_losers};
use crate::tracker::error::TrackerError;
use crate::tracker::face_track::{FaceTrack, TrackSnapshot};
use crate::tracker::identity::{
    Comparator, EuclideanComparator, Identity, IdentityGallery, IdentityResolver,
};
use crate::tracker::matching::{self, AssignmentResult, Detection};
use crate::tracker::rect::FaceBox;
use crate::tracker::smoother::MotionModel;

/// Owns every track of one capture session.
///
/// Frame calls take `&mut self`, so a session processes one frame at a time.
/// Separate cameras use separate sessions.
pub struct TrackerSession<C = EuclideanComparator> {
    tracks: BTreeMap<u64, FaceTrack>,
    next_id: u64,
    frame_id: u64,
    config: TrackerConfig,
    motion: MotionModel,
    resolver: IdentityResolver<C>,
    removed: Vec<TrackSnapshot>,
}

impl Default for TrackerSession {
    fn default() -> Self {
        Self::build(TrackerConfig::default(), EuclideanComparator)
    }
}

impl TrackerSession {
    pub fn new(config: TrackerConfig) -> Result<Self, TrackerError> {
        Self::with_comparator(config, EuclideanComparator)
    }
}

impl<C: Comparator> TrackerSession<C> {
    pub fn with_comparator(config: TrackerConfig, comparator: C) -> Result<Self, TrackerError> {
        config.validate()?;
        Ok(Self::build(config, comparator))
    }

    fn build(config: TrackerConfig, comparator: C) -> Self {
        Self {
            tracks: BTreeMap::new(),
            next_id: 0,
            frame_id: 0,
            motion: MotionModel::new(&config),
            resolver: IdentityResolver::new(comparator, config.tolerance),
            config,
            removed: Vec::new(),
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn gallery(&self) -> &IdentityGallery {
        self.resolver.gallery()
    }

    pub fn gallery_mut(&mut self) -> &mut IdentityGallery {
        self.resolver.gallery_mut()
    }

    /// Number of frames processed since creation or the last reset.
    pub fn frame_count(&self) -> u64 {
        self.frame_id
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn track(&self, id: u64) -> Option<&FaceTrack> {
        self.tracks.get(&id)
    }

    /// Resolve an embedding against the gallery without touching any track.
    pub fn identify(&self, embedding: Option<&Array1<f32>>) -> Result<Identity, TrackerError> {
        self.resolver.resolve(embedding)
    }

    /// Snapshots of every live track, ordered by id.
    pub fn tracks(&self) -> Vec<TrackSnapshot> {
        self.tracks.values().map(FaceTrack::snapshot).collect()
    }

    /// Tracks expired or merged away by the most recent frame call.
    pub fn removed_tracks(&self) -> &[TrackSnapshot] {
        &self.removed
    }

    /// Drop all tracks and restart id assignment. The gallery is kept.
    pub fn reset(&mut self) {
        info!(
            dropped = self.tracks.len(),
            frames = self.frame_id,
            "Resetting tracker session"
        );
        self.tracks.clear();
        self.removed.clear();
        self.next_id = 0;
        self.frame_id = 0;
    }

    /// Run one detection frame through dedup, matching, identity resolution,
    /// smoothing, aging, expiry and merge.
    ///
    /// Boxes in `detections` are in detector space. Malformed boxes are
    /// dropped individually. If identity resolution fails, the frame is
    /// handled as if nothing had been detected.
    pub fn process_detections(&mut self, detections: Vec<Detection>) -> Vec<TrackSnapshot> {
        let total = detections.len();
        let valid: Vec<Detection> = detections
            .into_iter()
            .filter(|det| match det.validate() {
                Ok(()) => true,
                Err(err) => {
                    warn!(error = %err, "Dropping detection");
                    false
                }
            })
            .collect();
        let detections = dedup_detections(valid, self.config.dedup_distance);

        // Resolve before touching any track so a comparator failure leaves the
        // registry as it was.
        let identities = match detections
            .iter()
            .map(|det| self.resolver.resolve(det.embedding.as_ref()))
            .collect::<Result<Vec<Identity>, TrackerError>>()
        {
            Ok(identities) => identities,
            Err(err) => {
                warn!(error = %err, "Identity resolution failed, aging tracks instead");
                return self.advance_without_detections();
            }
        };

        self.frame_id += 1;
        self.removed.clear();
        debug!(
            frame = self.frame_id,
            received = total,
            kept = detections.len(),
            tracks = self.tracks.len(),
            "Processing detections"
        );

        let det_boxes: Vec<FaceBox> = detections
            .iter()
            .map(|d| d.bbox.upscale(self.config.upscale_factor))
            .collect();
        let track_ids: Vec<u64> = self.tracks.keys().copied().collect();
        let track_boxes: Vec<FaceBox> = self.tracks.values().map(|t| t.location).collect();

        let dists = matching::center_distance(&track_boxes, &det_boxes);
        let AssignmentResult {
            matches,
            unmatched_tracks,
            unmatched_detections,
        } = match self.config.assignment {
            AssignmentStrategy::Greedy => {
                matching::greedy_assignment(&dists, self.config.match_distance)
            }
            AssignmentStrategy::Optimal => {
                matching::linear_assignment(&dists, self.config.match_distance)
            }
        };

        let mut detections: Vec<Option<Detection>> = detections.into_iter().map(Some).collect();

        for (itrack, idet) in matches {
            let embedding = detections[idet].take().and_then(|d| d.embedding);
            if let Some(track) = self.tracks.get_mut(&track_ids[itrack]) {
                track.update(
                    det_boxes[idet],
                    embedding,
                    &identities[idet],
                    &self.motion,
                    &self.config,
                );
                debug!(track_id = track.id, name = %track.name, "Matched track");
            }
        }

        for idx in unmatched_tracks {
            if let Some(track) = self.tracks.get_mut(&track_ids[idx]) {
                track.mark_missed(&self.motion);
            }
        }

        for idet in unmatched_detections {
            let embedding = detections[idet].take().and_then(|d| d.embedding);
            let id = self.next_id;
            self.next_id += 1;

            let mut track = FaceTrack::new(id, det_boxes[idet], embedding);
            track.apply_identity(&identities[idet], &self.config);
            debug!(track_id = id, name = %track.name, bbox = ?track.location, "New track");
            self.tracks.insert(id, track);
        }

        self.remove_expired();
        self.merge_duplicates();
        self.tracks()
    }

    /// Age every track by one frame without running any matching.
    pub fn advance_without_detections(&mut self) -> Vec<TrackSnapshot> {
        self.frame_id += 1;
        self.removed.clear();
        for track in self.tracks.values_mut() {
            track.mark_missed(&self.motion);
        }
        self.remove_expired();
        self.tracks()
    }

    fn remove_expired(&mut self) {
        let expired: Vec<u64> = self
            .tracks
            .values()
            .filter(|t| t.is_expired(self.config.expiry_threshold))
            .map(|t| t.id)
            .collect();

        for id in expired {
            if let Some(mut track) = self.tracks.remove(&id) {
                track.mark_removed();
                debug!(
                    track_id = id,
                    name = %track.name,
                    missed_frames = track.missed_frames,
                    "Track expired"
                );
                self.removed.push(track.snapshot());
            }
        }
    }

    fn merge_duplicates(&mut self) {
        let ordered: Vec<&FaceTrack> = self.tracks.values().collect();
        let losers = merge_losers(&ordered, &self.config);
        for id in losers {
            if let Some(mut track) = self.tracks.remove(&id) {
                track.mark_removed();
                self.removed.push(track.snapshot());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::track_state::TrackState;
    use ndarray::array;

    #[test]
    fn test_new_detection_spawns_track() {
        let mut session = TrackerSession::default();
        let tracks = session.process_detections(vec![Detection::new(10.0, 40.0, 40.0, 10.0)]);
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].id, 0);
        assert_eq!(tracks[0].name, "Unknown");
        assert_eq!(tracks[0].bbox, FaceBox::new(40, 160, 160, 40));
        assert_eq!(tracks[0].state, TrackState::New);
    }

    #[test]
    fn test_malformed_detection_is_dropped() {
        let mut session = TrackerSession::default();
        let tracks = session.process_detections(vec![
            Detection::new(f32::NAN, 40.0, 40.0, 10.0),
            Detection::new(40.0, 40.0, 10.0, 10.0),
            Detection::new(10.0, 140.0, 40.0, 110.0),
        ]);
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].bbox.left, 440);
    }

    #[test]
    fn test_unmatched_track_is_aged() {
        let mut session = TrackerSession::default();
        session.process_detections(vec![Detection::new(10.0, 40.0, 40.0, 10.0)]);
        let tracks = session.process_detections(vec![Detection::new(100.0, 200.0, 130.0, 170.0)]);
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].missed_frames, 1);
        assert_eq!(tracks[0].state, TrackState::Lost);
        assert_eq!(tracks[1].id, 1);
    }

    #[test]
    fn test_reset_restarts_ids_and_keeps_gallery() {
        let mut session = TrackerSession::default();
        session
            .gallery_mut()
            .enroll("Ada", &array![0.0, 0.0])
            .unwrap();
        session.process_detections(vec![Detection::new(10.0, 40.0, 40.0, 10.0)]);
        session.process_detections(vec![Detection::new(100.0, 200.0, 130.0, 170.0)]);
        session.reset();
        assert!(session.is_empty());
        assert_eq!(session.frame_count(), 0);
        assert_eq!(session.gallery().len(), 1);

        let tracks = session.process_detections(vec![Detection::new(10.0, 40.0, 40.0, 10.0)]);
        assert_eq!(tracks[0].id, 0);
    }

    #[test]
    fn test_removed_tracks_are_reported_once() {
        let config = TrackerConfig {
            expiry_threshold: 0,
            ..Default::default()
        };
        let mut session = TrackerSession::new(config).unwrap();
        session.process_detections(vec![Detection::new(10.0, 40.0, 40.0, 10.0)]);
        assert!(session.advance_without_detections().is_empty());
        assert_eq!(session.removed_tracks().len(), 1);
        assert_eq!(session.removed_tracks()[0].state, TrackState::Removed);

        session.advance_without_detections();
        assert!(session.removed_tracks().is_empty());
    }

    #[test]
    fn test_far_out_box_is_tracked() {
        let mut session = TrackerSession::default();
        let far = || vec![Detection::new(0.0, 5.0e8, 10.0, 4.0e8)];
        session.process_detections(far());
        let tracks = session.process_detections(far());
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].missed_frames, 0);
        assert_eq!(tracks[0].bbox.right, 2_000_000_000);

        let tracks = session.advance_without_detections();
        assert_eq!(tracks[0].missed_frames, 1);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = TrackerConfig {
            decay_factor: 1.5,
            ..Default::default()
        };
        assert!(TrackerSession::new(config).is_err());
    }
}
