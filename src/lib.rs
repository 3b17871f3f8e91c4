//! Online multi-face tracker for attendance capture.
//!
//! A [`TrackerSession`] turns noisy per-frame face detections into persistent
//! tracks with stable ids, smoothed boxes and confirmed identities. Detection
//! and embedding extraction stay outside the crate, behind
//! [`DetectionSource`] and [`Comparator`].

pub mod integration;
pub mod tracker;

pub use integration::{
    DetectionBuilder, DetectionSource, FaceIdentification, IntoDetections, PipelineConfig,
    TrackerPipeline,
};
pub use tracker::{
    AssignmentStrategy, Comparator, Detection, EuclideanComparator, FaceBox, FaceTrack,
    IdentityGallery, RawBox, TrackSnapshot, TrackState, TrackStatus, TrackerConfig, TrackerError,
    TrackerSession, UNKNOWN_NAME,
};
