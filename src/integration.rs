//! Integration module for connecting face detection backends with the tracker.
//!
//! This module provides traits and utilities for plugging a face
//! detector/encoder into a [`TrackerSession`](crate::TrackerSession).

mod builder;
mod detector;
mod pipeline;

pub use builder::DetectionBuilder;
pub use detector::{DetectionSource, IntoDetections};
pub use pipeline::{FaceIdentification, PipelineConfig, TrackerPipeline};
