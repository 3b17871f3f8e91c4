//! TrackerPipeline for combining face detection with tracking.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::tracker::{
    Comparator, EuclideanComparator, FaceBox, TrackSnapshot, TrackerConfig, TrackerError,
    TrackerSession,
};

use super::{DetectionSource, IntoDetections};

/// Frame cadence and one-shot identification settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Run the detector on every Nth frame; other frames only age tracks.
    pub detection_interval: u32,
    /// Confidence above which a one-shot identification counts as confirmed.
    pub instant_confirm_confidence: f32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            detection_interval: 3,
            instant_confirm_confidence: 0.6,
        }
    }
}

/// One face from a stateless, single-frame identification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceIdentification {
    /// Position of the face in the detector's output
    pub index: usize,
    pub name: String,
    /// `1 - distance` of the accepted match, 0 for unknown faces
    pub confidence: f32,
    pub is_confirmed: bool,
    /// Full-resolution box
    pub bbox: FaceBox,
}

/// Bundles a face detector with a `TrackerSession`.
///
/// Detection is expensive, so it only runs on every `detection_interval`-th
/// frame; the frames in between advance the tracks on prediction alone.
pub struct TrackerPipeline<D: DetectionSource, C: Comparator = EuclideanComparator> {
    detector: D,
    session: TrackerSession<C>,
    config: PipelineConfig,
    frame_count: u64,
}

impl<D: DetectionSource> TrackerPipeline<D> {
    /// Create a pipeline with default tracker and pipeline configuration.
    pub fn with_default_config(detector: D) -> Self {
        Self::new(detector, TrackerSession::default(), PipelineConfig::default())
    }

    /// Create a pipeline with the default comparator.
    pub fn from_config(
        detector: D,
        tracker_config: TrackerConfig,
        config: PipelineConfig,
    ) -> Result<Self, TrackerError> {
        Ok(Self::new(detector, TrackerSession::new(tracker_config)?, config))
    }
}

impl<D: DetectionSource, C: Comparator> TrackerPipeline<D, C> {
    pub fn new(detector: D, session: TrackerSession<C>, config: PipelineConfig) -> Self {
        Self {
            detector,
            session,
            config,
            frame_count: 0,
        }
    }

    /// Process a single captured frame and return the live tracks.
    ///
    /// A failing detector is logged and the frame is treated as empty.
    pub fn process_frame(&mut self, input: &[u8], width: u32, height: u32) -> Vec<TrackSnapshot> {
        self.frame_count += 1;

        let interval = u64::from(self.config.detection_interval.max(1));
        if self.frame_count % interval != 0 {
            return self.session.advance_without_detections();
        }

        match self.detector.detect(input, width, height) {
            Ok(detections) => self.session.process_detections(detections),
            Err(err) => {
                warn!(frame = self.frame_count, error = %err, "Face detection failed");
                self.session.advance_without_detections()
            }
        }
    }

    /// Feed detections produced outside the pipeline, e.g. by a remote
    /// detector. Counts as a detection frame regardless of the cadence.
    pub fn process_detections<I: IntoDetections>(&mut self, output: I) -> Vec<TrackSnapshot> {
        self.frame_count += 1;
        self.session.process_detections(output.into_detections())
    }

    /// Detect and identify every face in one frame without touching tracks.
    pub fn identify_frame(
        &mut self,
        input: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Vec<FaceIdentification>, TrackerError> {
        let detections = self
            .detector
            .detect(input, width, height)
            .map_err(|e| TrackerError::Detector(e.to_string()))?;
        let upscale = self.session.config().upscale_factor;

        let mut faces = Vec::with_capacity(detections.len());
        for (index, det) in detections.iter().enumerate() {
            if let Err(err) = det.validate() {
                warn!(index, error = %err, "Skipping face");
                continue;
            }
            let identity = self.session.identify(det.embedding.as_ref())?;
            let confidence = identity.confidence.unwrap_or(0.0);
            faces.push(FaceIdentification {
                index,
                name: identity.name,
                confidence,
                is_confirmed: confidence > self.config.instant_confirm_confidence,
                bbox: det.bbox.upscale(upscale),
            });
        }
        Ok(faces)
    }

    /// Drop all tracks and restart the frame cadence.
    pub fn reset(&mut self) {
        self.session.reset();
        self.frame_count = 0;
    }

    /// Frames seen by the pipeline, detection frames or not.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Get a reference to the underlying detector.
    pub fn detector(&self) -> &D {
        &self.detector
    }

    /// Get a mutable reference to the underlying detector.
    pub fn detector_mut(&mut self) -> &mut D {
        &mut self.detector
    }

    /// Get a reference to the underlying session.
    pub fn session(&self) -> &TrackerSession<C> {
        &self.session
    }

    /// Get a mutable reference to the underlying session.
    pub fn session_mut(&mut self) -> &mut TrackerSession<C> {
        &mut self.session
    }
}
