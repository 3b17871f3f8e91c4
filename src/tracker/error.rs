use thiserror::Error;

/// Errors raised by the face tracker.
///
/// Frame processing never fails outright: detector and comparator failures are
/// absorbed by aging the existing tracks instead. These variants surface from
/// configuration, gallery enrolment and the comparator boundary.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrackerError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Config parse error: {0}")]
    Config(String),

    #[error("Malformed detection box: {0}")]
    MalformedDetection(String),

    #[error("Embedding dimension mismatch: expected {expected}, got {got}")]
    EmbeddingDimension { expected: usize, got: usize },

    #[error("Detector error: {0}")]
    Detector(String),

    #[error("Comparator error: {0}")]
    Comparator(String),
}

impl From<serde_json::Error> for TrackerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(err.to_string())
    }
}
