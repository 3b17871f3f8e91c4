mod config;
mod dedup;
mod error;
mod face_track;
mod identity;
mod matching;
mod rect;
mod session;
mod smoother;
mod track_state;

pub use config::{AssignmentStrategy, TrackerConfig};
pub use dedup::{dedup_detections, merge_losers};
pub use error::TrackerError;
pub use face_track::{FaceTrack, TrackSnapshot, UNKNOWN_NAME};
pub use identity::{Comparator, EuclideanComparator, Identity, IdentityGallery, IdentityResolver};
pub use matching::{
    AssignmentResult, Detection, center_distance, greedy_assignment, linear_assignment,
};
pub use rect::{FaceBox, RawBox};
pub use session::TrackerSession;
pub use smoother::MotionModel;
pub use track_state::{TrackState, TrackStatus};
