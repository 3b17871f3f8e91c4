use serde::{Deserialize, Serialize};

/// Track state enumeration for the face track lifecycle.
///
/// Identity confirmation is a separate, permanent flag on the track and not a
/// state of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TrackState {
    /// Spawned from an unmatched detection, not yet re-matched
    #[default]
    New,
    /// Matched on the most recent detection frame
    Tracked,
    /// Coasting on prediction after one or more missed frames
    Lost,
    /// Expired or absorbed by a merge
    Removed,
}

/// Display status of a track, as shown on the attendance overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackStatus {
    /// Named and confirmed
    Confirmed,
    /// Named but not yet confirmed
    Tentative,
    /// No identity resolved
    Unknown,
}
