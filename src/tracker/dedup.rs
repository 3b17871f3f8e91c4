//! Duplicate suppression: within a frame for raw detections, and across the
//! registry for tracks that converged on the same face.

use tracing::debug;

use crate::tracker::config::TrackerConfig;
use crate::tracker::face_track::{FaceTrack, UNKNOWN_NAME};
use crate::tracker::matching::Detection;

/// Drop detections whose center lies strictly within `threshold` of a
/// detection already kept from this batch. First-seen order wins.
pub fn dedup_detections(detections: Vec<Detection>, threshold: f32) -> Vec<Detection> {
    let mut kept: Vec<Detection> = Vec::with_capacity(detections.len());
    for det in detections {
        let center = det.bbox.center();
        let duplicate = kept
            .iter()
            .any(|k| nalgebra::distance(&k.bbox.center(), &center) < threshold);
        if !duplicate {
            kept.push(det);
        }
    }
    kept
}

/// Pick the tracks to delete so that no two remaining tracks describe the same
/// face.
///
/// Pairs are visited in slice order (callers pass tracks sorted by id). Named
/// pairs merge within `merge_distance`; unnamed pairs only within
/// `unknown_merge_distance`, if set. The higher mean confidence survives, the
/// earlier track on a tie.
pub fn merge_losers(tracks: &[&FaceTrack], config: &TrackerConfig) -> Vec<u64> {
    let mut removed = vec![false; tracks.len()];
    let mut losers = Vec::new();

    for i in 0..tracks.len() {
        if removed[i] {
            continue;
        }
        for j in (i + 1)..tracks.len() {
            if removed[j] {
                continue;
            }
            let (a, b) = (tracks[i], tracks[j]);
            if a.name != b.name {
                continue;
            }

            let radius = if a.name == UNKNOWN_NAME {
                match config.unknown_merge_distance {
                    Some(r) => r,
                    None => continue,
                }
            } else {
                config.merge_distance
            };

            let distance = a.location.center_distance(&b.location);
            if distance >= radius {
                continue;
            }

            let loser = if b.average_confidence() > a.average_confidence() {
                i
            } else {
                j
            };
            debug!(
                survivor = tracks[i + j - loser].id,
                absorbed = tracks[loser].id,
                name = %a.name,
                distance,
                "Merging duplicate tracks"
            );
            removed[loser] = true;
            losers.push(tracks[loser].id);

            if loser == i {
                break;
            }
        }
    }

    losers
}
