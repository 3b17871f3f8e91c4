use approx::assert_relative_eq;
use ndarray::{Array1, ArrayView1, ArrayView2, array};

use facetrack_rs::tracker::Comparator;
use facetrack_rs::{
    AssignmentStrategy, Detection, DetectionBuilder, FaceBox, TrackState, TrackStatus,
    TrackerConfig, TrackerSession, UNKNOWN_NAME,
};

/// Square face box in detector space centred on (cx, cy).
fn face_at(cx: f32, cy: f32) -> Detection {
    DetectionBuilder::new().xywh(cx, cy, 10.0, 10.0).build()
}

fn session_with_ada(config: TrackerConfig) -> TrackerSession {
    let mut session = TrackerSession::new(config).unwrap();
    session
        .gallery_mut()
        .enroll("Ada", &array![0.0, 0.0])
        .unwrap();
    session
}

#[test]
fn test_unknown_face_becomes_confirmed_identity() {
    let mut session = session_with_ada(TrackerConfig::default());

    // Frame 1: no usable embedding
    let tracks = session.process_detections(vec![face_at(25.0, 25.0)]);
    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].id, 0);
    assert_eq!(tracks[0].name, UNKNOWN_NAME);
    assert!(!tracks[0].is_confirmed);

    // Frames 2-4: matches Ada at distance 0.5
    for _ in 0..2 {
        session.process_detections(vec![face_at(25.0, 25.0).with_embedding(array![0.5, 0.0])]);
    }
    let tracks =
        session.process_detections(vec![face_at(25.0, 25.0).with_embedding(array![0.5, 0.0])]);

    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].id, 0);
    assert_eq!(tracks[0].name, "Ada");
    assert!(tracks[0].is_confirmed);
    assert_eq!(tracks[0].status, TrackStatus::Confirmed);
    assert_relative_eq!(tracks[0].confidence, 0.5, epsilon = 1e-6);
}

#[test]
fn test_confirmed_track_expires_after_threshold() {
    let config = TrackerConfig::default();
    let expiry = config.expiry_threshold;
    let mut session = session_with_ada(config);

    for _ in 0..3 {
        session.process_detections(vec![face_at(25.0, 25.0).with_embedding(array![0.1, 0.0])]);
    }
    assert!(session.track(0).unwrap().is_confirmed);

    for missed in 1..=expiry {
        let tracks = session.advance_without_detections();
        assert_eq!(tracks.len(), 1, "track missing after {missed} missed frames");
        assert_eq!(tracks[0].missed_frames, missed);
    }

    let tracks = session.advance_without_detections();
    assert!(tracks.is_empty());
    assert!(session.track(0).is_none());
}

#[test]
fn test_track_ids_strictly_increase() {
    let config = TrackerConfig {
        expiry_threshold: 1,
        ..Default::default()
    };
    let mut session = TrackerSession::new(config).unwrap();
    let mut seen = Vec::new();

    for frame in 0..6 {
        // Each frame the face appears far from every existing track.
        let x = 25.0 + 60.0 * frame as f32;
        for t in session.process_detections(vec![face_at(x, 25.0)]) {
            if !seen.contains(&t.id) {
                seen.push(t.id);
            }
        }
    }

    assert_eq!(seen, vec![0, 1, 2, 3, 4, 5]);
    assert!(session.len() <= 2);
}

#[test]
fn test_stationary_face_converges() {
    let mut session = TrackerSession::default();
    session.process_detections(vec![face_at(25.0, 25.0)]);

    let target = face_at(35.0, 25.0).bbox.upscale(4.0);
    let mut last_speed = f32::MAX;
    for _ in 0..10 {
        session.process_detections(vec![face_at(35.0, 25.0)]);
        let speed = session.track(0).unwrap().velocity.norm();
        assert!(speed <= last_speed);
        last_speed = speed;
    }

    let track = session.track(0).unwrap();
    assert_eq!(track.location, target);
    assert_eq!(track.raw_location, target);
    assert!(track.velocity.norm() < 1.0);
    assert_eq!(track.state, TrackState::Tracked);
    assert_eq!(track.hits, 11);
}

#[test]
fn test_dedup_threshold_in_one_frame() {
    let mut session = TrackerSession::default();
    let tracks = session.process_detections(vec![face_at(25.0, 25.0), face_at(50.0, 25.0)]);
    assert_eq!(tracks.len(), 2);

    let mut session = TrackerSession::default();
    let tracks = session.process_detections(vec![face_at(25.0, 25.0), face_at(30.0, 25.0)]);
    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].bbox, face_at(25.0, 25.0).bbox.upscale(4.0));
}

#[test]
fn test_same_name_tracks_merge() {
    let config = TrackerConfig {
        dedup_distance: 5.0,
        ..Default::default()
    };
    let mut session = session_with_ada(config);

    // 40px apart at full resolution, both resolve to Ada.
    let tracks = session.process_detections(vec![
        face_at(25.0, 25.0).with_embedding(array![0.4, 0.0]),
        face_at(35.0, 25.0).with_embedding(array![0.1, 0.0]),
    ]);

    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].id, 1);
    assert_eq!(tracks[0].name, "Ada");
    assert_relative_eq!(tracks[0].confidence, 0.9, epsilon = 1e-6);
}

#[test]
fn test_confirmation_survives_low_confidence() {
    let config = TrackerConfig {
        tolerance: 0.9,
        ..Default::default()
    };
    let mut session = session_with_ada(config);

    for _ in 0..3 {
        session.process_detections(vec![face_at(25.0, 25.0).with_embedding(array![0.2, 0.0])]);
    }
    assert!(session.track(0).unwrap().is_confirmed);

    for _ in 0..6 {
        session.process_detections(vec![face_at(25.0, 25.0).with_embedding(array![0.85, 0.0])]);
        session.process_detections(vec![face_at(25.0, 25.0)]);
    }

    let track = session.track(0).unwrap();
    assert!(track.is_confirmed);
    assert!(track.average_confidence() < 0.4);
    assert_eq!(track.confidence_history.len(), 5);
}

#[test]
fn test_greedy_and_optimal_assignment() {
    let frame1 = || vec![face_at(25.0, 25.0), face_at(47.0, 25.0)];
    let frame2 = || vec![face_at(37.5, 25.0), face_at(65.0, 25.0)];

    // Greedy: the first detection steals track 1, the second spawns a track.
    let mut greedy = TrackerSession::default();
    greedy.process_detections(frame1());
    let tracks = greedy.process_detections(frame2());
    assert_eq!(tracks.len(), 3);
    assert_eq!(tracks[0].missed_frames, 1);
    assert_eq!(tracks[1].missed_frames, 0);
    assert_eq!(tracks[2].id, 2);

    let config = TrackerConfig {
        assignment: AssignmentStrategy::Optimal,
        ..Default::default()
    };
    let mut optimal = TrackerSession::new(config).unwrap();
    optimal.process_detections(frame1());
    let tracks = optimal.process_detections(frame2());
    assert_eq!(tracks.len(), 2);
    assert!(tracks.iter().all(|t| t.missed_frames == 0));
}

#[test]
fn test_malformed_boxes_do_not_abort_frame() {
    let mut session = TrackerSession::default();
    let tracks = session.process_detections(vec![
        Detection::new(30.0, 30.0, 20.0, 20.0),
        Detection::new(20.0, f32::INFINITY, 30.0, 20.0),
        face_at(25.0, 25.0),
    ]);
    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].bbox, FaceBox::new(80, 120, 120, 80));
}

struct FlakyComparator;

impl Comparator for FlakyComparator {
    type Error = String;

    fn compare(
        &self,
        embedding: ArrayView1<'_, f32>,
        known: ArrayView2<'_, f32>,
    ) -> Result<Array1<f32>, Self::Error> {
        if embedding[0] < 0.0 {
            return Err("recognition engine timed out".to_string());
        }
        Ok(Array1::from_elem(known.nrows(), 0.2))
    }
}

#[test]
fn test_comparator_failure_ages_tracks() {
    let mut session =
        TrackerSession::with_comparator(TrackerConfig::default(), FlakyComparator).unwrap();
    session
        .gallery_mut()
        .enroll("Ada", &array![0.0, 0.0])
        .unwrap();

    let tracks =
        session.process_detections(vec![face_at(25.0, 25.0).with_embedding(array![1.0, 0.0])]);
    assert_eq!(tracks[0].name, "Ada");

    let tracks = session.process_detections(vec![
        face_at(25.0, 25.0).with_embedding(array![1.0, 0.0]),
        face_at(80.0, 80.0).with_embedding(array![-1.0, 0.0]),
    ]);
    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].missed_frames, 1);
    assert_eq!(tracks[0].state, TrackState::Lost);
    assert_eq!(session.frame_count(), 2);
}

#[test]
fn test_lost_track_coasts_and_is_refound() {
    let mut session = TrackerSession::default();
    for i in 0..4 {
        session.process_detections(vec![face_at(25.0 + 2.0 * i as f32, 25.0)]);
    }
    let before = session.track(0).unwrap().location;
    session.advance_without_detections();
    let after = session.track(0).unwrap().location;
    assert!(after.center().x > before.center().x);

    let tracks = session.process_detections(vec![face_at(33.0, 25.0)]);
    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].id, 0);
    assert_eq!(tracks[0].missed_frames, 0);
}
