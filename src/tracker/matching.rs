//! Matching utilities for assigning detections to face tracks.

use ndarray::{Array1, Array2};

use crate::tracker::error::TrackerError;
use crate::tracker::rect::{FaceBox, RawBox};

/// Detection input for the tracker.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Bounding box in detector space (top, right, bottom, left)
    pub bbox: RawBox,
    /// Face descriptor from the encoder, when one was computed
    pub embedding: Option<Array1<f32>>,
}

impl Detection {
    pub fn new(top: f32, right: f32, bottom: f32, left: f32) -> Self {
        Self {
            bbox: RawBox::new(top, right, bottom, left),
            embedding: None,
        }
    }

    pub fn from_box(bbox: RawBox, embedding: Option<Array1<f32>>) -> Self {
        Self { bbox, embedding }
    }

    pub fn with_embedding(mut self, embedding: Array1<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    /// Reject boxes with non-finite or inverted coordinates.
    pub fn validate(&self) -> Result<(), TrackerError> {
        if self.bbox.is_valid() {
            Ok(())
        } else {
            Err(TrackerError::MalformedDetection(format!("{:?}", self.bbox)))
        }
    }
}

/// Compute the center distance matrix between tracks (rows) and detections (columns).
pub fn center_distance(track_boxes: &[FaceBox], det_boxes: &[FaceBox]) -> Array2<f32> {
    let mut dists = Array2::zeros((track_boxes.len(), det_boxes.len()));
    for (i, t) in track_boxes.iter().enumerate() {
        for (j, d) in det_boxes.iter().enumerate() {
            dists[[i, j]] = t.center_distance(d);
        }
    }
    dists
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentResult {
    pub matches: Vec<(usize, usize)>,
    pub unmatched_tracks: Vec<usize>,
    pub unmatched_detections: Vec<usize>,
}

impl AssignmentResult {
    fn trivial(num_rows: usize, num_cols: usize) -> Option<Self> {
        if num_rows == 0 || num_cols == 0 {
            Some(Self {
                matches: vec![],
                unmatched_tracks: (0..num_rows).collect(),
                unmatched_detections: (0..num_cols).collect(),
            })
        } else {
            None
        }
    }
}

/// Greedy nearest-neighbour assignment.
///
/// Detections are visited in column order; each claims the closest track that
/// is still free and strictly under `thresh`. Ties go to the lower row. An
/// early detection can take the track a later one fits better.
pub fn greedy_assignment(cost_matrix: &Array2<f32>, thresh: f32) -> AssignmentResult {
    let (num_rows, num_cols) = cost_matrix.dim();
    if let Some(result) = AssignmentResult::trivial(num_rows, num_cols) {
        return result;
    }

    let mut row_taken = vec![false; num_rows];
    let mut matches = vec![];
    let mut unmatched_detections = vec![];

    for col in 0..num_cols {
        let mut best: Option<(usize, f32)> = None;
        for row in 0..num_rows {
            if row_taken[row] {
                continue;
            }
            let cost = cost_matrix[[row, col]];
            if cost < thresh && best.is_none_or(|(_, c)| cost < c) {
                best = Some((row, cost));
            }
        }

        match best {
            Some((row, _)) => {
                row_taken[row] = true;
                matches.push((row, col));
            }
            None => unmatched_detections.push(col),
        }
    }

    let unmatched_tracks = row_taken
        .iter()
        .enumerate()
        .filter_map(|(i, &taken)| if taken { None } else { Some(i) })
        .collect();

    AssignmentResult {
        matches,
        unmatched_tracks,
        unmatched_detections,
    }
}

/// Minimum-cost assignment, keeping only pairs strictly under `thresh`.
pub fn linear_assignment(cost_matrix: &Array2<f32>, thresh: f32) -> AssignmentResult {
    let (num_rows, num_cols) = cost_matrix.dim();
    if let Some(result) = AssignmentResult::trivial(num_rows, num_cols) {
        return result;
    }

    // Gated pairs cost more than any real one so the solver only uses them
    // when it has to.
    let gate = 1e6;
    let size = num_rows.max(num_cols);
    let mut padded = Array2::<f64>::from_elem((size, size), gate);

    for i in 0..num_rows {
        for j in 0..num_cols {
            let cost = cost_matrix[[i, j]];
            if cost < thresh {
                padded[[i, j]] = cost as f64;
            }
        }
    }

    let result = lapjv::lapjv(&padded);
    let mut matches = vec![];
    let mut unmatched_tracks = vec![];
    let mut unmatched_detections_mask: Vec<bool> = vec![true; num_cols];

    match result {
        Ok((row_to_col, _)) => {
            for (row_idx, &col_idx) in row_to_col.iter().enumerate() {
                if row_idx >= num_rows {
                    continue;
                }
                if col_idx >= num_cols {
                    unmatched_tracks.push(row_idx);
                } else if cost_matrix[[row_idx, col_idx]] < thresh {
                    matches.push((row_idx, col_idx));
                    unmatched_detections_mask[col_idx] = false;
                } else {
                    unmatched_tracks.push(row_idx);
                }
            }
        }
        Err(_) => {
            return greedy_assignment(cost_matrix, thresh);
        }
    }

    matches.sort_by_key(|&(_, col)| col);

    let unmatched_detections: Vec<usize> = unmatched_detections_mask
        .iter()
        .enumerate()
        .filter_map(|(i, &u)| if u { Some(i) } else { None })
        .collect();

    AssignmentResult {
        matches,
        unmatched_tracks,
        unmatched_detections,
    }
}
