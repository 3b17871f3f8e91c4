//! Identity resolution against a gallery of enrolled face embeddings.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use tracing::debug;

use crate::tracker::error::TrackerError;
use crate::tracker::face_track::UNKNOWN_NAME;

/// Outcome of resolving one detection.
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub name: String,
    /// `1 - distance` for an accepted match, `None` for unknown faces
    pub confidence: Option<f32>,
}

impl Identity {
    pub fn unknown() -> Self {
        Self {
            name: UNKNOWN_NAME.to_string(),
            confidence: None,
        }
    }

    pub fn is_known(&self) -> bool {
        self.confidence.is_some()
    }
}

/// Distance function between one face embedding and a set of known ones.
///
/// Implement this to plug in the recognition engine's own metric.
pub trait Comparator {
    /// Error type for comparison failures.
    type Error: std::fmt::Display;

    /// Return one distance per row of `known`; smaller means more similar.
    fn compare(
        &self,
        embedding: ArrayView1<'_, f32>,
        known: ArrayView2<'_, f32>,
    ) -> Result<Array1<f32>, Self::Error>;
}

/// Plain L2 distance between embeddings.
#[derive(Debug, Clone, Copy, Default)]
pub struct EuclideanComparator;

impl Comparator for EuclideanComparator {
    type Error = TrackerError;

    fn compare(
        &self,
        embedding: ArrayView1<'_, f32>,
        known: ArrayView2<'_, f32>,
    ) -> Result<Array1<f32>, Self::Error> {
        if embedding.len() != known.ncols() {
            return Err(TrackerError::EmbeddingDimension {
                expected: known.ncols(),
                got: embedding.len(),
            });
        }
        let diff = &known - &embedding;
        Ok(diff.mapv(|x| x * x).sum_axis(Axis(1)).mapv(f32::sqrt))
    }
}

/// Enrolled reference embeddings, one row per entry.
///
/// A person may be enrolled several times (e.g. from different photos).
#[derive(Debug, Clone, Default)]
pub struct IdentityGallery {
    names: Vec<String>,
    embeddings: Option<Array2<f32>>,
}

impl IdentityGallery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enroll(
        &mut self,
        name: impl Into<String>,
        embedding: &Array1<f32>,
    ) -> Result<(), TrackerError> {
        let name = name.into();
        match &mut self.embeddings {
            Some(rows) => {
                if rows.ncols() != embedding.len() {
                    return Err(TrackerError::EmbeddingDimension {
                        expected: rows.ncols(),
                        got: embedding.len(),
                    });
                }
                let expected = rows.ncols();
                rows.push_row(embedding.view())
                    .map_err(|_| TrackerError::EmbeddingDimension {
                        expected,
                        got: embedding.len(),
                    })?;
            }
            None => {
                if embedding.is_empty() {
                    return Err(TrackerError::EmbeddingDimension {
                        expected: 1,
                        got: 0,
                    });
                }
                self.embeddings = Some(embedding.clone().insert_axis(Axis(0)));
            }
        }
        debug!(name = %name, entries = self.names.len() + 1, "Enrolled identity");
        self.names.push(name);
        Ok(())
    }

    /// Remove every entry enrolled under `name`; returns how many were removed.
    pub fn remove(&mut self, name: &str) -> usize {
        let keep: Vec<usize> = (0..self.names.len())
            .filter(|&i| self.names[i] != name)
            .collect();
        let removed = self.names.len() - keep.len();
        if removed == 0 {
            return 0;
        }
        if keep.is_empty() {
            self.clear();
            return removed;
        }
        if let Some(rows) = &self.embeddings {
            self.embeddings = Some(rows.select(Axis(0), &keep));
        }
        self.names = keep.iter().map(|&i| self.names[i].clone()).collect();
        removed
    }

    pub fn clear(&mut self) {
        self.names.clear();
        self.embeddings = None;
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Embedding length shared by every entry, once anything is enrolled.
    pub fn dimension(&self) -> Option<usize> {
        self.embeddings.as_ref().map(|rows| rows.ncols())
    }

    pub fn embeddings(&self) -> Option<ArrayView2<'_, f32>> {
        self.embeddings.as_ref().map(|rows| rows.view())
    }
}

/// Maps embeddings to gallery identities through a `Comparator`.
#[derive(Debug, Clone)]
pub struct IdentityResolver<C> {
    comparator: C,
    gallery: IdentityGallery,
    tolerance: f32,
}

impl<C: Comparator> IdentityResolver<C> {
    pub fn new(comparator: C, tolerance: f32) -> Self {
        Self {
            comparator,
            gallery: IdentityGallery::new(),
            tolerance,
        }
    }

    pub fn gallery(&self) -> &IdentityGallery {
        &self.gallery
    }

    pub fn gallery_mut(&mut self) -> &mut IdentityGallery {
        &mut self.gallery
    }

    /// Resolve one embedding.
    ///
    /// Missing embeddings and an empty gallery give `Identity::unknown()`. A
    /// failing comparator, or one that returns the wrong number of distances,
    /// is reported as `TrackerError::Comparator`.
    pub fn resolve(&self, embedding: Option<&Array1<f32>>) -> Result<Identity, TrackerError> {
        let (Some(embedding), Some(known)) = (embedding, self.gallery.embeddings()) else {
            return Ok(Identity::unknown());
        };

        let distances = self
            .comparator
            .compare(embedding.view(), known)
            .map_err(|e| TrackerError::Comparator(e.to_string()))?;

        if distances.len() != self.gallery.len() {
            return Err(TrackerError::Comparator(format!(
                "expected {} distances, got {}",
                self.gallery.len(),
                distances.len()
            )));
        }

        let best = distances
            .iter()
            .enumerate()
            .filter(|(_, d)| !d.is_nan())
            .min_by(|a, b| a.1.total_cmp(b.1));

        match best {
            Some((index, &distance)) if distance <= self.tolerance => Ok(Identity {
                name: self.gallery.names[index].clone(),
                confidence: Some(1.0 - distance),
            }),
            _ => Ok(Identity::unknown()),
        }
    }
}
