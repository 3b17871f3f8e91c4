//! Builder for creating Detection objects from various box formats.

use ndarray::Array1;

use crate::tracker::{Detection, RawBox};

/// Builder for creating `Detection` objects from various input formats.
///
/// All coordinates are in the detector's own (downscaled) space.
#[derive(Debug, Clone, Default)]
pub struct DetectionBuilder {
    bbox: RawBox,
    embedding: Option<Array1<f32>>,
}

impl DetectionBuilder {
    /// Create a new detection builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set bounding box in face detector order (top, right, bottom, left).
    pub fn trbl(mut self, top: f32, right: f32, bottom: f32, left: f32) -> Self {
        self.bbox = RawBox::new(top, right, bottom, left);
        self
    }

    /// Set bounding box in TLBR format (x1, y1, x2, y2).
    pub fn tlbr(mut self, x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        self.bbox = RawBox::new(y1, x2, y2, x1);
        self
    }

    /// Set bounding box in XYWH format (center_x, center_y, width, height).
    pub fn xywh(mut self, cx: f32, cy: f32, w: f32, h: f32) -> Self {
        self.bbox = RawBox::new(cy - h / 2.0, cx + w / 2.0, cy + h / 2.0, cx - w / 2.0);
        self
    }

    /// Set bounding box in TLWH format (left, top, width, height).
    pub fn tlwh(mut self, l: f32, t: f32, w: f32, h: f32) -> Self {
        self.bbox = RawBox::new(t, l + w, t + h, l);
        self
    }

    /// Attach the face embedding computed for this box.
    pub fn embedding(mut self, embedding: impl Into<Array1<f32>>) -> Self {
        self.embedding = Some(embedding.into());
        self
    }

    /// Build the final `Detection`.
    pub fn build(self) -> Detection {
        Detection::from_box(self.bbox, self.embedding)
    }
}
