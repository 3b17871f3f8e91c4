//! Face bounding boxes in the two coordinate spaces the tracker deals with.
//!
//! Both types use the (top, right, bottom, left) ordering produced by the
//! face detector:
//! - `RawBox`: floating point, detector (downscaled) space, unvalidated
//! - `FaceBox`: integer pixels, full-resolution space

use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

/// Box as reported by the detector, before validation and rescaling.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RawBox {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl RawBox {
    #[inline]
    pub fn new(top: f32, right: f32, bottom: f32, left: f32) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    /// A box is usable when every coordinate is finite and it is not inverted.
    pub fn is_valid(&self) -> bool {
        [self.top, self.right, self.bottom, self.left]
            .iter()
            .all(|v| v.is_finite())
            && self.top <= self.bottom
            && self.left <= self.right
    }

    /// Center point as (x, y).
    #[inline]
    pub fn center(&self) -> Point2<f32> {
        Point2::new(
            (self.left + self.right) / 2.0,
            (self.top + self.bottom) / 2.0,
        )
    }

    /// Rescale into full-resolution space and snap to integer pixels.
    ///
    /// Coordinates beyond the `i32` range saturate.
    pub fn upscale(&self, factor: f32) -> FaceBox {
        FaceBox::new(
            (self.top * factor).round() as i32,
            (self.right * factor).round() as i32,
            (self.bottom * factor).round() as i32,
            (self.left * factor).round() as i32,
        )
    }
}

/// Integer pixel box in full-resolution space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FaceBox {
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    pub left: i32,
}

impl FaceBox {
    #[inline]
    pub fn new(top: i32, right: i32, bottom: i32, left: i32) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    #[inline]
    pub fn width(&self) -> i32 {
        self.right.saturating_sub(self.left)
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.bottom.saturating_sub(self.top)
    }

    /// Center point as (x, y).
    #[inline]
    pub fn center(&self) -> Point2<f32> {
        Point2::new(
            (self.left as f32 + self.right as f32) / 2.0,
            (self.top as f32 + self.bottom as f32) / 2.0,
        )
    }

    /// Euclidean distance between the centers of two boxes.
    #[inline]
    pub fn center_distance(&self, other: &FaceBox) -> f32 {
        nalgebra::distance(&self.center(), &other.center())
    }

    /// Per-coordinate exponential smoothing toward `target`, rounded to pixels.
    pub fn blend(&self, target: &FaceBox, alpha: f32) -> FaceBox {
        let mix = |cur: i32, raw: i32| {
            (cur as f32 * (1.0 - alpha) + raw as f32 * alpha).round() as i32
        };
        FaceBox::new(
            mix(self.top, target.top),
            mix(self.right, target.right),
            mix(self.bottom, target.bottom),
            mix(self.left, target.left),
        )
    }

    /// Shift the box by `offset` (x, y), rounded to pixels.
    pub fn translate(&self, offset: &Vector2<f32>) -> FaceBox {
        let dx = offset.x.round() as i32;
        let dy = offset.y.round() as i32;
        FaceBox::new(
            self.top.saturating_add(dy),
            self.right.saturating_add(dx),
            self.bottom.saturating_add(dy),
            self.left.saturating_add(dx),
        )
    }
}
