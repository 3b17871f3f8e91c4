//! Exponential smoothing of matched boxes and velocity dead-reckoning for
//! unmatched ones.

use nalgebra::Vector2;

use crate::tracker::config::TrackerConfig;
use crate::tracker::rect::FaceBox;

#[derive(Debug, Clone)]
pub struct MotionModel {
    smoothing_factor: f32,
    decay_factor: f32,
    max_speed: f32,
    rapid_threshold: f32,
    rapid_damping: f32,
}

impl Default for MotionModel {
    fn default() -> Self {
        Self::new(&TrackerConfig::default())
    }
}

impl MotionModel {
    pub fn new(config: &TrackerConfig) -> Self {
        Self {
            smoothing_factor: config.smoothing_factor,
            decay_factor: config.decay_factor,
            max_speed: config.max_tracking_speed,
            rapid_threshold: config.rapid_movement_threshold,
            rapid_damping: config.rapid_movement_damping,
        }
    }

    /// Blend a new measurement into the smoothed box.
    ///
    /// Returns the new smoothed box and the velocity, i.e. the displacement of
    /// the smoothed center.
    pub fn update(&self, smoothed: &FaceBox, measurement: &FaceBox) -> (FaceBox, Vector2<f32>) {
        let new_smoothed = smoothed.blend(measurement, self.smoothing_factor);
        let velocity = new_smoothed.center() - smoothed.center();
        (new_smoothed, velocity)
    }

    /// Extrapolate one frame without a measurement.
    ///
    /// Returns the shifted smoothed box, the shifted raw box and the decayed
    /// velocity.
    pub fn predict(
        &self,
        smoothed: &FaceBox,
        raw: &FaceBox,
        velocity: &Vector2<f32>,
    ) -> (FaceBox, FaceBox, Vector2<f32>) {
        let mut v = *velocity;

        let speed = v.norm();
        if speed > self.max_speed {
            v *= self.max_speed / speed;
        }
        if v.norm() > self.rapid_threshold {
            v *= self.rapid_damping;
        }

        let shift = v * self.decay_factor;
        (smoothed.translate(&shift), raw.translate(&shift), shift)
    }
}
