//! Pixel to gaze coordinate transform.
//!
//! Detections in the analysis frame are scaled to a 1280x1024 reference frame
//! and mapped through an empirically fitted second-order polynomial.

use crate::animation::state::bounded;
use crate::constants::{REFERENCE_SCALE, REFERENCE_Y_OFFSET};

/// A detected subject position in analysis-frame pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MotionTarget {
    pub x: i32,
    pub y: i32,
}

impl MotionTarget {
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Scale analysis pixels to the 1280x1024 reference frame
#[must_use]
pub fn to_reference_frame(target: MotionTarget) -> (f64, f64) {
    let x = f64::from(target.x) * REFERENCE_SCALE;
    let y = (f64::from(target.y) + REFERENCE_Y_OFFSET) * REFERENCE_SCALE;
    (x, y)
}

/// Map a detection to gaze coordinates, both clamped to `[-1, 1]`
#[must_use]
pub fn pixel_to_gaze(target: MotionTarget) -> (f64, f64) {
    let (x, y) = to_reference_frame(target);

    let x_eye = -2.10554 + x * (0.003_629_59 - 2.893_24e-7 * x - 2.248_93e-6 * y) + 0.001_456_56 * y;
    let y_eye = -0.383_554 + x * (0.000_500_975 - 3.047_59e-7 * x + 1.123_33e-7 * y) + 0.002_257_04 * y;

    (bounded(-1.0, x_eye, 1.0), bounded(-1.0, y_eye, 1.0))
}
