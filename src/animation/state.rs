//! Eye animation state shared between the animator, the wire codec and the renderer.

/// Horizontal gaze domain
pub const GAZE_X_MIN: f64 = -1.0;
pub const GAZE_X_MAX: f64 = 1.0;

/// Vertical gaze domain, the eyes never look upwards
pub const GAZE_Y_MIN: f64 = 0.0;
pub const GAZE_Y_MAX: f64 = 1.0;

/// Eyelid closure domain, 0 = fully open, 1 = fully closed
pub const EYELID_OPEN: f64 = 0.0;
pub const EYELID_CLOSED: f64 = 1.0;

/// Clamp `value` into `[min, max]`, mapping NaN to `min`
#[must_use]
pub fn bounded(min: f64, value: f64, max: f64) -> f64 {
    if value.is_nan() {
        return min;
    }
    value.clamp(min, max)
}

/// Linear interpolation between two values of the same kind
pub trait Interpolate: Copy {
    /// `factor` 0 yields `self`, 1 yields `to`
    #[must_use]
    fn lerp(self, to: Self, factor: f64) -> Self;
}

impl Interpolate for f64 {
    fn lerp(self, to: Self, factor: f64) -> Self {
        (1.0 - factor) * self + factor * to
    }
}

/// Normalized gaze direction
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GazePoint {
    pub x: f64,
    pub y: f64,
}

impl GazePoint {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Clamp into the gaze domain
    #[must_use]
    pub fn clamped(self) -> Self {
        Self {
            x: bounded(GAZE_X_MIN, self.x, GAZE_X_MAX),
            y: bounded(GAZE_Y_MIN, self.y, GAZE_Y_MAX),
        }
    }
}

impl Interpolate for GazePoint {
    fn lerp(self, to: Self, factor: f64) -> Self {
        Self {
            x: self.x.lerp(to.x, factor),
            y: self.y.lerp(to.y, factor),
        }
    }
}

/// Which of the two eyes a renderer draws
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eye {
    Left,
    Right,
}

/// Snapshot of both eyes, produced every animation tick
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EyeState {
    /// Gaze of the left eye
    pub gaze_left: GazePoint,
    /// Gaze of the right eye
    pub gaze_right: GazePoint,
    /// Eyelid closure in `[0, 1]`
    pub eyelid_closure: f64,
    /// Set on ticks where a visible attribute changed
    pub update_requested: bool,
    /// Set only on the tick that carries a fresh detection
    pub motion_detected: bool,
}

impl EyeState {
    /// Clamp every scalar into its domain
    #[must_use]
    pub fn clamped(self) -> Self {
        Self {
            gaze_left: self.gaze_left.clamped(),
            gaze_right: self.gaze_right.clamped(),
            eyelid_closure: bounded(EYELID_OPEN, self.eyelid_closure, EYELID_CLOSED),
            ..self
        }
    }

    #[must_use]
    pub fn gaze(&self, eye: Eye) -> GazePoint {
        match eye {
            Eye::Left => self.gaze_left,
            Eye::Right => self.gaze_right,
        }
    }

    /// True when gaze or eyelid differ, ignoring the flags
    #[must_use]
    pub fn differs_visibly(&self, other: &Self) -> bool {
        self.gaze_left != other.gaze_left
            || self.gaze_right != other.gaze_right
            || self.eyelid_closure != other.eyelid_closure
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounded() {
        assert_eq!(bounded(0.0, 0.5, 1.0), 0.5);
        assert_eq!(bounded(0.0, -0.5, 1.0), 0.0);
        assert_eq!(bounded(0.0, 1.5, 1.0), 1.0);
        assert_eq!(bounded(-1.0, f64::NAN, 1.0), -1.0);
    }

    #[test]
    fn test_gaze_clamped_never_looks_up() {
        let gaze = GazePoint::new(-3.0, -0.2).clamped();
        assert_eq!(gaze, GazePoint::new(-1.0, 0.0));

        let gaze = GazePoint::new(0.25, 4.0).clamped();
        assert_eq!(gaze, GazePoint::new(0.25, 1.0));
    }

    #[test]
    fn test_lerp_endpoints() {
        let from = GazePoint::new(-0.5, 0.1);
        let to = GazePoint::new(0.75, 0.9);
        assert_eq!(from.lerp(to, 0.0), from);
        assert_eq!(from.lerp(to, 1.0), to);
        assert_eq!(0.2_f64.lerp(1.0, 0.5), 0.6);
    }

    #[test]
    fn test_state_clamped_keeps_flags() {
        let state = EyeState {
            gaze_left: GazePoint::new(2.0, 2.0),
            gaze_right: GazePoint::new(-2.0, -2.0),
            eyelid_closure: 1.5,
            update_requested: true,
            motion_detected: true,
        }
        .clamped();

        assert_eq!(state.gaze_left, GazePoint::new(1.0, 1.0));
        assert_eq!(state.gaze_right, GazePoint::new(-1.0, 0.0));
        assert_eq!(state.eyelid_closure, 1.0);
        assert!(state.update_requested);
        assert!(state.motion_detected);
    }
}
