//! Per-axis animation phases and easing curves.

use super::state::Interpolate;
use std::time::{Duration, Instant};

/// Smoothstep ease `3f² - 2f³`, with `f` clamped to `[0, 1]`
#[must_use]
pub fn smoothstep(fraction: f64) -> f64 {
    let f = fraction.clamp(0.0, 1.0);
    3.0 * f * f - 2.0 * f * f * f
}

/// Asymmetric blink waveform.
///
/// The first third of the blink closes from `start` to fully closed, the
/// remaining two thirds reopen from fully closed to `destination`.
#[must_use]
pub fn blink_level(start: f64, destination: f64, progress: f64) -> f64 {
    if progress <= 1.0 / 3.0 {
        start.lerp(1.0, 3.0 * progress)
    } else {
        1.0_f64.lerp(destination, 1.5 * progress - 0.5)
    }
}

/// An in-flight move from `start` to `destination`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition<T> {
    pub start: T,
    pub destination: T,
    pub started_at: Instant,
    pub duration: Duration,
}

impl<T: Interpolate> Transition<T> {
    #[must_use]
    pub fn new(start: T, destination: T, started_at: Instant, duration: Duration) -> Self {
        Self {
            start,
            destination,
            started_at,
            duration,
        }
    }

    /// Elapsed fraction of the planned duration, unclamped
    #[must_use]
    pub fn fraction(&self, now: Instant) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        now.saturating_duration_since(self.started_at).as_secs_f64() / self.duration.as_secs_f64()
    }

    #[must_use]
    pub fn is_complete(&self, now: Instant) -> bool {
        self.fraction(now) >= 1.0
    }
}

/// Phase of one animated attribute (gaze or eyelid)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnimationPhase<T> {
    /// Resting at the current value
    Idle,
    /// Moving along a transition
    Transitioning(Transition<T>),
}

impl<T> AnimationPhase<T> {
    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}
