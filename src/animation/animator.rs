//! Idle eye animation with external overrides.
//!
//! The animator keeps two independent axes, gaze and eyelid. Each axis rests
//! for a random pause, then runs a transition to a random destination. Detected
//! motion overrides the gaze directly and can suspend idle gaze scheduling
//! until the detection feed releases it again.

use super::phase::{blink_level, smoothstep, AnimationPhase, Transition};
use super::state::{bounded, EyeState, GazePoint, Interpolate, EYELID_CLOSED, EYELID_OPEN};
use crate::config::AnimationConfig;
use log::trace;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Instant;

/// Scheduling state of one animated attribute
#[derive(Debug, Clone)]
struct Axis<T> {
    phase: AnimationPhase<T>,
    next_start: Option<Instant>,
    idle_enabled: bool,
}

impl<T> Axis<T> {
    fn new() -> Self {
        Self {
            phase: AnimationPhase::Idle,
            next_start: None,
            idle_enabled: true,
        }
    }

    /// Drop any transition and pending pause
    fn cancel(&mut self) {
        self.phase = AnimationPhase::Idle;
        self.next_start = None;
    }
}

/// Generates natural idle eye motion and accepts immediate overrides
pub struct EyeAnimator<R: Rng = StdRng> {
    config: AnimationConfig,
    rng: R,
    state: EyeState,
    gaze: Axis<GazePoint>,
    eyelid: Axis<f64>,
    last_step: Option<Instant>,
}

impl EyeAnimator<StdRng> {
    /// Create an animator seeded from the operating system
    #[must_use]
    pub fn new(config: AnimationConfig) -> Self {
        Self::with_rng(config, StdRng::from_os_rng())
    }
}

impl<R: Rng> EyeAnimator<R> {
    /// Create an animator drawing from the given random source
    pub fn with_rng(config: AnimationConfig, rng: R) -> Self {
        Self {
            config,
            rng,
            state: EyeState::default(),
            gaze: Axis::new(),
            eyelid: Axis::new(),
            last_step: None,
        }
    }

    /// Current state snapshot
    #[must_use]
    pub fn state(&self) -> EyeState {
        self.state
    }

    #[must_use]
    pub fn gaze_phase(&self) -> &AnimationPhase<GazePoint> {
        &self.gaze.phase
    }

    #[must_use]
    pub fn eyelid_phase(&self) -> &AnimationPhase<f64> {
        &self.eyelid.phase
    }

    #[must_use]
    pub fn is_idle_gaze_enabled(&self) -> bool {
        self.gaze.idle_enabled
    }

    #[must_use]
    pub fn is_idle_blink_enabled(&self) -> bool {
        self.eyelid.idle_enabled
    }

    /// Advance gaze and eyelid to `now` and return the new state.
    ///
    /// `update_requested` reflects only this tick, `motion_detected` is cleared.
    pub fn step(&mut self, now: Instant) -> EyeState {
        let before = self.state;
        self.state.update_requested = false;
        self.state.motion_detected = false;

        self.step_gaze(now);
        self.step_eyelid(now);
        self.apply_tremor();

        self.state.update_requested = self.state.differs_visibly(&before);
        self.last_step = Some(now);
        self.state
    }

    /// Look at `point` immediately, cancelling any idle gaze transition
    pub fn force_gaze(&mut self, point: GazePoint) {
        let point = point.clamped();
        self.gaze.cancel();
        self.state.gaze_left = point;
        self.state.gaze_right = point;
        self.state.update_requested = true;
        self.state.motion_detected = true;
    }

    /// Set the eyelid closure immediately, cancelling any idle blink
    pub fn force_eyelid(&mut self, closure: f64) {
        self.eyelid.cancel();
        self.state.eyelid_closure = bounded(EYELID_OPEN, closure, EYELID_CLOSED);
        self.state.update_requested = true;
    }

    /// Stop `step` from starting new idle gaze transitions
    pub fn suspend_idle_gaze(&mut self) {
        self.gaze.idle_enabled = false;
    }

    /// Allow idle gaze again, the next transition starts on the following step
    pub fn resume_idle_gaze(&mut self) {
        self.gaze.idle_enabled = true;
        self.gaze.next_start = Some(self.last_step.unwrap_or_else(Instant::now));
    }

    /// Stop `step` from starting new idle blinks
    pub fn suspend_idle_blink(&mut self) {
        self.eyelid.idle_enabled = false;
    }

    /// Allow idle blinking again after a fresh pause
    pub fn resume_idle_blink(&mut self) {
        self.eyelid.idle_enabled = true;
        self.eyelid.next_start = None;
    }

    fn step_gaze(&mut self, now: Instant) {
        if let AnimationPhase::Transitioning(transition) = self.gaze.phase {
            let gaze = if transition.is_complete(now) {
                self.gaze.phase = AnimationPhase::Idle;
                transition.destination
            } else {
                transition.start.lerp(transition.destination, smoothstep(transition.fraction(now)))
            };
            self.state.gaze_left = gaze;
            self.state.gaze_right = gaze;
        }

        if !self.gaze.phase.is_idle() || !self.gaze.idle_enabled {
            return;
        }

        match self.gaze.next_start {
            None => {
                let pause = self.config.gaze_pause.sample(&mut self.rng);
                self.gaze.next_start = Some(now + pause);
            }
            Some(start_at) if now >= start_at => {
                let destination = GazePoint::new(self.rng.random_range(-1.0..=1.0), self.rng.random_range(0.0..=1.0));
                let duration = self.config.gaze_transition.sample(&mut self.rng);
                trace!(
                    "gaze transition ({:.3},{:.3}) -> ({:.3},{:.3}) over {:?}",
                    self.state.gaze_left.x,
                    self.state.gaze_left.y,
                    destination.x,
                    destination.y,
                    duration
                );
                self.gaze.phase =
                    AnimationPhase::Transitioning(Transition::new(self.state.gaze_left, destination, now, duration));
                self.gaze.next_start = None;
            }
            Some(_) => {}
        }
    }

    fn step_eyelid(&mut self, now: Instant) {
        if let AnimationPhase::Transitioning(transition) = self.eyelid.phase {
            self.state.eyelid_closure = if transition.is_complete(now) {
                self.eyelid.phase = AnimationPhase::Idle;
                transition.destination
            } else {
                blink_level(transition.start, transition.destination, transition.fraction(now))
            };
        }

        if !self.eyelid.phase.is_idle() || !self.eyelid.idle_enabled {
            return;
        }

        match self.eyelid.next_start {
            None => {
                let pause = self.config.blink_pause.sample(&mut self.rng);
                self.eyelid.next_start = Some(now + pause);
            }
            Some(start_at) if now >= start_at => {
                let max_closure = bounded(EYELID_OPEN, self.config.max_idle_closure, EYELID_CLOSED);
                let destination = self.rng.random_range(0.0..=max_closure);
                let duration = self.config.blink_duration.sample(&mut self.rng);
                trace!(
                    "blink {:.3} -> {:.3} over {:?}",
                    self.state.eyelid_closure,
                    destination,
                    duration
                );
                self.eyelid.phase = AnimationPhase::Transitioning(Transition::new(
                    self.state.eyelid_closure,
                    destination,
                    now,
                    duration,
                ));
                self.eyelid.next_start = None;
            }
            Some(_) => {}
        }
    }

    fn apply_tremor(&mut self) {
        let amplitude = self.config.eyelid_noise;
        // Non-finite amplitudes disable the tremor
        let noise = if amplitude.is_finite() && amplitude > 0.0 {
            self.rng.random_range(-amplitude..=amplitude)
        } else {
            0.0
        };
        self.state.eyelid_closure = bounded(EYELID_OPEN, self.state.eyelid_closure + noise, EYELID_CLOSED);
    }
}
