//! Consumer session: replicate the received eye state onto a render surface.

use crate::animation::{Eye, EyeAnimator, EyeState};
use crate::channel::EyeReplica;
use crate::config::AnimationConfig;
use crate::shutdown::ShutdownToken;
use crate::transport::StateSubscriber;
use crossbeam_channel::{select, tick};
use log::{debug, info, warn};
use std::time::{Duration, Instant};

/// Something that draws an eye
pub trait RenderSurface {
    fn render(&mut self, state: &EyeState);
}

/// Surface that logs the selected eye
#[derive(Debug)]
pub struct LogSurface {
    eye: Eye,
    frames: u64,
}

impl LogSurface {
    #[must_use]
    pub fn new(eye: Eye) -> Self {
        Self { eye, frames: 0 }
    }

    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl RenderSurface for LogSurface {
    fn render(&mut self, state: &EyeState) {
        self.frames += 1;
        let gaze = state.gaze(self.eye);
        debug!(
            "{:?} eye: gaze {:.3},{:.3} eyelid {:.3}",
            self.eye, gaze.x, gaze.y, state.eyelid_closure
        );
    }
}

/// Applies received messages and repaints the surface when asked to.
///
/// A local animator keeps the eye alive until the first valid message
/// arrives; from then on only the producer moves the eye.
pub struct EyeDisplay<S: RenderSurface> {
    subscriber: StateSubscriber,
    replica: EyeReplica,
    local: Option<EyeAnimator>,
    surface: S,
    tick_interval: Duration,
    rejected: u64,
    last_rendered: Option<EyeState>,
}

impl<S: RenderSurface> EyeDisplay<S> {
    /// Create a display; `local_idle` enables animation until the producer is heard
    pub fn new(subscriber: StateSubscriber, surface: S, config: &AnimationConfig, local_idle: bool) -> Self {
        Self {
            subscriber,
            replica: EyeReplica::new(),
            local: local_idle.then(|| EyeAnimator::new(config.clone())),
            surface,
            tick_interval: config.tick_interval(),
            rejected: 0,
            last_rendered: None,
        }
    }

    #[must_use]
    pub fn surface(&self) -> &S {
        &self.surface
    }

    #[must_use]
    pub fn replica(&self) -> &EyeReplica {
        &self.replica
    }

    /// Whether the local idle animation is still running
    #[must_use]
    pub fn is_animating_locally(&self) -> bool {
        self.local.is_some()
    }

    /// Number of messages that failed to decode
    #[must_use]
    pub fn rejected(&self) -> u64 {
        self.rejected
    }

    /// Apply every pending message in arrival order, or step the local
    /// animation if none arrived.
    ///
    /// The surface is repainted once per tick when any applied message asked
    /// for it or the replicated state moved away from the last painted one.
    pub fn tick(&mut self, now: Instant) {
        let messages = self.subscriber.drain();
        if messages.is_empty() {
            if let Some(animator) = self.local.as_mut() {
                let state = animator.step(now);
                if state.update_requested {
                    self.render(state);
                }
            }
            return;
        }

        let mut repaint = false;
        for message in &messages {
            match self.replica.apply(message) {
                Ok(state) => {
                    if self.local.take().is_some() {
                        info!("Producer detected, local animation stopped");
                    }
                    if state.motion_detected {
                        info!(
                            "Motion detected at {:.3},{:.3}",
                            state.gaze_left.x, state.gaze_left.y
                        );
                    }
                    repaint |= state.update_requested;
                }
                Err(e) => {
                    self.rejected += 1;
                    warn!("Discarding message: {}", e);
                }
            }
        }

        let state = self.replica.state();
        if repaint || self.last_rendered.is_some_and(|last| last.differs_visibly(&state)) {
            self.render(state);
        }
    }

    fn render(&mut self, state: EyeState) {
        self.surface.render(&state);
        self.last_rendered = Some(state);
    }

    /// Tick until `shutdown` fires
    pub fn run(&mut self, shutdown: &ShutdownToken) {
        info!("Display loop started, ticking every {:?}", self.tick_interval);
        let ticker = tick(self.tick_interval);
        loop {
            select! {
                recv(ticker) -> now => self.tick(now.unwrap_or_else(|_| Instant::now())),
                recv(shutdown.receiver()) -> _ => break,
            }
        }
        info!(
            "Display loop stopped after {} messages, {} rejected",
            self.replica.received(),
            self.rejected
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::GazePoint;
    use crate::transport::StatePublisher;
    use std::net::Ipv4Addr;
    use std::net::UdpSocket;
    use std::thread;

    #[derive(Default)]
    struct RecordingSurface {
        frames: Vec<EyeState>,
    }

    impl RenderSurface for RecordingSurface {
        fn render(&mut self, state: &EyeState) {
            self.frames.push(*state);
        }
    }

    fn display(local_idle: bool) -> (EyeDisplay<RecordingSurface>, StatePublisher) {
        let subscriber = StateSubscriber::bind((Ipv4Addr::LOCALHOST, 0).into()).unwrap();
        let publisher = StatePublisher::to_address(subscriber.local_addr().unwrap()).unwrap();
        let display = EyeDisplay::new(
            subscriber,
            RecordingSurface::default(),
            &AnimationConfig::default(),
            local_idle,
        );
        (display, publisher)
    }

    // Tick until the replica has applied `count` messages or rejected one
    fn tick_until_received(display: &mut EyeDisplay<RecordingSurface>, count: u64) {
        let deadline = Instant::now() + Duration::from_secs(2);
        while display.replica().received() < count && display.rejected() == 0 && Instant::now() < deadline {
            display.tick(Instant::now());
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_first_message_stops_local_animation() {
        let (mut display, mut publisher) = display(true);
        assert!(display.is_animating_locally());

        let state = EyeState {
            gaze_left: GazePoint::new(0.5, 0.5),
            gaze_right: GazePoint::new(0.5, 0.5),
            eyelid_closure: 0.0,
            update_requested: true,
            motion_detected: true,
        };
        publisher.publish(&state);
        tick_until_received(&mut display, 1);

        assert!(!display.is_animating_locally());
        assert_eq!(display.replica().state(), state);
        assert_eq!(display.surface().frames.last(), Some(&state));
    }

    #[test]
    fn test_surface_skipped_without_update_request() {
        let (mut display, mut publisher) = display(false);
        let state = EyeState {
            eyelid_closure: 0.4,
            update_requested: false,
            ..EyeState::default()
        };
        publisher.publish(&state);
        tick_until_received(&mut display, 1);

        assert_eq!(display.replica().state(), state);
        assert!(display.surface().frames.is_empty());
    }

    #[test]
    fn test_malformed_message_keeps_last_state() {
        let (mut display, mut publisher) = display(false);
        let state = EyeState {
            eyelid_closure: 0.7,
            update_requested: true,
            ..EyeState::default()
        };
        publisher.publish(&state);
        tick_until_received(&mut display, 1);

        let raw = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
        raw.send_to(&[1, 2, 3], publisher.destination()).unwrap();
        tick_until_received(&mut display, 2);

        assert_eq!(display.rejected(), 1);
        assert_eq!(display.replica().state(), state);
    }

    #[test]
    fn test_render_request_survives_later_quiet_message() {
        let (mut display, mut publisher) = display(false);
        let detected = EyeState {
            gaze_left: GazePoint::new(0.5, 0.5),
            gaze_right: GazePoint::new(0.5, 0.5),
            eyelid_closure: 0.0,
            update_requested: true,
            motion_detected: true,
        };
        let quiet = EyeState {
            update_requested: false,
            motion_detected: false,
            ..detected
        };
        publisher.publish(&detected);
        publisher.publish(&quiet);
        thread::sleep(Duration::from_millis(100));

        display.tick(Instant::now());

        assert_eq!(display.replica().received(), 2);
        assert_eq!(display.surface().frames.len(), 1);
        assert_eq!(display.surface().frames[0].gaze_left, GazePoint::new(0.5, 0.5));
    }

    #[test]
    fn test_changed_state_repainted_without_request() {
        let (mut display, mut publisher) = display(false);
        let first = EyeState {
            eyelid_closure: 0.2,
            update_requested: true,
            ..EyeState::default()
        };
        publisher.publish(&first);
        tick_until_received(&mut display, 1);
        assert_eq!(display.surface().frames.len(), 1);

        let moved = EyeState {
            eyelid_closure: 0.6,
            update_requested: false,
            ..EyeState::default()
        };
        publisher.publish(&moved);
        tick_until_received(&mut display, 2);

        assert_eq!(display.surface().frames.len(), 2);
        assert_eq!(display.surface().frames[1].eyelid_closure, 0.6);

        // Unchanged and unrequested: nothing to paint
        publisher.publish(&moved);
        tick_until_received(&mut display, 3);
        assert_eq!(display.surface().frames.len(), 2);
    }

    #[test]
    fn test_no_idle_means_no_local_frames() {
        let (mut display, _publisher) = display(false);
        display.tick(Instant::now());
        assert!(!display.is_animating_locally());
        assert!(display.surface().frames.is_empty());
    }

    #[test]
    fn test_log_surface_counts_frames() {
        let mut surface = LogSurface::new(Eye::Right);
        surface.render(&EyeState::default());
        assert_eq!(surface.frames(), 1);
    }
}
