//! Producer session: detection worker, animation loop and state publishing.

use crate::animation::{EyeAnimator, EyeState, GazePoint};
use crate::config::Config;
use crate::coordinate::{pixel_to_gaze, MotionTarget};
use crate::mailbox::DetectionMailbox;
use crate::motion::{DetectionWorker, FrameSource};
use crate::shutdown::Shutdown;
use crate::transport::StatePublisher;
use crate::{Error, Result};
use crossbeam_channel::{select, tick, RecvTimeoutError};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::Rng;
use std::thread;
use std::time::{Duration, Instant};

/// Drives the eye animation from detections and multicasts every tick
pub struct TrackerApp<R: Rng = StdRng> {
    animator: EyeAnimator<R>,
    mailbox: DetectionMailbox,
    publisher: StatePublisher,
    tick_interval: Duration,
    idle_resume_delay: Duration,
    shutdown_timeout: Duration,
    resume_at: Option<Instant>,
    ticks: u64,
}

impl TrackerApp<StdRng> {
    #[must_use]
    pub fn new(config: &Config, publisher: StatePublisher) -> Self {
        Self::with_animator(config, EyeAnimator::new(config.animation.clone()), publisher)
    }
}

impl<R: Rng> TrackerApp<R> {
    pub fn with_animator(config: &Config, animator: EyeAnimator<R>, publisher: StatePublisher) -> Self {
        Self {
            animator,
            mailbox: DetectionMailbox::new(),
            publisher,
            tick_interval: config.animation.tick_interval(),
            idle_resume_delay: config.tracking.idle_resume_delay(),
            shutdown_timeout: config.tracking.shutdown_timeout(),
            resume_at: None,
            ticks: 0,
        }
    }

    /// Handle used by the detection worker to deliver detections
    #[must_use]
    pub fn mailbox(&self) -> DetectionMailbox {
        self.mailbox.clone()
    }

    #[must_use]
    pub fn animator(&self) -> &EyeAnimator<R> {
        &self.animator
    }

    /// When idle gaze resumes, if a detection is holding it
    #[must_use]
    pub fn resume_deadline(&self) -> Option<Instant> {
        self.resume_at
    }

    /// Advance the animation by one tick and publish the result.
    ///
    /// A pending detection is applied after stepping so that it overrides any
    /// idle transition and the published state carries `motion_detected`.
    pub fn tick(&mut self, now: Instant) -> EyeState {
        self.animator.step(now);

        if let Some(target) = self.mailbox.take() {
            self.apply_detection(target, now);
        } else if self.resume_at.is_some_and(|deadline| now >= deadline) {
            info!("No motion for {:?}, resuming idle gaze", self.idle_resume_delay);
            self.animator.resume_idle_gaze();
            self.resume_at = None;
        }

        let state = self.animator.state();
        self.publisher.publish(&state);
        self.ticks += 1;
        state
    }

    fn apply_detection(&mut self, target: MotionTarget, now: Instant) {
        let (x, y) = pixel_to_gaze(target);
        debug!("Detection at {},{} -> gaze {:.3},{:.3}", target.x, target.y, x, y);
        self.animator.force_gaze(GazePoint::new(x, y));
        self.animator.suspend_idle_gaze();
        self.resume_at = Some(now + self.idle_resume_delay);
    }

    /// Run the detection worker and the animation loop until `shutdown` fires.
    ///
    /// The worker thread is given the shutdown timeout to finish; after that it
    /// is left to exit on its own.
    pub fn run<S>(&mut self, worker: DetectionWorker<S>, shutdown: &Shutdown) -> Result<()>
    where
        S: FrameSource + 'static,
    {
        let token = shutdown.token();
        let (done_tx, done_rx) = crossbeam_channel::bounded::<()>(1);
        let mailbox = self.mailbox();
        let worker_token = token.clone();
        let mut worker = worker;

        let handle = thread::Builder::new()
            .name("detection".to_string())
            .spawn(move || {
                worker.run(&worker_token, |target| mailbox.post(target));
                let _ = done_tx.send(());
            })
            .map_err(Error::Io)?;

        info!("Animation loop started, ticking every {:?}", self.tick_interval);
        let ticker = tick(self.tick_interval);
        loop {
            select! {
                recv(ticker) -> now => {
                    self.tick(now.unwrap_or_else(|_| Instant::now()));
                }
                recv(token.receiver()) -> _ => break,
            }
        }
        info!("Animation loop stopped after {} ticks", self.ticks);

        // The worker only exits on shutdown
        shutdown.trigger();
        match done_rx.recv_timeout(self.shutdown_timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                if handle.join().is_err() {
                    warn!("Detection thread panicked");
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                warn!(
                    "Detection thread did not stop within {:?}, detaching",
                    self.shutdown_timeout
                );
            }
        }
        Ok(())
    }
}
