//! Periodic detection loop.

use crate::config::{DetectionConfig, RecordingConfig};
use crate::coordinate::MotionTarget;
use crate::motion::detector::{Detection, MotionDetector};
use crate::motion::recorder::DetectionRecorder;
use crate::motion::source::FrameSource;
use crate::shutdown::ShutdownToken;
use crate::smoothed_average::SmoothedAverage;
use crate::Result;
use crossbeam_channel::{select, tick};
use log::{debug, info, warn};
use opencv::core::{Mat, Size};
use std::time::{Duration, Instant};

/// Counters logged with every detection
#[derive(Debug)]
pub struct Telemetry {
    /// Frames read from the source
    pub frames: u64,
    /// Frames that produced a detection
    pub detections: u64,
    latency_ms: SmoothedAverage,
}

impl Telemetry {
    fn new(window: usize) -> Self {
        Self {
            frames: 0,
            detections: 0,
            latency_ms: SmoothedAverage::new(window),
        }
    }

    /// Average processing time per frame in milliseconds
    #[must_use]
    pub fn average_latency_ms(&self) -> f64 {
        self.latency_ms.average()
    }

    /// Frame rate the pipeline could sustain at the average latency
    #[must_use]
    pub fn achievable_fps(&self) -> f64 {
        let avg = self.average_latency_ms();
        if avg > 0.0 {
            1000.0 / avg
        } else {
            0.0
        }
    }
}

/// Owns the frame source and the detector and runs one detection per poll.
///
/// Transient failures are logged and reported as "no detection"; they never
/// stop the loop.
pub struct DetectionWorker<S: FrameSource> {
    source: S,
    detector: MotionDetector,
    recorder: Option<DetectionRecorder>,
    poll_interval: Duration,
    frame: Mat,
    telemetry: Telemetry,
}

impl<S: FrameSource> DetectionWorker<S> {
    pub fn new(source: S, config: &DetectionConfig) -> Result<Self> {
        Ok(Self {
            source,
            detector: MotionDetector::new(config)?,
            recorder: None,
            poll_interval: config.poll_interval(),
            frame: Mat::default(),
            telemetry: Telemetry::new(config.telemetry_window),
        })
    }

    /// Attach the recorder described by `recording`, if any.
    ///
    /// Failing to open the writer is a setup failure.
    pub fn with_recording(mut self, detection: &DetectionConfig, recording: &RecordingConfig) -> Result<Self> {
        let size = Size::new(detection.analysis_width, detection.analysis_height);
        self.recorder = DetectionRecorder::from_config(recording, size)?;
        Ok(self)
    }

    #[must_use]
    pub fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }

    #[must_use]
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Run a single detection cycle
    pub fn poll(&mut self) -> Option<Detection> {
        if !self.source.is_open() {
            if let Err(e) = self.source.open() {
                warn!("Failed to open video source: {}", e);
                return None;
            }
            self.detector.reset();
        }

        match self.source.read(&mut self.frame) {
            Ok(true) => {}
            Ok(false) => {
                info!("Video source returned no frame, reopening on next poll");
                self.release_source();
                return None;
            }
            Err(e) => {
                warn!("Failed to read frame: {}", e);
                self.release_source();
                return None;
            }
        }
        self.telemetry.frames += 1;

        let seeding = !self.detector.has_background();
        let started = Instant::now();
        let detection = match self.detector.process(&self.frame) {
            Ok(detection) => detection,
            Err(e) => {
                warn!("Motion detection failed: {}", e);
                return None;
            }
        };
        if seeding {
            return None;
        }
        self.telemetry
            .latency_ms
            .add(started.elapsed().as_secs_f64() * 1000.0);

        let detection = detection?;
        self.telemetry.detections += 1;
        info!(
            "frames: {}, detections: {}, avg: {:.2}ms, {:.2}fps, x={} y={}",
            self.telemetry.frames,
            self.telemetry.detections,
            self.telemetry.average_latency_ms(),
            self.telemetry.achievable_fps(),
            detection.target.x,
            detection.target.y
        );

        if let Some(recorder) = self.recorder.as_mut() {
            if let Err(e) = recorder.record(self.detector.analysis_frame(), detection.bbox) {
                warn!("Failed to record frame: {}", e);
            }
        }

        Some(detection)
    }

    /// Poll at the configured interval until `shutdown` fires.
    ///
    /// `on_detection` is called once per detection, on the worker's thread.
    pub fn run<F>(&mut self, shutdown: &ShutdownToken, mut on_detection: F)
    where
        F: FnMut(MotionTarget),
    {
        info!("Detection loop started, polling every {:?}", self.poll_interval);
        let ticker = tick(self.poll_interval);

        loop {
            select! {
                recv(ticker) -> _ => {
                    if let Some(detection) = self.poll() {
                        on_detection(detection.target);
                    }
                }
                recv(shutdown.receiver()) -> _ => break,
            }
        }

        self.release_source();
        if let Some(recorder) = &self.recorder {
            info!("Wrote {} frames to {}", recorder.frames_written(), recorder.path().display());
        }
        info!("Detection loop stopped");
    }

    fn release_source(&mut self) {
        if let Err(e) = self.source.release() {
            debug!("Failed to release video source: {}", e);
        }
    }
}
