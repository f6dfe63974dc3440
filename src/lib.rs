//! Animatronic eyes driven by camera motion detection.
//!
//! The producer side watches a video source, finds the moving subject by frame
//! differencing and turns its position into a gaze target. Between detections
//! the eyes wander and blink on their own. Every animation tick the eye state is
//! multicast as a fixed 42-byte message, and any number of displays replicate it.
//!
//! The pipeline consists of:
//! 1. Motion detection on a down-scaled grayscale frame pair
//! 2. Mapping the detection to gaze coordinates through a fitted polynomial
//! 3. Idle animation with gaze and blink overrides
//! 4. Fixed-layout encoding and UDP multicast of the state
//!
//! # Examples
//!
//! ## Detecting motion
//!
//! ```no_run
//! use animatronic_eyes::config::DetectionConfig;
//! use animatronic_eyes::motion::MotionDetector;
//! use opencv::{prelude::*, videoio::{self, VideoCapture}};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut capture = VideoCapture::new(0, videoio::CAP_ANY)?;
//! let mut detector = MotionDetector::new(&DetectionConfig::default())?;
//!
//! let mut frame = opencv::core::Mat::default();
//! while capture.read(&mut frame)? {
//!     if let Some(detection) = detector.process(&frame)? {
//!         println!("subject at {},{}", detection.target.x, detection.target.y);
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Animating and publishing
//!
//! ```no_run
//! use animatronic_eyes::animation::{EyeAnimator, GazePoint};
//! use animatronic_eyes::config::Config;
//! use animatronic_eyes::coordinate::{pixel_to_gaze, MotionTarget};
//! use animatronic_eyes::transport::StatePublisher;
//! use std::time::Instant;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::default();
//! let mut animator = EyeAnimator::new(config.animation.clone());
//! let mut publisher = StatePublisher::new(&config.transport)?;
//!
//! animator.step(Instant::now());
//! let (x, y) = pixel_to_gaze(MotionTarget::new(160, 120));
//! animator.force_gaze(GazePoint::new(x, y));
//! publisher.publish(&animator.state());
//! # Ok(())
//! # }
//! ```

/// Eye animation state machine
pub mod animation;

/// Wire format of the eye state
pub mod channel;

/// Configuration management
pub mod config;

/// Constants used throughout the application
pub mod constants;

/// Pixel to gaze coordinate transform
pub mod coordinate;

/// Consumer session
pub mod display;

/// Error types and result handling
pub mod error;

/// Single-slot detection hand-off
pub mod mailbox;

/// Motion detection pipeline
pub mod motion;

/// Process termination signal
pub mod shutdown;

/// Fixed-window moving average
pub mod smoothed_average;

/// Producer session
pub mod tracker;

/// UDP multicast transport
pub mod transport;

pub use error::{Error, Result};
