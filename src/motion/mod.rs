//! Motion detection: frame sources, the differencing detector, recording and
//! the periodic worker.

/// Frame differencing detector
pub mod detector;

/// Recording of detection frames
pub mod recorder;

/// Video frame sources
pub mod source;

/// Periodic detection loop
pub mod worker;

pub use detector::{Detection, MotionDetector};
pub use recorder::DetectionRecorder;
pub use source::{CaptureSource, FrameSource, VideoSourceSpec};
pub use worker::{DetectionWorker, Telemetry};
