//! Video frame sources.

use crate::{Error, Result};
use log::{info, warn};
use opencv::{
    core::Mat,
    prelude::*,
    videoio::{self, VideoCapture, CAP_PROP_BUFFERSIZE},
};
use std::fmt;
use std::str::FromStr;

/// Yields successive frames on demand.
///
/// "No frame available" is reported as `Ok(false)` from [`FrameSource::read`],
/// not as an error.
pub trait FrameSource: Send {
    /// Open the underlying device or stream
    fn open(&mut self) -> Result<()>;

    fn is_open(&self) -> bool;

    /// Read the next frame into `frame`, returning whether one was produced
    fn read(&mut self, frame: &mut Mat) -> Result<bool>;

    fn release(&mut self) -> Result<()>;
}

/// Where frames come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoSourceSpec {
    /// Webcam index
    Camera(i32),
    /// Video file path or stream URL
    Path(String),
}

impl FromStr for VideoSourceSpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::InvalidInput("video source must not be empty".to_string()));
        }
        Ok(s.parse::<i32>()
            .map_or_else(|_| Self::Path(s.to_string()), Self::Camera))
    }
}

impl fmt::Display for VideoSourceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Camera(index) => write!(f, "camera {index}"),
            Self::Path(path) => write!(f, "{path}"),
        }
    }
}

/// [`FrameSource`] backed by an OpenCV `VideoCapture`
pub struct CaptureSource {
    spec: VideoSourceSpec,
    capture: Option<VideoCapture>,
}

impl CaptureSource {
    #[must_use]
    pub fn new(spec: VideoSourceSpec) -> Self {
        Self { spec, capture: None }
    }

    #[must_use]
    pub fn spec(&self) -> &VideoSourceSpec {
        &self.spec
    }
}

impl FrameSource for CaptureSource {
    fn open(&mut self) -> Result<()> {
        info!("Opening {}", self.spec);
        let capture = match &self.spec {
            VideoSourceSpec::Camera(index) => {
                let mut cap = VideoCapture::new(*index, videoio::CAP_ANY)?;
                // Lower latency on live cameras
                if let Err(e) = cap.set(CAP_PROP_BUFFERSIZE, 1.0) {
                    warn!("Failed to set camera buffer size: {}", e);
                }
                cap
            }
            VideoSourceSpec::Path(path) => VideoCapture::from_file(path, videoio::CAP_ANY)?,
        };

        if !capture.is_opened()? {
            return Err(Error::VideoSource(format!("cannot open {}", self.spec)));
        }
        self.capture = Some(capture);
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.capture
            .as_ref()
            .is_some_and(|capture| capture.is_opened().unwrap_or(false))
    }

    fn read(&mut self, frame: &mut Mat) -> Result<bool> {
        let Some(capture) = self.capture.as_mut() else {
            return Ok(false);
        };
        let grabbed = capture.read(frame)?;
        Ok(grabbed && !frame.empty())
    }

    fn release(&mut self) -> Result<()> {
        if let Some(mut capture) = self.capture.take() {
            capture.release()?;
        }
        Ok(())
    }
}
