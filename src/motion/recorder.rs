//! Recording of frames that produced a detection.

use crate::config::RecordingConfig;
use crate::{Error, Result};
use chrono::{DateTime, Local};
use log::info;
use opencv::{
    core::{Mat, Rect, Scalar, Size},
    imgproc,
    prelude::*,
    videoio::VideoWriter,
};
use std::path::{Path, PathBuf};

/// Placeholder replaced by the recording start time
pub const TIMESTAMP_PLACEHOLDER: &str = "{timestamp}";

const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// Substitute the `{timestamp}` placeholder in `pattern`
#[must_use]
pub fn resolve_path(pattern: &Path, now: &DateTime<Local>) -> PathBuf {
    let stamp = now.format(TIMESTAMP_FORMAT).to_string();
    PathBuf::from(pattern.to_string_lossy().replace(TIMESTAMP_PLACEHOLDER, &stamp))
}

/// Writes analysis frames with the detection box drawn to a video file
pub struct DetectionRecorder {
    writer: VideoWriter,
    path: PathBuf,
    frame_size: Size,
    canvas: Mat,
    frames_written: u64,
}

impl DetectionRecorder {
    /// Open a writer for `path` producing color frames of `frame_size`
    pub fn create(path: &Path, fourcc: &str, fps: f64, frame_size: Size) -> Result<Self> {
        let mut chars = fourcc.chars();
        let (Some(c1), Some(c2), Some(c3), Some(c4), None) =
            (chars.next(), chars.next(), chars.next(), chars.next(), chars.next())
        else {
            return Err(Error::Recording(format!("FOURCC must be four characters, got '{fourcc}'")));
        };
        let code = VideoWriter::fourcc(c1, c2, c3, c4)?;

        let path_str = path
            .to_str()
            .ok_or_else(|| Error::Recording(format!("path is not valid UTF-8: {}", path.display())))?;
        let writer = VideoWriter::new(path_str, code, fps, frame_size, true)?;
        if !writer.is_opened()? {
            return Err(Error::Recording(format!("cannot open video writer for {}", path.display())));
        }

        info!("Recording detections to {}", path.display());
        Ok(Self {
            writer,
            path: path.to_path_buf(),
            frame_size,
            canvas: Mat::default(),
            frames_written: 0,
        })
    }

    /// Open the recorder described by `config`, if a path is configured
    pub fn from_config(config: &RecordingConfig, frame_size: Size) -> Result<Option<Self>> {
        match &config.path {
            Some(pattern) => {
                let path = resolve_path(pattern, &Local::now());
                Self::create(&path, &config.fourcc, config.fps, frame_size).map(Some)
            }
            None => Ok(None),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Append `frame` with `bbox` outlined
    pub fn record(&mut self, frame: &Mat, bbox: Rect) -> Result<()> {
        if frame.size()? != self.frame_size {
            return Err(Error::Recording(format!(
                "frame size {:?} does not match recording size {:?}",
                frame.size()?,
                self.frame_size
            )));
        }

        if frame.channels() == 1 {
            imgproc::cvt_color(frame, &mut self.canvas, imgproc::COLOR_GRAY2BGR, 0)?;
        } else {
            frame.copy_to(&mut self.canvas)?;
        }
        imgproc::rectangle(
            &mut self.canvas,
            bbox,
            Scalar::new(0.0, 255.0, 0.0, 0.0),
            2,
            imgproc::LINE_8,
            0,
        )?;
        self.writer.write(&self.canvas)?;
        self.frames_written += 1;
        Ok(())
    }
}
