//! Frame differencing motion detector.

use crate::config::{ContourSelection, DetectionConfig};
use crate::coordinate::MotionTarget;
use crate::{Error, Result};
use log::trace;
use opencv::{
    core::{self, Mat, Point, Rect, Size, Vector, BORDER_DEFAULT},
    imgproc,
    prelude::*,
};

/// A subject found in the analysis frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    /// Center of the bounding box
    pub target: MotionTarget,
    /// Bounding box of the selected contour
    pub bbox: Rect,
}

impl Detection {
    fn from_bbox(bbox: Rect) -> Self {
        Self {
            target: MotionTarget::new(bbox.x + bbox.width / 2, bbox.y + bbox.height / 2),
            bbox,
        }
    }
}

/// Reports at most one moving subject per processed frame.
///
/// The previous grayscale analysis frame is kept as the background model. The
/// first frame after construction or [`MotionDetector::reset`] only seeds it.
pub struct MotionDetector {
    analysis_size: Size,
    sensitivity: f64,
    blur_size: i32,
    selection: ContourSelection,
    mirrored: bool,
    background: Option<Mat>,
    // Work buffers reused across frames
    input: Mat,
    resized: Mat,
    gray: Mat,
    diff: Mat,
    mask: Mat,
    blurred: Mat,
}

impl MotionDetector {
    /// Create a detector from the detection settings
    pub fn new(config: &DetectionConfig) -> Result<Self> {
        if config.analysis_width <= 0 || config.analysis_height <= 0 {
            return Err(Error::InvalidInput(format!(
                "analysis size must be positive, got {}x{}",
                config.analysis_width, config.analysis_height
            )));
        }
        if config.blur_size <= 0 {
            return Err(Error::InvalidInput(format!(
                "blur size must be positive, got {}",
                config.blur_size
            )));
        }

        Ok(Self {
            analysis_size: Size::new(config.analysis_width, config.analysis_height),
            sensitivity: config.sensitivity,
            blur_size: config.blur_size,
            selection: config.contour_selection,
            mirrored: config.mirrored,
            background: None,
            input: Mat::default(),
            resized: Mat::default(),
            gray: Mat::default(),
            diff: Mat::default(),
            mask: Mat::default(),
            blurred: Mat::default(),
        })
    }

    /// Whether a background frame has been seeded
    #[must_use]
    pub fn has_background(&self) -> bool {
        self.background.is_some()
    }

    /// Drop the background model; the next frame seeds it again
    pub fn reset(&mut self) {
        self.background = None;
    }

    /// The last frame scaled to the analysis size, before grayscale conversion
    #[must_use]
    pub fn analysis_frame(&self) -> &Mat {
        &self.resized
    }

    /// Analyze one frame against the background model.
    ///
    /// The background is replaced by this frame whether or not a subject was found.
    pub fn process(&mut self, frame: &Mat) -> Result<Option<Detection>> {
        if frame.empty() {
            return Err(Error::InvalidInput("empty frame".to_string()));
        }

        self.prepare(frame)?;

        let detection = match self.background.as_ref() {
            Some(background) => {
                core::absdiff(background, &self.gray, &mut self.diff)?;
                imgproc::threshold(&self.diff, &mut self.mask, self.sensitivity, 255.0, imgproc::THRESH_BINARY)?;
                imgproc::blur(
                    &self.mask,
                    &mut self.blurred,
                    Size::new(self.blur_size, self.blur_size),
                    Point::new(-1, -1),
                    BORDER_DEFAULT,
                )?;
                imgproc::threshold(&self.blurred, &mut self.mask, self.sensitivity, 255.0, imgproc::THRESH_BINARY)?;
                self.search_for_movement()?
            }
            None => {
                trace!("Seeding background model");
                None
            }
        };

        // Swap keeps both buffers allocated for the next frame
        match self.background.as_mut() {
            Some(background) => std::mem::swap(background, &mut self.gray),
            None => self.background = Some(std::mem::take(&mut self.gray)),
        }

        Ok(detection)
    }

    /// Scale, mirror and convert the incoming frame to grayscale
    fn prepare(&mut self, frame: &Mat) -> Result<()> {
        let source = if self.mirrored {
            core::flip(frame, &mut self.input, 1)?;
            &self.input
        } else {
            frame
        };

        imgproc::resize(source, &mut self.resized, self.analysis_size, 0.0, 0.0, imgproc::INTER_AREA)?;

        if self.resized.channels() == 1 {
            self.resized.copy_to(&mut self.gray)?;
        } else {
            imgproc::cvt_color(&self.resized, &mut self.gray, imgproc::COLOR_BGR2GRAY, 0)?;
        }
        Ok(())
    }

    /// Pick one external contour of the binary mask and return its bounding box
    fn search_for_movement(&self) -> Result<Option<Detection>> {
        let mut contours = Vector::<Vector<Point>>::new();
        imgproc::find_contours(
            &self.mask,
            &mut contours,
            imgproc::RETR_EXTERNAL,
            imgproc::CHAIN_APPROX_SIMPLE,
            Point::new(0, 0),
        )?;

        if contours.is_empty() {
            return Ok(None);
        }

        let index = match self.selection {
            ContourSelection::Last => contours.len() - 1,
            ContourSelection::LargestArea => {
                let mut best = (0, f64::MIN);
                for (index, contour) in contours.iter().enumerate() {
                    let area = imgproc::contour_area(&contour, false)?;
                    if area > best.1 {
                        best = (index, area);
                    }
                }
                best.0
            }
        };
        debug_assert!(index < contours.len());

        let contour = contours.get(index)?;
        let bbox = imgproc::bounding_rect(&contour)?;
        trace!("Selected contour {} of {} with bbox {:?}", index, contours.len(), bbox);

        Ok(Some(Detection::from_bbox(bbox)))
    }
}
