//! Configuration management for the eye tracker and the eye display

use crate::constants::{
    ANALYSIS_HEIGHT, ANALYSIS_WIDTH, ANIMATION_TICK_MS, BLINK_DURATION_MAX_MS, BLINK_DURATION_MIN_MS,
    BLINK_PAUSE_MAX_MS, BLINK_PAUSE_MIN_MS, BLUR_SIZE, DETECTION_POLL_INTERVAL_MS, EYELID_NOISE_AMPLITUDE,
    GAZE_PAUSE_MAX_MS, GAZE_PAUSE_MIN_MS, GAZE_TRANSITION_MAX_MS, GAZE_TRANSITION_MIN_MS, IDLE_RESUME_DELAY_MS,
    MAX_IDLE_BLINK_CLOSURE, MULTICAST_GROUP, MULTICAST_PORT, RECORDING_FOURCC, RECORDING_FPS, SENSITIVITY_VALUE,
    SHUTDOWN_TIMEOUT_MS, TELEMETRY_WINDOW,
};
use crate::{Error, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Idle animation timing
    pub animation: AnimationConfig,

    /// Motion detection pipeline
    pub detection: DetectionConfig,

    /// Hand-over between detections and idle animation
    pub tracking: TrackingConfig,

    /// Multicast transport
    pub transport: TransportConfig,

    /// Optional recording of frames with detections
    pub recording: RecordingConfig,
}

/// Inclusive range of milliseconds sampled uniformly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MillisRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl MillisRange {
    #[must_use]
    pub const fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    /// Sample a whole number of milliseconds in `[min_ms, max_ms]`
    pub fn sample<R: Rng>(&self, rng: &mut R) -> Duration {
        let (low, high) = if self.min_ms <= self.max_ms {
            (self.min_ms, self.max_ms)
        } else {
            (self.max_ms, self.min_ms)
        };
        Duration::from_millis(rng.random_range(low..=high))
    }

    fn validate(&self, name: &str) -> Result<()> {
        if self.min_ms > self.max_ms {
            return Err(Error::ConfigError(format!(
                "{name}: min_ms ({}) must not exceed max_ms ({})",
                self.min_ms, self.max_ms
            )));
        }
        Ok(())
    }
}

/// Idle animation timing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Animation tick interval
    pub tick_interval_ms: u64,

    /// Pause between idle gaze transitions
    pub gaze_pause: MillisRange,

    /// Duration of an idle gaze transition
    pub gaze_transition: MillisRange,

    /// Pause between idle blinks
    pub blink_pause: MillisRange,

    /// Duration of an idle blink
    pub blink_duration: MillisRange,

    /// Upper bound of the closure an idle blink settles at (0.0-1.0)
    pub max_idle_closure: f64,

    /// Amplitude of the uniform eyelid tremor added every tick
    pub eyelid_noise: f64,
}

/// Motion detection parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Analysis frame width
    pub analysis_width: i32,

    /// Analysis frame height
    pub analysis_height: i32,

    /// Threshold applied to the difference and blurred images (0-255)
    pub sensitivity: f64,

    /// Box blur kernel size
    pub blur_size: i32,

    /// Interval between detection polls
    pub poll_interval_ms: u64,

    /// Number of frame latencies averaged for telemetry
    pub telemetry_window: usize,

    /// Which contour becomes the tracked subject
    pub contour_selection: ContourSelection,

    /// Mirror frames horizontally before analysis
    pub mirrored: bool,
}

/// Contour selection policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContourSelection {
    /// Last contour in the order returned by `find_contours`
    #[default]
    Last,
    /// Contour enclosing the largest area
    LargestArea,
}

/// Detection to idle animation hand-over
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Idle gaze resumes this long after the last detection
    pub idle_resume_delay_ms: u64,

    /// Maximum wait for the detection worker after shutdown
    pub shutdown_timeout_ms: u64,
}

/// Multicast transport configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Multicast group address
    pub group: Ipv4Addr,

    /// Destination and listening port
    pub port: u16,

    /// Local interface used to join the group
    pub interface: Ipv4Addr,

    /// Multicast time-to-live
    pub ttl: u32,

    /// Deliver own datagrams back to local listeners
    pub loopback: bool,
}

/// Detection recording configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingConfig {
    /// Output path, `{timestamp}` is replaced by the start time
    pub path: Option<PathBuf>,

    /// Four character codec code
    pub fourcc: String,

    /// Frames per second written to the container
    pub fps: f64,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: ANIMATION_TICK_MS,
            gaze_pause: MillisRange::new(GAZE_PAUSE_MIN_MS, GAZE_PAUSE_MAX_MS),
            gaze_transition: MillisRange::new(GAZE_TRANSITION_MIN_MS, GAZE_TRANSITION_MAX_MS),
            blink_pause: MillisRange::new(BLINK_PAUSE_MIN_MS, BLINK_PAUSE_MAX_MS),
            blink_duration: MillisRange::new(BLINK_DURATION_MIN_MS, BLINK_DURATION_MAX_MS),
            max_idle_closure: MAX_IDLE_BLINK_CLOSURE,
            eyelid_noise: EYELID_NOISE_AMPLITUDE,
        }
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            analysis_width: ANALYSIS_WIDTH,
            analysis_height: ANALYSIS_HEIGHT,
            sensitivity: SENSITIVITY_VALUE,
            blur_size: BLUR_SIZE,
            poll_interval_ms: DETECTION_POLL_INTERVAL_MS,
            telemetry_window: TELEMETRY_WINDOW,
            contour_selection: ContourSelection::Last,
            mirrored: false,
        }
    }
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            idle_resume_delay_ms: IDLE_RESUME_DELAY_MS,
            shutdown_timeout_ms: SHUTDOWN_TIMEOUT_MS,
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            group: MULTICAST_GROUP,
            port: MULTICAST_PORT,
            interface: Ipv4Addr::UNSPECIFIED,
            ttl: 1,
            loopback: true,
        }
    }
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            path: None,
            fourcc: RECORDING_FOURCC.to_string(),
            fps: RECORDING_FPS,
        }
    }
}

impl AnimationConfig {
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

impl DetectionConfig {
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl TrackingConfig {
    #[must_use]
    pub fn idle_resume_delay(&self) -> Duration {
        Duration::from_millis(self.idle_resume_delay_ms)
    }

    #[must_use]
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }
}

impl TransportConfig {
    /// Group address and port datagrams are sent to
    #[must_use]
    pub fn destination(&self) -> SocketAddr {
        SocketAddr::V4(SocketAddrV4::new(self.group, self.port))
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        serde_yaml::from_str(&content).map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))
    }

    /// Save configuration to a YAML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let animation = &self.animation;
        if animation.tick_interval_ms == 0 {
            return Err(Error::ConfigError("Animation tick interval must be greater than 0".to_string()));
        }
        animation.gaze_pause.validate("gaze_pause")?;
        animation.gaze_transition.validate("gaze_transition")?;
        animation.blink_pause.validate("blink_pause")?;
        animation.blink_duration.validate("blink_duration")?;
        if !(0.0..=1.0).contains(&animation.max_idle_closure) {
            return Err(Error::ConfigError(
                "Maximum idle closure must be between 0.0 and 1.0".to_string(),
            ));
        }
        if !(animation.eyelid_noise >= 0.0 && animation.eyelid_noise.is_finite()) {
            return Err(Error::ConfigError("Eyelid noise must be a non-negative number".to_string()));
        }

        let detection = &self.detection;
        if detection.analysis_width <= 0 || detection.analysis_height <= 0 {
            return Err(Error::ConfigError("Analysis frame size must be positive".to_string()));
        }
        if !(0.0..=255.0).contains(&detection.sensitivity) {
            return Err(Error::ConfigError("Sensitivity must be between 0 and 255".to_string()));
        }
        if detection.blur_size <= 0 {
            return Err(Error::ConfigError("Blur size must be greater than 0".to_string()));
        }
        if detection.poll_interval_ms == 0 {
            return Err(Error::ConfigError("Detection poll interval must be greater than 0".to_string()));
        }
        if detection.telemetry_window == 0 {
            return Err(Error::ConfigError("Telemetry window must be greater than 0".to_string()));
        }

        if !self.transport.group.is_multicast() {
            return Err(Error::ConfigError(format!(
                "Transport group {} is not a multicast address",
                self.transport.group
            )));
        }

        if self.recording.fourcc.chars().count() != 4 {
            return Err(Error::ConfigError(format!(
                "FOURCC must be four characters, got '{}'",
                self.recording.fourcc
            )));
        }
        if !(self.recording.fps > 0.0) {
            return Err(Error::ConfigError("Recording fps must be greater than 0".to_string()));
        }

        Ok(())
    }
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# Animatronic Eyes Configuration

# Idle animation timing
animation:
  tick_interval_ms: 10
  gaze_pause: { min_ms: 150, max_ms: 3000 }
  gaze_transition: { min_ms: 72, max_ms: 144 }
  blink_pause: { min_ms: 300, max_ms: 4000 }
  blink_duration: { min_ms: 40, max_ms: 150 }
  max_idle_closure: 0.5
  eyelid_noise: 0.005

# Motion detection
detection:
  analysis_width: 320
  analysis_height: 240
  sensitivity: 40.0
  blur_size: 10
  poll_interval_ms: 80
  telemetry_window: 100
  contour_selection: last
  mirrored: false

# Detection to idle hand-over
tracking:
  idle_resume_delay_ms: 2000
  shutdown_timeout_ms: 5000

# Multicast transport
transport:
  group: 239.255.43.21
  port: 45454
  interface: 0.0.0.0
  ttl: 1
  loopback: true

# Recording of frames with detections
recording:
  path: ~
  fourcc: XVID
  fps: 20.0
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_default_config_is_valid() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn test_example_config_matches_defaults() {
        let parsed: Config = serde_yaml::from_str(EXAMPLE_CONFIG).unwrap();
        parsed.validate().unwrap();

        let defaults = Config::default();
        assert_eq!(parsed.animation.gaze_pause, defaults.animation.gaze_pause);
        assert_eq!(parsed.animation.blink_duration, defaults.animation.blink_duration);
        assert_eq!(parsed.detection.contour_selection, ContourSelection::Last);
        assert_eq!(parsed.transport.group, MULTICAST_GROUP);
        assert_eq!(parsed.transport.port, MULTICAST_PORT);
        assert!(parsed.recording.path.is_none());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let parsed: Config = serde_yaml::from_str("detection:\n  contour_selection: largest_area\n").unwrap();
        assert_eq!(parsed.detection.contour_selection, ContourSelection::LargestArea);
        assert_eq!(parsed.detection.blur_size, BLUR_SIZE);
        assert_eq!(parsed.tracking.idle_resume_delay_ms, IDLE_RESUME_DELAY_MS);
    }

    #[test]
    fn test_validate_rejects_inverted_range() {
        let mut config = Config::default();
        config.animation.gaze_pause = MillisRange::new(500, 100);
        assert!(matches!(config.validate(), Err(Error::ConfigError(_))));
    }

    #[test]
    fn test_validate_rejects_unicast_group() {
        let mut config = Config::default();
        config.transport.group = Ipv4Addr::new(192, 168, 1, 10);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_fourcc() {
        let mut config = Config::default();
        config.recording.fourcc = "MJPEG".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_millis_range_sample_within_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        let range = MillisRange::new(72, 144);
        for _ in 0..1000 {
            let sample = range.sample(&mut rng);
            assert!(sample >= Duration::from_millis(72));
            assert!(sample <= Duration::from_millis(144));
        }

        // Inverted ranges are sampled as if ordered
        let inverted = MillisRange::new(144, 72);
        let sample = inverted.sample(&mut rng);
        assert!(sample >= Duration::from_millis(72) && sample <= Duration::from_millis(144));
    }

    #[test]
    fn test_config_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("eyes.yaml");

        let mut config = Config::default();
        config.detection.mirrored = true;
        config.recording.path = Some(PathBuf::from("motion-{timestamp}.avi"));
        config.to_file(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert!(loaded.detection.mirrored);
        assert_eq!(loaded.recording.path, Some(PathBuf::from("motion-{timestamp}.avi")));
    }

    #[test]
    fn test_missing_config_file() {
        assert!(matches!(Config::from_file("does/not/exist.yaml"), Err(Error::Io(_))));
    }
}
