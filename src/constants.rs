//! Constants used throughout the application

use std::net::Ipv4Addr;

/// Analysis frame size every incoming frame is downscaled to
pub const ANALYSIS_WIDTH: i32 = 320;
pub const ANALYSIS_HEIGHT: i32 = 240;

/// Frame differencing sensitivity (0-255), used for both threshold passes
pub const SENSITIVITY_VALUE: f64 = 40.0;

/// Box blur kernel size applied to the first threshold mask
pub const BLUR_SIZE: i32 = 10;

/// Detection poll interval, slightly faster than 10 fps
pub const DETECTION_POLL_INTERVAL_MS: u64 = 80;

/// Animation tick interval
pub const ANIMATION_TICK_MS: u64 = 10;

/// Window of the frame latency average
pub const TELEMETRY_WINDOW: usize = 100;

/// Idle gaze pause and transition bounds
pub const GAZE_PAUSE_MIN_MS: u64 = 150;
pub const GAZE_PAUSE_MAX_MS: u64 = 3000;
pub const GAZE_TRANSITION_MIN_MS: u64 = 72;
pub const GAZE_TRANSITION_MAX_MS: u64 = 144;

/// Idle blink pause and duration bounds
pub const BLINK_PAUSE_MIN_MS: u64 = 300;
pub const BLINK_PAUSE_MAX_MS: u64 = 4000;
pub const BLINK_DURATION_MIN_MS: u64 = 40;
pub const BLINK_DURATION_MAX_MS: u64 = 150;

/// Idle blinks never settle more than half closed
pub const MAX_IDLE_BLINK_CLOSURE: f64 = 0.5;

/// Eyelid tremor amplitude added every tick
pub const EYELID_NOISE_AMPLITUDE: f64 = 0.005;

/// Delay after the last detection before idle gaze resumes
pub const IDLE_RESUME_DELAY_MS: u64 = 2000;

/// Upper bound for the detection worker to finish after shutdown
pub const SHUTDOWN_TIMEOUT_MS: u64 = 5000;

/// Multicast group and port shared by producer and consumer
pub const MULTICAST_GROUP: Ipv4Addr = Ipv4Addr::new(239, 255, 43, 21);
pub const MULTICAST_PORT: u16 = 45454;

/// Scale from the analysis frame to the calibration reference frame (1280x1024)
pub const REFERENCE_SCALE: f64 = 4.0;

/// Vertical offset (analysis pixels) applied before scaling to the reference frame
pub const REFERENCE_Y_OFFSET: f64 = 8.0;

/// Detection recording defaults
pub const RECORDING_FPS: f64 = 20.0;
pub const RECORDING_FOURCC: &str = "XVID";
