//! Fixed-layout wire format of the eye animation state.
//!
//! Layout, all little-endian, 42 bytes in total:
//!
//! | offset | field               | type |
//! |--------|---------------------|------|
//! | 0      | `gaze_left.x`       | f64  |
//! | 8      | `gaze_left.y`       | f64  |
//! | 16     | `gaze_right.x`      | f64  |
//! | 24     | `gaze_right.y`      | f64  |
//! | 32     | `eyelid_closure`    | f64  |
//! | 40     | `update_requested`  | u8   |
//! | 41     | `motion_detected`   | u8   |

use crate::animation::{EyeState, GazePoint};
use crate::{Error, Result};

const F64_LEN: usize = 8;
const F64_FIELDS: usize = 5;

/// Size of an encoded message
pub const MESSAGE_LEN: usize = F64_FIELDS * F64_LEN + 2;

/// Encode `state` into its wire representation
#[must_use]
pub fn encode(state: &EyeState) -> [u8; MESSAGE_LEN] {
    let mut buffer = [0u8; MESSAGE_LEN];
    let values = [
        state.gaze_left.x,
        state.gaze_left.y,
        state.gaze_right.x,
        state.gaze_right.y,
        state.eyelid_closure,
    ];
    for (chunk, value) in buffer.chunks_exact_mut(F64_LEN).zip(values) {
        chunk.copy_from_slice(&value.to_le_bytes());
    }
    buffer[F64_FIELDS * F64_LEN] = u8::from(state.update_requested);
    buffer[F64_FIELDS * F64_LEN + 1] = u8::from(state.motion_detected);
    buffer
}

/// Decode a wire message.
///
/// # Errors
///
/// Returns `Error::MalformedMessage` on a length mismatch, a boolean byte other
/// than 0 or 1, or a non-finite float. Finite values are clamped into their domain.
pub fn decode(bytes: &[u8]) -> Result<EyeState> {
    if bytes.len() != MESSAGE_LEN {
        return Err(Error::MalformedMessage(format!(
            "expected {MESSAGE_LEN} bytes, got {}",
            bytes.len()
        )));
    }

    let mut values = [0.0f64; F64_FIELDS];
    for (index, (value, chunk)) in values.iter_mut().zip(bytes.chunks_exact(F64_LEN)).enumerate() {
        let mut raw = [0u8; F64_LEN];
        raw.copy_from_slice(chunk);
        *value = f64::from_le_bytes(raw);
        if !value.is_finite() {
            return Err(Error::MalformedMessage(format!("field {index} is not finite")));
        }
    }

    let state = EyeState {
        gaze_left: GazePoint::new(values[0], values[1]),
        gaze_right: GazePoint::new(values[2], values[3]),
        eyelid_closure: values[4],
        update_requested: decode_bool(bytes[F64_FIELDS * F64_LEN], "update_requested")?,
        motion_detected: decode_bool(bytes[F64_FIELDS * F64_LEN + 1], "motion_detected")?,
    };
    Ok(state.clamped())
}

fn decode_bool(byte: u8, field: &str) -> Result<bool> {
    match byte {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(Error::MalformedMessage(format!("{field} has invalid value {other}"))),
    }
}

/// Consumer-side replica of the producer's state.
///
/// `apply` is the only way the replicated state changes; a rejected message
/// leaves the last valid state in place.
#[derive(Debug, Default)]
pub struct EyeReplica {
    state: EyeState,
    received: u64,
}

impl EyeReplica {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Last valid state
    #[must_use]
    pub fn state(&self) -> EyeState {
        self.state
    }

    /// Number of messages applied so far
    #[must_use]
    pub fn received(&self) -> u64 {
        self.received
    }

    /// Decode and adopt a message
    pub fn apply(&mut self, bytes: &[u8]) -> Result<EyeState> {
        let state = decode(bytes)?;
        self.state = state;
        self.received += 1;
        Ok(state)
    }
}
