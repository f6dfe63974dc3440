//! Single-slot hand-off of the latest detection.

use crate::coordinate::MotionTarget;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Latest-value mailbox shared between the detection worker and the animation loop.
///
/// Posting overwrites an unread detection; only the most recent subject
/// position is meaningful.
#[derive(Debug, Clone, Default)]
pub struct DetectionMailbox {
    slot: Arc<Mutex<Option<MotionTarget>>>,
}

impl DetectionMailbox {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `target`, replacing any unread detection
    pub fn post(&self, target: MotionTarget) {
        *self.lock() = Some(target);
    }

    /// Remove and return the pending detection
    #[must_use]
    pub fn take(&self) -> Option<MotionTarget> {
        self.lock().take()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_none()
    }

    fn lock(&self) -> MutexGuard<'_, Option<MotionTarget>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
