//! Eye animation: state, easing phases and the idle animator.

/// Idle animation state machine with override entry points
pub mod animator;

/// Animation phases, transitions and easing curves
pub mod phase;

/// Eye state value types
pub mod state;

pub use animator::EyeAnimator;
pub use phase::{AnimationPhase, Transition};
pub use state::{Eye, EyeState, GazePoint};
