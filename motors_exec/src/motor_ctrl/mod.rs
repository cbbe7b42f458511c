//! Motor control module
//!
//! Cyclic processing for the motor bank: advances the run state machine and
//! shapes the per-motor drive outputs for the cycle.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod machine;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use machine::*;
pub use state::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during MotorCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum MotorCtrlError {
    #[error("Expected {expected} forces but the command carries {found}")]
    WrongForceCount { expected: usize, found: usize },
}
