//! # Bus interface crate.
//!
//! Provides the publish/subscribe bus abstraction and the wire message
//! definitions shared between the autopilot nodes.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Message definitions for the motors node
pub mod motors;

/// Network module
pub mod net;
