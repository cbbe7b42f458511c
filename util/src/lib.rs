//! Utility library for the UAV autopilot software
//!
//! Provides the support functions every node executable needs: session
//! management, logging, parameter loading, pidfile bookkeeping and the common
//! module lifecycle trait.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod host;
pub mod logger;
pub mod module;
pub mod params;
pub mod pidfile;
pub mod session;
pub mod time;
