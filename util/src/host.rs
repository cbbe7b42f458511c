//! Host platform (linux for example) utility functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::path::PathBuf;
use thiserror::Error;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Name of the environment variable which points at the root of the software
/// installation. Parameter files, session directories and pidfiles all live
/// under this root.
pub const SW_ROOT_ENV_VAR: &str = "UAV_SW_ROOT";

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// An error that occurs while querying the host.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("The software root environment variable (UAV_SW_ROOT) is not set")]
    SwRootNotSet,
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Get the root directory of the software installation.
pub fn get_sw_root() -> Result<PathBuf, HostError> {
    std::env::var(SW_ROOT_ENV_VAR)
        .map(PathBuf::from)
        .map_err(|_| HostError::SwRootNotSet)
}

/// Get a short description of the host this executable is running on.
pub fn get_description() -> String {
    let hostname = std::fs::read_to_string("/etc/hostname")
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|_| String::from("unknown"));

    format!("{} ({}, {})", hostname, std::env::consts::OS, std::env::consts::ARCH)
}
