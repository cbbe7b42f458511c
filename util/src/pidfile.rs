//! Pidfile bookkeeping
//!
//! Each node records its process id in a pidfile under `run/` in the software
//! root so that a second instance of the same node refuses to start. The
//! pidfile is removed when the [`Pidfile`] is dropped.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::host;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A claimed pidfile. Dropping this removes the file.
pub struct Pidfile {
    path: PathBuf,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors associated with claiming a pidfile.
#[derive(Debug, Error)]
pub enum PidfileError {
    #[error("The software root environment variable (UAV_SW_ROOT) is not set")]
    SwRootNotSet,

    #[error("Another instance is already running with pid {0}")]
    AlreadyRunning(u32),

    #[error("Cannot write the pidfile: {0}")]
    WriteError(std::io::Error),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Pidfile {
    /// Claim the pidfile for the named node.
    ///
    /// The pidfile lives at `{UAV_SW_ROOT}/run/{node_name}.pid`. A stale
    /// pidfile (one whose pid is no longer in the process table) is
    /// overwritten.
    pub fn claim(node_name: &str) -> Result<Self, PidfileError> {
        let mut path = host::get_sw_root().map_err(|_| PidfileError::SwRootNotSet)?;
        path.push("run");

        fs::create_dir_all(&path).map_err(PidfileError::WriteError)?;

        path.push(format!("{}.pid", node_name));

        Self::claim_path(path)
    }

    /// Claim the pidfile at the given path directly.
    pub fn claim_path<P: AsRef<Path>>(path: P) -> Result<Self, PidfileError> {
        let path = path.as_ref().to_path_buf();

        // If a pidfile already exists check whether its owner is still alive
        if let Some(pid) = read_pid(&path) {
            if pid != std::process::id() && pid_is_alive(pid) {
                return Err(PidfileError::AlreadyRunning(pid));
            }
        }

        fs::write(&path, format!("{}\n", std::process::id()))
            .map_err(PidfileError::WriteError)?;

        Ok(Pidfile { path })
    }
}

impl Drop for Pidfile {
    fn drop(&mut self) {
        // Nothing useful to do if the unlink fails at shutdown
        let _ = fs::remove_file(&self.path);
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Read the pid stored in the given pidfile, or `None` if there is no file or
/// no pid can be parsed from it.
fn read_pid(path: &Path) -> Option<u32> {
    let contents = fs::read_to_string(path).ok()?;
    contents.trim().parse().ok()
}

/// Check the process table (via /proc) for the given pid.
fn pid_is_alive(pid: u32) -> bool {
    Path::new(&format!("/proc/{}", pid)).exists()
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_claim_and_release() {
        let mut path = std::env::temp_dir();
        path.push(format!("pidfile_test_{}.pid", std::process::id()));

        {
            let _pidfile = Pidfile::claim_path(&path).unwrap();
            assert_eq!(read_pid(&path), Some(std::process::id()));

            // Our own pid in the file must not count as another instance
            let reclaim = Pidfile::claim_path(&path);
            assert!(reclaim.is_ok());
        }

        // Dropped pidfiles are removed
        assert!(!path.exists());
    }

    #[test]
    fn test_stale_pidfile_is_overwritten() {
        let mut path = std::env::temp_dir();
        path.push(format!("pidfile_stale_test_{}.pid", std::process::id()));

        // No process with pid 0 exists in /proc
        fs::write(&path, "0\n").unwrap();

        let pidfile = Pidfile::claim_path(&path);
        assert!(pidfile.is_ok());
        assert_eq!(read_pid(&path), Some(std::process::id()));
    }
}
