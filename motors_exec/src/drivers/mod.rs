//! # Motor Driver Module
//!
//! This module provides a unified motor output interface which abstracts over
//! the hardware (or simulated) sink the drive vector is written to. The
//! concrete driver is a configuration-time binding resolved once at startup,
//! there is no runtime driver branch inside the control loop.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// [`MotorDriver`] implementation for the PCA9685 16 channel PWM board.
pub mod pca9685;

/// Simulated [`MotorDriver`] for development hosts.
pub mod sim;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Trait to provide a unified API for motor output sinks.
pub trait MotorDriver {
    /// Apply a full drive vector to the motor bank.
    ///
    /// The whole vector belongs to one control cycle: implementations must
    /// not expose a partially applied vector across calls. The vector length
    /// must equal the motor count the driver was created for, and every entry
    /// must be in [0, 1]; anything else is rejected without touching the
    /// hardware.
    fn apply(&mut self, drives: &[f64]) -> Result<(), DriverError>;
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug)]
pub enum DriverError {
    #[error("Unknown motor driver identifier: \"{0}\"")]
    UnknownId(String),

    #[error("The \"{0}\" driver is not available on this host")]
    UnsupportedOnHost(&'static str),

    #[error("Expected a drive vector of length {expected}, found {found}")]
    WrongLength { expected: usize, found: usize },

    #[error("Drive values must be between 0.0 and 1.0, found {0}")]
    InvalidDrive(f64),

    #[error("Hardware error: {0}")]
    Hardware(String),
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Resolve a configured driver identifier into a concrete driver.
pub fn from_id(id: &str, n_motors: usize) -> Result<Box<dyn MotorDriver>, DriverError> {
    match id {
        "sim" => Ok(Box::new(sim::SimDriver::new(n_motors))),

        #[cfg(all(target_os = "linux", target_arch = "arm"))]
        "pca9685" => {
            let i2c = rppal::i2c::I2c::new()
                .map_err(|e| DriverError::Hardware(format!("I2C bus: {}", e)))?;
            Ok(Box::new(pca9685::Pca9685Driver::new(i2c, n_motors)?))
        }

        #[cfg(not(all(target_os = "linux", target_arch = "arm")))]
        "pca9685" => Err(DriverError::UnsupportedOnHost("pca9685")),

        _ => Err(DriverError::UnknownId(id.to_string())),
    }
}

/// Validate a drive vector against the motor count before it touches any
/// hardware.
pub(crate) fn validate(drives: &[f64], n_motors: usize) -> Result<(), DriverError> {
    if drives.len() != n_motors {
        return Err(DriverError::WrongLength {
            expected: n_motors,
            found: drives.len(),
        });
    }

    for &drive in drives {
        if !(0.0..=1.0).contains(&drive) {
            return Err(DriverError::InvalidDrive(drive));
        }
    }

    Ok(())
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_from_id() {
        assert!(from_id("sim", 4).is_ok());
        assert!(matches!(
            from_id("no_such_board", 4),
            Err(DriverError::UnknownId(_))
        ));
    }

    #[test]
    fn test_validate() {
        assert!(validate(&[0.0, 0.5, 1.0], 3).is_ok());

        assert!(matches!(
            validate(&[0.0, 0.5], 3),
            Err(DriverError::WrongLength {
                expected: 3,
                found: 2
            })
        ));
        assert!(matches!(
            validate(&[0.0, 1.5, 0.0], 3),
            Err(DriverError::InvalidDrive(_))
        ));
        assert!(matches!(
            validate(&[-0.1, 0.5, 0.0], 3),
            Err(DriverError::InvalidDrive(_))
        ));
        assert!(matches!(
            validate(&[f64::NAN, 0.5, 0.0], 3),
            Err(DriverError::InvalidDrive(_))
        ));
    }
}
