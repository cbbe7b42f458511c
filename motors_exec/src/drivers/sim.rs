//! Simulated [`MotorDriver`] which logs the applied drive vector.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::trace;

use super::{validate, DriverError, MotorDriver};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A motor output sink for development hosts without motor hardware.
pub struct SimDriver {
    n_motors: usize,

    /// The last drive vector applied, for inspection
    pub last_applied: Vec<f64>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SimDriver {
    pub fn new(n_motors: usize) -> Self {
        SimDriver {
            n_motors,
            last_applied: vec![0.0; n_motors],
        }
    }
}

impl MotorDriver for SimDriver {
    fn apply(&mut self, drives: &[f64]) -> Result<(), DriverError> {
        validate(drives, self.n_motors)?;

        self.last_applied.copy_from_slice(drives);
        trace!("SimDriver applied: {:?}", drives);

        Ok(())
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_apply() {
        let mut driver = SimDriver::new(4);

        driver.apply(&[0.1, 0.2, 0.3, 0.4]).unwrap();
        assert_eq!(driver.last_applied, vec![0.1, 0.2, 0.3, 0.4]);
    }

    #[test]
    fn test_rejects_bad_vectors() {
        let mut driver = SimDriver::new(4);
        driver.apply(&[0.5; 4]).unwrap();

        // Neither a short vector nor an out-of-range entry may change the
        // applied state
        assert!(driver.apply(&[0.1; 3]).is_err());
        assert!(driver.apply(&[0.1, 0.2, 0.3, 1.2]).is_err());
        assert_eq!(driver.last_applied, vec![0.5; 4]);
    }
}
