//! [`MotorDriver`] implementation for the PCA9685 PWM driver

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use embedded_hal::blocking::i2c::{Write, WriteRead};
use pwm_pca9685::{Address, Channel, Error, Pca9685};

use super::{validate, DriverError, MotorDriver};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

const MAX_PWM: u16 = 4096;

/// Prescale value for a 50 Hz PWM period, the update rate the ESCs expect
const PRESCALE_50HZ: u8 = 121;

const CHANNELS: [Channel; 16] = [
    Channel::C0,
    Channel::C1,
    Channel::C2,
    Channel::C3,
    Channel::C4,
    Channel::C5,
    Channel::C6,
    Channel::C7,
    Channel::C8,
    Channel::C9,
    Channel::C10,
    Channel::C11,
    Channel::C12,
    Channel::C13,
    Channel::C14,
    Channel::C15,
];

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Motor output sink backed by a PCA9685 board, one PWM channel per motor.
pub struct Pca9685Driver<I2C> {
    pwm: Pca9685<I2C>,

    n_motors: usize,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<I2C, E> Pca9685Driver<I2C>
where
    I2C: Write<Error = E> + WriteRead<Error = E>,
    E: core::fmt::Debug,
{
    /// Create and enable a driver for `n_motors` channels on the board at the
    /// default address.
    pub fn new(i2c: I2C, n_motors: usize) -> Result<Self, DriverError> {
        if n_motors > CHANNELS.len() {
            return Err(DriverError::Hardware(format!(
                "PCA9685 has {} channels, {} motors configured",
                CHANNELS.len(),
                n_motors
            )));
        }

        let mut pwm = Pca9685::new(i2c, Address::default()).map_err(map_pwm_error)?;
        pwm.set_prescale(PRESCALE_50HZ).map_err(map_pwm_error)?;
        pwm.enable().map_err(map_pwm_error)?;

        // All channels switch on at the start of the period, the off counter
        // set per cycle then determines the duty cycle
        for i in 0..n_motors {
            pwm.set_channel_on(CHANNELS[i], 0).map_err(map_pwm_error)?;
        }

        Ok(Pca9685Driver { pwm, n_motors })
    }
}

impl<I2C, E> MotorDriver for Pca9685Driver<I2C>
where
    I2C: Write<Error = E> + WriteRead<Error = E>,
    E: core::fmt::Debug,
{
    fn apply(&mut self, drives: &[f64]) -> Result<(), DriverError> {
        // Validate the whole vector before writing any channel
        validate(drives, self.n_motors)?;

        for (i, &drive) in drives.iter().enumerate() {
            let off_count = (drive * f64::from(MAX_PWM - 1)) as u16;
            self.pwm
                .set_channel_off(CHANNELS[i], off_count)
                .map_err(map_pwm_error)?;
        }

        Ok(())
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn map_pwm_error<E: core::fmt::Debug>(error: Error<E>) -> DriverError {
    match error {
        Error::I2C(e) => DriverError::Hardware(format!("I2C error: {:?}", e)),
        Error::InvalidInputData => DriverError::Hardware("Invalid PWM input data".into()),
    }
}
