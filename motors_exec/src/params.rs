//! # Motors Executable Parameters

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;
use std::collections::HashMap;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Deserialize, Debug)]
pub struct MotorsExecParams {
    /// Name of the platform this node is running on. Selects the entry in
    /// `platforms` to use.
    pub platform: String,

    /// Endpoint of the force command subscription
    pub forces_endpoint: String,

    /// Endpoint of the voltage telemetry subscription
    pub voltage_endpoint: String,

    /// Endpoint the motors state is published on
    pub state_endpoint: String,

    /// Per-platform motor bank configuration
    pub platforms: HashMap<String, PlatformParams>,
}

/// Motor bank configuration for one platform.
#[derive(Deserialize, Debug, Clone)]
pub struct PlatformParams {
    /// Number of motors on the platform
    pub n_motors: usize,

    /// Identifier of the force-to-drive calibration curve to use
    pub f2e: String,

    /// Identifier of the hardware driver to bind
    pub driver: String,

    /// Minimum sustaining drive. A running motor is never commanded below
    /// this, and ramp-up holds exactly this value.
    pub min_drive: f64,

    /// Time spent ramping up before the motors are considered running
    pub spinup_s: f64,

    /// Time spent ramping down before the motors are considered stopped
    pub spindown_s: f64,

    /// Supply voltage assumed until the first telemetry sample arrives
    pub voltage_default_v: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// The configured platform has no entry in the parameter file.
#[derive(Debug, thiserror::Error)]
#[error("No motor parameters for platform \"{0}\"")]
pub struct UnknownPlatformError(pub String);

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl MotorsExecParams {
    /// Get the parameters for the configured platform.
    pub fn platform_params(&self) -> Result<&PlatformParams, UnknownPlatformError> {
        self.platforms
            .get(&self.platform)
            .ok_or_else(|| UnknownPlatformError(self.platform.clone()))
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    const PARAMS_TOML: &str = r#"
        platform = "quad_a"
        forces_endpoint = "tcp://localhost:5100"
        voltage_endpoint = "tcp://localhost:5101"
        state_endpoint = "tcp://*:5102"

        [platforms.quad_a]
        n_motors = 4
        f2e = "mk12_roxxy282735_1045"
        driver = "sim"
        min_drive = 0.1
        spinup_s = 1.5
        spindown_s = 1.0
        voltage_default_v = 16.0
    "#;

    #[test]
    fn test_platform_lookup() {
        let params: MotorsExecParams = toml::from_str(PARAMS_TOML).unwrap();

        let platform = params.platform_params().unwrap();
        assert_eq!(platform.n_motors, 4);
        assert_eq!(platform.f2e, "mk12_roxxy282735_1045");
        assert_eq!(platform.driver, "sim");
        assert!((platform.min_drive - 0.1).abs() < f64::EPSILON);
    }

    #[test]
    fn test_unknown_platform() {
        let mut params: MotorsExecParams = toml::from_str(PARAMS_TOML).unwrap();
        params.platform = String::from("hexa_b");

        assert!(params.platform_params().is_err());
    }
}
