//! # Force-to-Drive Mapping Module
//!
//! Converts a requested per-motor force and the measured supply voltage into a
//! normalised drive value via a calibration curve selected at startup. The
//! curves are named after the ESC/motor/propeller combination they were fitted
//! against.
//!
//! Per-phase output shaping happens here and nowhere else: a running motor
//! follows its curve but is floored at the minimum sustaining drive, a
//! starting motor holds exactly that floor, and a stopped or stopping motor is
//! commanded exactly zero.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::str::FromStr;

use crate::motor_ctrl::MotorPhase;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Supply voltage the curves were fitted at
const REFERENCE_VOLTAGE_V: f64 = 16.0;

/// Voltage bounds used for compensation. Readings outside this range are
/// treated as the nearest bound so a bad sample cannot blow up the drive.
const VOLTAGE_MIN_V: f64 = 8.0;
const VOLTAGE_MAX_V: f64 = 26.0;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A named force-to-drive calibration curve.
///
/// The set is closed: a curve is selected once at startup by its configured
/// identifier and can only be changed by restarting the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationCurve {
    /// Mikrokopter MK12 ESC, Roxxy 2827-35 motor, 10x4.5 propeller
    Mk12Roxxy282735_1045,

    /// Hobbyking 20A ESC, Roxxy 2827-35 motor, 10x4.5 propeller
    Hk20Roxxy282735_1045,

    /// HexFET 20A ESC, Suppo 2212-13 motor, 10x4.5 propeller
    Hexfet20Suppo221213_1045,
}

/// The configured curve identifier names no known curve.
#[derive(Debug, thiserror::Error)]
#[error("Unknown calibration curve identifier: \"{0}\"")]
pub struct UnknownCurveError(pub String);

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl FromStr for CalibrationCurve {
    type Err = UnknownCurveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mk12_roxxy282735_1045" => Ok(CalibrationCurve::Mk12Roxxy282735_1045),
            "hk20_roxxy282735_1045" => Ok(CalibrationCurve::Hk20Roxxy282735_1045),
            "hexfet20_suppo221213_1045" => Ok(CalibrationCurve::Hexfet20Suppo221213_1045),
            _ => Err(UnknownCurveError(s.into())),
        }
    }
}

impl CalibrationCurve {
    /// Compute the normalised drive producing the requested force at the given
    /// supply voltage.
    ///
    /// Pure and total: any finite inputs produce a value in [0, 1], and
    /// non-finite inputs produce 0.
    pub fn drive(&self, force_n: f64, voltage_v: f64) -> f64 {
        if !force_n.is_finite() || !voltage_v.is_finite() {
            return 0.0;
        }

        // Thrust scales roughly with the square of the effective duty cycle,
        // so drive goes with the square root of force; the linear term soaks
        // up the per-combination deviation from that model.
        let (sqrt_coeff, lin_coeff) = match self {
            CalibrationCurve::Mk12Roxxy282735_1045 => (0.1610, 0.0122),
            CalibrationCurve::Hk20Roxxy282735_1045 => (0.1385, 0.0168),
            CalibrationCurve::Hexfet20Suppo221213_1045 => (0.1493, 0.0106),
        };

        let force_n = force_n.max(0.0);
        let voltage_v = voltage_v.max(VOLTAGE_MIN_V).min(VOLTAGE_MAX_V);

        // Battery sag compensation: a lower supply needs a higher duty cycle
        // for the same thrust
        let drive = (sqrt_coeff * force_n.sqrt() + lin_coeff * force_n)
            * (REFERENCE_VOLTAGE_V / voltage_v);

        drive.max(0.0).min(1.0)
    }
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Map a requested force to the drive value to command, given the phase the
/// state machine reported for this cycle.
///
/// This is the last line of defence for output range: whatever the upstream
/// data quality, the result is always in [0, 1].
pub fn map_force(
    phase: MotorPhase,
    force_n: f64,
    voltage_v: f64,
    curve: CalibrationCurve,
    min_drive: f64,
) -> f64 {
    match phase {
        // A live motor follows its curve but must never decay below the
        // sustaining floor, ESCs stall below a minimum duty cycle
        MotorPhase::Running => curve.drive(force_n, voltage_v).max(min_drive),

        // Ramp-up holds a fixed minimal spin regardless of the request
        MotorPhase::Starting => min_drive,

        MotorPhase::Stopped | MotorPhase::Stopping => 0.0,
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    const MIN_DRIVE: f64 = 0.1;

    #[test]
    fn test_curve_output_in_range() {
        let curves = [
            CalibrationCurve::Mk12Roxxy282735_1045,
            CalibrationCurve::Hk20Roxxy282735_1045,
            CalibrationCurve::Hexfet20Suppo221213_1045,
        ];

        for curve in &curves {
            for force in &[-10.0, 0.0, 0.5, 2.0, 5.0, 50.0, 1e9] {
                for voltage in &[0.0, 8.0, 12.6, 16.0, 25.2, 1e6] {
                    let drive = curve.drive(*force, *voltage);
                    assert!(
                        (0.0..=1.0).contains(&drive),
                        "curve {:?} out of range: f={} v={} -> {}",
                        curve,
                        force,
                        voltage,
                        drive
                    );
                }
            }
        }
    }

    #[test]
    fn test_curve_rejects_non_finite_inputs() {
        let curve = CalibrationCurve::Mk12Roxxy282735_1045;

        assert_eq!(curve.drive(f64::NAN, 16.0), 0.0);
        assert_eq!(curve.drive(5.0, f64::NAN), 0.0);
        assert_eq!(curve.drive(f64::INFINITY, 16.0), 0.0);
        assert_eq!(curve.drive(5.0, f64::NEG_INFINITY), 0.0);
    }

    #[test]
    fn test_curve_compensates_for_sag() {
        let curve = CalibrationCurve::Hk20Roxxy282735_1045;

        // The same force needs more drive from a sagging battery
        let nominal = curve.drive(3.0, 16.0);
        let sagged = curve.drive(3.0, 13.0);
        assert!(sagged > nominal);
    }

    #[test]
    fn test_map_running_floors_at_min_drive() {
        let curve = CalibrationCurve::Mk12Roxxy282735_1045;

        // A small force would map below the floor, the floor wins
        let drive = map_force(MotorPhase::Running, 0.01, 16.0, curve, MIN_DRIVE);
        assert_eq!(drive, MIN_DRIVE);

        // A large force maps above the floor and passes through
        let drive = map_force(MotorPhase::Running, 5.0, 16.0, curve, MIN_DRIVE);
        assert_eq!(drive, curve.drive(5.0, 16.0).max(MIN_DRIVE));
        assert!(drive > MIN_DRIVE);
    }

    #[test]
    fn test_map_starting_holds_floor() {
        let curve = CalibrationCurve::Hexfet20Suppo221213_1045;

        for force in &[0.0, 2.0, 1000.0] {
            let drive = map_force(MotorPhase::Starting, *force, 16.0, curve, MIN_DRIVE);
            assert_eq!(drive, MIN_DRIVE);
        }
    }

    #[test]
    fn test_map_stopped_and_stopping_are_zero() {
        let curve = CalibrationCurve::Mk12Roxxy282735_1045;

        for phase in &[MotorPhase::Stopped, MotorPhase::Stopping] {
            for force in &[0.0, 5.0, 1e9] {
                assert_eq!(map_force(*phase, *force, 16.0, curve, MIN_DRIVE), 0.0);
            }
        }
    }

    #[test]
    fn test_curve_identifiers() {
        assert_eq!(
            "mk12_roxxy282735_1045".parse::<CalibrationCurve>().unwrap(),
            CalibrationCurve::Mk12Roxxy282735_1045
        );
        assert_eq!(
            "hk20_roxxy282735_1045".parse::<CalibrationCurve>().unwrap(),
            CalibrationCurve::Hk20Roxxy282735_1045
        );
        assert_eq!(
            "hexfet20_suppo221213_1045"
                .parse::<CalibrationCurve>()
                .unwrap(),
            CalibrationCurve::Hexfet20Suppo221213_1045
        );

        assert!("garbage".parse::<CalibrationCurve>().is_err());
    }
}
