//! Implementations for the MotorCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;

// Internal
use super::{MotorCtrlError, MotorPhase, MotorState, PhaseTimings};
use crate::force_map::{map_force, CalibrationCurve, UnknownCurveError};
use crate::params::PlatformParams;
use util::{module::State, session::Session};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Motor control module state
pub struct MotorCtrl {
    state: MotorState,

    curve: CalibrationCurve,

    n_motors: usize,

    min_drive: f64,

    timings: PhaseTimings,
}

/// Input data to Motor Control.
pub struct InputData {
    /// Wall time elapsed since the previous successful cycle
    pub dt_s: f64,

    /// The enable flag carried by this cycle's force command
    pub enable: bool,

    /// Requested force per motor, index-aligned to motor identity
    pub forces: Vec<f64>,

    /// The current supply voltage reading
    pub voltage_v: f64,
}

/// Output of one motor control cycle: the drive vector to hand to the
/// hardware driver.
#[derive(Clone, Debug)]
pub struct OutputData {
    /// Normalised drive value per motor, each in [0, 1]
    pub drives: Vec<f64>,
}

/// Status report for MotorCtrl processing.
#[derive(Clone, Copy, Debug)]
pub struct StatusReport {
    /// Phase the state machine settled on this cycle
    pub phase: MotorPhase,

    /// Whether any drive value was clamped at full scale
    pub saturated: bool,

    /// Integer state code to publish on the bus
    pub wire_code: u8,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for MotorCtrl {
    fn default() -> Self {
        MotorCtrl {
            state: MotorState::default(),
            curve: CalibrationCurve::Mk12Roxxy282735_1045,
            n_motors: 0,
            min_drive: 0.1,
            timings: PhaseTimings {
                spinup_s: 0.0,
                spindown_s: 0.0,
            },
        }
    }
}

impl State for MotorCtrl {
    type InitData = PlatformParams;
    type InitError = UnknownCurveError;

    type InputData = InputData;
    type OutputData = OutputData;
    type StatusReport = StatusReport;
    type ProcError = MotorCtrlError;

    /// Initialise the MotorCtrl module from the platform parameters.
    ///
    /// Resolves the calibration curve identifier once, an unknown identifier
    /// is a fatal startup error.
    fn init(&mut self, init_data: Self::InitData, _session: &Session)
        -> Result<(), Self::InitError>
    {
        self.curve = init_data.f2e.parse()?;
        self.n_motors = init_data.n_motors;
        self.min_drive = init_data.min_drive;
        self.timings = PhaseTimings {
            spinup_s: init_data.spinup_s,
            spindown_s: init_data.spindown_s,
        };
        self.state = MotorState::default();

        Ok(())
    }

    /// Perform cyclic processing of Motor Control.
    ///
    /// Advances the run state machine by the elapsed time, then maps every
    /// requested force through the calibration curve under the per-phase
    /// output policy. On error the run state is left untouched and no output
    /// is produced.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>
    {
        // A force count mismatch is a protocol fault, never map partial data
        if input_data.forces.len() != self.n_motors {
            return Err(MotorCtrlError::WrongForceCount {
                expected: self.n_motors,
                found: input_data.forces.len(),
            });
        }

        let stepped = self
            .state
            .step(input_data.dt_s, input_data.enable, &self.timings);

        let drives: Vec<f64> = input_data
            .forces
            .iter()
            .map(|&force| {
                map_force(
                    stepped.phase,
                    force,
                    input_data.voltage_v,
                    self.curve,
                    self.min_drive,
                )
            })
            .collect();

        // A drive pinned at full scale means the request exceeded the
        // achievable range
        let saturated = stepped.controllable() && drives.iter().any(|&d| d >= 1.0);

        self.state = stepped.with_saturation(saturated);

        trace!(
            "MotorCtrl output:\n    phase: {:?}\n    drives: {:?}",
            self.state.phase,
            drives
        );

        let report = StatusReport {
            phase: self.state.phase,
            saturated,
            wire_code: self.state.wire_code(),
        };

        Ok((OutputData { drives }, report))
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    const SPINUP_S: f64 = 1.5;
    const MIN_DRIVE: f64 = 0.1;

    #[test]
    fn test_enable_from_stopped_ramps_at_floor() {
        let mut ctrl = test_ctrl();

        // [1, 2.0, 2.0, 2.0, 2.0] while stopped
        let (output, report) = ctrl
            .proc(&input(0.01, true, vec![2.0; 4], 16.0))
            .unwrap();

        assert_eq!(report.phase, MotorPhase::Starting);
        assert_eq!(output.drives, vec![MIN_DRIVE; 4]);
    }

    #[test]
    fn test_running_follows_curve_with_floor() {
        let mut ctrl = test_ctrl();

        ctrl.proc(&input(0.01, true, vec![2.0; 4], 16.0)).unwrap();
        let (_, report) = ctrl
            .proc(&input(SPINUP_S, true, vec![2.0; 4], 16.0))
            .unwrap();
        assert_eq!(report.phase, MotorPhase::Running);

        let (output, report) = ctrl
            .proc(&input(0.01, true, vec![5.0; 4], 16.0))
            .unwrap();
        assert_eq!(report.phase, MotorPhase::Running);

        let expected = CalibrationCurve::Mk12Roxxy282735_1045
            .drive(5.0, 16.0)
            .max(MIN_DRIVE);
        assert_eq!(output.drives, vec![expected; 4]);
        assert!(!report.saturated);
    }

    #[test]
    fn test_disable_while_running_zeroes_outputs() {
        let mut ctrl = test_ctrl();

        ctrl.proc(&input(0.01, true, vec![2.0; 4], 16.0)).unwrap();
        ctrl.proc(&input(SPINUP_S, true, vec![2.0; 4], 16.0))
            .unwrap();

        // [0, 0, 0, 0, 0] while running
        let (output, report) = ctrl
            .proc(&input(0.01, false, vec![0.0; 4], 16.0))
            .unwrap();

        assert_eq!(report.phase, MotorPhase::Stopping);
        assert_eq!(output.drives, vec![0.0; 4]);
    }

    #[test]
    fn test_force_count_mismatch_leaves_state_untouched() {
        let mut ctrl = test_ctrl();

        ctrl.proc(&input(0.01, true, vec![2.0; 4], 16.0)).unwrap();
        ctrl.proc(&input(SPINUP_S, true, vec![2.0; 4], 16.0))
            .unwrap();

        // A command with the wrong motor count must not advance the machine
        let result = ctrl.proc(&input(0.01, false, vec![1.0; 2], 16.0));
        assert!(matches!(
            result,
            Err(MotorCtrlError::WrongForceCount {
                expected: 4,
                found: 2
            })
        ));

        let (_, report) = ctrl
            .proc(&input(0.01, true, vec![2.0; 4], 16.0))
            .unwrap();
        assert_eq!(report.phase, MotorPhase::Running);
    }

    #[test]
    fn test_saturation_reported_and_tagged() {
        let mut ctrl = test_ctrl();

        ctrl.proc(&input(0.01, true, vec![2.0; 4], 16.0)).unwrap();
        ctrl.proc(&input(SPINUP_S, true, vec![2.0; 4], 16.0))
            .unwrap();

        // An absurd force pins the drive at full scale
        let (output, report) = ctrl
            .proc(&input(0.01, true, vec![1e6; 4], 16.0))
            .unwrap();

        assert!(output.drives.iter().all(|&d| d == 1.0));
        assert!(report.saturated);
        assert_eq!(report.wire_code, 6);

        // Back to a sane request clears the tag
        let (_, report) = ctrl
            .proc(&input(0.01, true, vec![2.0; 4], 16.0))
            .unwrap();
        assert!(!report.saturated);
        assert_eq!(report.wire_code, 2);
    }

    /// A MotorCtrl configured like a four motor test platform.
    fn test_ctrl() -> MotorCtrl {
        MotorCtrl {
            state: MotorState::default(),
            curve: CalibrationCurve::Mk12Roxxy282735_1045,
            n_motors: 4,
            min_drive: MIN_DRIVE,
            timings: PhaseTimings {
                spinup_s: SPINUP_S,
                spindown_s: 1.0,
            },
        }
    }

    fn input(dt_s: f64, enable: bool, forces: Vec<f64>, voltage_v: f64) -> InputData {
        InputData {
            dt_s,
            enable,
            forces,
            voltage_v,
        }
    }
}
