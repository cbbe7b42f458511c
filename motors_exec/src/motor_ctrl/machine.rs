//! # Motor Run State Machine
//!
//! The single authority for whether motor outputs are live, ramping, or zero.
//! The machine cycles through four base phases:
//!
//! ```text
//!                  enable
//!          .-> Stopped ---> Starting --.
//! spindown |                           | spinup
//! elapsed  `-- Stopping <--- Running <-' elapsed
//!                  !enable
//! ```
//!
//! Each phase can additionally carry a `saturated` tag, raised when drive
//! values have been clamped at their limits. Saturation is diagnostic only and
//! never forces a phase transition.

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Base phase of the motor bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotorPhase {
    /// Motors are off, outputs are zero.
    Stopped,

    /// Motors are ramping up at the minimum sustaining drive.
    Starting,

    /// Motors are live and follow the requested forces.
    Running,

    /// Motors are ramping down, outputs are zero.
    Stopping,
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Full run state of the motor bank: phase, saturation tag, and the time spent
/// in the current phase.
///
/// The in-phase time is carried inside the state so that [`MotorState::step`]
/// stays a pure function, there is no hidden clock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotorState {
    /// Current base phase
    pub phase: MotorPhase,

    /// Whether drive values were clamped at their limits
    pub saturated: bool,

    /// Time accumulated in the current phase
    phase_time_s: f64,
}

/// Durations governing the timed transitions of the state machine.
#[derive(Debug, Clone, Copy)]
pub struct PhaseTimings {
    /// Time to hold the ramp-up before the motors count as running
    pub spinup_s: f64,

    /// Time to hold the ramp-down before the motors count as stopped
    pub spindown_s: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for MotorState {
    fn default() -> Self {
        MotorState {
            phase: MotorPhase::Stopped,
            saturated: false,
            phase_time_s: 0.0,
        }
    }
}

impl MotorState {
    /// Whether the requested forces are actually in control of the outputs.
    ///
    /// Only true while running, saturated or not.
    pub fn controllable(&self) -> bool {
        self.phase == MotorPhase::Running
    }

    /// The integer state code published on the bus.
    ///
    /// Base phases code as 0..3 in the order stopped, starting, running,
    /// stopping; saturation adds 4.
    pub fn wire_code(&self) -> u8 {
        let base = match self.phase {
            MotorPhase::Stopped => 0,
            MotorPhase::Starting => 1,
            MotorPhase::Running => 2,
            MotorPhase::Stopping => 3,
        };

        if self.saturated {
            base + 4
        } else {
            base
        }
    }

    /// Return this state with the saturation tag set as given.
    pub fn with_saturation(mut self, saturated: bool) -> Self {
        self.saturated = saturated;
        self
    }

    /// Advance the state machine by one control cycle.
    ///
    /// Pure function of `(self, dt_s, enable)` for fixed timings: the same
    /// inputs always produce the same next state, and nothing else is touched.
    /// The saturation tag is carried through unchanged, it is owned by the
    /// caller's clamping logic (see [`MotorState::with_saturation`]).
    pub fn step(self, dt_s: f64, enable: bool, timings: &PhaseTimings) -> Self {
        let mut next = self;

        match self.phase {
            MotorPhase::Stopped => {
                if enable {
                    next.phase = MotorPhase::Starting;
                    next.phase_time_s = 0.0;
                }
            }
            MotorPhase::Starting => {
                if !enable {
                    // Losing the enable during ramp-up aborts into ramp-down
                    next.phase = MotorPhase::Stopping;
                    next.phase_time_s = 0.0;
                } else {
                    next.phase_time_s += dt_s;
                    if next.phase_time_s >= timings.spinup_s {
                        next.phase = MotorPhase::Running;
                        next.phase_time_s = 0.0;
                    }
                }
            }
            MotorPhase::Running => {
                if !enable {
                    next.phase = MotorPhase::Stopping;
                    next.phase_time_s = 0.0;
                }
            }
            MotorPhase::Stopping => {
                // Ramp-down always completes, a re-enable must wait for
                // Stopped before it can take effect
                next.phase_time_s += dt_s;
                if next.phase_time_s >= timings.spindown_s {
                    next.phase = MotorPhase::Stopped;
                    next.phase_time_s = 0.0;
                }
            }
        }

        next
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    const TIMINGS: PhaseTimings = PhaseTimings {
        spinup_s: 1.5,
        spindown_s: 1.0,
    };

    #[test]
    fn test_stopped_stays_stopped_without_enable() {
        let state = MotorState::default();

        let next = state.step(100.0, false, &TIMINGS);
        assert_eq!(next.phase, MotorPhase::Stopped);
    }

    #[test]
    fn test_stopped_starts_on_enable() {
        let state = MotorState::default();

        let next = state.step(0.01, true, &TIMINGS);
        assert_eq!(next.phase, MotorPhase::Starting);
        assert!(!next.controllable());
    }

    #[test]
    fn test_starting_runs_after_spinup() {
        let mut state = MotorState::default().step(0.01, true, &TIMINGS);
        assert_eq!(state.phase, MotorPhase::Starting);

        // Accumulate the spin-up over many small cycles
        for _ in 0..140 {
            state = state.step(0.01, true, &TIMINGS);
            assert_eq!(state.phase, MotorPhase::Starting);
        }
        state = state.step(0.2, true, &TIMINGS);
        assert_eq!(state.phase, MotorPhase::Running);
        assert!(state.controllable());
    }

    #[test]
    fn test_starting_aborts_on_disable() {
        let state = MotorState::default().step(0.01, true, &TIMINGS);

        let next = state.step(0.01, false, &TIMINGS);
        assert_eq!(next.phase, MotorPhase::Stopping);
    }

    #[test]
    fn test_running_stops_immediately_on_disable() {
        let state = running_state();

        // Even a zero-length cycle must drop out of Running
        let next = state.step(0.0, false, &TIMINGS);
        assert_eq!(next.phase, MotorPhase::Stopping);
        assert!(!next.controllable());
    }

    #[test]
    fn test_stopping_stops_after_spindown() {
        let state = running_state().step(0.01, false, &TIMINGS);
        assert_eq!(state.phase, MotorPhase::Stopping);

        // A re-enable during ramp-down does not interrupt it
        let state = state.step(0.5, true, &TIMINGS);
        assert_eq!(state.phase, MotorPhase::Stopping);

        let state = state.step(0.6, true, &TIMINGS);
        assert_eq!(state.phase, MotorPhase::Stopped);
    }

    #[test]
    fn test_step_is_deterministic() {
        let state = MotorState::default().step(0.01, true, &TIMINGS);

        let a = state.step(0.4, true, &TIMINGS);
        let b = state.step(0.4, true, &TIMINGS);
        assert_eq!(a, b);
    }

    #[test]
    fn test_saturation_is_independent_of_phase() {
        let state = running_state().with_saturation(true);
        assert_eq!(state.phase, MotorPhase::Running);
        assert!(state.controllable());

        // The tag survives a step and does not gate transitions
        let next = state.step(0.01, true, &TIMINGS);
        assert_eq!(next.phase, MotorPhase::Running);
        assert!(next.saturated);

        let next = state.step(0.01, false, &TIMINGS);
        assert_eq!(next.phase, MotorPhase::Stopping);
        assert!(next.saturated);
    }

    #[test]
    fn test_wire_codes() {
        assert_eq!(MotorState::default().wire_code(), 0);
        assert_eq!(running_state().wire_code(), 2);
        assert_eq!(running_state().with_saturation(true).wire_code(), 6);

        let stopping = running_state().step(0.01, false, &TIMINGS);
        assert_eq!(stopping.wire_code(), 3);
        assert_eq!(stopping.with_saturation(true).wire_code(), 7);
    }

    /// Drive a default state through to Running.
    fn running_state() -> MotorState {
        let state = MotorState::default()
            .step(0.01, true, &TIMINGS)
            .step(TIMINGS.spinup_s, true, &TIMINGS);
        assert_eq!(state.phase, MotorPhase::Running);
        state
    }
}
