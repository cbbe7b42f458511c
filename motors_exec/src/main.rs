//! # Motors Control Executable
//!
//! This executable is the actuator-control node of the autopilot. It
//! subscribes to force commands and voltage telemetry on the bus, runs the
//! motor run state machine, maps requested forces into normalised drive
//! values and applies them to the bound hardware driver.
//!
//! Interfaces:
//!
//! ```text
//!                 [voltage] ----> +--------+
//!                                 | MOTORS | ---> motor drives
//! [enable, f_0, .., f_n-1] ----> |  EXEC  | ---> [state: 0..7]
//!                                 +--------+
//! ```

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Hardware drivers the drive vector can be bound to.
mod drivers;

/// Force-to-drive mapping and calibration curves.
mod force_map;

/// Motor run state machine and cyclic control module.
mod motor_ctrl;

/// Bus endpoints of the motors node.
mod motors_server;

/// Parameters for the motors executable.
mod params;

/// Shared voltage cell and background voltage reader.
mod voltage;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use bus_if::net::zmq;
use color_eyre::{eyre::WrapErr, Result};
use log::{info, trace, warn};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

// Internal
use motor_ctrl::{InputData, MotorCtrl};
use motors_server::MotorsServer;
use util::{
    host,
    logger::{logger_init, LevelFilter},
    module::State,
    pidfile::Pidfile,
    session::Session,
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Time to idle when no command arrived within the bounded receive wait.
const IDLE_SLEEP: Duration = Duration::from_millis(1);

// ------------------------------------------------------------------------------------------------
// MAIN
// ------------------------------------------------------------------------------------------------

fn main() -> Result<()> {
    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("motors_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Trace, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Motors Control Executable\n");
    info!("Running on: {}", host::get_description());
    info!("Session directory: {:?}\n", session.session_root);

    info!("Initialising...");

    // Claim the pidfile so a second instance refuses to start
    let _pidfile = Pidfile::claim("motors_exec").wrap_err("Failed to claim the pidfile")?;

    // ---- LOAD PARAMETERS ----

    let params: params::MotorsExecParams = util::params::load("motors_exec.toml")
        .wrap_err("Could not load motors_exec params")?;

    let platform = params
        .platform_params()
        .wrap_err("Could not find the platform's motor parameters")?
        .clone();

    info!("Parameters loaded");
    info!("    Platform: {}", params.platform);
    info!("    Motors: {}", platform.n_motors);
    info!("    Force-to-drive curve: {}", platform.f2e);
    info!("    Driver: {}", platform.driver);

    // ---- MODULE INITIALISATION ----

    let ctx = zmq::Context::new();

    let mut server = MotorsServer::new(&ctx, &params, platform.n_motors)
        .wrap_err("Failed to initialise the motors server")?;

    let mut driver = drivers::from_id(&platform.driver, platform.n_motors)
        .wrap_err("Failed to bind the motor driver")?;

    let mut motor_ctrl = MotorCtrl::default();
    motor_ctrl
        .init(platform.clone(), &session)
        .wrap_err("Failed to initialise motor control")?;

    // ---- VOLTAGE READER ----

    let voltage_cell = voltage::VoltageCell::new(platform.voltage_default_v);
    let shutdown = Arc::new(AtomicBool::new(false));

    let _voltage_reader = voltage::VoltageReader::spawn(
        &ctx,
        &params.voltage_endpoint,
        voltage_cell.clone(),
        shutdown,
    )
    .wrap_err("Failed to start the voltage reader")?;

    // ---- REAL-TIME SCHEDULING ----

    // Actuator latency is safety relevant, so ask for the highest
    // fixed-priority class for the control loop
    request_rt_sched();

    // ---- MAIN LOOP ----

    info!("Initialisation complete, entering main loop");

    let mut last_cycle = Instant::now();

    loop {
        // Get the next force command, idling on absence. No command means no
        // state machine update: the last commanded intent holds until a new
        // command arrives.
        let cmd = match server.recv_forces() {
            Ok(Some(c)) => c,
            Ok(None) => {
                thread::sleep(IDLE_SLEEP);
                continue;
            }
            Err(e) => {
                warn!("Skipping cycle: {}", e);
                continue;
            }
        };

        // Elapsed wall time since the previous successful cycle
        let dt_s = last_cycle.elapsed().as_secs_f64();
        last_cycle = Instant::now();

        let input = InputData {
            dt_s,
            enable: cmd.enable,
            forces: cmd.forces,
            voltage_v: voltage_cell.get(),
        };

        let (output, report) = match motor_ctrl.proc(&input) {
            Ok(r) => r,
            Err(e) => {
                warn!("Skipping cycle: {}", e);
                continue;
            }
        };

        trace!(
            "Cycle: dt {:.4} s, phase {:?}, drives {:?}",
            dt_s,
            report.phase,
            output.drives
        );

        // Apply the drive vector. A hardware fault must not kill the node,
        // the next cycle re-commands the full vector.
        if let Err(e) = driver.apply(&output.drives) {
            warn!("Could not apply drives: {}", e);
        }

        // Broadcast the state code so downstream logic can gate on it
        if let Err(e) = server.publish_state(report.wire_code) {
            warn!("Could not publish the motors state: {}", e);
        }
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Request SCHED_FIFO at the maximum priority for this thread.
///
/// Needs the right privileges, so failure is logged and the node carries on
/// under the default scheduler.
#[cfg(target_os = "linux")]
fn request_rt_sched() {
    let priority = unsafe { libc::sched_get_priority_max(libc::SCHED_FIFO) };
    let sched_param = libc::sched_param {
        sched_priority: priority,
    };

    let ret = unsafe { libc::sched_setscheduler(0, libc::SCHED_FIFO, &sched_param) };

    if ret == 0 {
        info!("Real-time scheduling active (SCHED_FIFO, priority {})", priority);
    } else {
        warn!("Could not request real-time scheduling, running with the default scheduler");
    }
}

#[cfg(not(target_os = "linux"))]
fn request_rt_sched() {
    warn!("Real-time scheduling is not supported on this host");
}
