//! # Voltage Module
//!
//! The supply voltage is a compensation input to the force-to-drive mapping,
//! published on the bus by the battery monitor at a low rate. A background
//! reader task keeps the latest reading in a shared cell which the control
//! loop samples every cycle.
//!
//! Voltage is secondary: a malformed or missing sample never stops the node,
//! the last good value (or the configured default) is simply retained.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc,
};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, trace, warn};

use bus_if::motors::decode_voltage;
use bus_if::net::{zmq, MonitoredSocket, MonitoredSocketError, SocketOptions};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Bounded wait on the voltage subscription before treating the cycle as a
/// telemetry gap.
const VOLTAGE_RECV_TIMEOUT_MS: i32 = 200;

/// Pause after a telemetry gap. Voltage telemetry is low-frequency and
/// non-urgent, so the reader backs off rather than spinning.
const GAP_RETRY_DELAY: Duration = Duration::from_secs(1);

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A concurrently readable/writable cell holding the latest supply voltage.
///
/// The reader task is the sole writer, the control loop reads through the
/// mapper. Stores the value as atomic bits, so a `get` concurrent with a
/// `set` yields either the new or the previous reading, never a torn value.
/// Relaxed ordering is sufficient: the only contract is eventual visibility
/// of the latest reading.
#[derive(Clone)]
pub struct VoltageCell {
    bits: Arc<AtomicU64>,
}

/// Background task feeding a [`VoltageCell`] from the bus.
pub struct VoltageReader;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors raised while starting the voltage reader.
#[derive(thiserror::Error, Debug)]
pub enum VoltageReaderError {
    #[error("Socket error: {0}")]
    SocketError(#[from] MonitoredSocketError),

    #[error("Could not spawn the reader thread: {0}")]
    SpawnError(std::io::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl VoltageCell {
    /// Create a new cell holding the given default until the first reading
    /// arrives.
    pub fn new(default_v: f64) -> Self {
        VoltageCell {
            bits: Arc::new(AtomicU64::new(default_v.to_bits())),
        }
    }

    /// Get the most recently stored voltage. Never blocks.
    pub fn get(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Relaxed))
    }

    /// Store a new voltage reading.
    pub fn set(&self, voltage_v: f64) {
        self.bits.store(voltage_v.to_bits(), Ordering::Relaxed);
    }
}

impl VoltageReader {
    /// Spawn the reader task on the voltage telemetry endpoint.
    ///
    /// The task runs until `shutdown` is raised. It only ever writes
    /// validated readings into the cell, malformed samples are dropped at
    /// this boundary with a warning.
    pub fn spawn(
        ctx: &zmq::Context,
        endpoint: &str,
        cell: VoltageCell,
        shutdown: Arc<AtomicBool>,
    ) -> Result<JoinHandle<()>, VoltageReaderError> {
        let socket_options = SocketOptions {
            recv_timeout: VOLTAGE_RECV_TIMEOUT_MS,
            ..Default::default()
        };

        let socket = MonitoredSocket::new(ctx, zmq::SUB, socket_options, endpoint)?;

        thread::Builder::new()
            .name("voltage_reader".into())
            .spawn(move || reader_loop(socket, cell, shutdown))
            .map_err(VoltageReaderError::SpawnError)
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn reader_loop(socket: MonitoredSocket, cell: VoltageCell, shutdown: Arc<AtomicBool>) {
    while !shutdown.load(Ordering::Relaxed) {
        match socket.recv_string(0) {
            Ok(Ok(raw)) => match decode_voltage(&raw) {
                Ok(voltage_v) => {
                    cell.set(voltage_v);
                    trace!("Voltage: {:.2} V", voltage_v);
                }
                Err(e) => warn!("Dropping voltage sample: {}", e),
            },
            Ok(Err(_)) => warn!("Dropping voltage sample: message is not valid UTF-8"),
            Err(_) => {
                // Telemetry gap, keep the last good value and retry later
                debug!("No voltage telemetry received");
                thread::sleep(GAP_RETRY_DELAY);
            }
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_cell_holds_default_until_set() {
        let cell = VoltageCell::new(16.0);
        assert_eq!(cell.get(), 16.0);

        cell.set(14.7);
        assert_eq!(cell.get(), 14.7);
    }

    #[test]
    fn test_cell_is_shared_between_clones() {
        let writer = VoltageCell::new(16.0);
        let reader = writer.clone();

        writer.set(12.3);
        assert_eq!(reader.get(), 12.3);
    }
}
