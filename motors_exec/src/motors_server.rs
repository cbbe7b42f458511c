//! # Motors Server Module
//!
//! This module abstracts over the networking side of the motors executable:
//! the subscription the force commands arrive on and the publication the
//! motors state code goes out on. The voltage subscription lives with the
//! voltage reader task instead (see [`crate::voltage`]).

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use bus_if::{
    motors::{encode_state, ForceCommand, ProtocolError},
    net::{zmq, MonitoredSocket, MonitoredSocketError, SocketOptions},
};

use crate::params::MotorsExecParams;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Bounded wait on the force command subscription. Commands arrive at the
/// control rate, so absence beyond a few milliseconds means an idle cycle.
const FORCES_RECV_TIMEOUT_MS: i32 = 5;

/// Bounded wait on the state publication.
const STATE_SEND_TIMEOUT_MS: i32 = 10;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// An abstraction over the networking part of the motors executable.
pub struct MotorsServer {
    /// SUB socket on which force commands arrive
    forces_socket: MonitoredSocket,

    /// PUB socket which broadcasts the motors state code
    state_socket: MonitoredSocket,

    /// Number of motors force commands are validated against
    n_motors: usize,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors which can occur in the [`MotorsServer`]
#[derive(thiserror::Error, Debug)]
pub enum MotorsServerError {
    #[error("Socket error: {0}")]
    SocketError(#[from] MonitoredSocketError),

    #[error("Could not publish the motors state: {0}")]
    SendError(zmq::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl MotorsServer {
    /// Create a new instance of the motors server.
    ///
    /// This function will not wait for the command publisher to be present
    /// before returning.
    pub fn new(
        ctx: &zmq::Context,
        params: &MotorsExecParams,
        n_motors: usize,
    ) -> Result<Self, MotorsServerError> {
        let forces_socket_options = SocketOptions {
            recv_timeout: FORCES_RECV_TIMEOUT_MS,
            ..Default::default()
        };
        let state_socket_options = SocketOptions {
            bind: true,
            send_timeout: STATE_SEND_TIMEOUT_MS,
            ..Default::default()
        };

        let forces_socket = MonitoredSocket::new(
            ctx,
            zmq::SUB,
            forces_socket_options,
            &params.forces_endpoint,
        )?;
        let state_socket = MonitoredSocket::new(
            ctx,
            zmq::PUB,
            state_socket_options,
            &params.state_endpoint,
        )?;

        Ok(Self {
            forces_socket,
            state_socket,
            n_motors,
        })
    }

    /// Retrieve the next force command.
    ///
    /// Returns `Ok(None)` when no command arrived within the bounded wait,
    /// in which case the caller must idle without advancing any state. A
    /// malformed command is an `Err` and the whole cycle must be skipped, no
    /// partially decoded command is ever returned.
    pub fn recv_forces(&mut self) -> Result<Option<ForceCommand>, ProtocolError> {
        match self.forces_socket.recv_string(0) {
            Ok(Ok(raw)) => ForceCommand::decode(&raw, self.n_motors).map(Some),
            Ok(Err(_)) => Err(ProtocolError::NotUtf8),
            // Timeout or no publisher yet
            Err(_) => Ok(None),
        }
    }

    /// Publish the motors state code for this cycle.
    pub fn publish_state(&mut self, code: u8) -> Result<(), MotorsServerError> {
        self.state_socket
            .send(encode_state(code).as_str(), 0)
            .map_err(MotorsServerError::SendError)
    }
}
