//! # Motors Node Messages
//!
//! Wire format for the motors node. All messages are JSON positional arrays:
//!
//! - force command: `[enable, f_0, .., f_{n-1}]` where `enable` is an integer
//!   (zero is off, anything else is on) and each `f_i` is the requested force
//!   for motor `i` in newtons.
//! - voltage telemetry: `[voltage]`, the measured supply voltage in volts.
//! - motors state: `[state]`, the integer state code published by the motors
//!   node each cycle.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde_json::Value;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A decoded force command.
///
/// Created fresh for each received message and consumed within the cycle that
/// received it.
#[derive(Debug, Clone, PartialEq)]
pub struct ForceCommand {
    /// Whether the motors should be enabled.
    pub enable: bool,

    /// Requested force per motor, index-aligned to motor identity.
    ///
    /// Always exactly as long as the motor count the command was decoded
    /// against.
    pub forces: Vec<f64>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors raised when an inbound message does not match the wire format.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ProtocolError {
    #[error("Message is not a JSON array")]
    NotAnArray,

    #[error("Message array is empty")]
    Empty,

    #[error("Expected an array of length {expected}, found {found}")]
    WrongLength { expected: usize, found: usize },

    #[error("Element {0} is not a number of the expected kind")]
    BadElement(usize),

    #[error("Reading is not a usable value: {0}")]
    BadReading(f64),

    #[error("Message is not valid JSON: {0}")]
    Json(String),

    #[error("Message is not valid UTF-8")]
    NotUtf8,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ForceCommand {
    /// Decode a raw force command message.
    ///
    /// The message must be an array of exactly `n_motors + 1` elements: the
    /// enable flag followed by one force per motor. Any shape or length
    /// mismatch is a [`ProtocolError`] and the caller must discard the whole
    /// message, partial data never escapes this function.
    pub fn decode(raw: &str, n_motors: usize) -> Result<Self, ProtocolError> {
        let array = parse_array(raw)?;

        if array.is_empty() {
            return Err(ProtocolError::Empty);
        }
        if array.len() != n_motors + 1 {
            return Err(ProtocolError::WrongLength {
                expected: n_motors + 1,
                found: array.len(),
            });
        }

        // The enable flag is an integer, zero meaning off
        let enable = match array[0].as_i64() {
            Some(i) => i != 0,
            None => return Err(ProtocolError::BadElement(0)),
        };

        let mut forces = Vec::with_capacity(n_motors);
        for (i, element) in array.iter().enumerate().skip(1) {
            match element.as_f64() {
                Some(f) if f.is_finite() => forces.push(f),
                _ => return Err(ProtocolError::BadElement(i)),
            }
        }

        Ok(ForceCommand { enable, forces })
    }
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Decode a raw voltage telemetry message.
///
/// The message is a single-element array holding the measured supply voltage.
/// Non-finite or negative readings are rejected here so they can never reach
/// the voltage cell.
pub fn decode_voltage(raw: &str) -> Result<f64, ProtocolError> {
    let array = parse_array(raw)?;

    if array.len() != 1 {
        return Err(ProtocolError::WrongLength {
            expected: 1,
            found: array.len(),
        });
    }

    let voltage = array[0].as_f64().ok_or(ProtocolError::BadElement(0))?;

    if !voltage.is_finite() || voltage < 0.0 {
        return Err(ProtocolError::BadReading(voltage));
    }

    Ok(voltage)
}

/// Encode a motors state code for publication.
pub fn encode_state(code: u8) -> String {
    format!("[{}]", code)
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Parse a raw message into a JSON array.
fn parse_array(raw: &str) -> Result<Vec<Value>, ProtocolError> {
    let value: Value =
        serde_json::from_str(raw).map_err(|e| ProtocolError::Json(e.to_string()))?;

    match value {
        Value::Array(a) => Ok(a),
        _ => Err(ProtocolError::NotAnArray),
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_decode_force_command() {
        let cmd = ForceCommand::decode("[1, 2.0, 2.0, 2.0, 2.0]", 4).unwrap();
        assert!(cmd.enable);
        assert_eq!(cmd.forces, vec![2.0, 2.0, 2.0, 2.0]);

        // Zero is the only "off" value, any other integer enables
        let cmd = ForceCommand::decode("[0, 0, 0, 0, 0]", 4).unwrap();
        assert!(!cmd.enable);
        assert_eq!(cmd.forces, vec![0.0, 0.0, 0.0, 0.0]);

        let cmd = ForceCommand::decode("[2, 1.5]", 1).unwrap();
        assert!(cmd.enable);
    }

    #[test]
    fn test_decode_force_command_wrong_length() {
        // 2 elements when 5 are expected
        assert_eq!(
            ForceCommand::decode("[1, 2.0]", 4),
            Err(ProtocolError::WrongLength {
                expected: 5,
                found: 2
            })
        );

        // Too many is just as bad as too few
        assert!(matches!(
            ForceCommand::decode("[1, 2.0, 2.0]", 1),
            Err(ProtocolError::WrongLength { .. })
        ));
    }

    #[test]
    fn test_decode_force_command_bad_shape() {
        assert_eq!(
            ForceCommand::decode("{\"enable\": 1}", 4),
            Err(ProtocolError::NotAnArray)
        );
        assert_eq!(ForceCommand::decode("[]", 4), Err(ProtocolError::Empty));
        assert!(matches!(
            ForceCommand::decode("not json", 4),
            Err(ProtocolError::Json(_))
        ));

        // A non-integer enable flag is a protocol fault
        assert_eq!(
            ForceCommand::decode("[1.5, 2.0]", 1),
            Err(ProtocolError::BadElement(0))
        );

        // As is a non-numeric force
        assert_eq!(
            ForceCommand::decode("[1, \"high\"]", 1),
            Err(ProtocolError::BadElement(1))
        );
    }

    #[test]
    fn test_decode_voltage() {
        assert_eq!(decode_voltage("[16.0]"), Ok(16.0));
        assert_eq!(decode_voltage("[11]"), Ok(11.0));

        assert!(matches!(
            decode_voltage("[16.0, 1.0]"),
            Err(ProtocolError::WrongLength { .. })
        ));
        assert!(matches!(
            decode_voltage("[-1.0]"),
            Err(ProtocolError::BadReading(_))
        ));
        assert!(matches!(
            decode_voltage("[null]"),
            Err(ProtocolError::BadElement(0))
        ));
    }

    #[test]
    fn test_encode_state() {
        assert_eq!(encode_state(6), "[6]");
    }
}
