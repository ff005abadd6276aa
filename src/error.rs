//! # Modbus Error Handling
//!
//! This module defines the ModbusError enum, which represents the different error
//! types that can occur in the modbus-rtu-slave crate.
//!
//! Protocol exceptions answered on the wire (illegal function, illegal data
//! address, illegal data value) are not errors in this sense; they are ordinary
//! values produced by the dispatcher, see [`crate::rtu::ExceptionCode`].

use thiserror::Error;

/// Represents the different error types that can occur in the Modbus RTU slave crate.
#[derive(Debug, Error)]
pub enum ModbusError {
    /// Indicates an error related to the serial port communication.
    #[error("Serial port error: {0}")]
    SerialPortError(String),

    /// Indicates a frame that could not be decoded.
    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    /// Indicates a checksum mismatch.
    #[error("Invalid checksum: expected 0x{expected:04X}, calculated 0x{calculated:04X}")]
    InvalidChecksum { expected: u16, calculated: u16 },

    /// Indicates an invalid or inconsistent configuration value.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Indicates a slave address outside of 1..=247.
    #[error("Invalid slave address: {0}")]
    InvalidSlaveAddress(u8),

    /// Indicates an invalid hexadecimal string was provided.
    #[error("Invalid hexadecimal string")]
    InvalidHexString,

    /// Wraps I/O failures outside the serial port itself (e.g. reading a config file).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for ModbusError {
    fn from(err: serde_json::Error) -> Self {
        ModbusError::ConfigError(err.to_string())
    }
}

impl From<crate::util::hex::HexError> for ModbusError {
    fn from(_: crate::util::hex::HexError) -> Self {
        ModbusError::InvalidHexString
    }
}
