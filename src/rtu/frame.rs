//! # Modbus RTU Request Decoder
//!
//! This module decodes request ADUs received by the slave. It leverages the `nom`
//! crate for the big-endian field extraction.
//!
//! ## Frame layout
//!
//! ```text
//! [slave:1][function:1][start address:2][field2:2][byte count:1][payload..][crc:2]
//!                                                  \_ multi-write functions only _/
//! ```
//!
//! `field2` is the quantity for reads and multi-writes, and the value for the
//! single-write functions.
//!
//! ## Usage
//!
//! ```rust
//! use modbus_rtu_slave::rtu::frame::{decode_request, FrameRejection};
//!
//! let raw = [0x01, 0x03, 0x00, 0x00, 0x00, 0x0A, 0xC5, 0xCD];
//! let request = decode_request(&raw, 1).unwrap();
//! assert_eq!(request.function_code, 0x03);
//! assert_eq!(request.field2, 10);
//!
//! // Same frame, other slave
//! assert_eq!(decode_request(&raw, 2), Err(FrameRejection::NotAddressed(1)));
//! ```

use crate::constants::*;
use crate::error::ModbusError;
use crate::rtu::crc::{calculate_crc, frame_crc};
use nom::multi::length_data;
use nom::number::complete::{be_u16, be_u8};
use nom::IResult;
use std::fmt;
use thiserror::Error;

/// The function codes this slave implements.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum FunctionCode {
    ReadCoils,
    ReadDiscreteInputs,
    ReadHoldingRegisters,
    ReadInputRegisters,
    WriteSingleCoil,
    WriteSingleRegister,
    WriteMultipleCoils,
    WriteMultipleRegisters,
}

impl FunctionCode {
    pub fn code(self) -> u8 {
        match self {
            FunctionCode::ReadCoils => MODBUS_FC_READ_COILS,
            FunctionCode::ReadDiscreteInputs => MODBUS_FC_READ_DISCRETE_INPUTS,
            FunctionCode::ReadHoldingRegisters => MODBUS_FC_READ_HOLDING_REGISTERS,
            FunctionCode::ReadInputRegisters => MODBUS_FC_READ_INPUT_REGISTERS,
            FunctionCode::WriteSingleCoil => MODBUS_FC_WRITE_SINGLE_COIL,
            FunctionCode::WriteSingleRegister => MODBUS_FC_WRITE_SINGLE_REGISTER,
            FunctionCode::WriteMultipleCoils => MODBUS_FC_WRITE_MULTIPLE_COILS,
            FunctionCode::WriteMultipleRegisters => MODBUS_FC_WRITE_MULTIPLE_REGISTERS,
        }
    }

    /// Read functions are never executed for broadcast requests.
    pub fn is_read(self) -> bool {
        matches!(
            self,
            FunctionCode::ReadCoils
                | FunctionCode::ReadDiscreteInputs
                | FunctionCode::ReadHoldingRegisters
                | FunctionCode::ReadInputRegisters
        )
    }

    /// Multi-write requests carry a byte count and a payload after `field2`.
    pub fn has_payload(self) -> bool {
        matches!(
            self,
            FunctionCode::WriteMultipleCoils | FunctionCode::WriteMultipleRegisters
        )
    }
}

impl TryFrom<u8> for FunctionCode {
    type Error = u8;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            MODBUS_FC_READ_COILS => Ok(FunctionCode::ReadCoils),
            MODBUS_FC_READ_DISCRETE_INPUTS => Ok(FunctionCode::ReadDiscreteInputs),
            MODBUS_FC_READ_HOLDING_REGISTERS => Ok(FunctionCode::ReadHoldingRegisters),
            MODBUS_FC_READ_INPUT_REGISTERS => Ok(FunctionCode::ReadInputRegisters),
            MODBUS_FC_WRITE_SINGLE_COIL => Ok(FunctionCode::WriteSingleCoil),
            MODBUS_FC_WRITE_SINGLE_REGISTER => Ok(FunctionCode::WriteSingleRegister),
            MODBUS_FC_WRITE_MULTIPLE_COILS => Ok(FunctionCode::WriteMultipleCoils),
            MODBUS_FC_WRITE_MULTIPLE_REGISTERS => Ok(FunctionCode::WriteMultipleRegisters),
            other => Err(other),
        }
    }
}

/// A decoded request. Borrows its payload from the receive buffer and lives
/// for one receive cycle.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Request<'a> {
    pub slave_address: u8,
    pub function_code: u8,
    pub start_address: u16,
    pub field2: u16,
    /// Payload after the byte count field, multi-write functions only.
    pub extra_bytes: Option<&'a [u8]>,
}

impl Request<'_> {
    pub fn is_broadcast(&self) -> bool {
        self.slave_address == MODBUS_BROADCAST_ADDRESS
    }

    pub fn function(&self) -> Result<FunctionCode, u8> {
        FunctionCode::try_from(self.function_code)
    }
}

impl fmt::Display for Request<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "slave={} func=0x{:02X} addr={} field2=0x{:04X}",
            self.slave_address, self.function_code, self.start_address, self.field2
        )?;
        if let Some(extra) = self.extra_bytes {
            write!(f, " payload={}B", extra.len())?;
        }
        Ok(())
    }
}

/// Why a received buffer was not turned into a request. None of these are
/// answered on the wire.
#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum FrameRejection {
    #[error("frame too short: {0} bytes")]
    TooShort(usize),

    #[error("frame addressed to slave {0}")]
    NotAddressed(u8),

    #[error("crc mismatch: received 0x{received:04X}, calculated 0x{calculated:04X}")]
    ChecksumMismatch { received: u16, calculated: u16 },

    #[error("byte count {declared} exceeds the {available} payload bytes received")]
    Truncated { declared: usize, available: usize },
}

impl From<FrameRejection> for ModbusError {
    fn from(rejection: FrameRejection) -> Self {
        match rejection {
            FrameRejection::ChecksumMismatch {
                received,
                calculated,
            } => ModbusError::InvalidChecksum {
                expected: received,
                calculated,
            },
            other => ModbusError::InvalidFrame(other.to_string()),
        }
    }
}

/// Decode a raw buffer received by slave `slave`.
///
/// Checks run in wire order: minimum length, address (own or broadcast),
/// checksum, then the function-specific fields.
pub fn decode_request(raw: &[u8], slave: u8) -> Result<Request<'_>, FrameRejection> {
    if raw.len() < MODBUS_RTU_MIN_FRAME_LEN {
        return Err(FrameRejection::TooShort(raw.len()));
    }

    let address = raw[0];
    if address != slave && address != MODBUS_BROADCAST_ADDRESS {
        return Err(FrameRejection::NotAddressed(address));
    }

    let body = &raw[..raw.len() - 2];
    let received = frame_crc(raw).ok_or(FrameRejection::TooShort(raw.len()))?;
    let calculated = calculate_crc(body);
    if received != calculated {
        return Err(FrameRejection::ChecksumMismatch {
            received,
            calculated,
        });
    }

    // The length check above leaves at least six body bytes
    let (rest, (slave_address, function_code, start_address, field2)) =
        parse_header(body).map_err(|_| FrameRejection::TooShort(raw.len()))?;

    let extra_bytes = match FunctionCode::try_from(function_code) {
        Ok(function) if function.has_payload() => Some(parse_payload(rest)?),
        _ => None,
    };

    Ok(Request {
        slave_address,
        function_code,
        start_address,
        field2,
        extra_bytes,
    })
}

/// Decode, discarding the rejection reason.
pub fn decode(raw: &[u8], slave: u8) -> Option<Request<'_>> {
    decode_request(raw, slave).ok()
}

fn parse_header(input: &[u8]) -> IResult<&[u8], (u8, u8, u16, u16)> {
    let (input, slave_address) = be_u8(input)?;
    let (input, function_code) = be_u8(input)?;
    let (input, start_address) = be_u16(input)?;
    let (input, field2) = be_u16(input)?;
    Ok((input, (slave_address, function_code, start_address, field2)))
}

fn parse_payload(input: &[u8]) -> Result<&[u8], FrameRejection> {
    let declared = input.first().map_or(0, |&count| count as usize);
    let available = input.len().saturating_sub(1);
    let truncated = FrameRejection::Truncated {
        declared,
        available,
    };

    let result: IResult<&[u8], &[u8]> = length_data(be_u8)(input);
    result.map(|(_, payload)| payload).map_err(|_| truncated)
}
