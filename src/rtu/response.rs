//! # Modbus RTU Response Encoder
//!
//! Builds the response ADUs sent by the slave. Every shape ends with the RTU
//! checksum, low byte first.
//!
//! | Shape        | Layout                                               |
//! |--------------|------------------------------------------------------|
//! | Exception    | `slave, function \| 0x80, code`                      |
//! | Write ack    | `slave, function, address:be16, value:be16`          |
//! | Bit data     | `slave, function, byte count, packed bits..`         |
//! | Word data    | `slave, function, byte count, value:be16..`          |

use crate::constants::*;
use crate::rtu::crc::push_crc;
use crate::util::bits::{pack_bits, packed_len};
use bytes::{BufMut, Bytes, BytesMut};
use std::fmt;

/// Exception codes answered by this slave.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum ExceptionCode {
    IllegalFunction,
    IllegalDataAddress,
    IllegalDataValue,
}

impl ExceptionCode {
    pub fn code(self) -> u8 {
        match self {
            ExceptionCode::IllegalFunction => MODBUS_EXCEPTION_ILLEGAL_FUNCTION,
            ExceptionCode::IllegalDataAddress => MODBUS_EXCEPTION_ILLEGAL_DATA_ADDRESS,
            ExceptionCode::IllegalDataValue => MODBUS_EXCEPTION_ILLEGAL_DATA_VALUE,
        }
    }
}

impl fmt::Display for ExceptionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExceptionCode::IllegalFunction => "ILLEGAL_FUNCTION",
            ExceptionCode::IllegalDataAddress => "ILLEGAL_DATA_ADDRESS",
            ExceptionCode::IllegalDataValue => "ILLEGAL_DATA_VALUE",
        };
        write!(f, "{name} ({})", self.code())
    }
}

/// A response produced by the dispatcher, ready to be encoded.
///
/// The data variants carry a one-byte byte count on the wire: `Bits` holds at
/// most 2000 values and `Words` at most 125, i.e. 250 data bytes either way.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Response {
    Exception { function: u8, code: ExceptionCode },
    WriteAck { function: u8, address: u16, value: u16 },
    /// At most [`MODBUS_MAX_READ_BITS`] values
    Bits { function: u8, values: Vec<bool> },
    /// At most [`MODBUS_MAX_READ_REGISTERS`] values
    Words { function: u8, values: Vec<u16> },
}

impl Response {
    pub fn exception(function: u8, code: ExceptionCode) -> Self {
        Response::Exception { function, code }
    }

    pub fn function(&self) -> u8 {
        match self {
            Response::Exception { function, .. }
            | Response::WriteAck { function, .. }
            | Response::Bits { function, .. }
            | Response::Words { function, .. } => *function,
        }
    }

    pub fn is_exception(&self) -> bool {
        matches!(self, Response::Exception { .. })
    }

    /// Encoded length including the checksum.
    pub fn encoded_len(&self) -> usize {
        match self {
            Response::Exception { .. } => 5,
            Response::WriteAck { .. } => 8,
            Response::Bits { values, .. } => 5 + packed_len(values.len()),
            Response::Words { values, .. } => 5 + 2 * values.len(),
        }
    }

    /// Encode the response as sent by slave `slave`.
    ///
    /// Data responses must respect the per-variant limits documented on
    /// [`Response`]; the dispatcher enforces them. Larger payloads panic in
    /// debug builds.
    pub fn encode(&self, slave: u8) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        buf.put_u8(slave);

        match self {
            Response::Exception { function, code } => {
                buf.put_u8(function | MODBUS_EXCEPTION_FLAG);
                buf.put_u8(code.code());
            }
            Response::WriteAck {
                function,
                address,
                value,
            } => {
                buf.put_u8(*function);
                buf.put_u16(*address);
                buf.put_u16(*value);
            }
            Response::Bits { function, values } => {
                let packed = pack_bits(values);
                debug_assert!(values.len() <= MODBUS_MAX_READ_BITS as usize);
                buf.put_u8(*function);
                buf.put_u8(packed.len() as u8);
                buf.put_slice(&packed);
            }
            Response::Words { function, values } => {
                debug_assert!(values.len() <= MODBUS_MAX_READ_REGISTERS as usize);
                buf.put_u8(*function);
                buf.put_u8((values.len() * 2) as u8);
                for value in values {
                    buf.put_u16(*value);
                }
            }
        }

        push_crc(&mut buf);
        buf.freeze()
    }
}
