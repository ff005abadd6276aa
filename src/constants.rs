//! Modbus RTU Protocol Constants
//!
//! This module defines constants used in the Modbus RTU slave implementation,
//! based on the Modbus Application Protocol Specification V1.1b3 and the
//! Modbus over Serial Line Specification V1.02.

/// Maximum RTU ADU length (address + PDU + CRC)
pub const MODBUS_RTU_MAX_ADU_LEN: usize = 256;

/// Frames shorter than this are dropped without further inspection
pub const MODBUS_RTU_MIN_FRAME_LEN: usize = 8;

/// Broadcast address, accepted by every slave
pub const MODBUS_BROADCAST_ADDRESS: u8 = 0;

/// Lowest and highest individually addressable slave
pub const MODBUS_MIN_SLAVE_ADDRESS: u8 = 1;
pub const MODBUS_MAX_SLAVE_ADDRESS: u8 = 247;

/// Initial value of the RTU CRC register
pub const MODBUS_CRC_INIT: u16 = 0xFFFF;

/// Reflected CRC-16/MODBUS polynomial
pub const MODBUS_CRC_POLYNOMIAL: u16 = 0xA001;

// ----------------------------------------------------------------------------
// Function codes
// ----------------------------------------------------------------------------

pub const MODBUS_FC_READ_COILS: u8 = 0x01;
pub const MODBUS_FC_READ_DISCRETE_INPUTS: u8 = 0x02;
pub const MODBUS_FC_READ_HOLDING_REGISTERS: u8 = 0x03;
pub const MODBUS_FC_READ_INPUT_REGISTERS: u8 = 0x04;
pub const MODBUS_FC_WRITE_SINGLE_COIL: u8 = 0x05;
pub const MODBUS_FC_WRITE_SINGLE_REGISTER: u8 = 0x06;
pub const MODBUS_FC_WRITE_MULTIPLE_COILS: u8 = 0x0F;
pub const MODBUS_FC_WRITE_MULTIPLE_REGISTERS: u8 = 0x10;

/// Set on the function code of an exception response
pub const MODBUS_EXCEPTION_FLAG: u8 = 0x80;

// ----------------------------------------------------------------------------
// Exception codes
// ----------------------------------------------------------------------------

pub const MODBUS_EXCEPTION_ILLEGAL_FUNCTION: u8 = 0x01;
pub const MODBUS_EXCEPTION_ILLEGAL_DATA_ADDRESS: u8 = 0x02;
pub const MODBUS_EXCEPTION_ILLEGAL_DATA_VALUE: u8 = 0x03;

// ----------------------------------------------------------------------------
// Single coil values
// ----------------------------------------------------------------------------

pub const MODBUS_COIL_ON: u16 = 0xFF00;
pub const MODBUS_COIL_OFF: u16 = 0x0000;

// ----------------------------------------------------------------------------
// Quantity limits (one PDU is at most 253 bytes)
// ----------------------------------------------------------------------------

pub const MODBUS_MAX_READ_BITS: u16 = 2000;
pub const MODBUS_MAX_READ_REGISTERS: u16 = 125;
pub const MODBUS_MAX_WRITE_BITS: u16 = 1968;
pub const MODBUS_MAX_WRITE_REGISTERS: u16 = 123;

// ----------------------------------------------------------------------------
// Serial line defaults
// ----------------------------------------------------------------------------

pub const MODBUS_DEFAULT_BAUD: u32 = 9600;
pub const MODBUS_DEFAULT_FORMAT: &str = "8n2";

/// Bits per character on the wire (start + 8 data + parity/stop + stop)
pub const MODBUS_BITS_PER_CHAR: u64 = 11;

/// Fixed t3.5 used above 19200 baud
pub const MODBUS_FIXED_FRAME_GAP_US: u64 = 1750;
