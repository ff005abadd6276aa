//! # Request Dispatcher
//!
//! Routes a decoded request to the matching data store capability and decides
//! what, if anything, goes back on the wire.
//!
//! Per function the outcome is one of:
//! - capability absent: `ILLEGAL_FUNCTION`
//! - malformed value or quantity: `ILLEGAL_DATA_VALUE`
//! - capability rejects the range or the write: `ILLEGAL_DATA_ADDRESS`
//! - otherwise the data or acknowledgement response
//!
//! Broadcast reads are dropped before any of this. Broadcast writes are executed
//! but never answered.

use crate::constants::*;
use crate::error::ModbusError;
use crate::rtu::capability::Capabilities;
use crate::rtu::frame::{FunctionCode, Request};
use crate::rtu::response::{ExceptionCode, Response};
use crate::util::bits::{packed_len, unpack_bits};
use log::{debug, info, warn};

/// Owns the slave identity and its capabilities for the lifetime of the engine.
#[derive(Debug)]
pub struct Dispatcher {
    slave: u8,
    capabilities: Capabilities,
}

impl Dispatcher {
    /// Create a dispatcher for slave `slave` (1..=247).
    pub fn new(slave: u8, capabilities: Capabilities) -> Result<Self, ModbusError> {
        if !(MODBUS_MIN_SLAVE_ADDRESS..=MODBUS_MAX_SLAVE_ADDRESS).contains(&slave) {
            return Err(ModbusError::InvalidSlaveAddress(slave));
        }
        Ok(Dispatcher {
            slave,
            capabilities,
        })
    }

    pub fn slave(&self) -> u8 {
        self.slave
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    /// Handle one request. Returns the response to transmit, or `None` when
    /// nothing must be sent.
    pub fn dispatch(&mut self, request: &Request<'_>) -> Option<Response> {
        let broadcast = request.is_broadcast();

        let function = match request.function() {
            Ok(function) => function,
            Err(code) => {
                info!("illegal function: 0x{code:02X}");
                return (!broadcast)
                    .then(|| Response::exception(code, ExceptionCode::IllegalFunction));
            }
        };

        if broadcast && function.is_read() {
            debug!("dropping broadcast read 0x{:02X}", function.code());
            return None;
        }

        let response = match function {
            FunctionCode::ReadCoils => self.read_coils(request),
            FunctionCode::ReadDiscreteInputs => self.read_discrete_inputs(request),
            FunctionCode::ReadHoldingRegisters => self.read_holding_registers(request),
            FunctionCode::ReadInputRegisters => self.read_input_registers(request),
            FunctionCode::WriteSingleCoil => self.write_single_coil(request),
            FunctionCode::WriteSingleRegister => self.write_single_register(request),
            FunctionCode::WriteMultipleCoils => self.write_multiple_coils(request),
            FunctionCode::WriteMultipleRegisters => self.write_multiple_registers(request),
        };

        if let Response::Exception { code, .. } = &response {
            debug!("{request} -> {code}");
        }

        (!broadcast).then_some(response)
    }

    fn read_coils(&mut self, request: &Request<'_>) -> Response {
        let Some(read) = self.capabilities.read_coils.as_mut() else {
            return Response::exception(MODBUS_FC_READ_COILS, ExceptionCode::IllegalFunction);
        };
        read_bits(MODBUS_FC_READ_COILS, read, request)
    }

    fn read_discrete_inputs(&mut self, request: &Request<'_>) -> Response {
        let Some(read) = self.capabilities.read_discrete_inputs.as_mut() else {
            return Response::exception(
                MODBUS_FC_READ_DISCRETE_INPUTS,
                ExceptionCode::IllegalFunction,
            );
        };
        read_bits(MODBUS_FC_READ_DISCRETE_INPUTS, read, request)
    }

    fn read_holding_registers(&mut self, request: &Request<'_>) -> Response {
        let Some(read) = self.capabilities.read_holding_registers.as_mut() else {
            return Response::exception(
                MODBUS_FC_READ_HOLDING_REGISTERS,
                ExceptionCode::IllegalFunction,
            );
        };
        read_words(MODBUS_FC_READ_HOLDING_REGISTERS, read, request)
    }

    fn read_input_registers(&mut self, request: &Request<'_>) -> Response {
        let Some(read) = self.capabilities.read_input_registers.as_mut() else {
            return Response::exception(
                MODBUS_FC_READ_INPUT_REGISTERS,
                ExceptionCode::IllegalFunction,
            );
        };
        read_words(MODBUS_FC_READ_INPUT_REGISTERS, read, request)
    }

    fn write_single_coil(&mut self, request: &Request<'_>) -> Response {
        const FC: u8 = MODBUS_FC_WRITE_SINGLE_COIL;
        let Some(write) = self.capabilities.write_coils.as_mut() else {
            return Response::exception(FC, ExceptionCode::IllegalFunction);
        };

        let value = request.field2;
        if value != MODBUS_COIL_ON && value != MODBUS_COIL_OFF {
            return Response::exception(FC, ExceptionCode::IllegalDataValue);
        }

        if write(request.start_address, &[value == MODBUS_COIL_ON]) {
            Response::WriteAck {
                function: FC,
                address: request.start_address,
                value,
            }
        } else {
            Response::exception(FC, ExceptionCode::IllegalDataAddress)
        }
    }

    fn write_single_register(&mut self, request: &Request<'_>) -> Response {
        const FC: u8 = MODBUS_FC_WRITE_SINGLE_REGISTER;
        let Some(write) = self.capabilities.write_registers.as_mut() else {
            return Response::exception(FC, ExceptionCode::IllegalFunction);
        };

        if write(request.start_address, &[request.field2]) {
            Response::WriteAck {
                function: FC,
                address: request.start_address,
                value: request.field2,
            }
        } else {
            Response::exception(FC, ExceptionCode::IllegalDataAddress)
        }
    }

    fn write_multiple_coils(&mut self, request: &Request<'_>) -> Response {
        const FC: u8 = MODBUS_FC_WRITE_MULTIPLE_COILS;
        let Some(write) = self.capabilities.write_coils.as_mut() else {
            return Response::exception(FC, ExceptionCode::IllegalFunction);
        };

        let count = request.field2;
        let payload = request.extra_bytes.unwrap_or_default();
        if !(1..=MODBUS_MAX_WRITE_BITS).contains(&count)
            || payload.len() != packed_len(count as usize)
        {
            return Response::exception(FC, ExceptionCode::IllegalDataValue);
        }

        let values = unpack_bits(payload, count as usize);
        if write(request.start_address, &values) {
            Response::WriteAck {
                function: FC,
                address: request.start_address,
                value: count,
            }
        } else {
            Response::exception(FC, ExceptionCode::IllegalDataAddress)
        }
    }

    fn write_multiple_registers(&mut self, request: &Request<'_>) -> Response {
        const FC: u8 = MODBUS_FC_WRITE_MULTIPLE_REGISTERS;
        let Some(write) = self.capabilities.write_registers.as_mut() else {
            return Response::exception(FC, ExceptionCode::IllegalFunction);
        };

        let count = request.field2;
        let payload = request.extra_bytes.unwrap_or_default();
        if !(1..=MODBUS_MAX_WRITE_REGISTERS).contains(&count)
            || payload.len() != 2 * count as usize
        {
            return Response::exception(FC, ExceptionCode::IllegalDataValue);
        }

        let values: Vec<u16> = payload
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        if write(request.start_address, &values) {
            Response::WriteAck {
                function: FC,
                address: request.start_address,
                value: count,
            }
        } else {
            Response::exception(FC, ExceptionCode::IllegalDataAddress)
        }
    }
}

fn read_bits<F>(function: u8, read: &mut F, request: &Request<'_>) -> Response
where
    F: FnMut(u16, u16) -> Option<Vec<bool>> + ?Sized,
{
    let count = request.field2;
    if !(1..=MODBUS_MAX_READ_BITS).contains(&count) {
        return Response::exception(function, ExceptionCode::IllegalDataValue);
    }

    match read(request.start_address, count) {
        Some(values) if values.len() == count as usize => Response::Bits { function, values },
        Some(values) => {
            warn!(
                "data store returned {} values for a read of {count}",
                values.len()
            );
            Response::exception(function, ExceptionCode::IllegalDataAddress)
        }
        None => Response::exception(function, ExceptionCode::IllegalDataAddress),
    }
}

fn read_words<F>(function: u8, read: &mut F, request: &Request<'_>) -> Response
where
    F: FnMut(u16, u16) -> Option<Vec<u16>> + ?Sized,
{
    let count = request.field2;
    if !(1..=MODBUS_MAX_READ_REGISTERS).contains(&count) {
        return Response::exception(function, ExceptionCode::IllegalDataValue);
    }

    match read(request.start_address, count) {
        Some(values) if values.len() == count as usize => Response::Words { function, values },
        Some(values) => {
            warn!(
                "data store returned {} values for a read of {count}",
                values.len()
            );
            Response::exception(function, ExceptionCode::IllegalDataAddress)
        }
        None => Response::exception(function, ExceptionCode::IllegalDataAddress),
    }
}
