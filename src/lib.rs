//! # modbus-rtu-slave - A Rust Crate for Modbus RTU Slave Devices
//!
//! The modbus-rtu-slave crate lets a host answer Modbus RTU requests on a serial line,
//! with the application supplying the data behind coils, discrete inputs and registers.
//!
//! ## Features
//!
//! - CRC-16/MODBUS checksum generation and verification
//! - Request decoding for function codes 0x01-0x06, 0x0F and 0x10
//! - Capability-based dispatch: unsupported operations answer ILLEGAL_FUNCTION
//! - Broadcast handling (writes executed, never answered)
//! - An async receive loop over `tokio-serial`, or any `AsyncRead + AsyncWrite` transport
//! - JSON configuration, logging and per-slave statistics
//!
//! ## Usage
//!
//! ```toml
//! [dependencies]
//! modbus-rtu-slave = "0.1.0"
//! ```
//!
//! ```rust,no_run
//! use modbus_rtu_slave::{start, Capabilities, SlaveConfig};
//!
//! # async fn example() -> Result<(), modbus_rtu_slave::ModbusError> {
//! let caps = Capabilities::new()
//!     .with_read_holding_registers(|address, count| Some((address..address + count).collect()));
//! let mut slave = start(&SlaveConfig::new("/dev/ttyUSB0", 1), caps).await?;
//! slave.run().await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod register_bank;
pub mod rtu;
pub mod stats;
pub mod util;

pub use crate::config::{SerialOptions, SlaveConfig};
pub use crate::error::ModbusError;
pub use crate::logging::{init_logger, log_info};
pub use crate::register_bank::RegisterBank;
pub use crate::stats::SlaveStats;

// Core RTU types
pub use rtu::{
    calculate_crc, decode, decode_request, verify_crc, Capabilities, Dispatcher, ExceptionCode,
    FrameRejection, FunctionCode, Request, Response, RtuSlave, Transport,
};

use tokio_serial::SerialStream;

/// Open the configured serial port and build a slave on it.
///
/// # Arguments
/// * `config` - Device path, slave address and line settings
/// * `capabilities` - Data operations the application supports
///
/// # Returns
/// * `Ok(RtuSlave)` - Slave ready to [`RtuSlave::run`]
/// * `Err(ModbusError)` - Invalid configuration or the port could not be opened
pub async fn start(
    config: &SlaveConfig,
    capabilities: Capabilities,
) -> Result<RtuSlave<SerialStream>, ModbusError> {
    RtuSlave::open(config, capabilities).await
}
