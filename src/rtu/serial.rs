//! # Modbus RTU Serial Transport
//!
//! This module opens the serial device for the slave and defines the transport
//! contract the receive loop runs against. Any `AsyncRead + AsyncWrite` byte
//! stream qualifies, which is how tests inject in-memory ports.

use crate::config::SerialOptions;
use crate::constants::{MODBUS_BITS_PER_CHAR, MODBUS_FIXED_FRAME_GAP_US};
use crate::error::ModbusError;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio_serial::{DataBits, Parity, SerialPortBuilderExt, SerialStream, StopBits};

/// Byte transport used by the slave.
#[async_trait::async_trait]
pub trait Transport: AsyncRead + AsyncWrite + Unpin + Send {
    /// Write one complete frame and flush it to the line.
    async fn transmit(&mut self, frame: &[u8]) -> Result<(), std::io::Error> {
        self.write_all(frame).await?;
        self.flush().await
    }
}

impl<T> Transport for T where T: AsyncRead + AsyncWrite + Unpin + Send {}

/// Character framing parsed from strings such as `8n2` or `7E1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameFormat {
    pub data_bits: DataBits,
    pub parity: Parity,
    pub stop_bits: StopBits,
}

impl FromStr for FrameFormat {
    type Err = ModbusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ModbusError::ConfigError(format!("invalid frame format '{s}'"));

        let chars: Vec<char> = s.trim().chars().collect();
        let &[data, parity, stop] = chars.as_slice() else {
            return Err(invalid());
        };

        let data_bits = match data {
            '5' => DataBits::Five,
            '6' => DataBits::Six,
            '7' => DataBits::Seven,
            '8' => DataBits::Eight,
            _ => return Err(invalid()),
        };
        let parity = match parity.to_ascii_lowercase() {
            'n' => Parity::None,
            'e' => Parity::Even,
            'o' => Parity::Odd,
            _ => return Err(invalid()),
        };
        let stop_bits = match stop {
            '1' => StopBits::One,
            '2' => StopBits::Two,
            _ => return Err(invalid()),
        };

        Ok(FrameFormat {
            data_bits,
            parity,
            stop_bits,
        })
    }
}

impl fmt::Display for FrameFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = match self.data_bits {
            DataBits::Five => '5',
            DataBits::Six => '6',
            DataBits::Seven => '7',
            DataBits::Eight => '8',
        };
        let parity = match self.parity {
            Parity::None => 'n',
            Parity::Even => 'e',
            Parity::Odd => 'o',
        };
        let stop = match self.stop_bits {
            StopBits::One => '1',
            StopBits::Two => '2',
        };
        write!(f, "{data}{parity}{stop}")
    }
}

/// Silent interval (t3.5) that ends a frame at `baud`.
///
/// 3.5 character times of 11 bits, fixed at 1750 µs above 19200 baud.
pub fn inter_frame_gap(baud: u32) -> Duration {
    if baud == 0 || baud > 19200 {
        return Duration::from_micros(MODBUS_FIXED_FRAME_GAP_US);
    }
    Duration::from_micros(MODBUS_BITS_PER_CHAR * 3_500_000 / baud as u64)
}

/// Open `device` with the given options.
pub fn open_port(device: &str, options: &SerialOptions) -> Result<SerialStream, ModbusError> {
    let format: FrameFormat = options.fmt.parse()?;
    log::debug!("opening {device} at {} baud, {format}", options.baud);

    tokio_serial::new(device, options.baud)
        .data_bits(format.data_bits)
        .parity(format.parity)
        .stop_bits(format.stop_bits)
        .open_native_async()
        .map_err(|e| ModbusError::SerialPortError(format!("{device}: {e}")))
}
