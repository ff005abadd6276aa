//! # Slave Configuration
//!
//! Serial line options and the slave identity, loadable from JSON:
//!
//! ```json
//! { "device": "/dev/ttyUSB0", "slave": 1, "serial": { "baud": 19200, "fmt": "8e1" } }
//! ```
//!
//! Missing serial options fall back to 9600 baud, `8n2`.

use crate::constants::*;
use crate::error::ModbusError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Serial line options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialOptions {
    /// Communication speed in baud
    pub baud: u32,
    /// Data bits, parity and stop bits, e.g. `8n2` or `8E1`
    pub fmt: String,
}

impl Default for SerialOptions {
    fn default() -> Self {
        SerialOptions {
            baud: MODBUS_DEFAULT_BAUD,
            fmt: MODBUS_DEFAULT_FORMAT.to_string(),
        }
    }
}

/// Everything needed to start a slave on a serial device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlaveConfig {
    pub device: String,
    pub slave: u8,
    #[serde(default)]
    pub serial: SerialOptions,
}

impl SlaveConfig {
    pub fn new(device: impl Into<String>, slave: u8) -> Self {
        SlaveConfig {
            device: device.into(),
            slave,
            serial: SerialOptions::default(),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, ModbusError> {
        let config: SlaveConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ModbusError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Checks the slave address range and that `fmt` parses.
    pub fn validate(&self) -> Result<(), ModbusError> {
        if !(MODBUS_MIN_SLAVE_ADDRESS..=MODBUS_MAX_SLAVE_ADDRESS).contains(&self.slave) {
            return Err(ModbusError::InvalidSlaveAddress(self.slave));
        }
        if self.serial.baud == 0 {
            return Err(ModbusError::ConfigError("baud must be non-zero".into()));
        }
        self.serial.fmt.parse::<crate::rtu::serial::FrameFormat>()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = SerialOptions::default();
        assert_eq!(options.baud, 9600);
        assert_eq!(options.fmt, "8n2");
    }

    #[test]
    fn test_partial_serial_options() {
        let config =
            SlaveConfig::from_json_str(r#"{"device":"/dev/ttyS0","slave":3,"serial":{"baud":19200}}"#)
                .unwrap();
        assert_eq!(config.serial.baud, 19200);
        assert_eq!(config.serial.fmt, "8n2");
    }

    #[test]
    fn test_missing_serial_section() {
        let config = SlaveConfig::from_json_str(r#"{"device":"COM3","slave":247}"#).unwrap();
        assert_eq!(config.serial, SerialOptions::default());
    }

    #[test]
    fn test_invalid_slave() {
        let err = SlaveConfig::from_json_str(r#"{"device":"COM3","slave":0}"#).unwrap_err();
        assert!(matches!(err, ModbusError::InvalidSlaveAddress(0)));
    }

    #[test]
    fn test_invalid_format() {
        let err = SlaveConfig::from_json_str(
            r#"{"device":"COM3","slave":1,"serial":{"fmt":"9x3"}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ModbusError::ConfigError(_)));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            SlaveConfig::from_json_str("{"),
            Err(ModbusError::ConfigError(_))
        ));
    }
}
