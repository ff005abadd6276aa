//! # Modbus RTU Slave
//!
//! The receive loop: one read in flight at a time, each completed read decoded,
//! dispatched and answered before the next read is issued. Nothing here is
//! fatal; a bad frame or a transport error costs that one cycle only.

use crate::config::SlaveConfig;
use crate::constants::{MODBUS_DEFAULT_BAUD, MODBUS_RTU_MAX_ADU_LEN};
use crate::error::ModbusError;
use crate::log_warn_throttled;
use crate::rtu::capability::Capabilities;
use crate::rtu::dispatch::Dispatcher;
use crate::rtu::frame::{decode_request, FrameRejection};
use crate::rtu::serial::{inter_frame_gap, open_port, Transport};
use crate::stats::SlaveStats;
use crate::util::logging::{log_frame_hex, LogThrottle};
use bytes::Bytes;
use log::{debug, error, info};
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::time::{sleep, timeout};
use tokio_serial::SerialStream;

/// At most this many checksum or read error lines per second
const ERROR_LOG_CAP: u32 = 10;
const ERROR_LOG_WINDOW_MS: u64 = 1000;

/// A Modbus RTU slave bound to one transport.
pub struct RtuSlave<P: Transport> {
    port: P,
    dispatcher: Dispatcher,
    frame_gap: Duration,
    stats: SlaveStats,
    crc_log: LogThrottle,
    read_error_log: LogThrottle,
}

impl RtuSlave<SerialStream> {
    /// Open the configured serial device and build a slave on it.
    ///
    /// On error the device is not held open and no slave exists.
    pub async fn open(config: &SlaveConfig, capabilities: Capabilities) -> Result<Self, ModbusError> {
        config.validate()?;
        let port = open_port(&config.device, &config.serial)?;
        let slave = Self::new(port, config.slave, capabilities)?
            .with_frame_gap(inter_frame_gap(config.serial.baud));
        info!(
            "Modbus RTU slave {} on {} ({} baud, {})",
            config.slave, config.device, config.serial.baud, config.serial.fmt
        );
        Ok(slave)
    }
}

impl<P: Transport> RtuSlave<P> {
    /// Build a slave answering as `slave` (1..=247) on `port`.
    pub fn new(port: P, slave: u8, capabilities: Capabilities) -> Result<Self, ModbusError> {
        Ok(RtuSlave {
            port,
            dispatcher: Dispatcher::new(slave, capabilities)?,
            frame_gap: inter_frame_gap(MODBUS_DEFAULT_BAUD),
            stats: SlaveStats::default(),
            crc_log: LogThrottle::new(ERROR_LOG_WINDOW_MS, ERROR_LOG_CAP),
            read_error_log: LogThrottle::new(ERROR_LOG_WINDOW_MS, ERROR_LOG_CAP),
        })
    }

    /// Silent interval that ends a frame.
    pub fn with_frame_gap(mut self, frame_gap: Duration) -> Self {
        self.frame_gap = frame_gap;
        self
    }

    pub fn slave(&self) -> u8 {
        self.dispatcher.slave()
    }

    pub fn frame_gap(&self) -> Duration {
        self.frame_gap
    }

    pub fn stats(&self) -> &SlaveStats {
        &self.stats
    }

    /// Serve requests for as long as the process runs.
    pub async fn run(&mut self) {
        loop {
            self.poll_once().await;
        }
    }

    /// One receive cycle: read a frame, then decode, dispatch and respond.
    ///
    /// Returns the frame transmitted, if any. Empty reads and read errors back
    /// off for one frame gap before returning so a dead line does not spin.
    pub async fn poll_once(&mut self) -> Option<Bytes> {
        match self.read_frame().await {
            Ok(frame) if !frame.is_empty() => self.process(&frame).await,
            Ok(_) => {
                sleep(self.frame_gap).await;
                None
            }
            Err(e) => {
                self.stats.read_errors += 1;
                if self.read_error_log.allow() {
                    error!("read error: {e}");
                }
                sleep(self.frame_gap).await;
                None
            }
        }
    }

    /// Decode, dispatch and answer one received buffer.
    ///
    /// Returns the frame transmitted. Write failures are logged and counted,
    /// never retried.
    pub async fn process(&mut self, raw: &[u8]) -> Option<Bytes> {
        self.stats.frames_received += 1;
        log_frame_hex("rx", raw);

        let request = match decode_request(raw, self.dispatcher.slave()) {
            Ok(request) => request,
            Err(rejection) => {
                self.stats.record_rejection(&rejection);
                match rejection {
                    FrameRejection::ChecksumMismatch { .. } => {
                        log_warn_throttled!(self.crc_log, "crc error: {rejection}");
                    }
                    _ => debug!("dropping frame: {rejection}"),
                }
                return None;
            }
        };

        self.stats.requests += 1;
        if request.is_broadcast() {
            self.stats.broadcasts += 1;
        }
        debug!("request: {request}");

        let response = self.dispatcher.dispatch(&request)?;
        let frame = response.encode(self.dispatcher.slave());
        log_frame_hex("tx", &frame);

        match self.port.transmit(&frame).await {
            Ok(()) => {
                self.stats.responses_sent += 1;
                if response.is_exception() {
                    self.stats.exceptions_sent += 1;
                }
                Some(frame)
            }
            Err(e) => {
                self.stats.write_errors += 1;
                error!("write error: {e}");
                None
            }
        }
    }

    /// Read one frame: the first read waits indefinitely, further reads are
    /// appended while bytes keep arriving within the frame gap.
    async fn read_frame(&mut self) -> Result<Vec<u8>, std::io::Error> {
        let mut buf = vec![0u8; MODBUS_RTU_MAX_ADU_LEN];
        let mut len = self.port.read(&mut buf).await?;

        while len > 0 && len < buf.len() {
            match timeout(self.frame_gap, self.port.read(&mut buf[len..])).await {
                Ok(Ok(0)) | Err(_) => break,
                Ok(Ok(n)) => len += n,
                Ok(Err(e)) => return Err(e),
            }
        }

        buf.truncate(len);
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::register_bank::RegisterBank;
    use crate::rtu::serial_mock::MockSerialPort;
    use std::sync::{Arc, Mutex};

    fn demo_slave(port: MockSerialPort) -> (RtuSlave<MockSerialPort>, Arc<Mutex<RegisterBank>>) {
        let bank = Arc::new(Mutex::new(RegisterBank::with_demo_values(0, 10)));
        let caps = RegisterBank::into_capabilities(Arc::clone(&bank));
        let slave = RtuSlave::new(port, 1, caps)
            .unwrap()
            .with_frame_gap(Duration::from_millis(1));
        (slave, bank)
    }

    #[test]
    fn test_new_rejects_broadcast_identity() {
        let result = RtuSlave::new(MockSerialPort::new(), 0, Capabilities::new());
        assert!(matches!(result, Err(ModbusError::InvalidSlaveAddress(0))));
    }

    #[tokio::test]
    async fn test_read_holding_registers_cycle() {
        let port = MockSerialPort::new();
        port.queue_request(&[0x01, 0x03, 0x00, 0x00, 0x00, 0x05]);
        let (mut slave, _) = demo_slave(port.clone());

        let sent = slave.poll_once().await.unwrap();
        assert_eq!(&sent[..3], &[0x01, 0x03, 0x0A]);
        assert_eq!(port.get_tx_data(), sent.to_vec());
        assert_eq!(slave.stats().responses_sent, 1);
    }

    #[tokio::test]
    async fn test_frame_split_across_reads() {
        let port = MockSerialPort::new();
        port.queue_rx_data(&[0x01, 0x03, 0x00]);
        port.queue_rx_data(&[0x00, 0x00, 0x05, 0x85, 0xC9]);
        let (mut slave, _) = demo_slave(port.clone());

        assert!(slave.poll_once().await.is_some());
        assert_eq!(slave.stats().frames_received, 1);
        assert_eq!(slave.stats().crc_errors, 0);
    }

    #[tokio::test]
    async fn test_crc_error_is_dropped() {
        let port = MockSerialPort::new();
        port.queue_rx_data(&[0x01, 0x03, 0x00, 0x00, 0x00, 0x05, 0x00, 0x00]);
        let (mut slave, _) = demo_slave(port.clone());

        assert!(slave.poll_once().await.is_none());
        assert!(port.get_tx_data().is_empty());
        assert_eq!(slave.stats().crc_errors, 1);
    }

    #[tokio::test]
    async fn test_broadcast_write_is_silent() {
        let port = MockSerialPort::new();
        port.queue_request(&[0x00, 0x06, 0x00, 0x02, 0x12, 0x34]);
        let (mut slave, bank) = demo_slave(port.clone());

        assert!(slave.poll_once().await.is_none());
        assert!(port.get_tx_data().is_empty());
        assert_eq!(
            bank.lock().unwrap().read_holding_registers(2, 1),
            Some(vec![0x1234])
        );
        assert_eq!(slave.stats().broadcasts, 1);
    }

    #[tokio::test]
    async fn test_empty_read_falls_through() {
        let (mut slave, _) = demo_slave(MockSerialPort::new());
        assert!(slave.poll_once().await.is_none());
        assert_eq!(slave.stats().frames_received, 0);
    }

    #[tokio::test]
    async fn test_read_error_recovers() {
        let port = MockSerialPort::new();
        port.set_next_error(std::io::Error::new(std::io::ErrorKind::Other, "framing"));
        let (mut slave, _) = demo_slave(port.clone());

        assert!(slave.poll_once().await.is_none());
        assert_eq!(slave.stats().read_errors, 1);

        port.queue_request(&[0x01, 0x04, 0x00, 0x02, 0x00, 0x02]);
        let sent = slave.poll_once().await.unwrap();
        assert_eq!(
            &sent[..],
            &[0x01, 0x04, 0x04, 0x00, 0x02, 0x00, 0x03, 0x1A, 0x45]
        );
    }

    #[tokio::test]
    async fn test_write_error_is_counted() {
        let port = MockSerialPort::new();
        let (mut slave, _) = demo_slave(port.clone());

        let raw = crate::rtu::crc::append_crc(&[0x01, 0x03, 0x00, 0x00, 0x00, 0x01]);
        port.set_next_error(std::io::Error::new(
            std::io::ErrorKind::BrokenPipe,
            "Test error",
        ));
        assert!(slave.process(&raw).await.is_none());
        assert_eq!(slave.stats().write_errors, 1);
        assert_eq!(slave.stats().responses_sent, 0);
    }

    #[tokio::test]
    async fn test_open_missing_device_fails() {
        let config = SlaveConfig::new("/dev/does-not-exist-modbus", 1);
        let result = RtuSlave::open(&config, Capabilities::new()).await;
        assert!(matches!(result, Err(ModbusError::SerialPortError(_))));
    }
}
