//! # Slave Statistics
//!
//! Counters kept by the receive loop. They are diagnostics only and never
//! influence protocol behavior.
//!
//! ```rust
//! use modbus_rtu_slave::stats::SlaveStats;
//!
//! let stats = SlaveStats::default();
//! assert_eq!(stats.frames_received, 0);
//! assert!(stats.to_json().unwrap().contains("\"crc_errors\":0"));
//! ```

use crate::rtu::frame::FrameRejection;
use serde::{Deserialize, Serialize};

/// Counters for one slave instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlaveStats {
    /// Non-empty reads handed to the decoder
    pub frames_received: u64,
    /// Frames too short to inspect
    pub short_frames: u64,
    /// Frames addressed to another slave
    pub foreign_frames: u64,
    /// Frames failing checksum verification
    pub crc_errors: u64,
    /// Frames whose byte count runs past the received data
    pub truncated_frames: u64,
    /// Requests passed to the dispatcher
    pub requests: u64,
    /// Requests received on the broadcast address
    pub broadcasts: u64,
    /// Exception responses transmitted
    pub exceptions_sent: u64,
    /// Responses transmitted, exceptions included
    pub responses_sent: u64,
    /// Transport read failures
    pub read_errors: u64,
    /// Transport write failures
    pub write_errors: u64,
}

impl SlaveStats {
    pub(crate) fn record_rejection(&mut self, rejection: &FrameRejection) {
        match rejection {
            FrameRejection::TooShort(_) => self.short_frames += 1,
            FrameRejection::NotAddressed(_) => self.foreign_frames += 1,
            FrameRejection::ChecksumMismatch { .. } => self.crc_errors += 1,
            FrameRejection::Truncated { .. } => self.truncated_frames += 1,
        }
    }

    /// Frames dropped without a response for any reason
    pub fn frames_dropped(&self) -> u64 {
        self.short_frames + self.foreign_frames + self.crc_errors + self.truncated_frames
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
