//! # Modbus RTU Checksum
//!
//! CRC-16/MODBUS: register initialised to `0xFFFF`, reflected polynomial `0xA001`,
//! transmitted low byte first. The lookup table is built at compile time.
//!
//! ```rust
//! use modbus_rtu_slave::rtu::crc::{append_crc, calculate_crc, verify_crc};
//!
//! let request = [0x01, 0x03, 0x00, 0x00, 0x00, 0x0A];
//! assert_eq!(calculate_crc(&request), 0xCDC5);
//!
//! let frame = append_crc(&request);
//! assert_eq!(&frame[6..], &[0xC5, 0xCD]);
//! assert!(verify_crc(&frame));
//! ```

use crate::constants::{MODBUS_CRC_INIT, MODBUS_CRC_POLYNOMIAL};
use bytes::BufMut;

static CRC_TABLE: [u16; 256] = build_crc_table();

const fn build_crc_table() -> [u16; 256] {
    let mut table = [0u16; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u16;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 1 != 0 {
                (crc >> 1) ^ MODBUS_CRC_POLYNOMIAL
            } else {
                crc >> 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

/// Calculate the RTU checksum of `data`
pub fn calculate_crc(data: &[u8]) -> u16 {
    data.iter().fold(MODBUS_CRC_INIT, |crc, &byte| {
        let idx = ((crc ^ byte as u16) & 0xFF) as usize;
        (crc >> 8) ^ CRC_TABLE[idx]
    })
}

/// Checksum carried in the last two bytes of `frame`, if it has them
pub fn frame_crc(frame: &[u8]) -> Option<u16> {
    match frame {
        [.., lo, hi] => Some(u16::from_le_bytes([*lo, *hi])),
        _ => None,
    }
}

/// Verify a frame whose last two bytes are its checksum
///
/// Frames shorter than the checksum itself never verify.
pub fn verify_crc(frame: &[u8]) -> bool {
    match frame_crc(frame) {
        Some(received) => calculate_crc(&frame[..frame.len() - 2]) == received,
        None => false,
    }
}

/// Return a copy of `data` with its checksum appended in transmission order
pub fn append_crc(data: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(data.len() + 2);
    frame.extend_from_slice(data);
    push_crc(&mut frame);
    frame
}

/// Append the checksum of `frame` to it in place, low byte first
pub fn push_crc<B>(frame: &mut B)
where
    B: BufMut + AsRef<[u8]>,
{
    let crc = calculate_crc(frame.as_ref());
    frame.put_u16_le(crc);
}
