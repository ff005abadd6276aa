//! # Utility Modules
//!
//! This module provides common utility functions used throughout the
//! modbus-rtu-slave crate: bit packing, hex encoding/decoding and
//! throttled diagnostic logging.

pub mod bits;
pub mod hex;
pub mod logging;

// Re-export commonly used types and functions
pub use bits::{pack_bits, packed_len, unpack_bits};
pub use hex::{decode_hex, encode_hex, format_hex_compact, hex_to_bytes};
pub use logging::{log_frame_hex, LogThrottle};
