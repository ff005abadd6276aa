//! Modbus RTU slave protocol engine.
//!
//! Layered bottom-up: checksum, request decoding, capability dispatch,
//! response encoding, and the receive loop that ties them to a transport.

pub mod capability;
pub mod crc;
pub mod dispatch;
pub mod frame;
pub mod response;
pub mod serial;
pub mod serial_mock;
pub mod slave;

pub use capability::Capabilities;
pub use crc::{append_crc, calculate_crc, verify_crc};
pub use dispatch::Dispatcher;
pub use frame::{decode, decode_request, FrameRejection, FunctionCode, Request};
pub use response::{ExceptionCode, Response};
pub use serial::{inter_frame_gap, open_port, FrameFormat, Transport};
pub use slave::RtuSlave;
