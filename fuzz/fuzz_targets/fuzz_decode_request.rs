#![no_main]

use libfuzzer_sys::fuzz_target;
use modbus_rtu_slave::rtu::frame::decode_request;

fuzz_target!(|data: &[u8]| {
    let _ = decode_request(data, 1);
});
