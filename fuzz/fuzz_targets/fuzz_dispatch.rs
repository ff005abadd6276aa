#![no_main]

use libfuzzer_sys::fuzz_target;
use modbus_rtu_slave::rtu::crc::append_crc;
use modbus_rtu_slave::{decode_request, Dispatcher, RegisterBank};
use std::sync::{Arc, Mutex};

fuzz_target!(|data: &[u8]| {
    // Fix up the checksum so arbitrary bodies reach the dispatcher
    let raw = append_crc(data);
    let Ok(request) = decode_request(&raw, 1) else {
        return;
    };

    let bank = Arc::new(Mutex::new(RegisterBank::with_demo_values(0, 100)));
    let mut dispatcher = match Dispatcher::new(1, RegisterBank::into_capabilities(bank)) {
        Ok(dispatcher) => dispatcher,
        Err(_) => return,
    };

    if let Some(response) = dispatcher.dispatch(&request) {
        let frame = response.encode(1);
        assert!(frame.len() <= 256);
    }
});
