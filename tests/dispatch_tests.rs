//! End-to-end request/response scenarios: decode, dispatch and encode against a
//! register bank serving addresses 0..=10.

use modbus_rtu_slave::rtu::frame::decode_request;
use modbus_rtu_slave::util::hex::hex_to_bytes;
use modbus_rtu_slave::{Capabilities, Dispatcher, ExceptionCode, RegisterBank, Response};
use std::sync::{Arc, Mutex};

struct Fixture {
    bank: Arc<Mutex<RegisterBank>>,
    dispatcher: Dispatcher,
}

impl Fixture {
    fn new() -> Self {
        let bank = Arc::new(Mutex::new(RegisterBank::with_demo_values(0, 10)));
        let caps = RegisterBank::into_capabilities(Arc::clone(&bank));
        Fixture {
            bank,
            dispatcher: Dispatcher::new(1, caps).unwrap(),
        }
    }

    /// Feed one checksummed request, return the encoded answer if any.
    fn exchange(&mut self, request_hex: &str) -> Option<Vec<u8>> {
        let raw = hex_to_bytes(request_hex);
        let request = decode_request(&raw, self.dispatcher.slave()).unwrap();
        self.dispatcher
            .dispatch(&request)
            .map(|response| response.encode(self.dispatcher.slave()).to_vec())
    }
}

#[test]
fn test_read_holding_registers_in_range() {
    let mut fixture = Fixture::new();
    assert_eq!(
        fixture.exchange("01030000000585C9"),
        Some(hex_to_bytes("01030A00000001000200030004BC75"))
    );
}

#[test]
fn test_read_holding_registers_past_range() {
    let mut fixture = Fixture::new();
    assert_eq!(
        fixture.exchange("010300080005040B"),
        Some(hex_to_bytes("018302C0F1"))
    );
}

#[test]
fn test_read_last_register_in_range() {
    let mut fixture = Fixture::new();
    let reply = fixture.exchange(&encode_request("01 03 000A 0001")).unwrap();
    assert_eq!(&reply[..5], &[0x01, 0x03, 0x02, 0x00, 0x0A]);
}

#[test]
fn test_read_coils_packs_lsb_first() {
    let mut fixture = Fixture::new();
    assert_eq!(
        fixture.exchange("010100000005FC09"),
        Some(hex_to_bytes("0101010AD18F"))
    );
    assert_eq!(
        fixture.exchange("01010000000ABC0D"),
        Some(hex_to_bytes("010102AA02469D"))
    );
}

#[test]
fn test_read_discrete_inputs() {
    let mut fixture = Fixture::new();
    assert_eq!(
        fixture.exchange("01020001000369CB"),
        Some(hex_to_bytes("01020105618B"))
    );
}

#[test]
fn test_read_input_registers() {
    let mut fixture = Fixture::new();
    assert_eq!(
        fixture.exchange("010400020002D00B"),
        Some(hex_to_bytes("010404000200031A45"))
    );
}

#[test]
fn test_zero_quantity_is_illegal_value() {
    let mut fixture = Fixture::new();
    assert_eq!(
        fixture.exchange("01030000000045CA"),
        Some(hex_to_bytes("0183030131"))
    );
}

#[test]
fn test_over_limit_quantity_is_illegal_value() {
    let mut fixture = Fixture::new();
    assert_eq!(
        fixture.exchange("01030000007EC5EA"),
        Some(hex_to_bytes("0183030131"))
    );
}

#[test]
fn test_unknown_function_is_illegal_function() {
    let mut fixture = Fixture::new();
    // 0x99 already has the exception bit set, so the function byte is echoed as is
    assert_eq!(
        fixture.exchange("0199000000001DD6"),
        Some(hex_to_bytes("0199018B90"))
    );
}

#[test]
fn test_write_single_coil_acknowledged() {
    let mut fixture = Fixture::new();
    assert_eq!(
        fixture.exchange("01050003FF007C3A"),
        Some(hex_to_bytes("01050003FF007C3A"))
    );
    assert_eq!(
        fixture.bank.lock().unwrap().read_coils(2, 2),
        Some(vec![false, true])
    );
}

#[test]
fn test_write_single_coil_off() {
    let mut fixture = Fixture::new();
    let reply = fixture.exchange(&encode_request("01 05 0003 0000")).unwrap();
    assert_eq!(&reply[..6], &[0x01, 0x05, 0x00, 0x03, 0x00, 0x00]);
    assert_eq!(
        fixture.bank.lock().unwrap().read_coils(3, 1),
        Some(vec![false])
    );
}

#[test]
fn test_write_single_coil_bad_value() {
    let mut fixture = Fixture::new();
    assert_eq!(
        fixture.exchange("01050003123430BD"),
        Some(hex_to_bytes("0185030291"))
    );
}

#[test]
fn test_write_single_coil_bad_value_without_capability() {
    let mut dispatcher = Dispatcher::new(1, Capabilities::new()).unwrap();
    let raw = hex_to_bytes("01050003123430BD");
    let request = decode_request(&raw, 1).unwrap();
    assert_eq!(
        dispatcher.dispatch(&request),
        Some(Response::exception(0x05, ExceptionCode::IllegalFunction))
    );
}

#[test]
fn test_write_single_register() {
    let mut fixture = Fixture::new();
    assert_eq!(
        fixture.exchange("010600041234C57C"),
        Some(hex_to_bytes("010600041234C57C"))
    );
    assert_eq!(
        fixture.bank.lock().unwrap().read_holding_registers(4, 1),
        Some(vec![0x1234])
    );
}

#[test]
fn test_write_multiple_coils() {
    let mut fixture = Fixture::new();
    assert_eq!(
        fixture.exchange("010F0000000A02CD017068"),
        Some(hex_to_bytes("010F0000000AD5CC"))
    );
    // 0xCD 0x01, LSB first
    assert_eq!(
        fixture.bank.lock().unwrap().read_coils(0, 10),
        Some(vec![true, false, true, true, false, false, true, true, true, false])
    );
}

#[test]
fn test_write_multiple_registers() {
    let mut fixture = Fixture::new();
    assert_eq!(
        fixture.exchange("01100001000204000A01029230"),
        Some(hex_to_bytes("0110000100021008"))
    );
    assert_eq!(
        fixture.bank.lock().unwrap().read_holding_registers(1, 2),
        Some(vec![0x000A, 0x0102])
    );
}

#[test]
fn test_write_multiple_registers_byte_count_mismatch() {
    let mut fixture = Fixture::new();
    assert_eq!(
        fixture.exchange("01100001000203000A014226"),
        Some(hex_to_bytes("0190030C01"))
    );
    assert_eq!(
        fixture.bank.lock().unwrap().read_holding_registers(1, 1),
        Some(vec![1])
    );
}

#[test]
fn test_write_past_range_is_illegal_address() {
    let mut fixture = Fixture::new();
    let reply = fixture.exchange(&encode_request("01 06 000B 0001")).unwrap();
    assert_eq!(&reply[..3], &[0x01, 0x86, 0x02]);
}

#[test]
fn test_broadcast_read_not_invoked() {
    let calls = Arc::new(Mutex::new(0));
    let seen = Arc::clone(&calls);
    let caps = Capabilities::new().with_read_holding_registers(move |_, count| {
        *seen.lock().unwrap() += 1;
        Some(vec![0; count as usize])
    });
    let mut dispatcher = Dispatcher::new(1, caps).unwrap();

    let raw = hex_to_bytes("0003000000058418");
    let request = decode_request(&raw, 1).unwrap();
    assert_eq!(dispatcher.dispatch(&request), None);
    assert_eq!(*calls.lock().unwrap(), 0);
}

#[test]
fn test_broadcast_write_executed_silently() {
    let mut fixture = Fixture::new();
    assert_eq!(fixture.exchange("00050003FF007DEB"), None);
    assert_eq!(
        fixture.bank.lock().unwrap().read_coils(3, 1),
        Some(vec![true])
    );

    assert_eq!(fixture.exchange(&encode_request("00 05 0002 FF00")), None);
    assert_eq!(
        fixture.bank.lock().unwrap().read_coils(2, 1),
        Some(vec![true])
    );
}

#[test]
fn test_broadcast_exception_suppressed() {
    let mut fixture = Fixture::new();
    assert_eq!(fixture.exchange(&encode_request("00 06 0050 0001")), None);
    assert_eq!(fixture.exchange(&encode_request("00 2B 0000 0000")), None);
}

fn encode_request(hex: &str) -> String {
    let frame = modbus_rtu_slave::rtu::crc::append_crc(&hex_to_bytes(hex));
    modbus_rtu_slave::util::hex::encode_hex(&frame)
}

/// Dispatcher whose write capabilities accept anything, so only the
/// quantity and byte count checks decide the outcome.
fn accepting_writes() -> Dispatcher {
    let caps = Capabilities::new()
        .with_write_coils(|_, _| true)
        .with_write_registers(|_, _| true);
    Dispatcher::new(1, caps).unwrap()
}

/// Build a checksummed multi-write request with an explicit byte count.
fn multi_write(function: u8, count: u16, byte_count: u8, payload_len: usize) -> Vec<u8> {
    let mut body = vec![0x01, function, 0x00, 0x00];
    body.extend_from_slice(&count.to_be_bytes());
    body.push(byte_count);
    body.extend(std::iter::repeat(0xA5).take(payload_len));
    modbus_rtu_slave::rtu::crc::append_crc(&body)
}

fn dispatch_raw(dispatcher: &mut Dispatcher, raw: &[u8]) -> Option<Response> {
    let request = decode_request(raw, 1).unwrap();
    dispatcher.dispatch(&request)
}

fn ack(function: u8, count: u16) -> Option<Response> {
    Some(Response::WriteAck {
        function,
        address: 0,
        value: count,
    })
}

fn illegal_value(function: u8) -> Option<Response> {
    Some(Response::exception(function, ExceptionCode::IllegalDataValue))
}

#[test]
fn test_write_multiple_coils_quantity_limits() {
    let mut dispatcher = accepting_writes();
    assert_eq!(
        dispatch_raw(&mut dispatcher, &multi_write(0x0F, 0, 0, 0)),
        illegal_value(0x0F)
    );
    assert_eq!(
        dispatch_raw(&mut dispatcher, &multi_write(0x0F, 1, 1, 1)),
        ack(0x0F, 1)
    );
    assert_eq!(
        dispatch_raw(&mut dispatcher, &multi_write(0x0F, 1968, 246, 246)),
        ack(0x0F, 1968)
    );
    assert_eq!(
        dispatch_raw(&mut dispatcher, &multi_write(0x0F, 1969, 247, 247)),
        illegal_value(0x0F)
    );
}

#[test]
fn test_write_multiple_coils_byte_count_mismatch() {
    let mut dispatcher = accepting_writes();
    // Ten coils need two bytes
    assert_eq!(
        dispatch_raw(&mut dispatcher, &multi_write(0x0F, 10, 1, 1)),
        illegal_value(0x0F)
    );
    assert_eq!(
        dispatch_raw(&mut dispatcher, &multi_write(0x0F, 10, 3, 3)),
        illegal_value(0x0F)
    );
    assert_eq!(
        dispatch_raw(&mut dispatcher, &multi_write(0x0F, 10, 2, 2)),
        ack(0x0F, 10)
    );
}

#[test]
fn test_write_multiple_registers_quantity_limits() {
    let mut dispatcher = accepting_writes();
    assert_eq!(
        dispatch_raw(&mut dispatcher, &multi_write(0x10, 0, 0, 0)),
        illegal_value(0x10)
    );
    assert_eq!(
        dispatch_raw(&mut dispatcher, &multi_write(0x10, 1, 2, 2)),
        ack(0x10, 1)
    );
    assert_eq!(
        dispatch_raw(&mut dispatcher, &multi_write(0x10, 123, 246, 246)),
        ack(0x10, 123)
    );
    assert_eq!(
        dispatch_raw(&mut dispatcher, &multi_write(0x10, 124, 248, 248)),
        illegal_value(0x10)
    );
}
