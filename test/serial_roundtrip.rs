//! End-to-end tests for the serial ops: sink configuration, buffer
//! streaming and cooked-mode printing.

use basbridge::bindings::{Bindings, Host, HostError};
use basbridge::frame::{ArgStack, FrameError, Value};
use basbridge::platform::RecordingPlatform;
use basbridge::sink::{MemorySink, Printer, SinkParams, SinkTable};

fn host_with_mem_sink() -> (Host, MemorySink) {
    let sink = MemorySink::new();
    let mut table = SinkTable::new();
    table.install(0, Box::new(sink.clone()));
    let host = Host::new(table, Box::new(RecordingPlatform::new()));
    (host, sink)
}

fn alloc(bindings: &Bindings, host: &mut Host, len: i64) -> u64 {
    let mut frame = ArgStack::new(vec![Value::Int(len)]);
    bindings.call("malloc", host, &mut frame).unwrap();
    match frame.results()[0] {
        Value::Ref(h) => h,
        ref other => panic!("expected ref result, got {:?}", other),
    }
}

#[test]
fn sersend_delivers_exact_prefix() {
    let bindings = Bindings::new();
    let (mut host, sink) = host_with_mem_sink();
    let h = alloc(&bindings, &mut host, 8);

    let pattern = [0xDEu8, 0xAD, 0xBE, 0xEF, 0x01, 0x02, 0x03, 0x04];
    host.arena.get_mut(h).unwrap().write_bytes(0, &pattern);

    let mut frame = ArgStack::new(vec![Value::Int(0), Value::Ref(h), Value::Int(5)]);
    bindings.call("sersend", &mut host, &mut frame).unwrap();

    assert_eq!(sink.contents(), pattern[..5].to_vec());
}

#[test]
fn sersend_full_buffer() {
    let bindings = Bindings::new();
    let (mut host, sink) = host_with_mem_sink();
    let h = alloc(&bindings, &mut host, 4);

    host.arena.get_mut(h).unwrap().write_bytes(0, &[1, 2, 3, 4]);

    let mut frame = ArgStack::new(vec![Value::Int(0), Value::Ref(h), Value::Int(4)]);
    bindings.call("sersend", &mut host, &mut frame).unwrap();

    assert_eq!(sink.contents(), vec![1, 2, 3, 4]);
}

#[test]
fn sersend_appends_across_calls() {
    let bindings = Bindings::new();
    let (mut host, sink) = host_with_mem_sink();
    let h = alloc(&bindings, &mut host, 4);

    host.arena.get_mut(h).unwrap().write_bytes(0, b"abcd");

    for _ in 0..2 {
        let mut frame = ArgStack::new(vec![Value::Int(0), Value::Ref(h), Value::Int(2)]);
        bindings.call("sersend", &mut host, &mut frame).unwrap();
    }

    assert_eq!(sink.contents(), b"abab".to_vec());
}

#[test]
fn sersend_to_missing_slot_is_error() {
    let bindings = Bindings::new();
    let (mut host, sink) = host_with_mem_sink();
    let h = alloc(&bindings, &mut host, 4);
    host.arena.get_mut(h).unwrap().write_bytes(0, b"xyzw");

    // Slot 1 exists in the table but has no sink installed.
    let mut frame = ArgStack::new(vec![Value::Int(1), Value::Ref(h), Value::Int(2)]);
    assert_eq!(
        bindings.call("sersend", &mut host, &mut frame),
        Err(HostError::UnknownSink(1))
    );

    // Slot 9 is outside the table entirely.
    let mut frame = ArgStack::new(vec![Value::Int(9), Value::Ref(h), Value::Int(2)]);
    assert_eq!(
        bindings.call("sersend", &mut host, &mut frame),
        Err(HostError::UnknownSink(9))
    );

    assert!(sink.contents().is_empty());
}

#[test]
fn serbegin_both_arities() {
    let bindings = Bindings::new();
    let (mut host, sink) = host_with_mem_sink();

    let mut frame = ArgStack::new(vec![Value::Int(0), Value::Int(115_200)]);
    bindings.call("serbegin", &mut host, &mut frame).unwrap();
    assert_eq!(
        sink.params(),
        Some(SinkParams {
            baud: 115_200,
            pins: None
        })
    );

    let mut frame = ArgStack::new(vec![
        Value::Int(0),
        Value::Int(9600),
        Value::Int(16),
        Value::Int(17),
    ]);
    bindings.call("serbegin", &mut host, &mut frame).unwrap();
    assert_eq!(
        sink.params(),
        Some(SinkParams {
            baud: 9600,
            pins: Some((16, 17))
        })
    );
}

#[test]
fn serbegin_three_arguments_is_arg_error() {
    let bindings = Bindings::new();
    let (mut host, _sink) = host_with_mem_sink();

    let mut frame = ArgStack::new(vec![Value::Int(0), Value::Int(9600), Value::Int(16)]);
    assert_eq!(
        bindings.call("serbegin", &mut host, &mut frame),
        Err(HostError::Frame(FrameError::Exhausted))
    );
}

#[test]
fn printer_cooked_mode() {
    let sink = MemorySink::new();
    let mut printer = Printer::new(sink.clone());

    printer.print("hello\nworld").unwrap();
    assert_eq!(sink.contents(), b"hello\r\nworld\r\n".to_vec());

    printer.print("").unwrap();
    assert_eq!(sink.contents(), b"hello\r\nworld\r\n\r\n".to_vec());
}
