//! Serial bindings: configure a sink slot, stream buffer bytes to it.
//!
//! ```text
//! serbegin(slot, baud)                 -> ()
//! serbegin(slot, baud, rxpin, txpin)   -> ()
//! sersend(slot, buf, len)              -> ()
//! ```
//!
//! `len` is not validated against the allocation in release builds; the
//! script owns that contract, as with peek/poke offsets.

use std::sync::Arc;

use super::{op_ids, Bindings, HostError};
use crate::sink::SinkParams;

pub fn register_serial(bindings: &mut Bindings) {
    // serbegin: pass transport parameters through to the sink driver. The
    // pin pair is optional and popped only when present.
    bindings.register(
        op_ids::SERBEGIN,
        "serbegin",
        "Configure a serial sink. Args: slot, baud[, rxpin, txpin].",
        2,
        false,
        Arc::new(|host, frame| {
            frame.open_bracket()?;
            let slot = frame.pop_int()?;
            let baud = frame.pop_int()?;
            let pins = if frame.has_arg() {
                let rx = frame.pop_int()?;
                let tx = frame.pop_int()?;
                Some((rx as u8, tx as u8))
            } else {
                None
            };
            frame.close_bracket()?;

            let params = SinkParams {
                baud: baud as u32,
                pins,
            };
            let sink = host
                .sinks
                .get_mut(slot as usize)
                .ok_or(HostError::UnknownSink(slot))?;
            sink.configure(&params)?;
            Ok(())
        }),
    );

    // sersend: stream the first len bytes of a buffer to the sink.
    bindings.register(
        op_ids::SERSEND,
        "sersend",
        "Send buffer bytes to a serial sink. Args: slot, buf, len.",
        3,
        false,
        Arc::new(|host, frame| {
            frame.open_bracket()?;
            let slot = frame.pop_int()?;
            let handle = frame.pop_ref()?;
            let len = frame.pop_int()?;
            frame.close_bracket()?;

            let buf = host.arena.get(handle)?;
            let bytes = buf.bytes(len as usize);
            #[cfg(feature = "trace")]
            eprintln!("sersend slot={} {} byte(s): {}", slot, len, hex::encode(bytes));
            let sink = host
                .sinks
                .get_mut(slot as usize)
                .ok_or(HostError::UnknownSink(slot))?;
            sink.write_all(bytes)?;
            Ok(())
        }),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bindings::Host;
    use crate::frame::{ArgStack, FrameError, Value};
    use crate::platform::RecordingPlatform;
    use crate::sink::{MemorySink, SinkTable};

    fn host_with_sink() -> (Host, MemorySink) {
        let sink = MemorySink::new();
        let mut table = SinkTable::new();
        table.install(0, Box::new(sink.clone()));
        let host = Host::new(table, Box::<RecordingPlatform>::default());
        (host, sink)
    }

    #[test]
    fn serbegin_without_pins() {
        let bindings = Bindings::new();
        let (mut host, sink) = host_with_sink();

        let mut frame = ArgStack::new(vec![Value::Int(0), Value::Int(115_200)]);
        bindings.call("serbegin", &mut host, &mut frame).unwrap();
        assert_eq!(
            sink.params(),
            Some(SinkParams {
                baud: 115_200,
                pins: None
            })
        );
    }

    #[test]
    fn serbegin_with_pin_remap() {
        let bindings = Bindings::new();
        let (mut host, sink) = host_with_sink();

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
    fn serbegin_with_half_a_pin_pair_is_arg_error() {
        let bindings = Bindings::new();
        let (mut host, _sink) = host_with_sink();

        let mut frame =
            ArgStack::new(vec![Value::Int(0), Value::Int(9600), Value::Int(16)]);
        assert_eq!(
            bindings.call("serbegin", &mut host, &mut frame),
            Err(HostError::Frame(FrameError::Exhausted))
        );
    }

    #[test]
    fn unknown_slot_is_reported() {
        let bindings = Bindings::new();
        let (mut host, _sink) = host_with_sink();

        let mut frame = ArgStack::new(vec![Value::Int(7), Value::Int(9600)]);
        assert_eq!(
            bindings.call("serbegin", &mut host, &mut frame),
            Err(HostError::UnknownSink(7))
        );
    }
}
