//! Raw-memory bindings: allocate, peek, poke.
//!
//! Script-facing contracts:
//!
//! ```text
//! malloc(len)                    -> handle
//! peek(buf, offset)              -> byte
//! poke(buf, offset, value)
//! peekas(buf, offset, width)     -> integer
//! pokeas(buf, offset, width, value)
//! ```
//!
//! Offsets are trusted: release builds do not range-check them against the
//! allocation (the slack margin absorbs off-by-one scripts), debug builds
//! assert. Width is validated before any memory access.

use std::sync::Arc;

use super::{op_ids, Bindings, HostError};
use crate::frame::Value;
use crate::width;

fn parse_width(raw: i64) -> Result<usize, HostError> {
    if width::width_ok(raw) {
        Ok(raw as usize)
    } else {
        Err(HostError::BadWidth(raw))
    }
}

pub fn register_memory(bindings: &mut Bindings) {
    // malloc: reserve an untyped buffer, hand back the ownership token.
    bindings.register(
        op_ids::MALLOC,
        "malloc",
        "Allocate an untyped byte buffer. Args: len. Returns handle.",
        1,
        true,
        Arc::new(|host, frame| {
            frame.open_bracket()?;
            let len = frame.pop_int()?;
            frame.close_bracket()?;

            let handle = host.arena.alloc(len as usize)?;
            frame.push(Value::Ref(handle));
            Ok(())
        }),
    );

    bindings.register(
        op_ids::PEEK,
        "peek",
        "Read one byte. Args: buf, offset. Returns byte.",
        2,
        true,
        Arc::new(|host, frame| {
            frame.open_bracket()?;
            let handle = frame.pop_ref()?;
            let offset = frame.pop_int()?;
            frame.close_bracket()?;

            let buf = host.arena.get(handle)?;
            let value = buf.read_byte(offset as usize);
            frame.push(Value::Int(value as i64));
            Ok(())
        }),
    );

    bindings.register(
        op_ids::POKE,
        "poke",
        "Write one byte; value truncates. Args: buf, offset, value.",
        3,
        false,
        Arc::new(|host, frame| {
            frame.open_bracket()?;
            let handle = frame.pop_ref()?;
            let offset = frame.pop_int()?;
            let value = frame.pop_int()?;
            frame.close_bracket()?;

            let buf = host.arena.get_mut(handle)?;
            buf.write_byte(offset as usize, value as u8);
            Ok(())
        }),
    );

    bindings.register(
        op_ids::PEEKAS,
        "peekas",
        "Read an l-byte integer. Args: buf, offset, width. Returns integer.",
        3,
        true,
        Arc::new(|host, frame| {
            frame.open_bracket()?;
            let handle = frame.pop_ref()?;
            let offset = frame.pop_int()?;
            let raw_width = frame.pop_int()?;
            frame.close_bracket()?;

            let w = parse_width(raw_width)?;
            let buf = host.arena.get(handle)?;
            let value = width::read_uint(buf, offset as usize, w);
            frame.push(Value::Int(value as i64));
            Ok(())
        }),
    );

    bindings.register(
        op_ids::POKEAS,
        "pokeas",
        "Write an l-byte integer. Args: buf, offset, width, value.",
        4,
        false,
        Arc::new(|host, frame| {
            frame.open_bracket()?;
            let handle = frame.pop_ref()?;
            let offset = frame.pop_int()?;
            let raw_width = frame.pop_int()?;
            let value = frame.pop_int()?;
            frame.close_bracket()?;

            let w = parse_width(raw_width)?;
            let buf = host.arena.get_mut(handle)?;
            width::write_uint(buf, offset as usize, w, value as u64);
            Ok(())
        }),
    );
}
