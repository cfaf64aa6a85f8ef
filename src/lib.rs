//! basbridge: raw-memory and serial bridge bindings for embedded BASIC
//! scripting hosts.
//!
//! A small interpreted scripting language reaches into raw memory through
//! this crate: `malloc` reserves an untyped byte buffer and hands the script
//! an opaque handle; `peek`/`poke` and their width-addressed variants read
//! and write it at arbitrary offsets; `sersend` streams buffer bytes to a
//! configured serial sink. The interpreter side of the contract (tagged
//! values, the argument-popping call protocol, value-lifetime tracking) is
//! consumed through the [`frame::CallFrame`] trait, never implemented here.
//!
//! # Example
//!
//! ```rust
//! use basbridge::bindings::{Bindings, Host};
//! use basbridge::frame::{ArgStack, Value};
//! use basbridge::platform::RecordingPlatform;
//! use basbridge::sink::SinkTable;
//!
//! let bindings = Bindings::new();
//! let mut host = Host::new(SinkTable::new(), Box::new(RecordingPlatform::new()));
//!
//! // malloc(16)
//! let mut frame = ArgStack::new(vec![Value::Int(16)]);
//! bindings.call("malloc", &mut host, &mut frame).unwrap();
//! let handle = match frame.results()[0] {
//!     Value::Ref(h) => h,
//!     _ => unreachable!(),
//! };
//!
//! // poke(buf, 3, &hAB) then peek(buf, 3)
//! let mut frame = ArgStack::new(vec![Value::Ref(handle), Value::Int(3), Value::Int(0xAB)]);
//! bindings.call("poke", &mut host, &mut frame).unwrap();
//! let mut frame = ArgStack::new(vec![Value::Ref(handle), Value::Int(3)]);
//! bindings.call("peek", &mut host, &mut frame).unwrap();
//! assert_eq!(frame.results(), &[Value::Int(0xAB)]);
//!
//! // The host's value reclamation releases the buffer exactly once.
//! host.arena.release(handle).unwrap();
//! ```

pub mod arena;
pub mod bindings;
pub mod config;
pub mod frame;
pub mod platform;
pub mod sink;
pub mod width;

pub use arena::{ArenaError, BufferArena, Handle, RawBuffer, SLACK_BYTES};
pub use bindings::{op_ids, Bindings, Host, HostError};
pub use config::{build_sink_table, BridgeConfig, ConfigError};
pub use frame::{ArgStack, CallFrame, FrameError, Value};
pub use platform::{Platform, RecordingPlatform};
pub use sink::{ByteSink, MemorySink, Printer, SinkError, SinkParams, SinkTable};
