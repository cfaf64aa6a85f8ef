//! Script-callable bindings.
//!
//! Ops are registered by script name and stable id; the interpreter
//! dispatches by name. Each op parses its argument list strictly in the
//! declared order through the call frame, then touches arena memory or a
//! sink. A malformed call fails before any memory access.
//!
//! # Dispatch
//!
//! ```text
//! script: sersend(0, buf, 5)
//!                 |
//!                 v
//! interpreter:  bindings.call("sersend", &mut host, &mut frame)
//!                 |
//!                 v
//! op body:      open bracket, pop slot/ref/len, close bracket,
//!               resolve handle, stream bytes to the sink
//! ```

pub mod hardware;
pub mod memory;
pub mod serial;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::arena::{ArenaError, BufferArena};
use crate::frame::{CallFrame, FrameError};
use crate::platform::Platform;
use crate::sink::{SinkError, SinkTable};

// =============================================================================
// Errors
// =============================================================================

/// Everything a binding call can report back to the interpreter.
#[derive(Debug, Clone, PartialEq)]
pub enum HostError {
    /// No binding registered under that name.
    UnknownOp(String),
    /// Argument-protocol violation; no memory was touched.
    Frame(FrameError),
    /// Handle did not resolve, or the allocator refused the request.
    Arena(ArenaError),
    /// Width outside the 1–8 byte codec range.
    BadWidth(i64),
    /// Sink slot outside the table, or nothing installed there.
    UnknownSink(i64),
    /// Transport failure while streaming to a sink.
    Sink(SinkError),
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostError::UnknownOp(name) => write!(f, "unknown op {:?}", name),
            HostError::Frame(e) => write!(f, "argument error: {}", e),
            HostError::Arena(e) => write!(f, "{}", e),
            HostError::BadWidth(w) => {
                write!(f, "width {} outside the 1-8 byte range", w)
            }
            HostError::UnknownSink(slot) => write!(f, "no sink at slot {}", slot),
            HostError::Sink(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for HostError {}

impl From<FrameError> for HostError {
    fn from(e: FrameError) -> Self {
        HostError::Frame(e)
    }
}

impl From<ArenaError> for HostError {
    fn from(e: ArenaError) -> Self {
        HostError::Arena(e)
    }
}

impl From<SinkError> for HostError {
    fn from(e: SinkError) -> Self {
        HostError::Sink(e)
    }
}

// =============================================================================
// Host state
// =============================================================================

/// Mutable state the bindings operate on: the buffer arena, the sink table
/// and the platform, threaded through every call by the interpreter.
pub struct Host {
    pub arena: BufferArena,
    pub sinks: SinkTable,
    pub platform: Box<dyn Platform>,
}

impl Host {
    pub fn new(sinks: SinkTable, platform: Box<dyn Platform>) -> Self {
        Self {
            arena: BufferArena::new(),
            sinks,
            platform,
        }
    }
}

impl fmt::Debug for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Host")
            .field("arena", &self.arena)
            .field("sinks", &self.sinks)
            .finish()
    }
}

// =============================================================================
// Registry
// =============================================================================

/// Binding function signature.
pub type HostFn =
    Arc<dyn Fn(&mut Host, &mut dyn CallFrame) -> Result<(), HostError> + Send + Sync>;

/// Script-facing metadata for a registered binding.
#[derive(Clone)]
pub struct Signature {
    pub name: String,
    pub description: String,
    /// Minimum argument count; ops with optional tails accept more.
    pub arg_count: usize,
    pub has_return: bool,
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signature")
            .field("name", &self.name)
            .field("arg_count", &self.arg_count)
            .field("has_return", &self.has_return)
            .finish()
    }
}

pub struct BindingEntry {
    pub id: u32,
    pub signature: Signature,
    pub func: HostFn,
}

impl fmt::Debug for BindingEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingEntry")
            .field("id", &self.id)
            .field("signature", &self.signature)
            .finish()
    }
}

/// The full set of script-callable ops, looked up by name or stable id.
#[derive(Debug)]
pub struct Bindings {
    by_id: HashMap<u32, BindingEntry>,
    by_name: HashMap<String, u32>,
}

impl Bindings {
    /// Registry with every built-in op installed.
    pub fn new() -> Self {
        let mut bindings = Self {
            by_id: HashMap::new(),
            by_name: HashMap::new(),
        };
        bindings.register_builtins();
        bindings
    }

    pub fn register(
        &mut self,
        id: u32,
        name: &str,
        description: &str,
        arg_count: usize,
        has_return: bool,
        func: HostFn,
    ) {
        let signature = Signature {
            name: name.to_string(),
            description: description.to_string(),
            arg_count,
            has_return,
        };
        self.by_name.insert(name.to_string(), id);
        self.by_id.insert(
            id,
            BindingEntry {
                id,
                signature,
                func,
            },
        );
    }

    pub fn get(&self, id: u32) -> Option<&BindingEntry> {
        self.by_id.get(&id)
    }

    pub fn get_id(&self, name: &str) -> Option<u32> {
        self.by_name.get(name).copied()
    }

    pub fn list(&self) -> Vec<&BindingEntry> {
        self.by_id.values().collect()
    }

    /// Dispatch a script call by name.
    pub fn call(
        &self,
        name: &str,
        host: &mut Host,
        frame: &mut dyn CallFrame,
    ) -> Result<(), HostError> {
        let id = self
            .get_id(name)
            .ok_or_else(|| HostError::UnknownOp(name.to_string()))?;
        self.call_id(id, host, frame)
    }

    /// Dispatch by stable id.
    pub fn call_id(
        &self,
        id: u32,
        host: &mut Host,
        frame: &mut dyn CallFrame,
    ) -> Result<(), HostError> {
        let entry = self
            .by_id
            .get(&id)
            .ok_or_else(|| HostError::UnknownOp(format!("#{}", id)))?;
        (entry.func)(host, frame)
    }

    fn register_builtins(&mut self) {
        memory::register_memory(self);
        serial::register_serial(self);
        hardware::register_hardware(self);
    }
}

impl Default for Bindings {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Op ids
// =============================================================================

/// Stable binding ids.
pub mod op_ids {
    // Memory (1-19)
    pub const MALLOC: u32 = 1;
    pub const PEEK: u32 = 2;
    pub const POKE: u32 = 3;
    pub const PEEKAS: u32 = 4;
    pub const POKEAS: u32 = 5;

    // Serial (20-39)
    pub const SERBEGIN: u32 = 20;
    pub const SERSEND: u32 = 21;

    // Hardware pass-throughs (40-59)
    pub const PIN_MODE: u32 = 40;
    pub const DIGITAL_WRITE: u32 = 41;
    pub const ANALOG_WRITE: u32 = 42;
    pub const ANALOG_READ: u32 = 43;
    pub const DELAY: u32 = 44;
    pub const MILLIS: u32 = 45;
    pub const GET_TIME: u32 = 46;
    pub const GET_BATTERY_PCT: u32 = 47;
    pub const MOTOR: u32 = 48;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::ArgStack;
    use crate::platform::RecordingPlatform;

    #[test]
    fn builtins_are_registered() {
        let bindings = Bindings::new();
        for name in [
            "malloc", "peek", "poke", "peekas", "pokeas", "serbegin", "sersend",
        ] {
            assert!(bindings.get_id(name).is_some(), "{} missing", name);
        }
        assert_eq!(bindings.get_id("malloc"), Some(op_ids::MALLOC));
    }

    #[test]
    fn unknown_name_is_reported() {
        let bindings = Bindings::new();
        let mut host = Host::new(SinkTable::new(), Box::<RecordingPlatform>::default());
        let mut frame = ArgStack::new(vec![]);
        assert_eq!(
            bindings.call("frobnicate", &mut host, &mut frame),
            Err(HostError::UnknownOp("frobnicate".to_string()))
        );
    }
}
