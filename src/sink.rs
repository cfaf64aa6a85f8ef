//! Byte sinks and the serial sink table.
//!
//! A sink is anything a length-bounded byte range can be written to. Scripts
//! address sinks by a small slot index through a [`SinkTable`] the embedder
//! builds once at startup. The table is injected state, not a process
//! global.

use std::cell::RefCell;
use std::fmt;
use std::io::Write as _;
use std::rc::Rc;

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkError {
    /// Transport-level write failure.
    Io(String),
}

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkError::Io(msg) => write!(f, "sink write failed: {}", msg),
        }
    }
}

impl std::error::Error for SinkError {}

// =============================================================================
// ByteSink
// =============================================================================

/// Transport parameters applied by `serbegin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkParams {
    pub baud: u32,
    /// Optional (rx, tx) pin remap.
    pub pins: Option<(u8, u8)>,
}

/// A destination for length-bounded byte ranges.
pub trait ByteSink {
    /// Pass-through transport setup; the backing driver interprets the
    /// parameters, this crate only carries them.
    fn configure(&mut self, params: &SinkParams) -> Result<(), SinkError>;
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), SinkError>;
}

// =============================================================================
// SinkTable
// =============================================================================

/// Slot count of the reference layout (primary serial plus two spares).
pub const DEFAULT_SLOTS: usize = 3;

/// Slot-indexed mapping from sink id to installed transport.
pub struct SinkTable {
    slots: Vec<Option<Box<dyn ByteSink>>>,
}

impl SinkTable {
    pub fn new() -> Self {
        Self::with_slots(DEFAULT_SLOTS)
    }

    pub fn with_slots(count: usize) -> Self {
        let mut slots = Vec::with_capacity(count);
        slots.resize_with(count, || None);
        Self { slots }
    }

    /// Install a sink, returning whatever previously occupied the slot.
    /// Out-of-table slots are ignored and the sink is handed back.
    pub fn install(
        &mut self,
        slot: usize,
        sink: Box<dyn ByteSink>,
    ) -> Option<Box<dyn ByteSink>> {
        match self.slots.get_mut(slot) {
            Some(entry) => entry.replace(sink),
            None => Some(sink),
        }
    }

    pub fn get_mut(&mut self, slot: usize) -> Option<&mut (dyn ByteSink + 'static)> {
        self.slots
            .get_mut(slot)
            .and_then(|entry| entry.as_deref_mut())
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }
}

impl Default for SinkTable {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SinkTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let installed: Vec<usize> = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.is_some().then_some(i))
            .collect();
        f.debug_struct("SinkTable")
            .field("slots", &self.slots.len())
            .field("installed", &installed)
            .finish()
    }
}

// =============================================================================
// Shipped sinks
// =============================================================================

#[derive(Debug, Default)]
struct MemorySinkState {
    params: Option<SinkParams>,
    data: Vec<u8>,
}

/// Capturing sink for tests and headless embedders. Clones share the same
/// backing storage, so a test can keep one clone and install the other.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    shared: Rc<RefCell<MemorySinkState>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far.
    pub fn contents(&self) -> Vec<u8> {
        self.shared.borrow().data.clone()
    }

    /// Parameters from the last `configure`, if any.
    pub fn params(&self) -> Option<SinkParams> {
        self.shared.borrow().params
    }
}

impl ByteSink for MemorySink {
    fn configure(&mut self, params: &SinkParams) -> Result<(), SinkError> {
        self.shared.borrow_mut().params = Some(*params);
        Ok(())
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<(), SinkError> {
        self.shared.borrow_mut().data.extend_from_slice(bytes);
        Ok(())
    }
}

/// Stdout-backed sink. Configuration is accepted and discarded; the host
/// console has no baud rate.
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl ConsoleSink {
    pub fn new() -> Self {
        Self
    }
}

impl ByteSink for ConsoleSink {
    fn configure(&mut self, _params: &SinkParams) -> Result<(), SinkError> {
        Ok(())
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<(), SinkError> {
        let mut stdout = std::io::stdout().lock();
        stdout
            .write_all(bytes)
            .and_then(|_| stdout.flush())
            .map_err(|e| SinkError::Io(e.to_string()))
    }
}

// =============================================================================
// Printer
// =============================================================================

/// Cooked-mode text output over a sink: a CR precedes every LF on the wire,
/// and a newline sequence is appended per print, matching what a serial
/// terminal expects from println-style script output.
pub struct Printer<S: ByteSink> {
    sink: S,
}

impl<S: ByteSink> Printer<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    pub fn print(&mut self, text: &str) -> Result<(), SinkError> {
        let mut wire = Vec::with_capacity(text.len() + 2);
        for &b in text.as_bytes() {
            if b == b'\n' {
                wire.push(b'\r');
            }
            wire.push(b);
        }
        wire.extend_from_slice(b"\r\n");
        self.sink.write_all(&wire)
    }

    pub fn into_inner(self) -> S {
        self.sink
    }
}
