//! Handle-indexed arena of raw script buffers.
//!
//! Scripts name buffers by opaque [`Handle`], never by address. The arena
//! owns the memory; [`BufferArena::release`] is invoked exactly once per
//! buffer by the host's value-lifetime tracking, never by script code.

use std::alloc::{alloc, dealloc, Layout};
use std::collections::HashMap;
use std::fmt;
use std::ptr::NonNull;

/// Opaque ownership token a script holds in place of a raw address.
pub type Handle = u64;

/// Extra bytes reserved past every requested length. A little slack against
/// off-by-one script errors; never reflected in [`RawBuffer::len`].
pub const SLACK_BYTES: usize = 2;

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArenaError {
    /// The underlying allocator refused the request.
    AllocFailed(usize),
    /// Handle already released or never issued.
    StaleHandle(Handle),
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArenaError::AllocFailed(len) => {
                write!(f, "allocation of {} byte(s) failed", len)
            }
            ArenaError::StaleHandle(h) => write!(f, "stale buffer handle {}", h),
        }
    }
}

impl std::error::Error for ArenaError {}

// =============================================================================
// RawBuffer
// =============================================================================

/// An untyped, contiguous, uninitialized byte region.
///
/// `len` is the script-requested size; [`SLACK_BYTES`] more are reserved.
/// Release builds do not range-check accesses against `len`; a span past
/// `len + SLACK_BYTES` is undefined behavior, the documented contract of
/// the peek/poke surface. Debug builds assert every span.
pub struct RawBuffer {
    base: NonNull<u8>,
    len: usize,
    layout: Layout,
}

impl RawBuffer {
    fn reserve(len: usize) -> Result<Self, ArenaError> {
        let layout = len
            .checked_add(SLACK_BYTES)
            .and_then(|n| Layout::array::<u8>(n).ok())
            .ok_or(ArenaError::AllocFailed(len))?;
        // Contents stay uninitialized; scripts must not rely on zeroed memory.
        let ptr = unsafe { alloc(layout) };
        let base = NonNull::new(ptr).ok_or(ArenaError::AllocFailed(len))?;
        Ok(Self { base, len, layout })
    }

    /// Requested length in bytes. The slack margin is not included.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    fn check_span(&self, offset: usize, width: usize) {
        debug_assert!(
            offset.checked_add(width).is_some_and(|end| end <= self.len + SLACK_BYTES),
            "span {}+{} outside buffer of {} (+{} slack)",
            offset,
            width,
            self.len,
            SLACK_BYTES
        );
    }

    #[inline]
    pub fn read_byte(&self, offset: usize) -> u8 {
        self.check_span(offset, 1);
        unsafe { *self.base.as_ptr().add(offset) }
    }

    #[inline]
    pub fn write_byte(&mut self, offset: usize, value: u8) {
        self.check_span(offset, 1);
        unsafe { *self.base.as_ptr().add(offset) = value }
    }

    /// The first `len` bytes as a slice, for streaming to a sink.
    pub fn bytes(&self, len: usize) -> &[u8] {
        self.check_span(0, len);
        unsafe { std::slice::from_raw_parts(self.base.as_ptr(), len) }
    }

    /// Bulk copy into the buffer starting at `offset`.
    pub fn write_bytes(&mut self, offset: usize, data: &[u8]) {
        self.check_span(offset, data.len());
        unsafe {
            std::ptr::copy_nonoverlapping(
                data.as_ptr(),
                self.base.as_ptr().add(offset),
                data.len(),
            );
        }
    }
}

impl Drop for RawBuffer {
    fn drop(&mut self) {
        unsafe { dealloc(self.base.as_ptr(), self.layout) }
    }
}

impl fmt::Debug for RawBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawBuffer")
            .field("base", &self.base)
            .field("len", &self.len)
            .finish()
    }
}

// =============================================================================
// BufferArena
// =============================================================================

/// Owner of every live script buffer, keyed by monotonic handle.
///
/// Handles are never reused within an arena's lifetime, so a double release
/// is always detected as [`ArenaError::StaleHandle`].
#[derive(Debug)]
pub struct BufferArena {
    slots: HashMap<Handle, RawBuffer>,
    next: Handle,
}

impl BufferArena {
    pub fn new() -> Self {
        Self {
            slots: HashMap::new(),
            next: 1,
        }
    }

    /// Reserve `len` uninitialized bytes (plus slack) and issue a handle.
    ///
    /// No upper bound is enforced here; an oversized request fails in the
    /// underlying allocator and is reported, not retried.
    pub fn alloc(&mut self, len: usize) -> Result<Handle, ArenaError> {
        let buf = RawBuffer::reserve(len)?;
        let handle = self.next;
        self.next += 1;
        self.slots.insert(handle, buf);
        Ok(handle)
    }

    pub fn get(&self, handle: Handle) -> Result<&RawBuffer, ArenaError> {
        self.slots
            .get(&handle)
            .ok_or(ArenaError::StaleHandle(handle))
    }

    pub fn get_mut(&mut self, handle: Handle) -> Result<&mut RawBuffer, ArenaError> {
        self.slots
            .get_mut(&handle)
            .ok_or(ArenaError::StaleHandle(handle))
    }

    /// Free the buffer behind `handle`. Exactly one release per handle; a
    /// second call reports [`ArenaError::StaleHandle`] and frees nothing.
    pub fn release(&mut self, handle: Handle) -> Result<(), ArenaError> {
        self.slots
            .remove(&handle)
            .map(drop)
            .ok_or(ArenaError::StaleHandle(handle))
    }

    /// Number of live buffers.
    pub fn live(&self) -> usize {
        self.slots.len()
    }
}

impl Default for BufferArena {
    fn default() -> Self {
        Self::new()
    }
}
