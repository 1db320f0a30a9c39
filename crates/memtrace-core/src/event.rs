//! Allocation event model and row rendering.
//!
//! One event is one row of the trace: the effective direction of the
//! operation, the entry point that produced it, the pointer involved, and a
//! byte count. The row grammar is the bit-exact external contract of the
//! whole system:
//!
//! ```text
//! op,caller,ptr,size
//! +,m,0x55e3a40012a0,100
//! -,f,0x55e3a40012a0,112
//! ```
//!
//! Rendering happens in a fixed-size stack buffer. The append path runs
//! inside intercepted `malloc` calls and must not allocate.

use std::ffi::c_void;
use std::fmt::{self, Write as _};

/// Header row, written exactly once before any data row.
pub const HEADER: &str = "op,caller,ptr,size\n";

/// Effective direction of an event: bytes granted or bytes returned.
///
/// This is not the user-facing call name; a `realloc` produces one event of
/// each direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    /// Bytes granted to the application.
    Allocate,
    /// Bytes handed back to the heap.
    Release,
}

impl Op {
    /// Single-character row field for this direction.
    #[must_use]
    pub const fn symbol(self) -> char {
        match self {
            Self::Allocate => '+',
            Self::Release => '-',
        }
    }

    /// Parse a row field back into a direction.
    #[must_use]
    pub const fn from_symbol(c: char) -> Option<Self> {
        match c {
            '+' => Some(Self::Allocate),
            '-' => Some(Self::Release),
            _ => None,
        }
    }
}

/// Entry point that produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Caller {
    Malloc,
    Calloc,
    Realloc,
    Free,
}

impl Caller {
    /// Single-character row field for this entry point.
    #[must_use]
    pub const fn symbol(self) -> char {
        match self {
            Self::Malloc => 'm',
            Self::Calloc => 'c',
            Self::Realloc => 'r',
            Self::Free => 'f',
        }
    }

    /// Parse a row field back into an entry point.
    #[must_use]
    pub const fn from_symbol(c: char) -> Option<Self> {
        match c {
            'm' => Some(Self::Malloc),
            'c' => Some(Self::Calloc),
            'r' => Some(Self::Realloc),
            'f' => Some(Self::Free),
            _ => None,
        }
    }
}

/// One allocation event, ready to be rendered as a row.
///
/// Null is a valid, loggable address: a failed allocation is recorded with
/// the null pointer and the size that was asked for.
#[derive(Debug, Clone, Copy)]
pub struct TraceEvent {
    pub op: Op,
    pub caller: Caller,
    pub addr: *mut c_void,
    pub size: usize,
}

impl TraceEvent {
    #[must_use]
    pub const fn new(op: Op, caller: Caller, addr: *mut c_void, size: usize) -> Self {
        Self {
            op,
            caller,
            addr,
            size,
        }
    }

    /// Render as one `op,caller,ptr,size` row, newline included.
    ///
    /// The pointer uses the platform's standard rendering (`0x…`, `0x0` for
    /// null) and the size is full-width decimal: any `usize` fits, so large
    /// allocations are never truncated in the trace.
    #[must_use]
    pub fn render(&self) -> RowBuf {
        let mut row = RowBuf::new();
        let rendered = writeln!(
            row,
            "{},{},{:p},{}",
            self.op.symbol(),
            self.caller.symbol(),
            self.addr,
            self.size
        );
        // Two single-char fields, a pointer, and a usize always fit ROW_CAP.
        debug_assert!(rendered.is_ok(), "trace row exceeded fixed capacity");
        row
    }
}

/// Upper bound on a rendered row: two one-char fields, three commas, an
/// `0x`-prefixed 64-bit pointer, a 20-digit size, and the newline.
const ROW_CAP: usize = 64;

/// Fixed-capacity row buffer; lives on the appending thread's stack.
pub struct RowBuf {
    buf: [u8; ROW_CAP],
    len: usize,
}

impl RowBuf {
    const fn new() -> Self {
        Self {
            buf: [0; ROW_CAP],
            len: 0,
        }
    }

    /// The rendered row bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }
}

impl fmt::Write for RowBuf {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let bytes = s.as_bytes();
        let end = self.len + bytes.len();
        if end > ROW_CAP {
            return Err(fmt::Error);
        }
        self.buf[self.len..end].copy_from_slice(bytes);
        self.len = end;
        Ok(())
    }
}
