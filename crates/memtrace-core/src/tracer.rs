//! The interception layer: four entry points wrapping the real heap.
//!
//! Each operation calls through to the heap, computes the byte size the
//! event carries (querying the live usable size when the caller did not
//! supply one), and emits one or two rows. The heap's result is returned
//! unchanged; recording is a side channel and never alters it or masks a
//! failure.

use std::ffi::c_void;

use crate::event::{Caller, Op, TraceEvent};
use crate::heap::Heap;
use crate::metrics::{TraceMetrics, global_metrics};
use crate::writer::{TraceError, TraceWriter};

/// Interception layer over a heap capability `H`.
///
/// The methods mirror the four standard allocation entry points. Each
/// returns the heap's result untouched alongside the only failure this
/// layer can add: an unrecordable trace, which the process boundary treats
/// as fatal.
pub struct Tracer<H> {
    heap: H,
    log: TraceWriter,
}

impl<H: Heap> Tracer<H> {
    pub fn new(heap: H, log: TraceWriter) -> Self {
        Self { heap, log }
    }

    /// The writer this tracer records to.
    #[must_use]
    pub fn log(&self) -> &TraceWriter {
        &self.log
    }

    /// `malloc`: allocate, then record one ALLOCATE row tagged `m` with the
    /// *requested* size, null results included, so failed allocations stay
    /// visible in the trace.
    pub fn malloc(&self, size: usize) -> Result<*mut c_void, TraceError> {
        TraceMetrics::inc(&global_metrics().malloc_calls);
        let ptr = self.heap.allocate(size);
        self.log
            .append(TraceEvent::new(Op::Allocate, Caller::Malloc, ptr, size))?;
        Ok(ptr)
    }

    /// `calloc`: zero-allocate with the two factors passed through raw,
    /// then record one ALLOCATE row tagged `c` carrying their product.
    ///
    /// A product that cannot be represented saturates to `usize::MAX` in
    /// the row; the heap sees the original factors and applies its own
    /// overflow policy, so the returned pointer is unaffected.
    pub fn calloc(&self, count: usize, size: usize) -> Result<*mut c_void, TraceError> {
        TraceMetrics::inc(&global_metrics().calloc_calls);
        let ptr = self.heap.zero_allocate(count, size);
        let total = count.checked_mul(size).unwrap_or(usize::MAX);
        self.log
            .append(TraceEvent::new(Op::Allocate, Caller::Calloc, ptr, total))?;
        Ok(ptr)
    }

    /// `realloc`: one RELEASE row for the old block, then one ALLOCATE row
    /// for the new one, both tagged `r`.
    ///
    /// The old block's size exists only while the old pointer is live, so
    /// the usable-size query and the RELEASE row happen strictly before the
    /// heap is asked to resize. A null `ptr` is a fresh allocation and
    /// releases size 0 without querying the heap. A failed resize records
    /// the null result with the requested size; whether the original block
    /// survives is the heap's contract and is not altered here.
    ///
    /// # Safety
    ///
    /// `ptr` must be null or a live pointer owned by this tracer's heap.
    pub unsafe fn realloc(
        &self,
        ptr: *mut c_void,
        new_size: usize,
    ) -> Result<*mut c_void, TraceError> {
        TraceMetrics::inc(&global_metrics().realloc_calls);
        let old_size = if ptr.is_null() {
            0
        } else {
            // SAFETY: non-null and, per caller contract, live and heap-owned.
            unsafe { self.heap.usable_size(ptr) }
        };
        self.log
            .append(TraceEvent::new(Op::Release, Caller::Realloc, ptr, old_size))?;

        // SAFETY: forwarded caller contract.
        let new_ptr = unsafe { self.heap.resize(ptr, new_size) };
        self.log.append(TraceEvent::new(
            Op::Allocate,
            Caller::Realloc,
            new_ptr,
            new_size,
        ))?;
        Ok(new_ptr)
    }

    /// `free`: query the usable size while the block is still live, record
    /// one RELEASE row tagged `f`, then release.
    ///
    /// `free(null)` is a legal no-op underneath; it is still recorded, with
    /// size 0, so the trace loses no information.
    ///
    /// # Safety
    ///
    /// `ptr` must be null or a live pointer owned by this tracer's heap.
    pub unsafe fn free(&self, ptr: *mut c_void) -> Result<(), TraceError> {
        TraceMetrics::inc(&global_metrics().free_calls);
        let size = if ptr.is_null() {
            0
        } else {
            // SAFETY: non-null and, per caller contract, live and heap-owned.
            unsafe { self.heap.usable_size(ptr) }
        };
        self.log
            .append(TraceEvent::new(Op::Release, Caller::Free, ptr, size))?;

        // SAFETY: forwarded caller contract.
        unsafe { self.heap.release(ptr) };
        Ok(())
    }
}
