//! Opaque capability over the real allocator.
//!
//! The shim does not manage memory. It forwards to whatever heap manager
//! sits underneath and needs exactly five things from it. Keeping those
//! five behind a trait keeps the interception logic testable without any
//! symbol-level redirection: tests substitute a deterministic in-memory
//! heap for the linker-provided one.

use std::ffi::c_void;

/// The real allocator, as seen by the interception layer.
///
/// # Safety
///
/// Implementations must behave like a heap manager: `resize` and `release`
/// accept null or a pointer this capability handed out earlier and not yet
/// released, and `usable_size` accepts only a live non-null pointer. The
/// interception layer never passes null to `usable_size`.
pub unsafe trait Heap {
    /// Obtain `size` bytes. Null on failure.
    fn allocate(&self, size: usize) -> *mut c_void;

    /// Obtain `count * size` bytes, pre-zeroed. The two factors are passed
    /// through unmodified; the heap applies its own overflow policy. Null
    /// on failure.
    fn zero_allocate(&self, count: usize, size: usize) -> *mut c_void;

    /// Grow or shrink the block at `ptr` to `new_size` bytes, possibly
    /// relocating it. On failure returns null, and whether the original
    /// block survives is decided by the heap's own contract, not here.
    ///
    /// # Safety
    ///
    /// `ptr` must be null or a live pointer owned by this heap.
    unsafe fn resize(&self, ptr: *mut c_void, new_size: usize) -> *mut c_void;

    /// Return the block at `ptr` to the heap.
    ///
    /// # Safety
    ///
    /// `ptr` must be null or a live pointer owned by this heap.
    unsafe fn release(&self, ptr: *mut c_void);

    /// Bytes the heap considers live for `ptr`. May exceed what the
    /// application originally asked for.
    ///
    /// # Safety
    ///
    /// `ptr` must be a live non-null pointer owned by this heap.
    unsafe fn usable_size(&self, ptr: *mut c_void) -> usize;
}
