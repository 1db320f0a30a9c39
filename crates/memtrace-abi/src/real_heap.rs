//! Heap capability backed by the linker-provided `__real_*` symbols.

use std::ffi::c_void;

use memtrace_core::Heap;

unsafe extern "C" {
    fn __real_malloc(size: usize) -> *mut c_void;
    fn __real_calloc(count: usize, size: usize) -> *mut c_void;
    fn __real_realloc(ptr: *mut c_void, new_size: usize) -> *mut c_void;
    fn __real_free(ptr: *mut c_void);
}

/// The untouched allocator underneath the shim.
pub struct RealHeap;

unsafe impl Heap for RealHeap {
    fn allocate(&self, size: usize) -> *mut c_void {
        // SAFETY: plain forward; malloc accepts any size.
        unsafe { __real_malloc(size) }
    }

    fn zero_allocate(&self, count: usize, size: usize) -> *mut c_void {
        // SAFETY: plain forward; calloc handles its own overflow check.
        unsafe { __real_calloc(count, size) }
    }

    unsafe fn resize(&self, ptr: *mut c_void, new_size: usize) -> *mut c_void {
        // SAFETY: forwarded caller contract.
        unsafe { __real_realloc(ptr, new_size) }
    }

    unsafe fn release(&self, ptr: *mut c_void) {
        // SAFETY: forwarded caller contract.
        unsafe { __real_free(ptr) }
    }

    unsafe fn usable_size(&self, ptr: *mut c_void) -> usize {
        // SAFETY: caller guarantees a live, heap-owned pointer.
        unsafe { msize(ptr) }
    }
}

// The usable-size query reads the live block's bookkeeping; it is not an
// allocation entry point and is never wrapped.
#[cfg(target_os = "linux")]
unsafe fn msize(ptr: *mut c_void) -> usize {
    unsafe { libc::malloc_usable_size(ptr) }
}

#[cfg(target_os = "macos")]
unsafe fn msize(ptr: *mut c_void) -> usize {
    unsafe { libc::malloc_size(ptr.cast_const()) }
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
compile_error!("no usable-size query known for this platform");
