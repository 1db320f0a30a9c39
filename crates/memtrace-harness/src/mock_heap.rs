//! Deterministic in-memory stand-in for the real allocator.
//!
//! Hands out fake, never-dereferenced addresses and keeps the usable-size
//! book the way a real heap would: sizes round up to a bucket, so tests
//! can tell "requested" apart from "live usable". Release rows must carry
//! the latter.

use std::collections::HashMap;
use std::ffi::c_void;
use std::ptr;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

use memtrace_core::Heap;

/// Allocation granularity of the mock: usable sizes round up to this.
pub const BUCKET: usize = 16;

/// Round a requested size up to the mock's bucket, one bucket minimum.
#[must_use]
pub const fn usable_for(size: usize) -> usize {
    let size = if size == 0 { 1 } else { size };
    (size + BUCKET - 1) & !(BUCKET - 1)
}

/// Mock heap capability for driving the tracer in tests.
pub struct MockHeap {
    next_addr: AtomicUsize,
    live: Mutex<HashMap<usize, usize>>,
    fail_over: Option<usize>,
}

impl MockHeap {
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_addr: AtomicUsize::new(0x1000),
            live: Mutex::new(HashMap::new()),
            fail_over: None,
        }
    }

    /// Mock that refuses any request larger than `limit`, for exercising
    /// the allocator-failure paths.
    #[must_use]
    pub fn failing_over(limit: usize) -> Self {
        Self {
            fail_over: Some(limit),
            ..Self::new()
        }
    }

    /// Blocks currently live, for leak assertions.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.live.lock().len()
    }

    fn grant(&self, size: usize) -> *mut c_void {
        if self.fail_over.is_some_and(|limit| size > limit) {
            return ptr::null_mut();
        }
        let usable = usable_for(size);
        let addr = self.next_addr.fetch_add(usable, Ordering::Relaxed);
        self.live.lock().insert(addr, usable);
        addr as *mut c_void
    }
}

impl Default for MockHeap {
    fn default() -> Self {
        Self::new()
    }
}

unsafe impl Heap for MockHeap {
    fn allocate(&self, size: usize) -> *mut c_void {
        self.grant(size)
    }

    fn zero_allocate(&self, count: usize, size: usize) -> *mut c_void {
        // A real calloc refuses products it cannot represent.
        match count.checked_mul(size) {
            Some(total) => self.grant(total),
            None => ptr::null_mut(),
        }
    }

    unsafe fn resize(&self, ptr: *mut c_void, new_size: usize) -> *mut c_void {
        if ptr.is_null() {
            return self.grant(new_size);
        }
        let new_ptr = self.grant(new_size);
        // On failure the original block stays live, as glibc's does.
        if !new_ptr.is_null() {
            self.live.lock().remove(&(ptr as usize));
        }
        new_ptr
    }

    unsafe fn release(&self, ptr: *mut c_void) {
        if !ptr.is_null() {
            self.live.lock().remove(&(ptr as usize));
        }
    }

    unsafe fn usable_size(&self, ptr: *mut c_void) -> usize {
        self.live.lock().get(&(ptr as usize)).copied().unwrap_or(0)
    }
}
