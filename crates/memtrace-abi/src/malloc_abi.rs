//! `extern "C"` entry points for the four intercepted operations.
//!
//! Each `__wrap_*` computes its events through the core tracer and forwards
//! to the matching `__real_*` exactly once; the result crosses back to the
//! caller byte-identical to an unwrapped call.
//!
//! Reentrancy: the tracer machinery allocates on its own behalf (global
//! init, opening the destination, pathname conversion). A thread-local
//! in-shim flag routes those nested calls straight to the real heap with no
//! row, which also keeps the trace lock from ever nesting inside an
//! allocator lock.

use std::cell::Cell;
use std::ffi::c_void;
use std::io::{self, Write as _};

use memtrace_core::{Heap, TraceError, TraceMetrics, global_metrics};

use crate::real_heap::RealHeap;
use crate::tracer_state::global_tracer;

thread_local! {
    // const-initialized Cell: no drop registration, so reading the flag can
    // never itself allocate.
    static IN_SHIM: Cell<bool> = const { Cell::new(false) };
}

/// Runs `traced` unless this thread is already inside the shim, in which
/// case `passthrough` runs against the real heap and no row is emitted.
fn reenter_guard<R>(passthrough: impl FnOnce() -> R, traced: impl FnOnce() -> R) -> R {
    if IN_SHIM.replace(true) {
        // Flag stays set; the outer frame owns clearing it.
        TraceMetrics::inc(&global_metrics().untraced_passthroughs);
        return passthrough();
    }
    let out = traced();
    IN_SHIM.set(false);
    out
}

/// A trace that cannot be recorded is fatal: no silent-drop mode exists,
/// and unwinding across `extern "C"` is not an option. Report and abort.
fn trace_failure(err: &TraceError) -> ! {
    // stderr, not the trace file; the trace file is what just failed.
    let _ = writeln!(io::stderr(), "memtrace: fatal: {err}");
    std::process::abort()
}

/// Wrapped `malloc`: one ALLOCATE row tagged `m` with the requested size,
/// null results included.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn __wrap_malloc(size: usize) -> *mut c_void {
    reenter_guard(
        || RealHeap.allocate(size),
        || match global_tracer().malloc(size) {
            Ok(ptr) => ptr,
            Err(err) => trace_failure(&err),
        },
    )
}

/// Wrapped `calloc`: one ALLOCATE row tagged `c` carrying the product of
/// the factors (saturated if unrepresentable); the real calloc sees the
/// factors untouched.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn __wrap_calloc(count: usize, size: usize) -> *mut c_void {
    reenter_guard(
        || RealHeap.zero_allocate(count, size),
        || match global_tracer().calloc(count, size) {
            Ok(ptr) => ptr,
            Err(err) => trace_failure(&err),
        },
    )
}

/// Wrapped `realloc`: a RELEASE row for the old block (live usable size,
/// queried before the resize), then an ALLOCATE row for the result.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn __wrap_realloc(ptr: *mut c_void, new_size: usize) -> *mut c_void {
    reenter_guard(
        // SAFETY: forwarded from the caller's realloc contract.
        || unsafe { RealHeap.resize(ptr, new_size) },
        // SAFETY: same contract.
        || match unsafe { global_tracer().realloc(ptr, new_size) } {
            Ok(new_ptr) => new_ptr,
            Err(err) => trace_failure(&err),
        },
    )
}

/// Wrapped `free`: one RELEASE row tagged `f` with the live usable size,
/// queried before the release; `free(null)` is recorded with size 0.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn __wrap_free(ptr: *mut c_void) {
    reenter_guard(
        // SAFETY: forwarded from the caller's free contract.
        || unsafe { RealHeap.release(ptr) },
        // SAFETY: same contract.
        || {
            if let Err(err) = unsafe { global_tracer().free(ptr) } {
                trace_failure(&err);
            }
        },
    )
}
