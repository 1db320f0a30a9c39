//! Process-global tracer instance.
//!
//! Manual atomic init instead of `OnceLock`: the first intercepted call can
//! arrive on any thread, and constructing the tracer itself allocates.
//! Same-thread re-entry never reaches this module (the in-shim flag in
//! `malloc_abi` short-circuits it first), so a caller that observes
//! INITIALIZING is on another thread and can spin without deadlock. That
//! keeps the "every intercepted call produces a row" invariant intact even
//! across the one-time init race.

use std::sync::atomic::{AtomicPtr, AtomicU8, Ordering};

use memtrace_core::{TraceWriter, Tracer};

use crate::real_heap::RealHeap;

const STATE_UNINIT: u8 = 0;
const STATE_INITIALIZING: u8 = 1;
const STATE_READY: u8 = 2;

static TRACER_STATE: AtomicU8 = AtomicU8::new(STATE_UNINIT);
static TRACER_PTR: AtomicPtr<Tracer<RealHeap>> = AtomicPtr::new(std::ptr::null_mut());

/// Trace destination, validated and baked in by build.rs.
const LOG_FILE: &str = env!("MEMTRACE_LOG_FILE");

/// Global tracer, constructed on the first intercepted call and never torn
/// down (the destination closes when the process exits).
pub(crate) fn global_tracer() -> &'static Tracer<RealHeap> {
    loop {
        match TRACER_STATE.load(Ordering::Acquire) {
            STATE_READY => {
                let ptr = TRACER_PTR.load(Ordering::Acquire);
                // SAFETY: READY is stored only after TRACER_PTR, and the
                // instance is leaked for the process lifetime.
                return unsafe { &*ptr };
            }
            STATE_INITIALIZING => std::hint::spin_loop(),
            _ => {
                if TRACER_STATE
                    .compare_exchange(
                        STATE_UNINIT,
                        STATE_INITIALIZING,
                        Ordering::SeqCst,
                        Ordering::Relaxed,
                    )
                    .is_ok()
                {
                    // This Box allocation re-enters the shim; the in-shim
                    // flag routes it to __real_malloc untraced.
                    let tracer = Box::new(Tracer::new(RealHeap, TraceWriter::new(LOG_FILE)));
                    TRACER_PTR.store(Box::into_raw(tracer), Ordering::Release);
                    TRACER_STATE.store(STATE_READY, Ordering::Release);
                }
            }
        }
    }
}
