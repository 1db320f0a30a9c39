//! # memtrace-abi
//!
//! `extern "C"` boundary for the allocation trace shim. Produces a
//! `staticlib` whose `__wrap_malloc` / `__wrap_calloc` / `__wrap_realloc` /
//! `__wrap_free` symbols substitute for the allocator entry points when the
//! final binary is linked with:
//!
//! ```text
//! -Wl,--wrap=malloc -Wl,--wrap=calloc -Wl,--wrap=realloc -Wl,--wrap=free
//! ```
//!
//! The linker resolves the `__real_*` imports in this crate to the
//! untouched originals, and substitution is total: every call site in the
//! process reaches the shim.
//!
//! The trace destination is baked in at build time from `MEMTRACE_LOG_FILE`
//! (see `build.rs`); a missing value fails the build, never falls back at
//! runtime.

// Gated behind cfg(not(test)) because these modules import the __real_*
// symbols that only a wrapped application link provides; the plain test
// binary has no definition for them.
#[cfg(not(test))]
pub mod malloc_abi;
#[cfg(not(test))]
pub mod real_heap;
#[cfg(not(test))]
mod tracer_state;
