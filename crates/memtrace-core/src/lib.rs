//! # memtrace-core
//!
//! Event model, trace writer, and interception logic for the allocation
//! trace shim. Everything in this crate is testable without symbol
//! redirection; the `extern "C"` installation lives in `memtrace-abi`.
//!
//! # Architecture
//!
//! ```text
//! application -> interception (Tracer over a Heap capability)
//!             -> TraceWriter (single append destination, header once)
//!             -> trace file
//! ```
//!
//! The tracer calls through to the heap and emits one row per allocate or
//! release effect; a resize emits a RELEASE/ALLOCATE pair. Control returns
//! to the application with exactly the result the heap produced.

pub mod event;
pub mod heap;
pub mod metrics;
pub mod tracer;
pub mod writer;

pub use event::{Caller, HEADER, Op, TraceEvent};
pub use heap::Heap;
pub use metrics::{MetricsSnapshot, TraceMetrics, global_metrics};
pub use tracer::Tracer;
pub use writer::{TraceError, TraceWriter};
