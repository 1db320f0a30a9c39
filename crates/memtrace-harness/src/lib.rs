//! # memtrace-harness
//!
//! Test tooling for the trace shim: a parser/validator for the on-disk
//! trace contract and a deterministic mock heap fixture, shared by the
//! integration suites under `tests/`.

pub mod mock_heap;
pub mod trace_file;

pub use mock_heap::{BUCKET, MockHeap};
pub use trace_file::{ParseError, TraceRow, parse_trace, read_trace};
