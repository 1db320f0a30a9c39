//! Concurrency contract: many threads hammer the four operations against
//! one shared tracer. The trace must end up with exactly one header ahead
//! of all data rows, no torn or interleaved rows, and no lost events.
//! Cross-thread ordering is unspecified and deliberately not asserted;
//! each single thread's own rows must appear in program order.

use std::fs;
use std::path::PathBuf;
use std::thread;

use parking_lot::Mutex;

use memtrace_core::{Caller, Op, TraceWriter, Tracer};
use memtrace_harness::mock_heap::usable_for;
use memtrace_harness::{MockHeap, TraceRow, read_trace};

const THREADS: usize = 8;

fn temp_trace(tag: &str) -> PathBuf {
    std::env::temp_dir().join(format!("memtrace-mt-{}-{}.csv", tag, std::process::id()))
}

fn assert_single_leading_header(path: &PathBuf) {
    let text = fs::read_to_string(path).unwrap();
    assert!(text.starts_with("op,caller,ptr,size\n"));
    assert_eq!(
        text.lines().filter(|l| *l == "op,caller,ptr,size").count(),
        1,
        "header must appear exactly once"
    );
}

#[test]
fn racing_threads_produce_a_complete_well_formed_trace() {
    let path = temp_trace("alloc-free");
    let tracer = Tracer::new(MockHeap::new(), TraceWriter::new(&path));

    thread::scope(|s| {
        for i in 0..THREADS {
            let tracer = &tracer;
            s.spawn(move || {
                // Distinct sizes let the assertions find each thread's rows.
                let size = (i + 1) * 100;
                let p = tracer.malloc(size).unwrap();
                unsafe { tracer.free(p) }.unwrap();
            });
        }
    });

    assert_single_leading_header(&path);

    // read_trace rejects torn or malformed rows, so parsing doubles as the
    // row-atomicity check.
    let rows = read_trace(&path).unwrap();
    assert_eq!(rows.len(), 2 * THREADS);

    for i in 0..THREADS {
        let size = (i + 1) * 100;
        let alloc_at = rows
            .iter()
            .position(|r| r.caller == Caller::Malloc && r.size == size)
            .unwrap_or_else(|| panic!("missing allocate row for size {size}"));
        let addr = rows[alloc_at].addr;
        let release_at = rows
            .iter()
            .position(|r| r.caller == Caller::Free && r.addr == addr)
            .unwrap_or_else(|| panic!("missing release row for size {size}"));

        assert_eq!(rows[release_at].size, usable_for(size));
        // Same-thread order survives into the file.
        assert!(alloc_at < release_at);
    }

    let _ = fs::remove_file(&path);
}

#[test]
fn racing_resizes_keep_their_pair_order_per_thread() {
    let path = temp_trace("resize");
    let tracer = Tracer::new(MockHeap::new(), TraceWriter::new(&path));
    let chains: Mutex<Vec<(usize, usize, usize, usize)>> = Mutex::new(Vec::new());

    thread::scope(|s| {
        for i in 0..THREADS {
            let tracer = &tracer;
            let chains = &chains;
            s.spawn(move || {
                let old_size = (i + 1) * 100 + 10;
                let new_size = (i + 1) * 100 + 50;
                let p = tracer.malloc(old_size).unwrap();
                let q = unsafe { tracer.realloc(p, new_size) }.unwrap();
                unsafe { tracer.free(q) }.unwrap();
                chains
                    .lock()
                    .push((p as usize, q as usize, old_size, new_size));
            });
        }
    });

    assert_single_leading_header(&path);
    let rows = read_trace(&path).unwrap();
    // Per thread: one allocate, a release/allocate pair, one release.
    assert_eq!(rows.len(), 4 * THREADS);

    let find = |pred: &dyn Fn(&TraceRow) -> bool, what: &str| -> usize {
        rows.iter()
            .position(|r| pred(r))
            .unwrap_or_else(|| panic!("missing {what} row"))
    };

    for (p, q, old_size, new_size) in chains.lock().iter().copied() {
        let malloc_at = find(
            &|r: &TraceRow| r.caller == Caller::Malloc && r.addr == p && r.size == old_size,
            "malloc",
        );
        let released_at = find(
            &|r: &TraceRow| {
                r.op == Op::Release && r.caller == Caller::Realloc && r.addr == p
            },
            "resize-release",
        );
        let reallocated_at = find(
            &|r: &TraceRow| {
                r.op == Op::Allocate && r.caller == Caller::Realloc && r.addr == q
            },
            "resize-allocate",
        );
        let freed_at = find(
            &|r: &TraceRow| r.caller == Caller::Free && r.addr == q,
            "free",
        );

        // The release of the old block carries its live usable size.
        assert_eq!(rows[released_at].size, usable_for(old_size));
        assert_eq!(rows[reallocated_at].size, new_size);
        assert_eq!(rows[freed_at].size, usable_for(new_size));
        assert!(malloc_at < released_at);
        assert!(released_at < reallocated_at);
        assert!(reallocated_at < freed_at);
    }

    let _ = fs::remove_file(&path);
}

#[test]
fn first_event_race_opens_the_destination_exactly_once() {
    // All threads race the Unopened -> Open transition directly; no thread
    // may lose its row and the header may not duplicate.
    let path = temp_trace("open-race");
    let tracer = Tracer::new(MockHeap::new(), TraceWriter::new(&path));

    thread::scope(|s| {
        for i in 0..THREADS {
            let tracer = &tracer;
            s.spawn(move || {
                let p = tracer.malloc(i + 1).unwrap();
                assert!(!p.is_null());
            });
        }
    });

    assert_single_leading_header(&path);
    let rows = read_trace(&path).unwrap();
    assert_eq!(rows.len(), THREADS);
    for i in 0..THREADS {
        assert!(
            rows.iter()
                .any(|r| r.op == Op::Allocate && r.size == i + 1),
            "row for size {} was dropped in the open race",
            i + 1
        );
    }

    let _ = fs::remove_file(&path);
}
