//! Append-only trace destination.
//!
//! Owns the single piece of truly shared mutable state in the system: one
//! file, opened once, kept open for the life of the process. The first
//! append performs the Unopened -> Open transition under the same lock as
//! every row write, so the header lands exactly once ahead of all data rows
//! no matter how many threads race to emit the first event.
//!
//! There is no userspace buffering on this path: each row is rendered off
//! the lock, then written with a single `write_all` against the raw file,
//! so every row has reached the kernel by the time `append` returns. A
//! crash can cost at most a partial final row, never a buffered backlog.
//! There is no Closed state; process exit reclaims the descriptor.

use std::fs::File;
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::event::{HEADER, Op, TraceEvent};
use crate::metrics::{TraceMetrics, global_metrics};

/// Failure to record a trace event.
///
/// There is no recovery path and no silent-drop mode: the caller at the
/// process boundary treats this as fatal (see `memtrace-abi`).
#[derive(Debug, thiserror::Error)]
pub enum TraceError {
    #[error("cannot open trace destination {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot append trace row: {0}")]
    Append(#[from] io::Error),
}

/// Append-only writer over the single trace destination.
///
/// State machine: Unopened -> Open. The destination is opened (truncating
/// any prior content) on the first append, immediately after which the
/// header row is written.
pub struct TraceWriter {
    path: PathBuf,
    dest: Mutex<Option<File>>,
}

impl TraceWriter {
    /// New writer over `path`. The file is not touched until the first
    /// append.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            dest: Mutex::new(None),
        }
    }

    /// Destination path this writer appends to.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True once the Unopened -> Open transition has happened.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.dest.lock().is_some()
    }

    /// Append one event as one row.
    ///
    /// The row is rendered into a stack buffer before the lock is taken and
    /// written with one `write_all`, so concurrent appenders can never
    /// interleave mid-row. The open step shares the lock: exactly one racer
    /// opens the file and writes the header, and no event is dropped across
    /// the race.
    pub fn append(&self, event: TraceEvent) -> Result<(), TraceError> {
        let row = event.render();

        let mut dest = self.dest.lock();
        if dest.is_none() {
            let mut file = File::create(&self.path).map_err(|source| TraceError::Open {
                path: self.path.clone(),
                source,
            })?;
            file.write_all(HEADER.as_bytes())?;
            TraceMetrics::inc(&global_metrics().header_writes);
            *dest = Some(file);
        }
        let file = dest.as_mut().expect("destination opened above");
        file.write_all(row.as_bytes())?;

        match event.op {
            Op::Allocate => TraceMetrics::inc(&global_metrics().allocate_events),
            Op::Release => TraceMetrics::inc(&global_metrics().release_events),
        }
        TraceMetrics::inc(&global_metrics().rows_written);
        Ok(())
    }
}
