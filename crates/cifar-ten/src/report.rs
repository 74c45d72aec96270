// crates/cifar-ten/src/report.rs
// ============================================================================
// Module: CIFAR-Ten Reporting
// Description: Structured progress records for fetch, extract, and parse steps.
// Purpose: Emit machine-readable JSON-line logs without a global logger.
// Dependencies: serde, serde_json, std
// ============================================================================

//! ## Overview
//! Long-running steps report progress through a [`Reporter`]. [`LogReporter`]
//! writes one JSON record per event to any writer; [`NullReporter`] discards
//! events. Reporting failures never abort the data pipeline.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use serde::Serialize;
use serde_json::json;

use crate::layout::Class;
use crate::layout::SplitKind;

// ============================================================================
// SECTION: Events
// ============================================================================

/// Progress event emitted by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ReportEvent {
    /// Download directory was created.
    DirectoryCreated {
        /// Created directory.
        path: PathBuf,
    },
    /// Archive download started.
    DownloadStarted {
        /// Source URL.
        url: String,
        /// Destination archive path.
        destination: PathBuf,
    },
    /// Archive already present; download skipped.
    DownloadSkipped {
        /// Existing archive path.
        path: PathBuf,
    },
    /// Bytes streamed so far.
    DownloadProgress {
        /// Bytes written.
        bytes: u64,
        /// Expected total when known.
        expected_bytes: Option<u64>,
    },
    /// Archive download finished.
    DownloadFinished {
        /// Final archive path.
        path: PathBuf,
        /// Total bytes written.
        bytes: u64,
    },
    /// Extraction started.
    ExtractStarted {
        /// Archive path.
        archive: PathBuf,
        /// Extraction root.
        destination: PathBuf,
    },
    /// Extracted data already present; extraction skipped.
    ExtractSkipped {
        /// Existing data directory.
        path: PathBuf,
    },
    /// Extraction finished.
    ExtractFinished {
        /// Extraction root.
        destination: PathBuf,
        /// Archive entries unpacked.
        entries: u64,
    },
    /// A batch file was read.
    BatchLoaded {
        /// Split the batch belongs to.
        split: SplitKind,
        /// Batch file path.
        path: PathBuf,
        /// Bytes read.
        bytes: u64,
    },
    /// A split was decoded.
    SplitParsed {
        /// Decoded split.
        split: SplitKind,
        /// Records decoded.
        records: u64,
    },
    /// A sample preview was rendered.
    SamplePreview {
        /// Split the sample belongs to.
        split: SplitKind,
        /// Record index.
        index: u64,
        /// Record class.
        label: Class,
        /// Preview file path.
        path: PathBuf,
    },
}

// ============================================================================
// SECTION: Reporter Trait
// ============================================================================

/// Receives pipeline progress events.
pub trait Reporter: Send + Sync {
    /// Records a single event.
    fn report(&self, event: &ReportEvent);
}

/// Reporter that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn report(&self, _event: &ReportEvent) {}
}

// ============================================================================
// SECTION: Log Reporter
// ============================================================================

/// JSON-line reporter.
///
/// # Invariants
/// - Each event produces exactly one newline-terminated JSON record.
/// - `seq` increases by one per record, starting at 1.
pub struct LogReporter<W: Write + Send> {
    /// Output writer for log records.
    writer: Mutex<W>,
    /// Component name embedded in each record.
    component: String,
    /// Monotonic record counter.
    counter: AtomicU64,
}

impl<W: Write + Send> LogReporter<W> {
    /// Creates a reporter tagged with the default component name.
    pub fn new(writer: W) -> Self {
        Self::with_component(writer, "cifar-ten")
    }

    /// Creates a reporter tagged with a custom component name.
    pub fn with_component(writer: W, component: impl Into<String>) -> Self {
        Self {
            writer: Mutex::new(writer),
            component: component.into(),
            counter: AtomicU64::new(0),
        }
    }

    /// Consumes the reporter and returns its writer.
    ///
    /// Returns `None` when the writer mutex was poisoned.
    pub fn into_inner(self) -> Option<W> {
        self.writer.into_inner().ok()
    }
}

impl<W: Write + Send> Reporter for LogReporter<W> {
    fn report(&self, event: &ReportEvent) {
        let seq = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        let record = json!({
            "seq": seq,
            "component": self.component,
            "detail": event,
        });
        let Ok(mut guard) = self.writer.lock() else {
            return;
        };
        if serde_json::to_writer(&mut *guard, &record).is_ok() {
            let _ = guard.write_all(b"\n");
            let _ = guard.flush();
        }
    }
}
