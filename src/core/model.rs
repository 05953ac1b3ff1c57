// csv2timeline - core/model.rs
//
// Core data model types. Pure data definitions with no I/O.
// These types are the shared vocabulary across all layers.

use crate::util::error::FilterError;
use chrono::NaiveDateTime;
use std::path::PathBuf;
use std::time::Duration;

// =============================================================================
// Timeline configuration (one named section of the configuration source)
// =============================================================================

/// Rule set describing how to turn one class of CSV file into timeline
/// events. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineConfig {
    /// Section name, e.g. "web".
    pub name: String,

    /// Column holding the event timestamp.
    pub datetime_field: String,

    /// Columns this class of file is expected to carry, in declared order.
    /// Used for matching and as the set of substitutable placeholders.
    pub headers: Vec<String>,

    /// Value of the TimestampDescription output column.
    pub timestamp_description: String,

    /// Message template with `{column}` placeholders.
    pub message_format: String,

    /// Value of the Source output column.
    pub source: String,

    /// Raw filter text. Each entry holds one or more `;`-separated groups;
    /// see `core::filter` for the grammar. Empty = keep every row.
    pub filters: Vec<String>,
}

// =============================================================================
// Row (one CSV record, transient)
// =============================================================================

/// One data line of an input CSV, as an ordered header -> value mapping.
///
/// Borrowed from the reader's header and record buffers; lives only while
/// the line is processed.
#[derive(Debug, Clone)]
pub struct Row<'a> {
    line_number: u64,
    cells: Vec<(&'a str, &'a str)>,
}

impl<'a> Row<'a> {
    /// Pair `headers` with `values` positionally. Columns without a value
    /// (short records) are absent from the row; surplus values are dropped.
    pub fn new<H, V>(line_number: u64, headers: H, values: V) -> Self
    where
        H: IntoIterator<Item = &'a str>,
        V: IntoIterator<Item = &'a str>,
    {
        Self {
            line_number,
            cells: headers.into_iter().zip(values).collect(),
        }
    }

    /// 1-based line number in the source file (header is line 1).
    pub fn line_number(&self) -> u64 {
        self.line_number
    }

    /// Value of the first column named `field`.
    pub fn get(&self, field: &str) -> Option<&'a str> {
        self.cells
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, value)| *value)
    }

    /// Like [`Row::get`], but a missing column is an error.
    pub fn field(&self, field: &str) -> Result<&'a str, FilterError> {
        self.get(field).ok_or_else(|| FilterError::FieldNotFound {
            field: field.to_string(),
        })
    }

    /// Number of columns present.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

// =============================================================================
// Event (normalised output record)
// =============================================================================

/// One normalised timeline record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Parsed from the configured timestamp column. Wall-clock as written in
    /// the source; no timezone normalisation.
    pub timestamp: NaiveDateTime,

    /// Caller-supplied label of the originating environment.
    pub source_system: String,

    /// Rendered message template.
    pub message: String,

    /// Copied from the matched configuration.
    pub timestamp_description: String,

    /// Copied from the matched configuration.
    pub source: String,
}

// =============================================================================
// Timeline (builder output for one file)
// =============================================================================

/// Events produced from one input file, in input order, plus row counts.
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    pub events: Vec<Event>,

    /// Data rows read (header excluded).
    pub rows_read: usize,

    /// Rows the configuration's filter rejected.
    pub rows_filtered: usize,

    /// Rows dropped because of an error (timestamp, filter, decoding).
    pub rows_skipped: usize,
}

impl Timeline {
    /// Earliest event timestamp, if any.
    pub fn earliest(&self) -> Option<NaiveDateTime> {
        self.events.iter().map(|e| e.timestamp).min()
    }

    /// Latest event timestamp, if any.
    pub fn latest(&self) -> Option<NaiveDateTime> {
        self.events.iter().map(|e| e.timestamp).max()
    }
}

// =============================================================================
// Run summary
// =============================================================================

/// Per-file statistics of a run.
#[derive(Debug, Clone)]
pub struct FileSummary {
    /// Input file path.
    pub path: PathBuf,

    /// Name of the configuration the file was processed with.
    pub config_name: String,

    pub rows_read: usize,
    pub events: usize,
    pub rows_filtered: usize,
    pub rows_skipped: usize,

    /// Earliest event timestamp (if any events were produced).
    pub earliest: Option<NaiveDateTime>,

    /// Latest event timestamp (if any events were produced).
    pub latest: Option<NaiveDateTime>,
}

/// Summary statistics for a completed run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Input files found in the input directory.
    pub files_discovered: usize,

    /// Files that matched a configuration and were written.
    pub files_matched: usize,

    /// Files no configuration matched.
    pub files_unmatched: usize,

    /// Files abandoned because of a read or write error.
    pub files_failed: usize,

    /// Events appended to the timeline file.
    pub events_written: usize,

    /// Rows rejected by filters, across all files.
    pub rows_filtered: usize,

    /// Rows dropped because of an error, across all files.
    pub rows_skipped: usize,

    /// Per-file breakdown, in processing order.
    pub file_summaries: Vec<FileSummary>,

    /// Wall-clock run duration.
    pub duration: Duration,
}
