// csv2timeline - core/timeline.rs
//
// Timeline builder: turns the data rows of one CSV file into events using
// its matched configuration.
//
// Per row: filter -> timestamp -> message -> Event. Row-level problems are
// logged through the injected run log and the row is skipped; only an I/O
// failure of the underlying reader aborts the file.

use crate::core::filter::FilterExpression;
use crate::core::message;
use crate::core::model::{Event, Row, Timeline, TimelineConfig};
use crate::core::timestamp;
use crate::util::constants;
use crate::util::error::ParseError;
use crate::util::logging::RunLog;
use std::io::Read;
use std::path::Path;

/// CSV reader configured the way input files are read: first line is the
/// header row (names trimmed), records may have a varying number of fields.
pub fn csv_reader<R: Read>(input: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(input)
}

/// Build the timeline of one file.
///
/// `file` is only used for diagnostics. Events are returned in input order.
/// Returns `ParseError::Read` if the reader fails with an I/O error; the
/// events gathered so far are discarded in that case.
pub fn build<R: Read>(
    reader: &mut csv::Reader<R>,
    file: &Path,
    config: &TimelineConfig,
    source_system: &str,
    log: &dyn RunLog,
) -> Result<Timeline, ParseError> {
    let headers = reader
        .headers()
        .map_err(|e| ParseError::Read {
            file: file.to_path_buf(),
            source: e,
        })?
        .clone();

    // Compiled once; a compile error is reported against every row it would
    // have been applied to.
    let filter = FilterExpression::parse(&config.filters);

    let mut timeline = Timeline::default();
    let mut warnings = RowWarnings::new(log);

    for (index, result) in reader.records().enumerate() {
        // Header is line 1; used when the reader has no position to offer.
        let fallback_line = index as u64 + 2;

        let record = match result {
            Ok(record) => record,
            Err(e) if e.is_io_error() => {
                return Err(ParseError::Read {
                    file: file.to_path_buf(),
                    source: e,
                });
            }
            Err(e) => {
                timeline.rows_read += 1;
                timeline.rows_skipped += 1;
                let line_number = e.position().map_or(fallback_line, |p| p.line());
                warnings.push(&ParseError::Record {
                    file: file.to_path_buf(),
                    line_number,
                    source: e,
                });
                continue;
            }
        };

        timeline.rows_read += 1;
        let line_number = record.position().map_or(fallback_line, |p| p.line());
        let row = Row::new(line_number, headers.iter(), record.iter());

        let accepted = match &filter {
            Ok(expression) => expression.evaluate(&row),
            Err(e) => Err(e.clone()),
        };
        match accepted {
            Ok(true) => {}
            Ok(false) => {
                timeline.rows_filtered += 1;
                continue;
            }
            Err(e) => {
                timeline.rows_skipped += 1;
                warnings.push(&ParseError::Filter {
                    file: file.to_path_buf(),
                    line_number,
                    source: e,
                });
                continue;
            }
        }

        let timestamp = match parse_timestamp(&row, file, &config.datetime_field) {
            Ok(ts) => ts,
            Err(e) => {
                timeline.rows_skipped += 1;
                warnings.push(&e);
                continue;
            }
        };

        timeline.events.push(Event {
            timestamp,
            source_system: source_system.to_string(),
            message: message::render(&config.message_format, &row, &config.headers),
            timestamp_description: config.timestamp_description.clone(),
            source: config.source.clone(),
        });
    }

    warnings.finish(file);

    tracing::debug!(
        file = %file.display(),
        config = %config.name,
        rows = timeline.rows_read,
        events = timeline.events.len(),
        filtered = timeline.rows_filtered,
        skipped = timeline.rows_skipped,
        "Timeline built"
    );

    Ok(timeline)
}

fn parse_timestamp(
    row: &Row<'_>,
    file: &Path,
    field: &str,
) -> Result<chrono::NaiveDateTime, ParseError> {
    let raw = row.get(field).ok_or_else(|| ParseError::MissingTimestamp {
        file: file.to_path_buf(),
        line_number: row.line_number(),
        field: field.to_string(),
    })?;

    timestamp::parse(raw).ok_or_else(|| ParseError::TimestampParse {
        file: file.to_path_buf(),
        line_number: row.line_number(),
        field: field.to_string(),
        raw_timestamp: preview(raw),
    })
}

/// At most `LOG_VALUE_PREVIEW` characters of a cell, for log messages.
fn preview(raw: &str) -> String {
    if raw.chars().count() <= constants::LOG_VALUE_PREVIEW {
        raw.to_string()
    } else {
        let mut s: String = raw.chars().take(constants::LOG_VALUE_PREVIEW).collect();
        s.push_str("...");
        s
    }
}

/// Per-file row warning budget.
struct RowWarnings<'a> {
    log: &'a dyn RunLog,
    logged: usize,
    suppressed: usize,
}

impl<'a> RowWarnings<'a> {
    fn new(log: &'a dyn RunLog) -> Self {
        Self {
            log,
            logged: 0,
            suppressed: 0,
        }
    }

    fn push(&mut self, error: &ParseError) {
        if self.logged < constants::MAX_ROW_WARNINGS_PER_FILE {
            self.logged += 1;
            self.log.warn(&error.to_string());
        } else {
            self.suppressed += 1;
        }
    }

    fn finish(self, file: &Path) {
        if self.suppressed > 0 {
            self.log.warn(&format!(
                "'{}': {} further row warnings suppressed",
                file.display(),
                self.suppressed
            ));
        }
    }
}
