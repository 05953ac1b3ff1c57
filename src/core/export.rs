// csv2timeline - core/export.rs
//
// CSV serialisation of timeline events.
// Core layer: writes to any Write trait object. Opening, appending and
// header bookkeeping on disk live in app::timeline_writer.

use crate::core::model::Event;
use crate::util::constants;
use crate::util::error::ExportError;
use chrono::NaiveDateTime;
use std::fmt::Write as _;
use std::io::Write;
use std::path::Path;

fn format_timestamp(ts: &NaiveDateTime, format: &str) -> Result<String, ExportError> {
    let mut out = String::new();
    write!(out, "{}", ts.format(format)).map_err(|_| ExportError::TimestampFormat {
        format: format.to_string(),
    })?;
    Ok(out)
}

/// Write `events` as timeline rows.
///
/// Columns: Timestamp, SourceSystem, Message, TimestampDescription, Source.
/// The TimestampDescription column carries `timestamp_description` for every
/// row of the batch. The header row is written only if `include_header`.
///
/// `export_path` is used for error messages only. Returns the number of
/// event rows written.
pub fn write_timeline<W: Write>(
    events: &[Event],
    writer: W,
    timestamp_description: &str,
    include_header: bool,
    timestamp_format: &str,
    export_path: &Path,
) -> Result<usize, ExportError> {
    let csv_error = |e: csv::Error| ExportError::Csv {
        path: export_path.to_path_buf(),
        source: e,
    };

    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    if include_header {
        csv_writer
            .write_record(constants::TIMELINE_COLUMNS)
            .map_err(csv_error)?;
    }

    let mut count = 0;
    for event in events {
        let ts = format_timestamp(&event.timestamp, timestamp_format)?;
        csv_writer
            .write_record([
                ts.as_str(),
                event.source_system.as_str(),
                event.message.as_str(),
                timestamp_description,
                event.source.as_str(),
            ])
            .map_err(csv_error)?;
        count += 1;
    }

    csv_writer.flush().map_err(|e| ExportError::Io {
        path: export_path.to_path_buf(),
        source: e,
    })?;

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_event(ts: &str, message: &str) -> Event {
        Event {
            timestamp: NaiveDateTime::parse_from_str(ts, "%Y-%m-%d %H:%M:%S%.f").unwrap(),
            source_system: "host-1".to_string(),
            message: message.to_string(),
            timestamp_description: "Page Visit".to_string(),
            source: "weblog".to_string(),
        }
    }

    fn export(events: &[Event], header: bool, format: &str) -> String {
        let mut buf = Vec::new();
        let count = write_timeline(
            events,
            &mut buf,
            "Page Visit",
            header,
            format,
            Path::new("timeline.csv"),
        )
        .unwrap();
        assert_eq!(count, events.len());
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_header_and_column_order() {
        let output = export(
            &[make_event("2024-01-01 10:00:00", "10.0.0.1 visited /home")],
            true,
            constants::DEFAULT_TIMESTAMP_FORMAT,
        );
        assert_eq!(
            output,
            "Timestamp,SourceSystem,Message,TimestampDescription,Source\n\
             2024-01-01T10:00:00,host-1,10.0.0.1 visited /home,Page Visit,weblog\n"
        );
    }

    #[test]
    fn test_without_header() {
        let output = export(
            &[make_event("2024-01-01 10:00:00.250", "m")],
            false,
            constants::DEFAULT_TIMESTAMP_FORMAT,
        );
        assert_eq!(output, "2024-01-01T10:00:00.250,host-1,m,Page Visit,weblog\n");
    }

    #[test]
    fn test_description_argument_overrides_event() {
        let mut event = make_event("2024-01-01 10:00:00", "m");
        event.timestamp_description = "Other".to_string();
        let mut buf = Vec::new();
        write_timeline(
            &[event],
            &mut buf,
            "Logon",
            false,
            "%Y-%m-%d %H:%M:%S",
            Path::new("timeline.csv"),
        )
        .unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "2024-01-01 10:00:00,host-1,m,Logon,weblog\n"
        );
    }

    #[test]
    fn test_fields_are_quoted() {
        let output = export(
            &[make_event("2024-01-01 10:00:00", "a, \"b\"\nc")],
            false,
            "%Y",
        );
        assert_eq!(output, "2024,host-1,\"a, \"\"b\"\"\nc\",Page Visit,weblog\n");
    }

    #[test]
    fn test_empty_batch_with_header() {
        let output = export(&[], true, constants::DEFAULT_TIMESTAMP_FORMAT);
        assert_eq!(
            output,
            "Timestamp,SourceSystem,Message,TimestampDescription,Source\n"
        );
        assert_eq!(export(&[], false, "%Y"), "");
    }

    #[test]
    fn test_invalid_format_is_an_error() {
        let mut buf = Vec::new();
        let result = write_timeline(
            &[make_event("2024-01-01 10:00:00", "m")],
            &mut buf,
            "d",
            false,
            "%Q",
            Path::new("timeline.csv"),
        );
        assert!(matches!(result, Err(ExportError::TimestampFormat { .. })));
    }
}
