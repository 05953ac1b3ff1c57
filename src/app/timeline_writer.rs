// csv2timeline - app/timeline_writer.rs
//
// Appends event batches to the cumulative timeline file.
//
// The file is opened, written and closed once per batch. It is never
// truncated: events from earlier batches and earlier runs stay in place, and
// the header row is written only while the file is still empty. A file
// whose last line lacks its line break gets one before the batch.

use crate::core::export;
use crate::core::model::Event;
use crate::util::constants;
use crate::util::error::ExportError;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Append `events` to the timeline CSV at `output_path`, creating it if
/// needed. Returns the number of events written.
pub fn append(
    output_path: &Path,
    events: &[Event],
    timestamp_description: &str,
    timestamp_format: &str,
) -> Result<usize, ExportError> {
    let io_error = |e: std::io::Error| ExportError::Io {
        path: output_path.to_path_buf(),
        source: e,
    };

    let mut file = OpenOptions::new()
        .create(true)
        .read(true)
        .append(true)
        .open(output_path)
        .map_err(io_error)?;

    let len = file.metadata().map_err(io_error)?.len();
    let include_header = len == 0;

    if !include_header && !ends_with_newline(&mut file, len).map_err(io_error)? {
        tracing::debug!(path = %output_path.display(), "Terminating unfinished last line");
        file.write_all(b"\n").map_err(io_error)?;
    }

    let written = export::write_timeline(
        events,
        BufWriter::new(&file),
        timestamp_description,
        include_header,
        timestamp_format,
        output_path,
    )?;

    tracing::debug!(
        path = %output_path.display(),
        events = written,
        header = include_header,
        "Timeline batch appended"
    );

    Ok(written)
}

/// True if the last byte of the `len`-byte file is a line feed.
fn ends_with_newline(file: &mut File, len: u64) -> std::io::Result<bool> {
    file.seek(SeekFrom::Start(len - 1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

/// Writer bound to one timeline file and timestamp format for a whole run.
#[derive(Debug, Clone)]
pub struct TimelineWriter {
    path: PathBuf,
    timestamp_format: String,
}

impl TimelineWriter {
    /// Writer for `timeline.csv` inside `output_dir`.
    pub fn new(output_dir: &Path, timestamp_format: impl Into<String>) -> Self {
        Self::with_path(output_dir.join(constants::TIMELINE_FILE_NAME), timestamp_format)
    }

    pub fn with_path(path: PathBuf, timestamp_format: impl Into<String>) -> Self {
        Self {
            path,
            timestamp_format: timestamp_format.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(
        &self,
        events: &[Event],
        timestamp_description: &str,
    ) -> Result<usize, ExportError> {
        append(
            &self.path,
            events,
            timestamp_description,
            &self.timestamp_format,
        )
    }
}
