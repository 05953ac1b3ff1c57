// csv2timeline - app/pipeline.rs
//
// Run orchestration: discovery -> match -> build -> append, one input file
// at a time, in file-name order.
//
// Error policy:
//   - Setup problems (output or input directory unusable) return Err and
//     nothing is written.
//   - A file that cannot be read or appended is logged as an error and
//     counted; the run moves on to the next file.
//   - A file no configuration matches is logged as a warning.
//   - Row problems are handled inside core::timeline.

use crate::app::timeline_writer::TimelineWriter;
use crate::core::discovery::{self, DiscoveryConfig};
use crate::core::matcher;
use crate::core::model::{FileSummary, RunSummary, TimelineConfig};
use crate::core::timeline;
use crate::util::constants;
use crate::util::error::{Csv2TimelineError, ExportError, ParseError};
use crate::util::logging::RunLog;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Everything a run needs besides the configurations.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,

    /// Label attached to every event of the run.
    pub source_system: String,

    pub discovery: DiscoveryConfig,

    /// chrono format of the Timestamp column.
    pub timestamp_format: String,
}

impl RunRequest {
    /// Request with default discovery and timestamp settings.
    pub fn new(
        input_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        source_system: impl Into<String>,
    ) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            source_system: source_system.into(),
            discovery: DiscoveryConfig::default(),
            timestamp_format: constants::DEFAULT_TIMESTAMP_FORMAT.to_string(),
        }
    }

    /// Path of the cumulative timeline file.
    pub fn timeline_path(&self) -> PathBuf {
        self.output_dir.join(constants::TIMELINE_FILE_NAME)
    }
}

/// What happened to one input file.
enum FileOutcome {
    Written(FileSummary),
    Unmatched,
}

/// The output directory must exist and be a directory.
pub fn validate_output_dir(dir: &Path) -> Result<(), ExportError> {
    match std::fs::metadata(dir) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(ExportError::OutputNotADirectory {
            path: dir.to_path_buf(),
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ExportError::OutputDirNotFound {
            path: dir.to_path_buf(),
        }),
        Err(e) => Err(ExportError::Io {
            path: dir.to_path_buf(),
            source: e,
        }),
    }
}

/// Process every input file of `request` against `configs`.
///
/// Returns `Err` only for setup failures; per-file failures are reported to
/// `log` and counted in the summary.
pub fn run(
    request: &RunRequest,
    configs: &[TimelineConfig],
    log: &dyn RunLog,
) -> Result<RunSummary, Csv2TimelineError> {
    let started = Instant::now();

    validate_output_dir(&request.output_dir)?;

    let (files, warnings) = discovery::discover_files(&request.input_dir, &request.discovery)?;
    for warning in &warnings {
        log.warn(warning);
    }

    let writer = TimelineWriter::new(&request.output_dir, request.timestamp_format.as_str());

    tracing::info!(
        input = %request.input_dir.display(),
        output = %writer.path().display(),
        files = files.len(),
        configurations = configs.len(),
        "Run starting"
    );

    let mut summary = RunSummary::default();

    for path in &files {
        if is_same_file(path, writer.path()) {
            tracing::debug!(file = %path.display(), "Skipping the timeline file itself");
            continue;
        }
        summary.files_discovered += 1;

        match process_file(path, request, configs, &writer, log) {
            Ok(FileOutcome::Written(file_summary)) => {
                summary.files_matched += 1;
                summary.events_written += file_summary.events;
                summary.rows_filtered += file_summary.rows_filtered;
                summary.rows_skipped += file_summary.rows_skipped;
                summary.file_summaries.push(file_summary);
            }
            Ok(FileOutcome::Unmatched) => summary.files_unmatched += 1,
            Err(e) => {
                summary.files_failed += 1;
                log.error(&format!("Failed to process '{}': {e}", path.display()));
            }
        }
    }

    summary.duration = started.elapsed();

    log.info(&format!(
        "Run complete: {} files, {} matched, {} unmatched, {} failed; \
         {} events written, {} rows filtered, {} rows skipped",
        summary.files_discovered,
        summary.files_matched,
        summary.files_unmatched,
        summary.files_failed,
        summary.events_written,
        summary.rows_filtered,
        summary.rows_skipped,
    ));
    tracing::info!(
        duration_ms = summary.duration.as_millis() as u64,
        "Run finished"
    );

    Ok(summary)
}

fn process_file(
    path: &Path,
    request: &RunRequest,
    configs: &[TimelineConfig],
    writer: &TimelineWriter,
    log: &dyn RunLog,
) -> Result<FileOutcome, Csv2TimelineError> {
    log.info(&format!("Reading '{}'", path.display()));

    let file = File::open(path).map_err(|e| Csv2TimelineError::Io {
        path: path.to_path_buf(),
        operation: "open",
        source: e,
    })?;
    let mut reader = timeline::csv_reader(BufReader::new(file));

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| ParseError::Read {
            file: path.to_path_buf(),
            source: e,
        })?
        .iter()
        .map(str::to_string)
        .collect();
    let header_names: Vec<&str> = headers.iter().map(String::as_str).collect();

    let Some(matched) = matcher::best_match(&header_names, configs) else {
        log.warn(&format!(
            "No configuration matches '{}' (headers: {}); file skipped",
            path.display(),
            headers.join(", ")
        ));
        return Ok(FileOutcome::Unmatched);
    };
    let config = matched.config;

    log.info(&format!(
        "'{}' matched configuration '{}' ({} of {} headers{})",
        path.display(),
        config.name,
        matched.score,
        header_names.len(),
        if matched.exact { ", exact" } else { "" }
    ));

    let built = timeline::build(&mut reader, path, config, &request.source_system, log)?;
    let written = writer.append(&built.events, &config.timestamp_description)?;

    log.info(&format!(
        "Wrote {written} events from '{}' to '{}'",
        path.display(),
        writer.path().display()
    ));

    Ok(FileOutcome::Written(FileSummary {
        path: path.to_path_buf(),
        config_name: config.name.clone(),
        rows_read: built.rows_read,
        events: written,
        rows_filtered: built.rows_filtered,
        rows_skipped: built.rows_skipped,
        earliest: built.earliest(),
        latest: built.latest(),
    }))
}

/// True if both paths name the same existing file.
fn is_same_file(a: &Path, b: &Path) -> bool {
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_validate_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(validate_output_dir(dir.path()).is_ok());

        assert!(matches!(
            validate_output_dir(&dir.path().join("absent")),
            Err(ExportError::OutputDirNotFound { .. })
        ));

        let file = dir.path().join("file.txt");
        fs::write(&file, "x").unwrap();
        assert!(matches!(
            validate_output_dir(&file),
            Err(ExportError::OutputNotADirectory { .. })
        ));
    }

    #[test]
    fn test_is_same_file_resolves_relative_components() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("timeline.csv");
        fs::write(&file, "").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();

        let indirect = dir.path().join("sub").join("..").join("timeline.csv");
        assert!(is_same_file(&file, &indirect));
        assert!(!is_same_file(&file, &dir.path().join("other.csv")));
    }

    #[test]
    fn test_request_defaults() {
        let request = RunRequest::new("in", "out", "host-1");
        assert_eq!(request.timeline_path(), Path::new("out").join("timeline.csv"));
        assert_eq!(request.timestamp_format, constants::DEFAULT_TIMESTAMP_FORMAT);
        assert_eq!(request.discovery.max_depth, constants::DEFAULT_MAX_DEPTH);
    }
}
