// csv2timeline - util/logging.rs
//
// Structured logging with runtime-selectable debug mode, plus the injected
// run-log collaborator used by the pipeline.
//
// Activation:
//   - Environment variable: RUST_LOG=debug (or trace)
//   - CLI flag: --debug
//   - Settings file: [logging] level = "debug"
//
// Output: stderr, and optionally a plain-text run log file.

use std::cell::RefCell;
use std::fs::File;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Initialise the logging subsystem.
///
/// `debug_flag` is true when the user passed --debug on the CLI.
/// `config_level` is the level from settings.toml (if present).
/// `log_file` is the optional run log path; every event is mirrored there.
///
/// Priority: RUST_LOG env var > CLI --debug flag > config level > default "info".
///
/// Returns the error from creating `log_file`, if that failed; logging to
/// stderr is set up regardless.
pub fn init(
    debug_flag: bool,
    config_level: Option<&str>,
    log_file: Option<&Path>,
) -> Result<(), std::io::Error> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if debug_flag {
        EnvFilter::new("debug")
    } else if let Some(level) = config_level {
        EnvFilter::new(level)
    } else {
        EnvFilter::new(super::constants::DEFAULT_LOG_LEVEL)
    };

    let (file, file_error) = match log_file.map(File::create).transpose() {
        Ok(file) => (file, None),
        Err(e) => (None, Some(e)),
    };

    let file_layer = file.map(|f| {
        tracing_subscriber::fmt::layer()
            .with_writer(Mutex::new(f))
            .with_ansi(false)
            .with_target(false)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .compact(),
        )
        .with(file_layer)
        .init();

    tracing::debug!(
        app = super::constants::APP_NAME,
        version = super::constants::APP_VERSION,
        "Logging initialised"
    );

    match file_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

// =============================================================================
// Run log collaborator
// =============================================================================

/// User-visible progress and failure messages of a run.
///
/// Passed into the timeline builder and the pipeline instead of reaching for
/// a global logger, so callers (and tests) decide where messages go.
pub trait RunLog {
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
    fn error(&self, message: &str);
}

/// Forwards run messages to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLog;

impl RunLog for TracingLog {
    fn info(&self, message: &str) {
        tracing::info!("{message}");
    }

    fn warn(&self, message: &str) {
        tracing::warn!("{message}");
    }

    fn error(&self, message: &str) {
        tracing::error!("{message}");
    }
}

/// Severity of a captured run message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

/// Keeps run messages in memory for later inspection.
#[derive(Debug, Default)]
pub struct MemoryLog {
    records: RefCell<Vec<(LogLevel, String)>>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// All captured messages, oldest first.
    pub fn records(&self) -> Vec<(LogLevel, String)> {
        self.records.borrow().clone()
    }

    /// Captured messages of one level.
    pub fn messages(&self, level: LogLevel) -> Vec<String> {
        self.records
            .borrow()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }

    fn push(&self, level: LogLevel, message: &str) {
        self.records.borrow_mut().push((level, message.to_string()));
    }
}

impl RunLog for MemoryLog {
    fn info(&self, message: &str) {
        self.push(LogLevel::Info, message);
    }

    fn warn(&self, message: &str) {
        self.push(LogLevel::Warn, message);
    }

    fn error(&self, message: &str) {
        self.push(LogLevel::Error, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_log_keeps_order_and_levels() {
        let log = MemoryLog::new();
        log.info("reading a.csv");
        log.warn("no match for b.csv");
        log.error("write failed");
        log.warn("bad row");

        assert_eq!(log.records().len(), 4);
        assert_eq!(log.records()[0], (LogLevel::Info, "reading a.csv".to_string()));
        assert_eq!(
            log.messages(LogLevel::Warn),
            vec!["no match for b.csv".to_string(), "bad row".to_string()]
        );
        assert_eq!(log.messages(LogLevel::Error).len(), 1);
    }
}
