// csv2timeline - util/constants.rs
//
// Single source of truth for all named constants, limits, and defaults.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "csv2timeline";

/// Application identifier used for config/data directories.
pub const APP_ID: &str = "csv2timeline";

/// Current application version.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Discovery
// =============================================================================

/// Default recursion depth: the input directory itself, no subdirectories.
pub const DEFAULT_MAX_DEPTH: usize = 1;

/// Hard upper bound on max depth (prevents runaway traversal).
pub const ABSOLUTE_MAX_DEPTH: usize = 32;

/// Default include glob patterns for input discovery.
pub const DEFAULT_INCLUDE_PATTERNS: &[&str] = &["*.csv"];

// =============================================================================
// Configuration source
// =============================================================================

/// Configuration file name looked up in the working directory, then in the
/// platform config directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Optional tool settings file name (platform config directory).
pub const SETTINGS_FILE_NAME: &str = "settings.toml";

/// Maximum size of the configuration file in bytes.
pub const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024; // 1 MB

/// Maximum number of configuration sections accepted from one source.
pub const MAX_CONFIGURATIONS: usize = 500;

/// Keys every configuration section must carry.
pub const REQUIRED_CONFIG_KEYS: &[&str] =
    &["datetime", "headers", "timestamp_desc", "message", "source"];

// =============================================================================
// Timeline building
// =============================================================================

/// Per-row warnings logged for a single input file before further ones are
/// only counted. The suppressed count is reported once when the file is done.
pub const MAX_ROW_WARNINGS_PER_FILE: usize = 1_000;

/// Maximum characters of a raw cell value echoed into a log message.
pub const LOG_VALUE_PREVIEW: usize = 120;

// =============================================================================
// Output
// =============================================================================

/// Name of the cumulative timeline file inside the output directory.
pub const TIMELINE_FILE_NAME: &str = "timeline.csv";

/// Column header of the timeline file, in write order.
pub const TIMELINE_COLUMNS: [&str; 5] = [
    "Timestamp",
    "SourceSystem",
    "Message",
    "TimestampDescription",
    "Source",
];

/// Default chrono format for the Timestamp column.
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

// =============================================================================
// Logging
// =============================================================================

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Prefix of the per-run log file written into the output directory.
pub const RUN_LOG_PREFIX: &str = "csv2timeline_";
