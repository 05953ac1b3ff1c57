// csv2timeline - util/error.rs
//
// Typed error hierarchy with context-preserving error chains.
// Every variant carries the path / section / line it concerns so that a
// logged error is diagnosable on its own.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Top-level error type for all csv2timeline operations.
/// Errors are categorised by the subsystem that produced them.
#[derive(Debug)]
pub enum Csv2TimelineError {
    /// Configuration source loading or validation failed.
    Config(ConfigError),

    /// Input discovery failed.
    Discovery(DiscoveryError),

    /// Reading or interpreting an input CSV failed.
    Parse(ParseError),

    /// Writing the timeline failed.
    Export(ExportError),

    /// I/O error with path context.
    Io {
        path: PathBuf,
        operation: &'static str,
        source: io::Error,
    },
}

impl fmt::Display for Csv2TimelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "Configuration error: {e}"),
            Self::Discovery(e) => write!(f, "Discovery error: {e}"),
            Self::Parse(e) => write!(f, "Parse error: {e}"),
            Self::Export(e) => write!(f, "Export error: {e}"),
            Self::Io {
                path,
                operation,
                source,
            } => write!(
                f,
                "I/O error during {operation} on '{}': {source}",
                path.display()
            ),
        }
    }
}

impl std::error::Error for Csv2TimelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Discovery(e) => Some(e),
            Self::Parse(e) => Some(e),
            Self::Export(e) => Some(e),
            Self::Io { source, .. } => Some(source),
        }
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

/// Errors related to loading the configuration source. All of them are fatal
/// for a run.
#[derive(Debug)]
pub enum ConfigError {
    /// The TOML document could not be parsed.
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// No configuration file exists at any of the searched locations.
    NotFound { searched: Vec<PathBuf> },

    /// Configuration file exceeds the maximum allowed size.
    FileTooLarge {
        path: PathBuf,
        size: u64,
        max_size: u64,
    },

    /// A top-level key is not a `[section]` table.
    NotASection { path: PathBuf, name: String },

    /// A section's values do not have the expected types.
    InvalidSection {
        section: String,
        source: toml::de::Error,
    },

    /// A required key is missing (or blank) in a section.
    MissingKey { section: String, key: &'static str },

    /// More sections than the loader accepts.
    TooManyConfigurations { count: usize, max: usize },

    /// I/O error reading the configuration file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TomlParse { path, source } => write!(
                f,
                "Failed to parse '{}': {source}\n\
                 Configuration values must be quoted TOML strings, \
                 e.g. headers = \"time,url,ip\"",
                path.display()
            ),
            Self::NotFound { searched } => {
                let list: Vec<String> =
                    searched.iter().map(|p| format!("'{}'", p.display())).collect();
                write!(
                    f,
                    "No configuration file found (searched {})",
                    list.join(", ")
                )
            }
            Self::FileTooLarge {
                path,
                size,
                max_size,
            } => write!(
                f,
                "Configuration '{}' is {size} bytes, exceeds maximum of {max_size} bytes",
                path.display()
            ),
            Self::NotASection { path, name } => write!(
                f,
                "'{}': top-level key '{name}' is not a [section]",
                path.display()
            ),
            Self::InvalidSection { section, source } => {
                write!(f, "Section [{section}]: {source}")
            }
            Self::MissingKey { section, key } => {
                write!(f, "Section [{section}]: missing required key '{key}'")
            }
            Self::TooManyConfigurations { count, max } => write!(
                f,
                "Too many configurations ({count}), maximum is {max}"
            ),
            Self::Io { path, source } => {
                write!(
                    f,
                    "I/O error reading configuration '{}': {source}",
                    path.display()
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TomlParse { source, .. } => Some(source),
            Self::InvalidSection { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ConfigError> for Csv2TimelineError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Discovery errors
// ---------------------------------------------------------------------------

/// Errors related to listing the input directory.
#[derive(Debug)]
pub enum DiscoveryError {
    /// The input directory does not exist.
    RootNotFound { path: PathBuf },

    /// The input path is not a directory.
    NotADirectory { path: PathBuf },

    /// Permission denied accessing the input directory.
    PermissionDenied { path: PathBuf, source: io::Error },

    /// The input directory itself could not be traversed.
    Traversal {
        path: PathBuf,
        source: walkdir::Error,
    },
}

impl fmt::Display for DiscoveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RootNotFound { path } => {
                write!(f, "Input directory '{}' does not exist", path.display())
            }
            Self::NotADirectory { path } => {
                write!(f, "Input path '{}' is not a directory", path.display())
            }
            Self::PermissionDenied { path, source } => {
                write!(
                    f,
                    "Permission denied accessing '{}': {source}",
                    path.display()
                )
            }
            Self::Traversal { path, source } => {
                write!(f, "Error traversing '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for DiscoveryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::PermissionDenied { source, .. } => Some(source),
            Self::Traversal { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<DiscoveryError> for Csv2TimelineError {
    fn from(e: DiscoveryError) -> Self {
        Self::Discovery(e)
    }
}

// ---------------------------------------------------------------------------
// Filter errors
// ---------------------------------------------------------------------------

/// Errors raised while compiling or evaluating a filter expression.
/// Both are row-local: the row is skipped and the file continues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    /// A condition is not of the form `field=value` / `field~value`, or the
    /// parentheses of the expression do not balance.
    Syntax {
        condition: String,
        reason: &'static str,
    },

    /// A condition references a column the row does not have.
    FieldNotFound { field: String },
}

impl fmt::Display for FilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Syntax { condition, reason } => {
                write!(f, "Invalid filter expression '{condition}': {reason}")
            }
            Self::FieldNotFound { field } => {
                write!(f, "Filter references unknown field '{field}'")
            }
        }
    }
}

impl std::error::Error for FilterError {}

// ---------------------------------------------------------------------------
// Parse errors
// ---------------------------------------------------------------------------

/// Errors related to reading input CSV files.
///
/// `Read` aborts the current file. Every other variant describes a single
/// skipped row and is only ever logged.
#[derive(Debug)]
pub enum ParseError {
    /// The timestamp column value is not a recognisable date/time.
    TimestampParse {
        file: PathBuf,
        line_number: u64,
        field: String,
        raw_timestamp: String,
    },

    /// The row has no value for the configured timestamp column.
    MissingTimestamp {
        file: PathBuf,
        line_number: u64,
        field: String,
    },

    /// The configuration's filter rejected the row with an error.
    Filter {
        file: PathBuf,
        line_number: u64,
        source: FilterError,
    },

    /// A record could not be decoded (e.g. invalid UTF-8).
    Record {
        file: PathBuf,
        line_number: u64,
        source: csv::Error,
    },

    /// The file could not be opened or read.
    Read { file: PathBuf, source: csv::Error },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TimestampParse {
                file,
                line_number,
                field,
                raw_timestamp,
            } => write!(
                f,
                "'{}' line {line_number}: cannot parse '{raw_timestamp}' in column \
                 '{field}' as a date/time",
                file.display()
            ),
            Self::MissingTimestamp {
                file,
                line_number,
                field,
            } => write!(
                f,
                "'{}' line {line_number}: timestamp column '{field}' is missing",
                file.display()
            ),
            Self::Filter {
                file,
                line_number,
                source,
            } => write!(f, "'{}' line {line_number}: {source}", file.display()),
            Self::Record {
                file,
                line_number,
                source,
            } => write!(
                f,
                "'{}' line {line_number}: unreadable record: {source}",
                file.display()
            ),
            Self::Read { file, source } => {
                write!(f, "'{}': read error: {source}", file.display())
            }
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Filter { source, .. } => Some(source),
            Self::Record { source, .. } => Some(source),
            Self::Read { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ParseError> for Csv2TimelineError {
    fn from(e: ParseError) -> Self {
        Self::Parse(e)
    }
}

// ---------------------------------------------------------------------------
// Export errors
// ---------------------------------------------------------------------------

/// Errors related to writing the timeline file.
#[derive(Debug)]
pub enum ExportError {
    /// The output directory does not exist.
    OutputDirNotFound { path: PathBuf },

    /// The output path exists but is not a directory.
    OutputNotADirectory { path: PathBuf },

    /// I/O error opening or writing the timeline file.
    Io { path: PathBuf, source: io::Error },

    /// CSV serialisation error.
    Csv { path: PathBuf, source: csv::Error },

    /// The timestamp format string is not a valid chrono format.
    TimestampFormat { format: String },
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutputDirNotFound { path } => {
                write!(f, "Output directory '{}' does not exist", path.display())
            }
            Self::OutputNotADirectory { path } => {
                write!(f, "Output path '{}' is not a directory", path.display())
            }
            Self::Io { path, source } => {
                write!(f, "Timeline I/O error '{}': {source}", path.display())
            }
            Self::Csv { path, source } => {
                write!(f, "Timeline CSV error '{}': {source}", path.display())
            }
            Self::TimestampFormat { format } => {
                write!(f, "Invalid timestamp format '{format}'")
            }
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Csv { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ExportError> for Csv2TimelineError {
    fn from(e: ExportError) -> Self {
        Self::Export(e)
    }
}

/// Convenience type alias for csv2timeline results.
pub type Result<T> = std::result::Result<T, Csv2TimelineError>;
