// csv2timeline - platform/config.rs
//
// Platform directory resolution and settings.toml loading with startup
// validation.
//
// Uses the `directories` crate for XDG (Linux), AppData (Windows),
// Library (macOS) compliance.

use crate::util::constants;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Resolved platform paths for csv2timeline configuration.
#[derive(Debug, Clone)]
pub struct PlatformPaths {
    /// Configuration directory (e.g. ~/.config/csv2timeline/ or
    /// %APPDATA%\csv2timeline\config\). Holds config.toml and settings.toml.
    pub config_dir: PathBuf,
}

impl PlatformPaths {
    /// Resolve platform-appropriate paths.
    ///
    /// Falls back to the current directory if platform dirs cannot be
    /// determined. Runs before logging is initialised, so the fallback is
    /// reported in the returned warnings.
    pub fn resolve() -> (Self, Vec<String>) {
        Self::from_project_dirs(ProjectDirs::from("", "", constants::APP_ID))
    }

    fn from_project_dirs(proj_dirs: Option<ProjectDirs>) -> (Self, Vec<String>) {
        match proj_dirs {
            Some(proj_dirs) => (
                Self {
                    config_dir: proj_dirs.config_dir().to_path_buf(),
                },
                Vec::new(),
            ),
            None => (
                Self {
                    config_dir: PathBuf::from("."),
                },
                vec![
                    "Could not determine platform directories, using current directory"
                        .to_string(),
                ],
            ),
        }
    }

    /// Default location of settings.toml.
    pub fn settings_file(&self) -> PathBuf {
        self.config_dir.join(constants::SETTINGS_FILE_NAME)
    }
}

// =============================================================================
// settings.toml loading and validation
// =============================================================================

/// Raw deserialisable shape of settings.toml.
///
/// Unknown keys are silently ignored.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct RawSettings {
    pub logging: LoggingSection,
    pub input: InputSection,
    pub output: OutputSection,
}

/// `[logging]` section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub level: Option<String>,
    /// Write a run log file into the output directory.
    pub run_log: Option<bool>,
}

/// `[input]` section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct InputSection {
    /// Include glob patterns, matched against file names.
    pub include_patterns: Option<Vec<String>>,
    /// Directory depth searched for input files.
    pub max_depth: Option<usize>,
}

/// `[output]` section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct OutputSection {
    /// chrono format of the Timestamp column.
    pub timestamp_format: Option<String>,
}

/// Validated tool settings.
///
/// Invalid values produce actionable warnings and fall back to defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Logging level string (for init before tracing is available).
    pub log_level: Option<String>,
    pub run_log: bool,
    pub include_patterns: Vec<String>,
    pub max_depth: usize,
    pub timestamp_format: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: None,
            run_log: true,
            include_patterns: constants::DEFAULT_INCLUDE_PATTERNS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            max_depth: constants::DEFAULT_MAX_DEPTH,
            timestamp_format: constants::DEFAULT_TIMESTAMP_FORMAT.to_string(),
        }
    }
}

/// Load and validate settings from `path`.
///
/// Returns the settings and a list of non-fatal warnings. A missing file
/// yields defaults, with a warning only when the path was given explicitly;
/// an unreadable or unparseable file yields defaults with a warning.
///
/// Called before logging is initialised, so problems are returned rather
/// than logged; the caller emits them once tracing is up.
pub fn load_settings(path: &Path, explicit: bool) -> (Settings, Vec<String>) {
    if !path.exists() {
        let warnings = if explicit {
            vec![format!(
                "Settings file '{}' does not exist. Using defaults.",
                path.display()
            )]
        } else {
            Vec::new()
        };
        return (Settings::default(), warnings);
    }

    match std::fs::read_to_string(path) {
        Ok(content) => parse_settings(&content, path),
        Err(e) => (
            Settings::default(),
            vec![format!(
                "Could not read settings file '{}': {e}. Using defaults.",
                path.display()
            )],
        ),
    }
}

/// Parse and validate settings.toml content. `path` is for messages only.
pub fn parse_settings(content: &str, path: &Path) -> (Settings, Vec<String>) {
    let mut warnings: Vec<String> = Vec::new();

    let raw: RawSettings = match toml::from_str(content) {
        Ok(r) => r,
        Err(e) => {
            warnings.push(format!(
                "Failed to parse settings file '{}': {e}. Using defaults.",
                path.display()
            ));
            return (Settings::default(), warnings);
        }
    };

    let mut settings = Settings::default();

    // -- Logging: level --
    if let Some(ref level) = raw.logging.level {
        let valid = ["error", "warn", "info", "debug", "trace"];
        if valid.contains(&level.to_lowercase().as_str()) {
            settings.log_level = Some(level.to_lowercase());
        } else {
            warnings.push(format!(
                "[logging] level = \"{level}\" is not recognised. \
                 Valid values: error, warn, info, debug, trace. Using default (info).",
            ));
        }
    }

    // -- Logging: run_log --
    if let Some(run_log) = raw.logging.run_log {
        settings.run_log = run_log;
    }

    // -- Input: max_depth --
    if let Some(depth) = raw.input.max_depth {
        if (1..=constants::ABSOLUTE_MAX_DEPTH).contains(&depth) {
            settings.max_depth = depth;
        } else {
            warnings.push(format!(
                "[input] max_depth = {depth} is out of range (1-{}). Using default ({}).",
                constants::ABSOLUTE_MAX_DEPTH,
                constants::DEFAULT_MAX_DEPTH,
            ));
        }
    }

    // -- Input: include_patterns --
    if let Some(patterns) = raw.input.include_patterns {
        let mut valid = Vec::new();
        for pattern in patterns {
            match glob::Pattern::new(&pattern) {
                Ok(_) => valid.push(pattern),
                Err(e) => warnings.push(format!(
                    "[input] include_patterns entry \"{pattern}\" is not a valid glob ({e}); ignored."
                )),
            }
        }
        if valid.is_empty() {
            warnings.push(format!(
                "[input] include_patterns has no usable pattern. Using default ({}).",
                constants::DEFAULT_INCLUDE_PATTERNS.join(", ")
            ));
        } else {
            settings.include_patterns = valid;
        }
    }

    // -- Output: timestamp_format --
    if let Some(format) = raw.output.timestamp_format {
        if is_valid_format(&format) {
            settings.timestamp_format = format;
        } else {
            warnings.push(format!(
                "[output] timestamp_format = \"{format}\" is not a valid chrono format. \
                 Using default ({}).",
                constants::DEFAULT_TIMESTAMP_FORMAT,
            ));
        }
    }

    (settings, warnings)
}

fn is_valid_format(format: &str) -> bool {
    use chrono::format::{Item, StrftimeItems};
    !format.is_empty() && StrftimeItems::new(format).all(|item| !matches!(item, Item::Error))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> (Settings, Vec<String>) {
        parse_settings(content, Path::new("settings.toml"))
    }

    #[test]
    fn test_empty_settings_are_defaults() {
        let (settings, warnings) = parse("");
        assert_eq!(settings, Settings::default());
        assert!(warnings.is_empty());
        assert!(settings.run_log);
        assert_eq!(settings.include_patterns, vec!["*.csv"]);
    }

    #[test]
    fn test_valid_settings() {
        let (settings, warnings) = parse(
            r#"
[logging]
level = "DEBUG"
run_log = false

[input]
include_patterns = ["*.csv", "*.tsv"]
max_depth = 3

[output]
timestamp_format = "%Y-%m-%d %H:%M:%S"
"#,
        );
        assert!(warnings.is_empty(), "{warnings:?}");
        assert_eq!(settings.log_level.as_deref(), Some("debug"));
        assert!(!settings.run_log);
        assert_eq!(settings.include_patterns, vec!["*.csv", "*.tsv"]);
        assert_eq!(settings.max_depth, 3);
        assert_eq!(settings.timestamp_format, "%Y-%m-%d %H:%M:%S");
    }

    #[test]
    fn test_invalid_values_fall_back_with_warnings() {
        let (settings, warnings) = parse(
            r#"
[logging]
level = "loud"

[input]
include_patterns = ["["]
max_depth = 0

[output]
timestamp_format = "%Q"
"#,
        );
        assert_eq!(settings, Settings::default());
        // level, bad glob, no usable pattern, depth, format
        assert_eq!(warnings.len(), 5, "{warnings:?}");
        assert!(warnings.iter().any(|w| w.contains("max_depth = 0")));
        assert!(warnings.iter().any(|w| w.contains("timestamp_format")));
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let (settings, warnings) = parse("[ui]\ntheme = \"dark\"\n[input]\nextra = 1\n");
        assert_eq!(settings, Settings::default());
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_unparseable_file_warns() {
        let (settings, warnings) = parse("[logging\nlevel = ");
        assert_eq!(settings, Settings::default());
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("Failed to parse"));
    }

    #[test]
    fn test_format_validation() {
        assert!(is_valid_format(constants::DEFAULT_TIMESTAMP_FORMAT));
        assert!(is_valid_format("%d/%m/%Y %H:%M"));
        assert!(!is_valid_format("%Q"));
        assert!(!is_valid_format(""));
    }

    #[test]
    fn test_missing_file_is_silent() {
        let dir = tempfile::tempdir().unwrap();
        let (settings, warnings) = load_settings(&dir.path().join("settings.toml"), false);
        assert_eq!(settings, Settings::default());
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_missing_explicit_file_warns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("typo.toml");
        let (settings, warnings) = load_settings(&path, true);
        assert_eq!(settings, Settings::default());
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("typo.toml"), "{warnings:?}");
        assert!(warnings[0].contains("does not exist"));
    }

    #[test]
    fn test_platform_dir_fallback_is_reported() {
        let (paths, warnings) = PlatformPaths::from_project_dirs(None);
        assert_eq!(paths.config_dir, PathBuf::from("."));
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("current directory"));

        let resolved = ProjectDirs::from("", "", constants::APP_ID);
        let found = resolved.is_some();
        let (_, warnings) = PlatformPaths::from_project_dirs(resolved);
        assert_eq!(warnings.is_empty(), found);
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "[input]\nmax_depth = 2\n").unwrap();
        let (settings, warnings) = load_settings(&path, false);
        assert_eq!(settings.max_depth, 2);
        assert!(warnings.is_empty());
    }
}
