// csv2timeline - core/config.rs
//
// Configuration source parsing and validation.
// Core layer: accepts TOML strings, never touches the filesystem.
// I/O is handled by app::config_loader which feeds content here.
//
// Source format: one top-level table per configuration, in file order.
//
//   [web]
//   datetime       = "time"
//   headers        = "time,url,ip,status"
//   timestamp_desc = "Page Visit"
//   message        = "{ip} visited {url}"
//   source         = "weblog"
//   filter         = "(status=200; url~/admin)"

use crate::core::filter::FilterExpression;
use crate::core::model::TimelineConfig;
use crate::util::constants;
use crate::util::error::ConfigError;
use serde::Deserialize;
use std::path::Path;

// =============================================================================
// TOML deserialization structures (raw input)
// =============================================================================

/// Raw section as deserialized from the source. Every key is optional here
/// so that a missing key can be reported by name during validation.
#[derive(Debug, Deserialize)]
pub struct SectionDefinition {
    pub datetime: Option<String>,
    pub headers: Option<StringList>,
    pub timestamp_desc: Option<String>,
    pub message: Option<String>,
    pub source: Option<String>,
    pub filter: Option<StringList>,
}

/// A value given either as one string or as an array of strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum StringList {
    One(String),
    Many(Vec<String>),
}

// =============================================================================
// Parsing and validation
// =============================================================================

/// Parse a TOML document into its named sections, preserving file order.
///
/// `source_path` is used for error messages only (not for I/O).
pub fn parse_config_toml(
    toml_content: &str,
    source_path: &Path,
) -> Result<Vec<(String, SectionDefinition)>, ConfigError> {
    let table: toml::Table = toml::from_str(toml_content).map_err(|e| ConfigError::TomlParse {
        path: source_path.to_path_buf(),
        source: e,
    })?;

    if table.len() > constants::MAX_CONFIGURATIONS {
        return Err(ConfigError::TooManyConfigurations {
            count: table.len(),
            max: constants::MAX_CONFIGURATIONS,
        });
    }

    let mut sections = Vec::with_capacity(table.len());
    for (name, value) in table {
        if !value.is_table() {
            return Err(ConfigError::NotASection {
                path: source_path.to_path_buf(),
                name,
            });
        }
        let def: SectionDefinition =
            value.try_into().map_err(|e| ConfigError::InvalidSection {
                section: name.clone(),
                source: e,
            })?;
        sections.push((name, def));
    }

    Ok(sections)
}

/// Validate a section and build the runtime `TimelineConfig`.
///
/// Validates:
/// - Required keys are present and not blank
/// - `headers` yields at least one column name
///
/// A filter that does not compile is accepted with a warning: filter errors
/// are reported per row while the file is processed.
pub fn validate_section(
    name: &str,
    def: SectionDefinition,
) -> Result<TimelineConfig, ConfigError> {
    let datetime_field = required(name, "datetime", def.datetime)?.trim().to_string();
    let timestamp_description = required(name, "timestamp_desc", def.timestamp_desc)?
        .trim()
        .to_string();
    let message_format = required(name, "message", def.message)?;
    let source = required(name, "source", def.source)?.trim().to_string();

    let headers = match def.headers {
        Some(StringList::One(list)) => split_headers(&list),
        Some(StringList::Many(items)) => items
            .iter()
            .map(|h| h.trim())
            .filter(|h| !h.is_empty())
            .map(str::to_string)
            .collect(),
        None => Vec::new(),
    };
    if headers.is_empty() {
        return Err(ConfigError::MissingKey {
            section: name.to_string(),
            key: "headers",
        });
    }

    if !headers.iter().any(|h| *h == datetime_field) {
        tracing::debug!(
            config = name,
            datetime = %datetime_field,
            "Timestamp column is not among the declared headers"
        );
    }

    let filters = match def.filter {
        Some(StringList::One(text)) => vec![text],
        Some(StringList::Many(items)) => items,
        None => Vec::new(),
    };

    if let Err(e) = FilterExpression::parse(&filters) {
        tracing::warn!(
            config = name,
            error = %e,
            "Filter does not compile; rows of matching files will be skipped"
        );
    }

    Ok(TimelineConfig {
        name: name.to_string(),
        datetime_field,
        headers,
        timestamp_description,
        message_format,
        source,
        filters,
    })
}

/// Parse and validate a whole configuration source.
///
/// Fails on the first malformed section; a run cannot start with a partial
/// rule set.
pub fn load_configurations(
    toml_content: &str,
    source_path: &Path,
) -> Result<Vec<TimelineConfig>, ConfigError> {
    let sections = parse_config_toml(toml_content, source_path)?;

    let configs = sections
        .into_iter()
        .map(|(name, def)| validate_section(&name, def))
        .collect::<Result<Vec<_>, _>>()?;

    for config in &configs {
        tracing::debug!(
            config = %config.name,
            headers = config.headers.len(),
            filters = config.filters.len(),
            "Loaded configuration"
        );
    }

    Ok(configs)
}

/// Split a comma-separated header list, trimming names and dropping blanks.
fn split_headers(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .map(str::to_string)
        .collect()
}

fn required(
    section: &str,
    key: &'static str,
    value: Option<String>,
) -> Result<String, ConfigError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::MissingKey {
            section: section.to_string(),
            key,
        }),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const VALID_CONFIG_TOML: &str = r#"
[web]
datetime = "time"
headers = "time,url,ip"
timestamp_desc = "Page Visit"
message = "{ip} visited {url}"
source = "weblog"

[auth]
datetime = "When"
headers = "When, User, Result"
timestamp_desc = "Logon"
message = "{User}: {Result}"
source = "auth"
filter = "(Result=failure; User~admin); Result=locked"
"#;

    fn path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    #[test]
    fn test_load_valid_configurations() {
        let configs = load_configurations(VALID_CONFIG_TOML, &path()).unwrap();
        assert_eq!(configs.len(), 2);

        let web = &configs[0];
        assert_eq!(web.name, "web");
        assert_eq!(web.datetime_field, "time");
        assert_eq!(web.headers, vec!["time", "url", "ip"]);
        assert_eq!(web.timestamp_description, "Page Visit");
        assert_eq!(web.message_format, "{ip} visited {url}");
        assert_eq!(web.source, "weblog");
        assert!(web.filters.is_empty(), "absent filter means no filter");
    }

    #[test]
    fn test_headers_are_trimmed() {
        let configs = load_configurations(VALID_CONFIG_TOML, &path()).unwrap();
        assert_eq!(configs[1].headers, vec!["When", "User", "Result"]);
        assert_eq!(
            configs[1].filters,
            vec!["(Result=failure; User~admin); Result=locked"]
        );
    }

    #[test]
    fn test_section_order_is_preserved() {
        let toml = r#"
[zulu]
datetime = "t"
headers = "t"
timestamp_desc = "d"
message = "m"
source = "s"

[alpha]
datetime = "t"
headers = "t"
timestamp_desc = "d"
message = "m"
source = "s"
"#;
        let configs = load_configurations(toml, &path()).unwrap();
        let names: Vec<_> = configs.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["zulu", "alpha"]);
    }

    #[test]
    fn test_array_forms_accepted() {
        let toml = r#"
[fw]
datetime = "ts"
headers = ["ts", " action ", "dst"]
timestamp_desc = "Connection"
message = "{action} {dst}"
source = "firewall"
filter = ["action=deny", "(action=allow; dst~10.)"]
"#;
        let configs = load_configurations(toml, &path()).unwrap();
        assert_eq!(configs[0].headers, vec!["ts", "action", "dst"]);
        assert_eq!(configs[0].filters.len(), 2);
    }

    #[test]
    fn test_missing_required_key() {
        let toml = r#"
[web]
headers = "time,url"
timestamp_desc = "Page Visit"
message = "{url}"
source = "weblog"
"#;
        match load_configurations(toml, &path()).unwrap_err() {
            ConfigError::MissingKey { section, key } => {
                assert_eq!(section, "web");
                assert_eq!(key, "datetime");
            }
            other => panic!("Expected MissingKey, got: {other:?}"),
        }
    }

    #[test]
    fn test_blank_required_key_is_missing() {
        let toml = r#"
[web]
datetime = "time"
headers = " , "
timestamp_desc = "Page Visit"
message = "{url}"
source = "weblog"
"#;
        assert!(matches!(
            load_configurations(toml, &path()).unwrap_err(),
            ConfigError::MissingKey { key: "headers", .. }
        ));
    }

    #[test]
    fn test_every_required_key_is_checked() {
        for key in constants::REQUIRED_CONFIG_KEYS {
            let body: String = constants::REQUIRED_CONFIG_KEYS
                .iter()
                .filter(|k| *k != key)
                .map(|k| format!("{k} = \"x\"\n"))
                .collect();
            let toml = format!("[s]\n{body}");
            match load_configurations(&toml, &path()) {
                Err(ConfigError::MissingKey { key: missing, .. }) => assert_eq!(missing, *key),
                other => panic!("Expected MissingKey for {key}, got: {other:?}"),
            }
        }
    }

    #[test]
    fn test_top_level_value_is_not_a_section() {
        let toml = "stray = \"value\"\n";
        assert!(matches!(
            load_configurations(toml, &path()).unwrap_err(),
            ConfigError::NotASection { .. }
        ));
    }

    #[test]
    fn test_wrong_value_type() {
        let toml = r#"
[web]
datetime = 42
headers = "time"
timestamp_desc = "d"
message = "m"
source = "s"
"#;
        match load_configurations(toml, &path()).unwrap_err() {
            ConfigError::InvalidSection { section, .. } => assert_eq!(section, "web"),
            other => panic!("Expected InvalidSection, got: {other:?}"),
        }
    }

    #[test]
    fn test_malformed_toml() {
        assert!(matches!(
            load_configurations("[web\ndatetime = ", &path()).unwrap_err(),
            ConfigError::TomlParse { .. }
        ));
    }

    #[test]
    fn test_unquoted_ini_values_hint_at_quoting() {
        let ini = "[web]\ndatetime = time\nheaders = time,url,ip\n";
        let err = load_configurations(ini, &path()).unwrap_err();
        assert!(matches!(err, ConfigError::TomlParse { .. }));
        let text = err.to_string();
        assert!(text.contains("config.toml"), "{text}");
        assert!(text.contains("quoted TOML strings"), "{text}");
    }

    #[test]
    fn test_malformed_filter_still_loads() {
        let toml = r#"
[web]
datetime = "time"
headers = "time,status"
timestamp_desc = "d"
message = "m"
source = "s"
filter = "status"
"#;
        let configs = load_configurations(toml, &path()).unwrap();
        assert_eq!(configs[0].filters, vec!["status"]);
    }

    #[test]
    fn test_empty_source_has_no_configurations() {
        let configs = load_configurations("", &path()).unwrap();
        assert!(configs.is_empty());
    }
}
