// csv2timeline - app/config_loader.rs
//
// Locates and reads the configuration file, then hands its content to
// core::config for parsing and validation.

use crate::core::config;
use crate::core::model::TimelineConfig;
use crate::util::constants;
use crate::util::error::ConfigError;
use std::path::{Path, PathBuf};

/// Pick the configuration file to load.
///
/// An explicit path is used as given. Otherwise `config.toml` in the working
/// directory is preferred over the one in `platform_config_dir`.
pub fn resolve_config_path(
    explicit: Option<&Path>,
    platform_config_dir: Option<&Path>,
) -> Result<PathBuf, ConfigError> {
    let candidates: Vec<PathBuf> = match explicit {
        Some(path) => vec![path.to_path_buf()],
        None => std::iter::once(PathBuf::from(constants::CONFIG_FILE_NAME))
            .chain(platform_config_dir.map(|dir| dir.join(constants::CONFIG_FILE_NAME)))
            .collect(),
    };

    match candidates.iter().find(|p| p.is_file()) {
        Some(found) => Ok(found.clone()),
        None => Err(ConfigError::NotFound {
            searched: candidates,
        }),
    }
}

/// Read and validate the configuration file at `path`.
///
/// A file without sections is accepted with a warning: every input will be
/// unmatched.
pub fn load_config_file(path: &Path) -> Result<Vec<TimelineConfig>, ConfigError> {
    let metadata = std::fs::metadata(path).map_err(|e| ConfigError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    if metadata.len() > constants::MAX_CONFIG_FILE_SIZE {
        return Err(ConfigError::FileTooLarge {
            path: path.to_path_buf(),
            size: metadata.len(),
            max_size: constants::MAX_CONFIG_FILE_SIZE,
        });
    }

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    let configs = config::load_configurations(&content, path)?;

    if configs.is_empty() {
        tracing::warn!(
            path = %path.display(),
            "Configuration file defines no sections; no input file will match"
        );
    } else {
        tracing::info!(
            path = %path.display(),
            count = configs.len(),
            "Configurations loaded"
        );
    }

    Ok(configs)
}

/// Resolve and load in one step. Returns the path that was loaded.
pub fn load(
    explicit: Option<&Path>,
    platform_config_dir: Option<&Path>,
) -> Result<(PathBuf, Vec<TimelineConfig>), ConfigError> {
    let path = resolve_config_path(explicit, platform_config_dir)?;
    let configs = load_config_file(&path)?;
    Ok((path, configs))
}
