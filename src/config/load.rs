use std::path::{Path, PathBuf};

use crate::app_dirs;

use super::types::LookalikeConfig;
use super::{CONFIG_FILE_NAME, ConfigError, map_app_dir_error};

/// Resolve the configuration file path inside the app root.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    let dir = app_dirs::app_root_dir().map_err(map_app_dir_error)?;
    Ok(dir.join(CONFIG_FILE_NAME))
}

/// Load configuration from the app root, returning defaults if the file is missing.
pub fn load_or_default() -> Result<LookalikeConfig, ConfigError> {
    let path = config_path()?;
    load_from_path(&path)
}

/// Load configuration from an explicit path; a missing file yields defaults.
pub fn load_from_path(path: &Path) -> Result<LookalikeConfig, ConfigError> {
    if !path.exists() {
        tracing::debug!("No config at {}, using defaults", path.display());
        return Ok(LookalikeConfig::default());
    }
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config: LookalikeConfig =
        toml::from_str(&text).map_err(|source| ConfigError::ParseToml {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(config.normalized())
}
