use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use super::ConfigError;
use super::types::LookalikeConfig;

/// Write the TOML config atomically, creating parent directories as needed.
pub fn save_to_path(config: &LookalikeConfig, path: &Path) -> Result<(), ConfigError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(|source| ConfigError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })?;
    let data = toml::to_string_pretty(config).map_err(|source| ConfigError::SerializeToml {
        path: path.to_path_buf(),
        source,
    })?;
    let write_err = |source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    };
    let mut file = NamedTempFile::new_in(dir).map_err(write_err)?;
    file.write_all(data.as_bytes()).map_err(write_err)?;
    file.as_file().sync_all().map_err(write_err)?;
    file.persist(path).map_err(|err| write_err(err.error))?;
    Ok(())
}
