//! TOML configuration for the search service and its tools.

use crate::app_dirs;

mod defaults;
mod errors;
mod load;
mod save;
mod types;

#[cfg(test)]
mod tests;

/// Default filename used to store the configuration.
pub const CONFIG_FILE_NAME: &str = "config.toml";
/// Default filename of the catalog database inside the app root.
pub const CATALOG_DB_FILE_NAME: &str = "catalog.db";
/// Default directory name for ANN index files, next to the catalog database.
pub const INDEX_DIR_NAME: &str = "ann";

pub use errors::ConfigError;
pub use load::{config_path, load_from_path, load_or_default};
pub use save::save_to_path;
pub use types::{
    CatalogSettings, EmbeddingSettings, IndexSettings, LookalikeConfig, RetrievalSettings,
};

fn map_app_dir_error(error: app_dirs::AppDirError) -> ConfigError {
    match error {
        app_dirs::AppDirError::NoBaseDir => ConfigError::NoConfigDir,
        app_dirs::AppDirError::CreateDir { path, source } => {
            ConfigError::CreateDir { path, source }
        }
    }
}
