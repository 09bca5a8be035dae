use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::defaults::*;
use super::{CATALOG_DB_FILE_NAME, ConfigError, INDEX_DIR_NAME, map_app_dir_error};
use crate::app_dirs;

/// Settings loaded from `config.toml`. Every section is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LookalikeConfig {
    #[serde(default)]
    pub catalog: CatalogSettings,
    #[serde(default)]
    pub index: IndexSettings,
    #[serde(default)]
    pub retrieval: RetrievalSettings,
    #[serde(default)]
    pub embedding: EmbeddingSettings,
}

/// Location of the catalog database.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogSettings {
    /// Path to the SQLite catalog; defaults to `catalog.db` in the app root.
    #[serde(default)]
    pub db_path: Option<PathBuf>,
}

/// HNSW construction and search parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSettings {
    /// Directory holding the index dump; defaults to `ann/` next to the catalog.
    #[serde(default)]
    pub dir: Option<PathBuf>,
    #[serde(default = "default_max_nb_connection")]
    pub max_nb_connection: usize,
    #[serde(default = "default_ef_construction")]
    pub ef_construction: usize,
    #[serde(default = "default_ef_search")]
    pub ef_search: usize,
    #[serde(default = "default_max_layer")]
    pub max_layer: usize,
}

/// Result sizing and candidate over-fetch policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalSettings {
    /// Result count used when a request does not carry one.
    #[serde(default = "default_k")]
    pub default_k: usize,
    /// Minimum number of raw candidates requested from the index.
    #[serde(default = "default_overfetch_floor")]
    pub overfetch_floor: usize,
    /// Candidates requested per result slot; `0` keeps the pool fixed at the floor.
    #[serde(default = "default_overfetch_multiplier")]
    pub overfetch_multiplier: usize,
}

/// Limits applied before an upload reaches the embedding provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddingSettings {
    #[serde(default = "default_max_image_bytes")]
    pub max_image_bytes: usize,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            dir: None,
            max_nb_connection: default_max_nb_connection(),
            ef_construction: default_ef_construction(),
            ef_search: default_ef_search(),
            max_layer: default_max_layer(),
        }
    }
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            default_k: default_k(),
            overfetch_floor: default_overfetch_floor(),
            overfetch_multiplier: default_overfetch_multiplier(),
        }
    }
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            max_image_bytes: default_max_image_bytes(),
        }
    }
}

impl RetrievalSettings {
    /// Number of raw candidates to request for a query asking for `k` results.
    pub fn pool_size(&self, k: usize) -> usize {
        self.overfetch_floor
            .max(k.saturating_mul(self.overfetch_multiplier))
            .max(k)
    }

    pub(super) fn normalized(mut self) -> Self {
        self.default_k = self.default_k.max(1);
        self.overfetch_floor = self.overfetch_floor.max(1);
        self.overfetch_multiplier = self.overfetch_multiplier.min(MAX_OVERFETCH_MULTIPLIER);
        self
    }
}

impl IndexSettings {
    pub(super) fn normalized(mut self) -> Self {
        self.max_nb_connection = self.max_nb_connection.clamp(2, 256);
        self.max_layer = self.max_layer.clamp(1, 16);
        self.ef_construction = self.ef_construction.max(self.max_nb_connection);
        self.ef_search = self.ef_search.max(1);
        self
    }
}

impl LookalikeConfig {
    /// Clamp out-of-range values to usable ones.
    pub fn normalized(mut self) -> Self {
        self.retrieval = self.retrieval.normalized();
        self.index = self.index.normalized();
        self.embedding.max_image_bytes = self.embedding.max_image_bytes.max(1);
        self
    }

    /// Resolve the catalog database path, falling back to the app root.
    pub fn catalog_db_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(path) = &self.catalog.db_path {
            return Ok(path.clone());
        }
        let root = app_dirs::app_root_dir().map_err(map_app_dir_error)?;
        Ok(root.join(CATALOG_DB_FILE_NAME))
    }

    /// Resolve the ANN index directory for a given catalog database path.
    pub fn index_dir(&self, catalog_db_path: &Path) -> PathBuf {
        if let Some(dir) = &self.index.dir {
            return dir.clone();
        }
        catalog_db_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(INDEX_DIR_NAME)
    }
}
