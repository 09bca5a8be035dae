//! Catalog metadata: item validity, categories, display records and fallback sampling.

use std::collections::HashSet;
use std::path::PathBuf;

use thiserror::Error;

/// SQLite-backed catalog store.
pub mod db;
mod types;

pub use db::SqliteCatalog;
pub use types::{CategoryId, CategoryKey, ItemId, ResultItem, SubcategoryId};

/// Errors returned by catalog stores.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The database file does not exist.
    #[error("Catalog database not found: {0}")]
    MissingDatabase(PathBuf),
    /// SQLite query failed.
    #[error("Catalog query failed: {0}")]
    Sql(#[from] rusqlite::Error),
    /// Failed to create a parent directory.
    #[error("Could not write to {path}: {source}")]
    CreateDir {
        /// Path that could not be created.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
    /// Database is locked or busy.
    #[error("Catalog database is busy, please retry")]
    Busy,
    /// A previous panic left the connection lock poisoned.
    #[error("Catalog connection lock poisoned")]
    LockPoisoned,
    /// SQLite returned an unexpected result.
    #[error("SQLite returned an unexpected result")]
    Unexpected,
}

/// Read-only view of the catalog used by the retrieval pipeline.
///
/// Implementations must be safe to share across request threads; every call
/// reflects the store at the time of the call.
pub trait CatalogStore: Send + Sync {
    /// Snapshot of every item id currently present in the catalog.
    fn all_valid_ids(&self) -> Result<HashSet<ItemId>, CatalogError>;

    /// Category of an item, or `None` when the item has no resolvable subcategory.
    fn category_of(&self, id: ItemId) -> Result<Option<CategoryKey>, CatalogError>;

    /// Display records for `ids`, one per id, in input order.
    ///
    /// Ids without a priced variant are omitted. Empty input returns an empty
    /// list without touching the store.
    fn hydrate(&self, ids: &[ItemId]) -> Result<Vec<ResultItem>, CatalogError>;

    /// Up to `limit` random display records from `subcategory` (or the whole
    /// catalog when `None`), skipping every id in `exclude`.
    fn sample_fallback(
        &self,
        subcategory: Option<SubcategoryId>,
        exclude: &HashSet<ItemId>,
        limit: usize,
    ) -> Result<Vec<ResultItem>, CatalogError>;
}
