use rusqlite::Connection;

use super::util::map_sql_error;
use crate::catalog::CatalogError;

/// Create catalog, embedding and ANN metadata tables when missing.
///
/// `item_embeddings` has no foreign key to `items`: the index may
/// still reference items that were removed from the catalog.
pub fn apply_schema(connection: &Connection) -> Result<(), CatalogError> {
    connection
        .execute_batch(
            "CREATE TABLE IF NOT EXISTS categories (
                category_id INTEGER PRIMARY KEY,
                subcategory_id INTEGER,
                name TEXT NOT NULL DEFAULT ''
             );
             CREATE TABLE IF NOT EXISTS items (
                item_id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                category_id INTEGER REFERENCES categories(category_id) ON DELETE SET NULL
             );
             CREATE INDEX IF NOT EXISTS idx_items_category
                ON items (category_id);
             CREATE TABLE IF NOT EXISTS item_variants (
                variant_id INTEGER PRIMARY KEY AUTOINCREMENT,
                item_id INTEGER NOT NULL REFERENCES items(item_id) ON DELETE CASCADE,
                price REAL NOT NULL
             );
             CREATE INDEX IF NOT EXISTS idx_item_variants_item
                ON item_variants (item_id);
             CREATE TABLE IF NOT EXISTS item_images (
                image_id INTEGER PRIMARY KEY AUTOINCREMENT,
                item_id INTEGER NOT NULL REFERENCES items(item_id) ON DELETE CASCADE,
                url TEXT NOT NULL,
                is_primary INTEGER NOT NULL DEFAULT 0
             );
             CREATE INDEX IF NOT EXISTS idx_item_images_item_primary
                ON item_images (item_id, is_primary);
             CREATE TABLE IF NOT EXISTS item_embeddings (
                item_id INTEGER PRIMARY KEY,
                model_id TEXT NOT NULL,
                dim INTEGER NOT NULL,
                vec BLOB NOT NULL,
                created_at INTEGER NOT NULL
             ) WITHOUT ROWID;
             CREATE INDEX IF NOT EXISTS idx_item_embeddings_model
                ON item_embeddings (model_id);
             CREATE TABLE IF NOT EXISTS ann_index_meta (
                model_id TEXT PRIMARY KEY,
                index_path TEXT NOT NULL,
                count INTEGER NOT NULL,
                params_json TEXT NOT NULL,
                updated_at INTEGER NOT NULL
             ) WITHOUT ROWID;",
        )
        .map_err(map_sql_error)
}
