use rusqlite::params;

use super::SqliteCatalog;
use super::util::map_sql_error;
use crate::catalog::{CatalogError, CategoryId, ItemId, SubcategoryId};

impl SqliteCatalog {
    /// Insert or replace a category row.
    pub fn upsert_category(
        &self,
        category: CategoryId,
        subcategory: Option<SubcategoryId>,
        name: &str,
    ) -> Result<(), CatalogError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO categories (category_id, subcategory_id, name)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(category_id) DO UPDATE SET
                subcategory_id = excluded.subcategory_id,
                name = excluded.name",
            params![category.0, subcategory.map(|sub| sub.0), name],
        )
        .map_err(map_sql_error)?;
        Ok(())
    }

    /// Insert or replace an item, keeping its variants and images.
    pub fn upsert_item(
        &self,
        id: ItemId,
        name: &str,
        category: Option<CategoryId>,
    ) -> Result<(), CatalogError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO items (item_id, name, category_id)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(item_id) DO UPDATE SET
                name = excluded.name,
                category_id = excluded.category_id",
            params![id, name, category.map(|cat| cat.0)],
        )
        .map_err(map_sql_error)?;
        Ok(())
    }

    /// Add a priced variant to an item.
    pub fn add_variant(&self, id: ItemId, price: f64) -> Result<(), CatalogError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO item_variants (item_id, price) VALUES (?1, ?2)",
            params![id, price],
        )
        .map_err(map_sql_error)?;
        Ok(())
    }

    /// Attach an image URL to an item.
    pub fn add_image(&self, id: ItemId, url: &str, primary: bool) -> Result<(), CatalogError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO item_images (item_id, url, is_primary) VALUES (?1, ?2, ?3)",
            params![id, url, primary as i64],
        )
        .map_err(map_sql_error)?;
        Ok(())
    }

    /// Delete an item with its variants and images. Embeddings are left alone.
    pub fn remove_item(&self, id: ItemId) -> Result<bool, CatalogError> {
        let conn = self.lock()?;
        let removed = conn
            .execute("DELETE FROM items WHERE item_id = ?1", params![id])
            .map_err(map_sql_error)?;
        Ok(removed > 0)
    }
}
