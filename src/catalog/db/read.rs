use std::collections::{HashMap, HashSet};

use rand::seq::SliceRandom;
use rusqlite::{Connection, OptionalExtension, params, params_from_iter};

use super::util::{map_sql_error, placeholders};
use super::{ID_CHUNK, SqliteCatalog};
use crate::catalog::{
    CatalogError, CatalogStore, CategoryId, CategoryKey, ItemId, ResultItem, SubcategoryId,
};

impl CatalogStore for SqliteCatalog {
    fn all_valid_ids(&self) -> Result<HashSet<ItemId>, CatalogError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare_cached("SELECT item_id FROM items")
            .map_err(map_sql_error)?;
        let rows = stmt
            .query_map([], |row| row.get::<_, i64>(0))
            .map_err(map_sql_error)?;
        let mut ids = HashSet::new();
        for raw in rows {
            if let Some(id) = ItemId::new(raw.map_err(map_sql_error)?) {
                ids.insert(id);
            }
        }
        Ok(ids)
    }

    fn category_of(&self, id: ItemId) -> Result<Option<CategoryKey>, CatalogError> {
        let conn = self.lock()?;
        let row = conn
            .prepare_cached(
                "SELECT c.category_id, c.subcategory_id
                 FROM items i
                 JOIN categories c ON c.category_id = i.category_id
                 WHERE i.item_id = ?1",
            )
            .map_err(map_sql_error)?
            .query_row(params![id], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, Option<i64>>(1)?))
            })
            .optional()
            .map_err(map_sql_error)?;
        Ok(match row {
            Some((category, Some(subcategory))) => Some(CategoryKey {
                category: CategoryId(category),
                subcategory: SubcategoryId(subcategory),
            }),
            _ => None,
        })
    }

    fn hydrate(&self, ids: &[ItemId]) -> Result<Vec<ResultItem>, CatalogError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.lock()?;
        hydrate_with(&conn, ids)
    }

    fn sample_fallback(
        &self,
        subcategory: Option<SubcategoryId>,
        exclude: &HashSet<ItemId>,
        limit: usize,
    ) -> Result<Vec<ResultItem>, CatalogError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let conn = self.lock()?;
        let pool = fallback_pool(&conn, subcategory)?;
        let mut picked: Vec<ItemId> = pool
            .into_iter()
            .filter(|id| !exclude.contains(id))
            .collect();
        // Sized by the pool, never by the caller's limit.
        picked.shuffle(&mut rand::rng());
        picked.truncate(limit);
        hydrate_with(&conn, &picked)
    }
}

fn hydrate_with(conn: &Connection, ids: &[ItemId]) -> Result<Vec<ResultItem>, CatalogError> {
    let mut seen = HashSet::with_capacity(ids.len());
    let unique: Vec<ItemId> = ids.iter().copied().filter(|id| seen.insert(*id)).collect();
    let mut by_id: HashMap<ItemId, ResultItem> = HashMap::with_capacity(unique.len());
    for chunk in unique.chunks(ID_CHUNK) {
        let sql = format!(
            "SELECT i.item_id, i.name, MIN(v.price),
                    COALESCE((SELECT img.url FROM item_images img
                              WHERE img.item_id = i.item_id AND img.is_primary != 0
                              ORDER BY img.image_id ASC
                              LIMIT 1), '')
             FROM items i
             JOIN item_variants v ON v.item_id = i.item_id
             WHERE i.item_id IN ({})
             GROUP BY i.item_id, i.name",
            placeholders(chunk.len())
        );
        let mut stmt = conn.prepare(&sql).map_err(map_sql_error)?;
        let rows = stmt
            .query_map(params_from_iter(chunk.iter()), |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, f64>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })
            .map_err(map_sql_error)?;
        for row in rows {
            let (raw_id, name, price, image_url) = row.map_err(map_sql_error)?;
            let Some(id) = ItemId::new(raw_id) else {
                continue;
            };
            by_id.insert(
                id,
                ResultItem {
                    id,
                    name,
                    price,
                    image_url,
                },
            );
        }
    }
    Ok(unique.iter().filter_map(|id| by_id.remove(id)).collect())
}

/// Ids eligible for backfill: priced items, optionally within one subcategory.
fn fallback_pool(
    conn: &Connection,
    subcategory: Option<SubcategoryId>,
) -> Result<Vec<ItemId>, CatalogError> {
    let raw: Vec<i64> = match subcategory {
        Some(subcategory) => {
            let mut stmt = conn
                .prepare_cached(
                    "SELECT i.item_id
                     FROM items i
                     JOIN categories c ON c.category_id = i.category_id
                     WHERE c.subcategory_id = ?1
                       AND EXISTS (SELECT 1 FROM item_variants v WHERE v.item_id = i.item_id)",
                )
                .map_err(map_sql_error)?;
            let ids = stmt
                .query_map(params![subcategory], |row| row.get(0))
                .map_err(map_sql_error)?
                .collect::<Result<_, _>>()
                .map_err(map_sql_error)?;
            ids
        }
        None => {
            let mut stmt = conn
                .prepare_cached(
                    "SELECT i.item_id
                     FROM items i
                     WHERE EXISTS (SELECT 1 FROM item_variants v WHERE v.item_id = i.item_id)",
                )
                .map_err(map_sql_error)?;
            let ids = stmt
                .query_map([], |row| row.get(0))
                .map_err(map_sql_error)?
                .collect::<Result<_, _>>()
                .map_err(map_sql_error)?;
            ids
        }
    };
    Ok(raw.into_iter().filter_map(ItemId::new).collect())
}
