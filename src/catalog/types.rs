use std::fmt;

use rusqlite::ToSql;
use rusqlite::types::ToSqlOutput;
use serde::{Deserialize, Serialize};

/// Positive catalog item identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(i64);

impl ItemId {
    /// Wrap a raw id; zero and negative values are not item ids.
    pub fn new(raw: i64) -> Option<Self> {
        (raw > 0).then_some(Self(raw))
    }

    /// Return the raw integer id.
    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl ToSql for ItemId {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0))
    }
}

/// Major category identifier (informational only).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(pub i64);

/// Fine-grained category identifier; the authoritative filter key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubcategoryId(pub i64);

impl ToSql for SubcategoryId {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0))
    }
}

/// Category placement of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CategoryKey {
    pub category: CategoryId,
    pub subcategory: SubcategoryId,
}

/// Display record returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultItem {
    pub id: ItemId,
    pub name: String,
    /// Lowest price across the item's variants.
    pub price: f64,
    /// URL of the primary image, or an empty string.
    pub image_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_id_rejects_non_positive() {
        assert!(ItemId::new(0).is_none());
        assert!(ItemId::new(-4).is_none());
        assert_eq!(ItemId::new(7).map(ItemId::get), Some(7));
    }

    #[test]
    fn result_item_serializes_flat_id() {
        let item = ResultItem {
            id: ItemId::new(12).unwrap(),
            name: "Linen shirt".to_string(),
            price: 19.5,
            image_url: String::new(),
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["id"], 12);
        assert_eq!(json["image_url"], "");
    }
}
