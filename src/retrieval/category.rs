use std::collections::HashSet;

use tracing::debug;

use crate::catalog::{CatalogError, CatalogStore, CategoryKey, ItemId, SubcategoryId};

/// What the pipeline knows about the query item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueryScope {
    /// Declared id, kept only when the catalog knows it.
    pub trusted_id: Option<ItemId>,
    /// Category of the trusted item, when resolvable.
    pub constraint: Option<CategoryKey>,
}

impl QueryScope {
    pub fn subcategory(&self) -> Option<SubcategoryId> {
        self.constraint.map(|key| key.subcategory)
    }
}

/// Trust the declared id against `valid_ids` and resolve its category.
///
/// An unknown id or an unresolvable category leaves the query unconstrained.
pub(super) fn resolve_scope(
    catalog: &dyn CatalogStore,
    declared: Option<ItemId>,
    valid_ids: &HashSet<ItemId>,
) -> Result<QueryScope, CatalogError> {
    let Some(declared) = declared else {
        return Ok(QueryScope::default());
    };
    if !valid_ids.contains(&declared) {
        debug!(declared = %declared, "Declared id not in catalog; searching unconstrained");
        return Ok(QueryScope::default());
    }
    let constraint = catalog.category_of(declared)?;
    if constraint.is_none() {
        debug!(declared = %declared, "Query item has no subcategory; searching unconstrained");
    }
    Ok(QueryScope {
        trusted_id: Some(declared),
        constraint,
    })
}
