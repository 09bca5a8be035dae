use std::collections::HashSet;

use crate::catalog::{CatalogError, CatalogStore, ItemId, ResultItem};

use super::category::QueryScope;

/// Top `products` up to `k` with random items from the query's subcategory.
///
/// Sampled items skip every accepted id and the query item, are re-checked
/// against `valid_ids`, and never duplicate an item already present. Returns
/// the number of items appended; fewer than requested is not an error.
pub(super) fn backfill(
    catalog: &dyn CatalogStore,
    products: &mut Vec<ResultItem>,
    accepted: &[ItemId],
    scope: &QueryScope,
    valid_ids: &HashSet<ItemId>,
    k: usize,
) -> Result<usize, CatalogError> {
    if products.len() >= k {
        return Ok(0);
    }
    let mut exclude: HashSet<ItemId> = accepted.iter().copied().collect();
    exclude.extend(products.iter().map(|item| item.id));
    exclude.extend(scope.trusted_id);

    let needed = k - products.len();
    let sampled = catalog.sample_fallback(scope.subcategory(), &exclude, needed)?;
    let before = products.len();
    for item in sampled {
        if products.len() == k {
            break;
        }
        if !valid_ids.contains(&item.id) || !exclude.insert(item.id) {
            continue;
        }
        products.push(item);
    }
    Ok(products.len() - before)
}
