use std::collections::HashSet;

use crate::analysis::ann_index::Candidate;
use crate::catalog::{CatalogError, CatalogStore, ItemId};

use super::category::QueryScope;

/// Walk candidates in index order and keep up to `k` usable ids.
///
/// A candidate survives when it is in the catalog, is not the query item,
/// matches the active subcategory and has not been seen before. Category
/// lookups happen at most once per distinct id.
pub(super) fn accept_candidates(
    catalog: &dyn CatalogStore,
    candidates: &[Candidate],
    valid_ids: &HashSet<ItemId>,
    scope: &QueryScope,
    k: usize,
) -> Result<Vec<ItemId>, CatalogError> {
    let mut accepted = Vec::with_capacity(k.min(candidates.len()));
    let mut seen = HashSet::with_capacity(candidates.len());
    for candidate in candidates {
        if accepted.len() == k {
            break;
        }
        let id = candidate.id;
        if !valid_ids.contains(&id) || scope.trusted_id == Some(id) {
            continue;
        }
        if !seen.insert(id) {
            continue;
        }
        if let Some(wanted) = scope.subcategory() {
            let matches = catalog
                .category_of(id)?
                .is_some_and(|key| key.subcategory == wanted);
            if !matches {
                continue;
            }
        }
        accepted.push(id);
    }
    Ok(accepted)
}
