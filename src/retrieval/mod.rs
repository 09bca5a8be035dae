//! Query pipeline: embed, search, filter, hydrate, backfill.

mod category;
mod error;
mod fallback;
mod filter;
mod query;


use tracing::{debug, info};

use crate::analysis::ann_index::SimilarityIndex;
use crate::analysis::embedding::EmbeddingProvider;
use crate::catalog::{CatalogStore, ResultItem};
use crate::config::RetrievalSettings;

pub use crate::analysis::ann_index::Candidate;
pub use category::QueryScope;
pub use error::{ErrorKind, RetrievalError};
pub use query::{QueryContext, ResultCount, parse_query_id};

/// Borrowed collaborators for running queries.
///
/// The pipeline never writes to its collaborators and never retries; a
/// failing collaborator surfaces as a distinct [`RetrievalError`].
pub struct RetrievalPipeline<'a> {
    embedder: &'a dyn EmbeddingProvider,
    index: &'a dyn SimilarityIndex,
    catalog: &'a dyn CatalogStore,
    settings: RetrievalSettings,
}

impl<'a> RetrievalPipeline<'a> {
    pub fn new(
        embedder: &'a dyn EmbeddingProvider,
        index: &'a dyn SimilarityIndex,
        catalog: &'a dyn CatalogStore,
        settings: RetrievalSettings,
    ) -> Self {
        Self {
            embedder,
            index,
            catalog,
            settings,
        }
    }

    /// Run one query and return at most `k` distinct items.
    pub fn run(&self, query: &QueryContext) -> Result<Vec<ResultItem>, RetrievalError> {
        let k = query.k().get();
        let vector = self.embedder.embed(query.image())?;
        let pool = self.settings.pool_size(k);
        let candidates = self.index.search(&vector, pool)?;

        let valid_ids = self.catalog.all_valid_ids()?;
        let scope = category::resolve_scope(self.catalog, query.declared_id(), &valid_ids)?;
        let accepted =
            filter::accept_candidates(self.catalog, &candidates, &valid_ids, &scope, k)?;
        debug!(
            pool,
            candidates = candidates.len(),
            accepted = accepted.len(),
            constrained = scope.constraint.is_some(),
            "Filtered index candidates"
        );

        let mut products = if accepted.is_empty() {
            Vec::new()
        } else {
            self.catalog.hydrate(&accepted)?
        };
        let hydrated = products.len();
        let backfilled = fallback::backfill(
            self.catalog,
            &mut products,
            &accepted,
            &scope,
            &valid_ids,
            k,
        )?;
        products.truncate(k);
        info!(
            k,
            hydrated,
            backfilled,
            returned = products.len(),
            subcategory = ?scope.subcategory().map(|sub| sub.0),
            "Search completed"
        );
        Ok(products)
    }
}
