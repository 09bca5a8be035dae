//! Service boundary: validates requests and runs the pipeline on shared collaborators.

use std::num::NonZeroUsize;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::analysis::ann_index::SimilarityIndex;
use crate::analysis::embedding::EmbeddingProvider;
use crate::catalog::{CatalogStore, ResultItem};
use crate::config::{LookalikeConfig, RetrievalSettings};
use crate::retrieval::{QueryContext, ResultCount, RetrievalError, RetrievalPipeline};

/// One "find similar" request.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    /// Upload filename; a numeric stem declares the query's catalog id.
    pub filename: String,
    /// Encoded image bytes.
    pub image: Vec<u8>,
    /// Requested result count; the configured default when absent.
    pub k: Option<i64>,
}

/// Search result as returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResponse {
    pub count: usize,
    pub products: Vec<ResultItem>,
}

impl From<Vec<ResultItem>> for SearchResponse {
    fn from(products: Vec<ResultItem>) -> Self {
        Self {
            count: products.len(),
            products,
        }
    }
}

/// Long-lived search entry point.
///
/// Collaborators are built once at startup and shared; the service holds no
/// per-request state, so one instance can serve many threads.
pub struct SearchService {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn SimilarityIndex>,
    catalog: Arc<dyn CatalogStore>,
    retrieval: RetrievalSettings,
    max_image_bytes: usize,
}

impl SearchService {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn SimilarityIndex>,
        catalog: Arc<dyn CatalogStore>,
        config: &LookalikeConfig,
    ) -> Self {
        Self {
            embedder,
            index,
            catalog,
            retrieval: config.retrieval,
            max_image_bytes: config.embedding.max_image_bytes,
        }
    }

    /// Validate `request` and return up to `k` similar items.
    ///
    /// Request errors are reported before any collaborator is contacted.
    pub fn search(&self, request: SearchRequest) -> Result<SearchResponse, RetrievalError> {
        let k = self.result_count(request.k)?;
        if request.image.len() > self.max_image_bytes {
            return Err(RetrievalError::ImageTooLarge {
                size: request.image.len(),
                limit: self.max_image_bytes,
            });
        }
        let query = QueryContext::from_upload(&request.filename, request.image, k);
        debug!(
            filename = %request.filename,
            declared = ?query.declared_id().map(|id| id.get()),
            k = k.get(),
            "Search request"
        );
        let pipeline = RetrievalPipeline::new(
            self.embedder.as_ref(),
            self.index.as_ref(),
            self.catalog.as_ref(),
            self.retrieval,
        );
        pipeline.run(&query).map(SearchResponse::from)
    }

    fn result_count(&self, requested: Option<i64>) -> Result<ResultCount, RetrievalError> {
        match requested {
            Some(raw) => ResultCount::new(raw),
            None => Ok(NonZeroUsize::new(self.retrieval.default_k)
                .unwrap_or(NonZeroUsize::MIN)
                .into()),
        }
    }
}
