//! HNSW nearest-neighbour index over stored item embeddings.

mod build;
mod state;
mod storage;


use std::path::{Path, PathBuf};

use hnsw_rs::prelude::*;
use rusqlite::Connection;
use thiserror::Error;

use crate::catalog::ItemId;

pub use state::AnnIndexOptions;
pub use storage::{count_embeddings, upsert_item_embedding};

/// Ranked hit returned by a similarity index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub id: ItemId,
    /// Higher is more similar; `1 - cosine distance` for [`AnnIndex`].
    pub score: f32,
}

/// Errors returned by similarity indexes.
#[derive(Debug, Error)]
pub enum IndexError {
    /// The index could not be loaded, built or queried.
    #[error("Similarity index unavailable: {0}")]
    Unavailable(String),
    /// The query vector does not match the indexed dimension.
    #[error("Query vector has {actual} dimensions, index expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Approximate nearest-neighbour search over normalised vectors.
pub trait SimilarityIndex: Send + Sync {
    /// Up to `n` candidates in descending similarity.
    ///
    /// Returns fewer than `n` when the index is smaller, and an empty list for
    /// an empty index. Results may include ids no longer in the catalog.
    fn search(&self, query: &[f32], n: usize) -> Result<Vec<Candidate>, IndexError>;
}

/// HNSW index loaded into memory. Read-only once constructed.
pub struct AnnIndex {
    hnsw: Hnsw<'static, f32, DistCosine>,
    id_map: Vec<ItemId>,
    params: state::AnnIndexParams,
    index_path: PathBuf,
}

impl AnnIndex {
    /// Load the persisted index, rebuilding it from `item_embeddings` when the
    /// dump is missing, unreadable, built with other parameters, or out of
    /// date with the stored embedding count.
    pub fn load_or_build(conn: &Connection, options: &AnnIndexOptions) -> Result<Self, IndexError> {
        build::load_or_build_index(conn, options).map_err(IndexError::Unavailable)
    }

    /// Rebuild from `item_embeddings` and persist, ignoring any existing dump.
    pub fn rebuild(conn: &Connection, options: &AnnIndexOptions) -> Result<Self, IndexError> {
        build::build_and_persist(conn, options).map_err(IndexError::Unavailable)
    }

    pub fn len(&self) -> usize {
        self.id_map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id_map.is_empty()
    }

    pub fn dim(&self) -> usize {
        self.params.dim
    }

    pub fn model_id(&self) -> &str {
        &self.params.model_id
    }

    /// Base path of the on-disk dump (graph, data and id map share it).
    pub fn index_path(&self) -> &Path {
        &self.index_path
    }
}

impl SimilarityIndex for AnnIndex {
    fn search(&self, query: &[f32], n: usize) -> Result<Vec<Candidate>, IndexError> {
        if query.len() != self.params.dim {
            return Err(IndexError::DimensionMismatch {
                expected: self.params.dim,
                actual: query.len(),
            });
        }
        if n == 0 || self.id_map.is_empty() {
            return Ok(Vec::new());
        }
        let requested = n.min(self.id_map.len());
        let ef = self.params.ef_search.max(requested);
        let neighbours = self.hnsw.search(query, requested, ef);
        let mut results: Vec<Candidate> = neighbours
            .into_iter()
            .filter_map(|neighbour| {
                self.id_map.get(neighbour.d_id).map(|&id| Candidate {
                    id,
                    score: 1.0 - neighbour.distance,
                })
            })
            .collect();
        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(n);
        Ok(results)
    }
}
