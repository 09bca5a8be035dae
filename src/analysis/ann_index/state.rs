use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::IndexSettings;

/// Parameters persisted in `ann_index_meta.params_json`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub(crate) struct AnnIndexParams {
    pub(crate) model_id: String,
    pub(crate) metric: String,
    pub(crate) dim: usize,
    pub(crate) max_nb_connection: usize,
    pub(crate) ef_construction: usize,
    pub(crate) ef_search: usize,
    pub(crate) max_layer: usize,
}

impl AnnIndexParams {
    /// Whether a graph built with `other` can serve queries for `self`.
    ///
    /// `ef_search` only affects queries, so it never forces a rebuild.
    pub(crate) fn same_graph(&self, other: &AnnIndexParams) -> bool {
        self.model_id == other.model_id
            && self.metric == other.metric
            && self.dim == other.dim
            && self.max_nb_connection == other.max_nb_connection
            && self.ef_construction == other.ef_construction
            && self.max_layer == other.max_layer
    }
}

pub(crate) struct AnnIndexMetaRow {
    pub(crate) index_path: PathBuf,
    pub(crate) count: usize,
    pub(crate) params: AnnIndexParams,
}

/// Where an index lives and how it is built.
#[derive(Clone, Debug, PartialEq)]
pub struct AnnIndexOptions {
    /// Directory holding the graph dump and id map.
    pub dir: PathBuf,
    /// Embedding model whose vectors are indexed.
    pub model_id: String,
    /// Vector length produced by that model.
    pub dim: usize,
    pub max_nb_connection: usize,
    pub ef_construction: usize,
    pub ef_search: usize,
    pub max_layer: usize,
}

impl AnnIndexOptions {
    /// Combine configured HNSW settings with the embedding model's identity.
    pub fn from_settings(
        settings: &IndexSettings,
        dir: PathBuf,
        model_id: &str,
        dim: usize,
    ) -> Self {
        Self {
            dir,
            model_id: model_id.to_string(),
            dim,
            max_nb_connection: settings.max_nb_connection,
            ef_construction: settings.ef_construction,
            ef_search: settings.ef_search,
            max_layer: settings.max_layer,
        }
    }

    pub(crate) fn params(&self) -> AnnIndexParams {
        AnnIndexParams {
            model_id: self.model_id.clone(),
            metric: "cosine".to_string(),
            dim: self.dim,
            max_nb_connection: self.max_nb_connection,
            ef_construction: self.ef_construction,
            ef_search: self.ef_search,
            max_layer: self.max_layer,
        }
    }
}
