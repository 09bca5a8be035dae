//! Library exports for the search binaries, benchmarks and tests.
/// Image embeddings and the nearest-neighbour index.
pub mod analysis;
/// Application directory helpers.
pub mod app_dirs;
/// Catalog metadata store.
pub mod catalog;
/// Configuration loading and saving.
pub mod config;
/// Logging setup.
pub mod logging;
/// Query pipeline and error taxonomy.
pub mod retrieval;
/// Request validation and response assembly.
pub mod service;

pub use service::{SearchRequest, SearchResponse, SearchService};
