//! Image embedding providers.

use thiserror::Error;

mod descriptor;

pub use descriptor::{DESCRIPTOR_DIM, DESCRIPTOR_MODEL_ID, DescriptorEmbedder};

/// Errors returned by embedding providers.
#[derive(Debug, Error)]
pub enum EmbedError {
    /// The bytes could not be decoded as an image.
    #[error("Unreadable image: {0}")]
    UnreadableImage(String),
    /// The extractor failed for reasons unrelated to the input.
    #[error("Embedding extractor unavailable: {0}")]
    Unavailable(String),
}

/// Turns raw image bytes into a fixed-length, L2-normalised vector.
///
/// Every vector returned by `embed` has `dim()` entries and unit length, so
/// cosine distance and dot product agree.
pub trait EmbeddingProvider: Send + Sync {
    /// Identifier stored alongside persisted embeddings.
    fn model_id(&self) -> &str;

    /// Length of every returned vector.
    fn dim(&self) -> usize;

    /// Embed one encoded image.
    fn embed(&self, image: &[u8]) -> Result<Vec<f32>, EmbedError>;
}
