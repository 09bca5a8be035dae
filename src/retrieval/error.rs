use thiserror::Error;

use crate::analysis::ann_index::IndexError;
use crate::analysis::embedding::EmbedError;
use crate::catalog::CatalogError;

/// Coarse classification a transport layer can map onto its own status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller sent something unusable; retrying the same request fails again.
    InvalidRequest,
    /// A collaborator failed; the request may succeed later.
    UpstreamUnavailable,
}

/// Errors surfaced by a search request.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("Result count must be greater than zero, got {0}")]
    InvalidResultCount(i64),
    #[error("Image is {size} bytes, limit is {limit}")]
    ImageTooLarge { size: usize, limit: usize },
    #[error("Unreadable image: {0}")]
    UnreadableImage(String),
    #[error("Embedding extractor unavailable: {0}")]
    ExtractorUnavailable(String),
    #[error(transparent)]
    IndexUnavailable(IndexError),
    #[error(transparent)]
    StoreUnavailable(CatalogError),
}

impl RetrievalError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidResultCount(_) | Self::ImageTooLarge { .. } | Self::UnreadableImage(_) => {
                ErrorKind::InvalidRequest
            }
            Self::ExtractorUnavailable(_)
            | Self::IndexUnavailable(_)
            | Self::StoreUnavailable(_) => ErrorKind::UpstreamUnavailable,
        }
    }

    /// HTTP-style status for hosts that expose the service over HTTP.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::ImageTooLarge { .. } => 413,
            _ => match self.kind() {
                ErrorKind::InvalidRequest => 400,
                ErrorKind::UpstreamUnavailable => 503,
            },
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::UpstreamUnavailable
    }
}

impl From<EmbedError> for RetrievalError {
    fn from(error: EmbedError) -> Self {
        match error {
            EmbedError::UnreadableImage(detail) => Self::UnreadableImage(detail),
            EmbedError::Unavailable(detail) => Self::ExtractorUnavailable(detail),
        }
    }
}

impl From<IndexError> for RetrievalError {
    fn from(error: IndexError) -> Self {
        Self::IndexUnavailable(error)
    }
}

impl From<CatalogError> for RetrievalError {
    fn from(error: CatalogError) -> Self {
        Self::StoreUnavailable(error)
    }
}
