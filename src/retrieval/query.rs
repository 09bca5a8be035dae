use std::num::NonZeroUsize;
use std::path::Path;

use super::RetrievalError;
use crate::catalog::ItemId;

/// Requested number of results; always at least one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResultCount(NonZeroUsize);

impl ResultCount {
    /// Validate a caller-supplied count. Positive counts beyond `usize` saturate.
    pub fn new(raw: i64) -> Result<Self, RetrievalError> {
        if raw <= 0 {
            return Err(RetrievalError::InvalidResultCount(raw));
        }
        let count = usize::try_from(raw).unwrap_or(usize::MAX);
        NonZeroUsize::new(count)
            .map(Self)
            .ok_or(RetrievalError::InvalidResultCount(raw))
    }

    pub fn get(self) -> usize {
        self.0.get()
    }
}

impl From<NonZeroUsize> for ResultCount {
    fn from(value: NonZeroUsize) -> Self {
        Self(value)
    }
}

/// One search request as seen by the pipeline.
#[derive(Debug, Clone)]
pub struct QueryContext {
    image: Vec<u8>,
    declared_id: Option<ItemId>,
    k: ResultCount,
}

impl QueryContext {
    pub fn new(image: Vec<u8>, declared_id: Option<ItemId>, k: ResultCount) -> Self {
        Self {
            image,
            declared_id,
            k,
        }
    }

    /// Build a query from an upload, reading the declared id from its filename.
    pub fn from_upload(filename: &str, image: Vec<u8>, k: ResultCount) -> Self {
        Self::new(image, parse_query_id(filename), k)
    }

    pub fn image(&self) -> &[u8] {
        &self.image
    }

    /// Id claimed by the upload. Untrusted until checked against the catalog.
    pub fn declared_id(&self) -> Option<ItemId> {
        self.declared_id
    }

    pub fn k(&self) -> ResultCount {
        self.k
    }
}

/// Read a catalog id from an upload filename such as `1234.jpg`.
///
/// The stem must be ASCII digits only; anything else, zero, or a value that
/// overflows `i64` yields `None`.
pub fn parse_query_id(filename: &str) -> Option<ItemId> {
    let stem = Path::new(filename).file_stem()?.to_str()?;
    if stem.is_empty() || !stem.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    stem.parse::<i64>().ok().and_then(ItemId::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_stems_parse() {
        assert_eq!(parse_query_id("101.jpg"), ItemId::new(101));
        assert_eq!(parse_query_id("uploads/0042.png"), ItemId::new(42));
        assert_eq!(parse_query_id("7"), ItemId::new(7));
        assert_eq!(parse_query_id("12.tar.gz"), None);
    }

    #[test]
    fn non_numeric_stems_are_undefined() {
        for name in ["", ".jpg", "shirt.jpg", "-5.jpg", "+5.jpg", "1 2.jpg", "٣.jpg", "0.jpg"] {
            assert_eq!(parse_query_id(name), None, "{name}");
        }
        assert_eq!(parse_query_id("99999999999999999999.jpg"), None);
    }

    #[test]
    fn result_count_requires_positive_values() {
        assert!(matches!(
            ResultCount::new(0),
            Err(RetrievalError::InvalidResultCount(0))
        ));
        assert!(matches!(
            ResultCount::new(-1),
            Err(RetrievalError::InvalidResultCount(-1))
        ));
        assert_eq!(ResultCount::new(3).unwrap().get(), 3);
    }

    #[test]
    fn result_count_accepts_largest_i64() {
        let count = ResultCount::new(i64::MAX).unwrap();
        assert!(count.get() >= 1);
    }
}
