//! Bulk embedding of catalog images named `<item_id>.<ext>`.

use std::path::{Path, PathBuf};

use rusqlite::Connection;
use thiserror::Error;
use tracing::{debug, warn};

use super::ann_index::upsert_item_embedding;
use super::embedding::{EmbedError, EmbeddingProvider};
use crate::retrieval::parse_query_id;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif", "bmp"];

/// Errors that abort an ingest run.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Failed to list {path}: {source}")]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Embedding extractor unavailable: {0}")]
    Extractor(String),
    #[error("Failed to store embedding: {0}")]
    Store(#[from] rusqlite::Error),
}

/// Counts reported after an ingest run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestSummary {
    pub embedded: usize,
    /// Image files whose stem is not an item id.
    pub skipped_names: usize,
    /// Files that failed to decode.
    pub unreadable: usize,
}

/// Embed every image in `dir` (non-recursive) into `item_embeddings`.
///
/// Files are processed in name order. Unreadable images are logged and
/// counted; an unavailable extractor stops the run.
pub fn embed_image_dir(
    conn: &Connection,
    embedder: &dyn EmbeddingProvider,
    dir: &Path,
) -> Result<IngestSummary, IngestError> {
    let mut summary = IngestSummary::default();
    for path in image_files(dir)? {
        let Some(id) = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(parse_query_id)
        else {
            debug!(path = %path.display(), "Skipping image without an item id");
            summary.skipped_names += 1;
            continue;
        };
        let bytes = std::fs::read(&path).map_err(|source| IngestError::ReadFile {
            path: path.clone(),
            source,
        })?;
        match embedder.embed(&bytes) {
            Ok(vector) => {
                upsert_item_embedding(conn, id, embedder.model_id(), &vector)?;
                summary.embedded += 1;
            }
            Err(EmbedError::UnreadableImage(reason)) => {
                warn!(path = %path.display(), "Skipping unreadable image: {reason}");
                summary.unreadable += 1;
            }
            Err(EmbedError::Unavailable(reason)) => return Err(IngestError::Extractor(reason)),
        }
    }
    Ok(summary)
}

fn image_files(dir: &Path) -> Result<Vec<PathBuf>, IngestError> {
    let read_dir_err = |source| IngestError::ReadDir {
        path: dir.to_path_buf(),
        source,
    };
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(read_dir_err)? {
        let path = entry.map_err(read_dir_err)?.path();
        if path.is_file() && has_image_extension(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use tempfile::tempdir;

    use super::*;
    use crate::analysis::ann_index::count_embeddings;
    use crate::analysis::embedding::DescriptorEmbedder;
    use crate::catalog::SqliteCatalog;

    fn write_png(path: &Path, colour: [u8; 3]) {
        let img = RgbImage::from_pixel(8, 8, Rgb(colour));
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        std::fs::write(path, bytes).unwrap();
    }

    #[test]
    fn embeds_numbered_images_and_counts_the_rest() {
        let dir = tempdir().unwrap();
        let images = dir.path().join("images");
        std::fs::create_dir_all(&images).unwrap();
        write_png(&images.join("1.png"), [255, 0, 0]);
        write_png(&images.join("2.PNG"), [0, 255, 0]);
        write_png(&images.join("hero.png"), [0, 0, 255]);
        std::fs::write(images.join("3.jpg"), b"not really a jpeg").unwrap();
        std::fs::write(images.join("notes.txt"), b"ignored").unwrap();

        let conn = SqliteCatalog::open_connection(dir.path().join("catalog.db")).unwrap();
        let embedder = DescriptorEmbedder::new();
        let summary = embed_image_dir(&conn, &embedder, &images).unwrap();
        assert_eq!(
            summary,
            IngestSummary {
                embedded: 2,
                skipped_names: 1,
                unreadable: 1,
            }
        );
        assert_eq!(count_embeddings(&conn, embedder.model_id()).unwrap(), 2);
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tempdir().unwrap();
        let conn = SqliteCatalog::open_connection(dir.path().join("catalog.db")).unwrap();
        let err = embed_image_dir(&conn, &DescriptorEmbedder, &dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, IngestError::ReadDir { .. }));
    }
}
