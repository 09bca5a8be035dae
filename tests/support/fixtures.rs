use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use lookalike::SearchService;
use lookalike::analysis::ann_index::{AnnIndex, AnnIndexOptions};
use lookalike::analysis::embedding::{DescriptorEmbedder, EmbeddingProvider};
use lookalike::analysis::ingest;
use lookalike::catalog::{CategoryId, ItemId, SqliteCatalog, SubcategoryId};
use lookalike::config::LookalikeConfig;
use tempfile::TempDir;

pub const SHIRTS: SubcategoryId = SubcategoryId(10);
pub const SHOES: SubcategoryId = SubcategoryId(20);

/// Red-ish shirts in subcategory 10.
pub const SHIRT_COLOURS: &[(i64, [u8; 3])] = &[
    (101, [200, 30, 30]),
    (102, [210, 40, 35]),
    (103, [190, 25, 40]),
    (104, [220, 50, 30]),
    (105, [180, 20, 20]),
];

/// Blue-ish shoes in subcategory 20.
pub const SHOE_COLOURS: &[(i64, [u8; 3])] = &[
    (201, [30, 40, 200]),
    (202, [20, 60, 210]),
    (203, [40, 30, 190]),
];

pub fn item(raw: i64) -> ItemId {
    ItemId::new(raw).expect("positive id")
}

/// A 24x24 PNG of `colour` with a soft horizontal gradient.
pub fn png_bytes(colour: [u8; 3]) -> Vec<u8> {
    let img = RgbImage::from_fn(24, 24, |x, _| {
        let shade = (x * 2) as u8;
        Rgb([
            colour[0].saturating_sub(shade),
            colour[1].saturating_sub(shade),
            colour[2].saturating_sub(shade),
        ])
    });
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("encode png");
    bytes
}

pub struct CatalogFixture {
    pub temp: TempDir,
    pub db_path: PathBuf,
    pub index_dir: PathBuf,
}

impl CatalogFixture {
    /// Seed shirts and shoes with prices, images and embeddings, then build the index.
    pub fn seeded() -> Self {
        let temp = tempfile::tempdir().expect("create tempdir");
        let db_path = temp.path().join("catalog.db");
        let index_dir = temp.path().join("ann");
        let images = temp.path().join("images");
        std::fs::create_dir_all(&images).expect("create image dir");

        let catalog = SqliteCatalog::open(&db_path).expect("open catalog");
        catalog
            .upsert_category(CategoryId(1), Some(SHIRTS), "Shirts")
            .expect("shirts");
        catalog
            .upsert_category(CategoryId(2), Some(SHOES), "Shoes")
            .expect("shoes");
        for (category, colours) in [(CategoryId(1), SHIRT_COLOURS), (CategoryId(2), SHOE_COLOURS)] {
            for &(raw, colour) in colours {
                catalog
                    .upsert_item(item(raw), &format!("item {raw}"), Some(category))
                    .expect("item");
                catalog.add_variant(item(raw), raw as f64 / 10.0).expect("variant");
                catalog
                    .add_image(item(raw), &format!("https://img.example/{raw}.jpg"), true)
                    .expect("image");
                write_image(&images, raw, colour);
            }
        }
        drop(catalog);

        let fixture = Self {
            temp,
            db_path,
            index_dir,
        };
        let conn = SqliteCatalog::open_connection(&fixture.db_path).expect("open connection");
        let summary =
            ingest::embed_image_dir(&conn, &DescriptorEmbedder, &images).expect("embed images");
        assert_eq!(summary.embedded, SHIRT_COLOURS.len() + SHOE_COLOURS.len());
        AnnIndex::rebuild(&conn, &fixture.index_options(&LookalikeConfig::default()))
            .expect("build index");
        fixture
    }

    pub fn index_options(&self, config: &LookalikeConfig) -> AnnIndexOptions {
        let embedder = DescriptorEmbedder;
        AnnIndexOptions::from_settings(
            &config.index,
            self.index_dir.clone(),
            embedder.model_id(),
            embedder.dim(),
        )
    }

    pub fn writer(&self) -> SqliteCatalog {
        SqliteCatalog::open(&self.db_path).expect("open catalog")
    }

    /// Wire the real embedder, index and catalog the way the binary does.
    pub fn service(&self, config: &LookalikeConfig) -> SearchService {
        let conn = SqliteCatalog::open_connection(&self.db_path).expect("open connection");
        let index = AnnIndex::load_or_build(&conn, &self.index_options(config)).expect("load index");
        let catalog = SqliteCatalog::open_read_only(&self.db_path).expect("open read-only");
        SearchService::new(
            Arc::new(DescriptorEmbedder),
            Arc::new(index),
            Arc::new(catalog),
            config,
        )
    }
}

fn write_image(dir: &Path, raw: i64, colour: [u8; 3]) {
    std::fs::write(dir.join(format!("{raw}.png")), png_bytes(colour)).expect("write image");
}
