mod support;

use std::collections::HashSet;

use lookalike::catalog::{CatalogStore, SqliteCatalog};
use lookalike::config::{self, LookalikeConfig};
use lookalike::retrieval::{ErrorKind, RetrievalError};
use lookalike::{SearchRequest, SearchResponse};
use support::fixtures::{CatalogFixture, SHIRT_COLOURS, SHIRTS, SHOE_COLOURS, SHOES, item, png_bytes};
use support::lookalike_env::LookalikeEnvGuard;

fn colour_of(raw: i64) -> [u8; 3] {
    SHIRT_COLOURS
        .iter()
        .chain(SHOE_COLOURS)
        .find(|(id, _)| *id == raw)
        .map(|(_, colour)| *colour)
        .expect("known item")
}

fn request(filename: &str, colour: [u8; 3], k: Option<i64>) -> SearchRequest {
    SearchRequest {
        filename: filename.to_string(),
        image: png_bytes(colour),
        k,
    }
}

fn ids(response: &SearchResponse) -> Vec<i64> {
    response.products.iter().map(|p| p.id.get()).collect()
}

fn assert_distinct(response: &SearchResponse) {
    let unique: HashSet<_> = ids(response).into_iter().collect();
    assert_eq!(unique.len(), response.count);
    assert_eq!(response.count, response.products.len());
}

#[test]
fn known_item_query_stays_in_its_subcategory() {
    let fixture = CatalogFixture::seeded();
    let service = fixture.service(&LookalikeConfig::default());
    let catalog = SqliteCatalog::open_read_only(&fixture.db_path).unwrap();

    let response = service
        .search(request("101.jpg", colour_of(101), Some(3)))
        .unwrap();
    assert_eq!(response.count, 3);
    assert_distinct(&response);
    for product in &response.products {
        assert_ne!(product.id, item(101));
        let key = catalog.category_of(product.id).unwrap().unwrap();
        assert_eq!(key.subcategory, SHIRTS);
        assert!(product.image_url.starts_with("https://img.example/"));
    }
}

#[test]
fn shortfall_returns_every_other_item_in_the_subcategory() {
    let fixture = CatalogFixture::seeded();
    let service = fixture.service(&LookalikeConfig::default());

    let response = service
        .search(request("201.png", colour_of(201), Some(10)))
        .unwrap();
    let got: HashSet<_> = ids(&response).into_iter().collect();
    assert_eq!(got, [202, 203].into_iter().collect::<HashSet<_>>());
}

#[test]
fn huge_k_returns_what_the_subcategory_holds() {
    let fixture = CatalogFixture::seeded();
    let service = fixture.service(&LookalikeConfig::default());

    let response = service
        .search(request("101.jpg", colour_of(101), Some(i64::MAX)))
        .unwrap();
    assert_distinct(&response);
    let got: HashSet<_> = ids(&response).into_iter().collect();
    assert_eq!(got, [102, 103, 104, 105].into_iter().collect::<HashSet<_>>());
}

#[test]
fn huge_k_for_anonymous_upload_returns_whole_catalog() {
    let fixture = CatalogFixture::seeded();
    let service = fixture.service(&LookalikeConfig::default());

    let response = service
        .search(request("upload.png", [200, 40, 40], Some(1_000_000_000_000)))
        .unwrap();
    assert_distinct(&response);
    assert_eq!(response.count, SHIRT_COLOURS.len() + SHOE_COLOURS.len());
}

#[test]
fn anonymous_upload_ranks_by_colour_across_the_catalog() {
    let fixture = CatalogFixture::seeded();
    let service = fixture.service(&LookalikeConfig::default());

    let response = service
        .search(request("my-photo.png", [25, 50, 205], Some(3)))
        .unwrap();
    assert_eq!(response.count, 3);
    let catalog = SqliteCatalog::open_read_only(&fixture.db_path).unwrap();
    for product in &response.products {
        let key = catalog.category_of(product.id).unwrap().unwrap();
        assert_eq!(key.subcategory, SHOES);
    }
}

#[test]
fn removed_items_never_surface_even_though_indexed() {
    let fixture = CatalogFixture::seeded();
    assert!(fixture.writer().remove_item(item(104)).unwrap());
    let service = fixture.service(&LookalikeConfig::default());

    let response = service
        .search(request("104.jpg", colour_of(104), Some(5)))
        .unwrap();
    assert_distinct(&response);
    assert!(!ids(&response).contains(&104));
    // 104 is no longer trusted, so results are unconstrained.
    assert_eq!(response.count, 5);
}

#[test]
fn unpriced_items_are_not_returned() {
    let fixture = CatalogFixture::seeded();
    let writer = fixture.writer();
    writer
        .upsert_item(item(106), "sample shirt", Some(lookalike::catalog::CategoryId(1)))
        .unwrap();
    drop(writer);
    let service = fixture.service(&LookalikeConfig::default());

    let response = service
        .search(request("101.jpg", colour_of(101), Some(10)))
        .unwrap();
    let got: HashSet<_> = ids(&response).into_iter().collect();
    assert_eq!(got, [102, 103, 104, 105].into_iter().collect::<HashSet<_>>());
}

#[test]
fn invalid_requests_are_rejected() {
    let fixture = CatalogFixture::seeded();
    let service = fixture.service(&LookalikeConfig::default());

    let err = service
        .search(request("101.jpg", colour_of(101), Some(-1)))
        .unwrap_err();
    assert!(matches!(err, RetrievalError::InvalidResultCount(-1)));

    let err = service
        .search(SearchRequest {
            filename: "101.jpg".to_string(),
            image: b"GIF89a but not really".to_vec(),
            k: Some(3),
        })
        .unwrap_err();
    assert!(matches!(err, RetrievalError::UnreadableImage(_)));
    assert_eq!(err.kind(), ErrorKind::InvalidRequest);
}

#[test]
fn default_k_comes_from_config_home() {
    let fixture = CatalogFixture::seeded();
    let home = fixture.temp.path().join("config_home");
    let _env = LookalikeEnvGuard::set_config_home(home.clone());
    let mut config = LookalikeConfig::default();
    config.retrieval.default_k = 2;
    config::save_to_path(&config, &config::config_path().unwrap()).unwrap();

    let loaded = config::load_or_default().unwrap();
    assert_eq!(loaded.retrieval.default_k, 2);
    assert!(config::config_path().unwrap().starts_with(&home));
    let service = fixture.service(&loaded);
    let response = service
        .search(request("upload.png", colour_of(102), None))
        .unwrap();
    assert_eq!(response.count, 2);
}

#[test]
fn response_json_matches_wire_shape() {
    let fixture = CatalogFixture::seeded();
    let service = fixture.service(&LookalikeConfig::default());
    let response = service
        .search(request("202.png", colour_of(202), Some(1)))
        .unwrap();
    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["count"], 1);
    let product = &json["products"][0];
    assert!(product["id"].is_i64());
    assert!(product["name"].is_string());
    assert!(product["price"].is_f64());
    assert!(product["image_url"].is_string());
}
