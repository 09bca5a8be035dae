use super::*;
use std::path::PathBuf;
use tempfile::tempdir;

#[test]
fn missing_file_yields_defaults() {
    let dir = tempdir().unwrap();
    let config = load_from_path(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(config, LookalikeConfig::default());
    assert_eq!(config.retrieval.default_k, 10);
    assert_eq!(config.retrieval.overfetch_floor, 50);
}

#[test]
fn partial_sections_keep_other_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        "[retrieval]\noverfetch_multiplier = 0\n\n[index]\nef_search = 128\n",
    )
    .unwrap();
    let config = load_from_path(&path).unwrap();
    assert_eq!(config.retrieval.overfetch_multiplier, 0);
    assert_eq!(config.retrieval.default_k, 10);
    assert_eq!(config.index.ef_search, 128);
    assert_eq!(config.index.max_nb_connection, 16);
}

#[test]
fn zero_values_are_clamped() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[retrieval]\ndefault_k = 0\noverfetch_floor = 0\n").unwrap();
    let config = load_from_path(&path).unwrap();
    assert_eq!(config.retrieval.default_k, 1);
    assert_eq!(config.retrieval.overfetch_floor, 1);
}

#[test]
fn invalid_toml_reports_path() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[retrieval\n").unwrap();
    let err = load_from_path(&path).unwrap_err();
    assert!(matches!(err, ConfigError::ParseToml { .. }));
    assert!(err.to_string().contains("config.toml"));
}

#[test]
fn saved_config_loads_back() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");
    let mut config = LookalikeConfig::default();
    config.catalog.db_path = Some(PathBuf::from("/srv/shop/catalog.db"));
    config.retrieval.overfetch_multiplier = 8;
    save_to_path(&config, &path).unwrap();
    assert_eq!(load_from_path(&path).unwrap(), config);
}

#[test]
fn pool_size_keeps_fixed_floor_for_small_k() {
    let settings = RetrievalSettings::default();
    assert_eq!(settings.pool_size(1), 50);
    assert_eq!(settings.pool_size(10), 50);
    assert_eq!(settings.pool_size(40), 200);
}

#[test]
fn pool_size_without_multiplier_still_covers_k() {
    let settings = RetrievalSettings {
        overfetch_multiplier: 0,
        ..RetrievalSettings::default()
    };
    assert_eq!(settings.pool_size(10), 50);
    assert_eq!(settings.pool_size(80), 80);
}

#[test]
fn index_dir_defaults_next_to_catalog() {
    let config = LookalikeConfig::default();
    let dir = config.index_dir(std::path::Path::new("/data/shop/catalog.db"));
    assert_eq!(dir, PathBuf::from("/data/shop/ann"));
}

#[test]
fn catalog_path_defaults_to_app_root() {
    let _lock = crate::app_dirs::CONFIG_TEST_LOCK
        .lock()
        .unwrap_or_else(|err| err.into_inner());
    let dir = tempdir().unwrap();
    let _guard = crate::app_dirs::ConfigBaseGuard::set(dir.path().to_path_buf());
    let path = LookalikeConfig::default().catalog_db_path().unwrap();
    assert_eq!(
        path,
        dir.path()
            .join(crate::app_dirs::APP_DIR_NAME)
            .join(CATALOG_DB_FILE_NAME)
    );
}
