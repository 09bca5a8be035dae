//! Embed catalog images and rebuild the ANN index.

use std::path::PathBuf;

use lookalike::analysis::ann_index::{AnnIndex, AnnIndexOptions};
use lookalike::analysis::embedding::{DescriptorEmbedder, EmbeddingProvider};
use lookalike::analysis::ingest;
use lookalike::catalog::SqliteCatalog;
use lookalike::config;
use lookalike::logging::{self, ConsoleStream};

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

struct Options {
    images: Option<PathBuf>,
    db_path: Option<PathBuf>,
    config_path: Option<PathBuf>,
}

fn run() -> Result<(), String> {
    let Some(options) = parse_args(std::env::args().skip(1).collect())? else {
        return Ok(());
    };
    if let Err(err) = logging::init(ConsoleStream::Stdout) {
        eprintln!("Logging disabled: {err}");
    }
    let config = match &options.config_path {
        Some(path) => config::load_from_path(path),
        None => config::load_or_default(),
    }
    .map_err(|err| format!("Failed to load config: {err}"))?;
    let db_path = match options.db_path {
        Some(path) => path,
        None => config.catalog_db_path().map_err(|err| err.to_string())?,
    };
    let conn = SqliteCatalog::open_connection(&db_path).map_err(|err| err.to_string())?;
    let embedder = DescriptorEmbedder::new();

    if let Some(images) = &options.images {
        let summary =
            ingest::embed_image_dir(&conn, &embedder, images).map_err(|err| err.to_string())?;
        println!(
            "Embedded {} images ({} without an item id, {} unreadable)",
            summary.embedded, summary.skipped_names, summary.unreadable
        );
    }

    let index_options = AnnIndexOptions::from_settings(
        &config.index,
        config.index_dir(&db_path),
        embedder.model_id(),
        embedder.dim(),
    );
    let index = AnnIndex::rebuild(&conn, &index_options).map_err(|err| err.to_string())?;
    println!(
        "Rebuilt ANN index with {} items at {}",
        index.len(),
        index.index_path().display()
    );
    Ok(())
}

fn parse_args(args: Vec<String>) -> Result<Option<Options>, String> {
    if args.iter().any(|arg| arg == "--help" || arg == "-h") {
        print_help();
        return Ok(None);
    }
    let mut images = None;
    let mut db_path = None;
    let mut config_path = None;
    let mut it = args.into_iter();
    while let Some(arg) = it.next() {
        let mut value = |flag: &str| {
            it.next()
                .map(PathBuf::from)
                .ok_or_else(|| format!("Missing value for {flag}"))
        };
        match arg.as_str() {
            "--images" => images = Some(value("--images")?),
            "--db" => db_path = Some(value("--db")?),
            "--config" => config_path = Some(value("--config")?),
            _ => return Err(format!("Unknown argument: {arg}")),
        }
    }
    Ok(Some(Options {
        images,
        db_path,
        config_path,
    }))
}

fn print_help() {
    println!("Usage: lookalike-index-build [--images <dir>] [--db <path>] [--config <path>]");
    println!();
    println!("Options:");
    println!("  --images <dir>   Embed <item_id>.<ext> images from this directory first");
    println!("  --db <path>      Catalog database (defaults to app data dir)");
    println!("  --config <path>  Config file (defaults to app data dir)");
}
