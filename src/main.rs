//! Search the catalog for items that look like one image.

use std::path::PathBuf;
use std::sync::Arc;

use lookalike::analysis::ann_index::{AnnIndex, AnnIndexOptions};
use lookalike::analysis::embedding::{DescriptorEmbedder, EmbeddingProvider};
use lookalike::catalog::SqliteCatalog;
use lookalike::config::{self, LookalikeConfig};
use lookalike::logging::{self, ConsoleStream};
use lookalike::{SearchRequest, SearchService};

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

struct Options {
    image: PathBuf,
    name: Option<String>,
    k: Option<i64>,
    db_path: Option<PathBuf>,
    config_path: Option<PathBuf>,
    index_dir: Option<PathBuf>,
}

fn run() -> Result<(), String> {
    let Some(options) = parse_args(std::env::args().skip(1).collect())? else {
        return Ok(());
    };
    // Stdout carries the JSON response.
    if let Err(err) = logging::init(ConsoleStream::Stderr) {
        eprintln!("Logging disabled: {err}");
    }
    let config = load_config(options.config_path.as_deref())?;
    let db_path = match &options.db_path {
        Some(path) => path.clone(),
        None => config.catalog_db_path().map_err(|err| err.to_string())?,
    };
    let index_dir = options
        .index_dir
        .clone()
        .unwrap_or_else(|| config.index_dir(&db_path));

    let embedder = Arc::new(DescriptorEmbedder::new());
    let index_options =
        AnnIndexOptions::from_settings(&config.index, index_dir, embedder.model_id(), embedder.dim());
    let index = {
        let conn = SqliteCatalog::open_connection(&db_path).map_err(|err| err.to_string())?;
        AnnIndex::load_or_build(&conn, &index_options).map_err(|err| err.to_string())?
    };
    let catalog = SqliteCatalog::open_read_only(&db_path).map_err(|err| err.to_string())?;
    let service = SearchService::new(embedder, Arc::new(index), Arc::new(catalog), &config);

    let image = std::fs::read(&options.image)
        .map_err(|err| format!("Failed to read {}: {err}", options.image.display()))?;
    let filename = options.name.clone().unwrap_or_else(|| {
        options
            .image
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    });
    let response = service
        .search(SearchRequest {
            filename,
            image,
            k: options.k,
        })
        .map_err(|err| format!("Search failed ({}): {err}", err.status_code()))?;
    let json = serde_json::to_string_pretty(&response)
        .map_err(|err| format!("Failed to encode response: {err}"))?;
    println!("{json}");
    Ok(())
}

fn load_config(path: Option<&std::path::Path>) -> Result<LookalikeConfig, String> {
    match path {
        Some(path) => config::load_from_path(path),
        None => config::load_or_default(),
    }
    .map_err(|err| format!("Failed to load config: {err}"))
}

fn parse_args(args: Vec<String>) -> Result<Option<Options>, String> {
    if args.iter().any(|arg| arg == "--help" || arg == "-h") {
        print_help();
        return Ok(None);
    }
    let mut image = None;
    let mut name = None;
    let mut k = None;
    let mut db_path = None;
    let mut config_path = None;
    let mut index_dir = None;
    let mut it = args.into_iter();
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--k" | "-k" => {
                let value = next_value(&mut it, "--k")?;
                let parsed = value
                    .parse::<i64>()
                    .map_err(|_| format!("Invalid value for --k: {value}"))?;
                k = Some(parsed);
            }
            "--name" => name = Some(next_value(&mut it, "--name")?),
            "--db" => db_path = Some(PathBuf::from(next_value(&mut it, "--db")?)),
            "--config" => config_path = Some(PathBuf::from(next_value(&mut it, "--config")?)),
            "--index-dir" => {
                index_dir = Some(PathBuf::from(next_value(&mut it, "--index-dir")?));
            }
            _ if arg.starts_with("--") => return Err(format!("Unknown argument: {arg}")),
            _ if image.is_none() => image = Some(PathBuf::from(&arg)),
            _ => return Err(format!("Unexpected argument: {arg}")),
        }
    }
    let image = image.ok_or_else(|| "Missing image path (see --help)".to_string())?;
    Ok(Some(Options {
        image,
        name,
        k,
        db_path,
        config_path,
        index_dir,
    }))
}

fn next_value(it: &mut impl Iterator<Item = String>, flag: &str) -> Result<String, String> {
    it.next().ok_or_else(|| format!("Missing value for {flag}"))
}

fn print_help() {
    println!("Usage: lookalike [options] <image>");
    println!();
    println!("Prints up to k catalog items that look like <image> as JSON.");
    println!("A numeric file name (e.g. 1234.jpg) marks the image as catalog item 1234;");
    println!("results then stay in its subcategory and exclude it.");
    println!();
    println!("Options:");
    println!("  --k <n>              Number of results (defaults to config, 10)");
    println!("  --name <filename>    Filename to report instead of the image path");
    println!("  --db <path>          Catalog database (defaults to app data dir)");
    println!("  --config <path>      Config file (defaults to app data dir)");
    println!("  --index-dir <path>   ANN index directory (defaults to <db dir>/ann)");
}
