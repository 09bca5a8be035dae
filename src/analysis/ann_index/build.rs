use std::path::Path;

use hnsw_rs::api::AnnT;
use hnsw_rs::hnswio::HnswIo;
use hnsw_rs::prelude::*;
use rusqlite::{Connection, params};
use tempfile::Builder;
use tracing::{debug, info, warn};

use super::AnnIndex;
use super::state::{AnnIndexMetaRow, AnnIndexOptions, AnnIndexParams};
use super::storage::{
    ANN_BASENAME, hnsw_dump_paths, id_map_path_for, load_id_map, read_meta, save_id_map,
    upsert_meta,
};
use crate::analysis::decode_f32_le_blob;
use crate::catalog::ItemId;

const ANN_TEMP_DUMP_PREFIX: &str = "ann_dump";

pub(crate) fn load_or_build_index(
    conn: &Connection,
    options: &AnnIndexOptions,
) -> Result<AnnIndex, String> {
    let params = options.params();
    let stored = count_indexable(conn, &params)?;
    if let Some(meta) = read_meta(conn, &params.model_id)?
        && meta.count > 0
        && meta.count == stored
        && meta.params.same_graph(&params)
        && meta.index_path.parent() == Some(options.dir.as_path())
        && let Some(index) = load_index_from_disk(&meta, params.clone())?
    {
        info!(
            points = index.len(),
            path = %index.index_path.display(),
            "Loaded ANN index from disk"
        );
        return Ok(index);
    }
    build_and_persist(conn, options)
}

pub(crate) fn build_and_persist(
    conn: &Connection,
    options: &AnnIndexOptions,
) -> Result<AnnIndex, String> {
    let index_path = options.dir.join(ANN_BASENAME);
    let index = build_index_from_db(conn, options.params(), &index_path)?;
    persist_index(conn, &index)?;
    info!(
        points = index.len(),
        model_id = %index.params.model_id,
        "Built ANN index"
    );
    Ok(index)
}

fn count_indexable(conn: &Connection, params: &AnnIndexParams) -> Result<usize, String> {
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM item_embeddings WHERE model_id = ?1 AND dim = ?2 AND item_id > 0",
            params![params.model_id, params.dim as i64],
            |row| row.get(0),
        )
        .map_err(|err| format!("Failed to count embeddings: {err}"))?;
    Ok(count.max(0) as usize)
}

pub(crate) fn build_index_from_db(
    conn: &Connection,
    params: AnnIndexParams,
    index_path: &Path,
) -> Result<AnnIndex, String> {
    let count = count_indexable(conn, &params)?;
    let max_elements = count.max(1024);
    let hnsw: Hnsw<'static, f32, DistCosine> = Hnsw::new(
        params.max_nb_connection,
        max_elements,
        params.max_layer,
        params.ef_construction,
        DistCosine {},
    );
    let mut id_map = Vec::with_capacity(count);
    let mut stmt = conn
        .prepare(
            "SELECT item_id, vec
             FROM item_embeddings
             WHERE model_id = ?1 AND dim = ?2
             ORDER BY item_id ASC",
        )
        .map_err(|err| format!("Failed to query embeddings: {err}"))?;
    let mut rows = stmt
        .query(params![params.model_id, params.dim as i64])
        .map_err(|err| format!("Failed to iterate embeddings: {err}"))?;
    while let Some(row) = rows.next().map_err(|err| err.to_string())? {
        let raw_id: i64 = row.get(0).map_err(|err| err.to_string())?;
        let blob: Vec<u8> = row.get(1).map_err(|err| err.to_string())?;
        let Some(id) = ItemId::new(raw_id) else {
            continue;
        };
        let embedding = decode_f32_le_blob(&blob)?;
        if embedding.len() != params.dim {
            warn!(item_id = %id, len = embedding.len(), "Skipping embedding with bad blob length");
            continue;
        }
        let slot = id_map.len();
        id_map.push(id);
        hnsw.insert((embedding.as_slice(), slot));
    }
    Ok(AnnIndex {
        hnsw,
        id_map,
        params,
        index_path: index_path.to_path_buf(),
    })
}

/// Write the graph dump, id map and meta row for `index`.
pub(crate) fn persist_index(conn: &Connection, index: &AnnIndex) -> Result<(), String> {
    let dir = index
        .index_path
        .parent()
        .ok_or_else(|| "Index path missing parent".to_string())?;
    std::fs::create_dir_all(dir).map_err(|err| format!("Failed to create ANN dir: {err}"))?;
    let id_map_path = id_map_path_for(&index.index_path);
    if index.id_map.is_empty() {
        remove_if_present(&id_map_path)?;
        return upsert_meta(conn, &index.index_path, 0, &index.params);
    }
    let temp_dir = Builder::new()
        .prefix(ANN_TEMP_DUMP_PREFIX)
        .tempdir_in(dir)
        .map_err(|err| format!("Failed to create ANN dump dir: {err}"))?;
    let dumped = index
        .hnsw
        .file_dump(temp_dir.path(), ANN_BASENAME)
        .map_err(|err| format!("Failed to save ANN index: {err}"))?;
    let (temp_graph, temp_data) = hnsw_dump_paths(&temp_dir.path().join(dumped))?;
    let (graph_path, data_path) = hnsw_dump_paths(&index.index_path)?;
    std::fs::rename(&temp_graph, &graph_path)
        .map_err(|err| format!("Failed to move ANN graph into place: {err}"))?;
    std::fs::rename(&temp_data, &data_path)
        .map_err(|err| format!("Failed to move ANN data into place: {err}"))?;
    save_id_map(&id_map_path, &index.id_map)?;
    upsert_meta(conn, &index.index_path, index.id_map.len(), &index.params)?;
    debug!(path = %index.index_path.display(), "Persisted ANN index");
    Ok(())
}

fn remove_if_present(path: &Path) -> Result<(), String> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(format!("Failed to remove stale id map: {err}")),
    }
}

pub(crate) fn load_index_from_disk(
    meta: &AnnIndexMetaRow,
    params: AnnIndexParams,
) -> Result<Option<AnnIndex>, String> {
    let index_path = meta.index_path.clone();
    let (graph_path, data_path) = hnsw_dump_paths(&index_path)?;
    if !graph_path.is_file() || !data_path.is_file() {
        return Ok(None);
    }
    let id_map_path = id_map_path_for(&index_path);
    if !id_map_path.is_file() {
        return Ok(None);
    }
    let id_map = match load_id_map(&id_map_path) {
        Ok(id_map) => id_map,
        Err(err) => {
            warn!("Ignoring unreadable ANN id map: {err}");
            return Ok(None);
        }
    };
    let basename = index_path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| "Index path missing basename".to_string())?;
    let dir = index_path
        .parent()
        .ok_or_else(|| "Index path missing parent".to_string())?;
    // The loaded graph borrows its loader; leak it so the index can be 'static.
    let hnsw_io: &'static mut HnswIo = Box::leak(Box::new(HnswIo::new(dir, basename)));
    let hnsw: Hnsw<'static, f32, DistCosine> = match hnsw_io.load_hnsw::<f32, DistCosine>() {
        Ok(hnsw) => hnsw,
        Err(err) => {
            warn!("Ignoring unreadable ANN dump: {err}");
            return Ok(None);
        }
    };
    if hnsw.get_nb_point() != id_map.len() || id_map.len() != meta.count {
        return Ok(None);
    }
    Ok(Some(AnnIndex {
        hnsw,
        id_map,
        params,
        index_path,
    }))
}
