use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::{Connection, OptionalExtension, params};

use super::state::{AnnIndexMetaRow, AnnIndexParams};
use crate::analysis::encode_f32_le_blob;
use crate::catalog::ItemId;

pub(crate) const ANN_BASENAME: &str = "similarity_hnsw";
const ANN_ID_MAP_SUFFIX: &str = "idmap.json";

pub(crate) fn read_meta(
    conn: &Connection,
    model_id: &str,
) -> Result<Option<AnnIndexMetaRow>, String> {
    let row = conn
        .query_row(
            "SELECT index_path, count, params_json FROM ann_index_meta WHERE model_id = ?1",
            params![model_id],
            |row| {
                let path: String = row.get(0)?;
                let count: i64 = row.get(1)?;
                let params_json: String = row.get(2)?;
                Ok((path, count, params_json))
            },
        )
        .optional()
        .map_err(|err| format!("Failed to read ann_index_meta: {err}"))?;
    let Some((path, count, params_json)) = row else {
        return Ok(None);
    };
    let params: AnnIndexParams =
        serde_json::from_str(&params_json).map_err(|err| format!("{err}"))?;
    Ok(Some(AnnIndexMetaRow {
        index_path: PathBuf::from(path),
        count: count.max(0) as usize,
        params,
    }))
}

pub(crate) fn upsert_meta(
    conn: &Connection,
    index_path: &Path,
    count: usize,
    params: &AnnIndexParams,
) -> Result<(), String> {
    let params_json = serde_json::to_string(params).map_err(|err| format!("{err}"))?;
    conn.execute(
        "INSERT INTO ann_index_meta (model_id, index_path, count, params_json, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(model_id) DO UPDATE SET
           index_path = excluded.index_path,
           count = excluded.count,
           params_json = excluded.params_json,
           updated_at = excluded.updated_at",
        params![
            params.model_id.as_str(),
            index_path.to_string_lossy(),
            count as i64,
            params_json,
            now_epoch_seconds()
        ],
    )
    .map_err(|err| format!("Failed to update ann_index_meta: {err}"))?;
    Ok(())
}

/// Store (or replace) the embedding of one catalog item.
///
/// The ANN index is immutable once loaded; rebuild it to pick up new rows.
pub fn upsert_item_embedding(
    conn: &Connection,
    id: ItemId,
    model_id: &str,
    embedding: &[f32],
) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO item_embeddings (item_id, model_id, dim, vec, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(item_id) DO UPDATE SET
           model_id = excluded.model_id,
           dim = excluded.dim,
           vec = excluded.vec,
           created_at = excluded.created_at",
        params![
            id,
            model_id,
            embedding.len() as i64,
            encode_f32_le_blob(embedding),
            now_epoch_seconds()
        ],
    )?;
    Ok(())
}

/// Number of stored embeddings for a model.
pub fn count_embeddings(conn: &Connection, model_id: &str) -> rusqlite::Result<usize> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM item_embeddings WHERE model_id = ?1",
        params![model_id],
        |row| row.get(0),
    )?;
    Ok(count.max(0) as usize)
}

pub(crate) fn id_map_path_for(index_path: &Path) -> PathBuf {
    let basename = index_path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(ANN_BASENAME);
    let parent = index_path.parent().unwrap_or_else(|| Path::new("."));
    parent.join(format!("{basename}.{ANN_ID_MAP_SUFFIX}"))
}

pub(crate) fn save_id_map(path: &Path, id_map: &[ItemId]) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|err| format!("Failed to create ANN dir: {err}"))?;
    }
    let data = serde_json::to_vec(id_map)
        .map_err(|err| format!("Failed to encode id map: {err}"))?;
    std::fs::write(path, data).map_err(|err| format!("Failed to write id map: {err}"))?;
    Ok(())
}

pub(crate) fn load_id_map(path: &Path) -> Result<Vec<ItemId>, String> {
    let bytes = std::fs::read(path).map_err(|err| format!("Failed to read id map: {err}"))?;
    serde_json::from_slice(&bytes).map_err(|err| format!("Failed to decode id map: {err}"))
}

pub(crate) fn hnsw_dump_paths(index_path: &Path) -> Result<(PathBuf, PathBuf), String> {
    let basename = index_path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| "Index path missing basename".to_string())?;
    let dir = index_path
        .parent()
        .ok_or_else(|| "Index path missing parent".to_string())?;
    let graph = dir.join(format!("{basename}.hnsw.graph"));
    let data = dir.join(format!("{basename}.hnsw.data"));
    Ok((graph, data))
}

fn now_epoch_seconds() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}
