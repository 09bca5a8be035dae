use std::path::Path;

use crate::catalog::CatalogError;

/// Translate rusqlite errors into friendlier `CatalogError` variants.
pub(crate) fn map_sql_error(err: rusqlite::Error) -> CatalogError {
    match err {
        rusqlite::Error::SqliteFailure(sql_err, _)
            if sql_err.code == rusqlite::ErrorCode::DatabaseBusy
                || sql_err.code == rusqlite::ErrorCode::DatabaseLocked =>
        {
            CatalogError::Busy
        }
        rusqlite::Error::InvalidQuery
        | rusqlite::Error::InvalidParameterName(_)
        | rusqlite::Error::MultipleStatement => CatalogError::Unexpected,
        other => CatalogError::Sql(other),
    }
}

/// Build `?1, ?2, ...` for an `IN (...)` clause of `count` parameters.
pub(super) fn placeholders(count: usize) -> String {
    (1..=count)
        .map(|idx| format!("?{idx}"))
        .collect::<Vec<_>>()
        .join(", ")
}

pub(super) fn create_parent_if_needed(path: &Path) -> Result<(), CatalogError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent).map_err(|source| CatalogError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    Ok(())
}
