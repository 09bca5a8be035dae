use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use rusqlite::{Connection, OpenFlags};

use super::CatalogError;

/// `CatalogStore` queries.
mod read;
/// SQLite schema management for catalog databases.
pub mod schema;
/// Helpers used by tooling and tests to populate a catalog.
pub mod write;

mod util;


/// Number of ids bound per `IN (...)` statement.
pub(crate) const ID_CHUNK: usize = 500;

/// SQLite catalog shared by request threads.
///
/// The connection is guarded by a mutex; each trait call holds it for the
/// duration of a single query batch.
pub struct SqliteCatalog {
    connection: Mutex<Connection>,
    path: PathBuf,
}

impl SqliteCatalog {
    /// Open (or create) a catalog database and apply the schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        util::create_parent_if_needed(path)?;
        let connection = Connection::open(path)?;
        apply_pragmas(&connection)?;
        schema::apply_schema(&connection)?;
        Ok(Self::wrap(connection, path))
    }

    /// Open an existing catalog read-only, without schema changes.
    pub fn open_read_only(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(CatalogError::MissingDatabase(path.to_path_buf()));
        }
        let connection = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
        apply_read_only_pragmas(&connection)?;
        Ok(Self::wrap(connection, path))
    }

    /// Open a read-write connection with the schema applied, for index tooling.
    pub fn open_connection(path: impl AsRef<Path>) -> Result<Connection, CatalogError> {
        let catalog = Self::open(path)?;
        catalog.into_connection()
    }

    /// Return the path backing this catalog.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn wrap(connection: Connection, path: &Path) -> Self {
        Self {
            connection: Mutex::new(connection),
            path: path.to_path_buf(),
        }
    }

    fn into_connection(self) -> Result<Connection, CatalogError> {
        self.connection
            .into_inner()
            .map_err(|_| CatalogError::LockPoisoned)
    }

    pub(crate) fn lock(&self) -> Result<MutexGuard<'_, Connection>, CatalogError> {
        self.connection.lock().map_err(|_| CatalogError::LockPoisoned)
    }
}

fn apply_pragmas(connection: &Connection) -> Result<(), CatalogError> {
    connection
        .execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys=ON;
             PRAGMA busy_timeout=5000;
             PRAGMA temp_store=MEMORY;",
        )
        .map_err(util::map_sql_error)
}

fn apply_read_only_pragmas(connection: &Connection) -> Result<(), CatalogError> {
    connection
        .execute_batch(
            "PRAGMA busy_timeout=5000;
             PRAGMA temp_store=MEMORY;
             PRAGMA cache_size=-32000;",
        )
        .map_err(util::map_sql_error)
}
