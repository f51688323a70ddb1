//! SQLite-backed key-value store.
//!
//! # Responsibility
//! - Persist string items in the `kv_items` table.
//! - Create that table on first open and refuse files written by a newer
//!   store layout.
//! - Translate SQLite failures into `StorageError` classes.
//!
//! # Invariants
//! - Each write is one upsert statement, so a failed write leaves the
//!   previous value in place.
//! - A store is only handed out once `kv_items` exists and the file's
//!   `PRAGMA user_version` equals `STORE_LAYOUT_VERSION`.

use super::{check_quota, KeyValueStore, StorageError, StorageResult};
use log::{error, info};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use std::path::Path;
use std::time::{Duration, Instant};

/// Layout version written to `PRAGMA user_version` of new store files.
pub const STORE_LAYOUT_VERSION: u32 = 1;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const CREATE_KV_ITEMS: &str = "
CREATE TABLE IF NOT EXISTS kv_items (
    key TEXT PRIMARY KEY NOT NULL,
    value TEXT NOT NULL,
    updated_at INTEGER NOT NULL DEFAULT (CAST(strftime('%s', 'now') AS INTEGER) * 1000)
);";

/// Durable `KeyValueStore` over one SQLite connection.
pub struct SqliteKeyValueStore {
    conn: Connection,
    max_value_bytes: Option<usize>,
}

impl SqliteKeyValueStore {
    /// Opens (or creates) the store file at `path`.
    ///
    /// # Errors
    /// - `StorageError::Unavailable` when the file cannot be opened, the
    ///   table cannot be created, or the file uses a newer layout.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref();
        Self::open_with("file", || Connection::open(path))
    }

    /// Opens a store that lives only as long as this value.
    pub fn open_in_memory() -> StorageResult<Self> {
        Self::open_with("memory", Connection::open_in_memory)
    }

    /// Wraps an existing connection, creating `kv_items` when missing.
    pub fn try_new(conn: Connection) -> StorageResult<Self> {
        prepare_connection(&conn)?;
        Ok(Self {
            conn,
            max_value_bytes: None,
        })
    }

    /// Rejects values larger than `limit` bytes with `QuotaExceeded`.
    pub fn with_max_value_bytes(mut self, limit: usize) -> Self {
        self.max_value_bytes = Some(limit);
        self
    }

    /// Underlying connection, for diagnostics.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn open_with(
        mode: &'static str,
        connect: impl FnOnce() -> rusqlite::Result<Connection>,
    ) -> StorageResult<Self> {
        let started_at = Instant::now();
        let result = connect()
            .map_err(|err| StorageError::Unavailable(format!("open failed: {err}")))
            .and_then(Self::try_new);

        match &result {
            Ok(_) => info!(
                "event=kv_open module=kv status=ok mode={mode} duration_ms={}",
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=kv_open module=kv status=error mode={mode} duration_ms={} error={}",
                started_at.elapsed().as_millis(),
                err
            ),
        }
        result
    }
}

fn prepare_connection(conn: &Connection) -> StorageResult<()> {
    let layout: u32 = conn
        .busy_timeout(BUSY_TIMEOUT)
        .and_then(|()| conn.query_row("PRAGMA user_version;", [], |row| row.get(0)))
        .map_err(setup_failed)?;
    if layout > STORE_LAYOUT_VERSION {
        return Err(StorageError::Unavailable(format!(
            "store layout version {layout} is newer than supported {STORE_LAYOUT_VERSION}"
        )));
    }
    if layout == STORE_LAYOUT_VERSION {
        return Ok(());
    }

    let tx = conn.unchecked_transaction().map_err(setup_failed)?;
    tx.execute_batch(CREATE_KV_ITEMS)
        .and_then(|()| tx.pragma_update(None, "user_version", STORE_LAYOUT_VERSION))
        .map_err(setup_failed)?;
    tx.commit().map_err(setup_failed)?;
    info!("event=kv_layout module=kv status=created version={STORE_LAYOUT_VERSION}");
    Ok(())
}

fn setup_failed(err: rusqlite::Error) -> StorageError {
    StorageError::Unavailable(format!("setup failed: {err}"))
}

impl KeyValueStore for SqliteKeyValueStore {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        self.conn
            .query_row(
                "SELECT value FROM kv_items WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .map_err(|err| map_sqlite_error("get_item", key, 0, err))
    }

    fn set_item(&mut self, key: &str, value: &str) -> StorageResult<()> {
        check_quota(key, value, self.max_value_bytes)?;
        self.conn
            .execute(
                "INSERT INTO kv_items (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = CAST(strftime('%s', 'now') AS INTEGER) * 1000;",
                params![key, value],
            )
            .map(|_| ())
            .map_err(|err| map_sqlite_error("set_item", key, value.len(), err))
    }

    fn remove_item(&mut self, key: &str) -> StorageResult<()> {
        self.conn
            .execute("DELETE FROM kv_items WHERE key = ?1;", [key])
            .map(|_| ())
            .map_err(|err| map_sqlite_error("remove_item", key, 0, err))
    }
}

fn map_sqlite_error(
    op: &'static str,
    key: &str,
    attempted_bytes: usize,
    err: rusqlite::Error,
) -> StorageError {
    let mapped = match err.sqlite_error_code() {
        Some(ErrorCode::DiskFull) => StorageError::QuotaExceeded {
            key: key.to_string(),
            attempted_bytes,
            limit_bytes: None,
        },
        _ => StorageError::Unavailable(err.to_string()),
    };
    error!(
        "event=kv_io module=kv status=error op={op} error_code={} error={}",
        mapped.code(),
        err
    );
    mapped
}
