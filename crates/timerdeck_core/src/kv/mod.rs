//! Durable local key-value storage.
//!
//! # Responsibility
//! - Define the string-keyed, string-valued storage contract used by
//!   persistence gateways.
//! - Classify storage failures into "unavailable" and "quota exceeded".
//!
//! # Invariants
//! - `set_item` is a full overwrite: after `Ok(())` the key holds exactly the
//!   new value; after `Err(_)` it still holds the previous one.
//! - A missing key is `Ok(None)`, never an error.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod memory_store;
mod sqlite_store;

pub use memory_store::MemoryKeyValueStore;
pub use sqlite_store::{SqliteKeyValueStore, STORE_LAYOUT_VERSION};

pub type StorageResult<T> = Result<T, StorageError>;

/// Failure of the underlying durable store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Device storage could not be read or written.
    Unavailable(String),
    /// The write would exceed the store's size limit.
    QuotaExceeded {
        key: String,
        attempted_bytes: usize,
        /// `None` when the device itself reported it is full.
        limit_bytes: Option<usize>,
    },
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(details) => write!(f, "storage unavailable: {details}"),
            Self::QuotaExceeded {
                key,
                attempted_bytes,
                limit_bytes: Some(limit),
            } => write!(
                f,
                "storage quota exceeded for `{key}`: {attempted_bytes} bytes > limit {limit}"
            ),
            Self::QuotaExceeded {
                key,
                attempted_bytes,
                limit_bytes: None,
            } => write!(
                f,
                "storage quota exceeded for `{key}`: device full while writing {attempted_bytes} bytes"
            ),
        }
    }
}

impl Error for StorageError {}

impl StorageError {
    /// Stable code for logs and FFI envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unavailable(_) => "storage_unavailable",
            Self::QuotaExceeded { .. } => "storage_quota",
        }
    }
}

/// String key-value storage with whole-value overwrite semantics.
pub trait KeyValueStore {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>>;
    fn set_item(&mut self, key: &str, value: &str) -> StorageResult<()>;
    fn remove_item(&mut self, key: &str) -> StorageResult<()>;
}

pub(crate) fn check_quota(
    key: &str,
    value: &str,
    limit_bytes: Option<usize>,
) -> StorageResult<()> {
    match limit_bytes {
        Some(limit) if value.len() > limit => Err(StorageError::QuotaExceeded {
            key: key.to_string(),
            attempted_bytes: value.len(),
            limit_bytes: Some(limit),
        }),
        _ => Ok(()),
    }
}
