//! Timer collection persistence over one key-value slot.
//!
//! # Responsibility
//! - Load and save the whole timer collection as one JSON array stored
//!   under `TIMER_DATA_KEY`.
//!
//! # Invariants
//! - An absent slot loads as an empty collection.
//! - A malformed slot is reported as `RepoError::CorruptData`, never masked.
//! - `save` replaces the slot wholesale; appending is the caller's job.

use crate::kv::{KeyValueStore, StorageError};
use crate::model::timer::TimerDefinition;
use log::{debug, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Well-known slot holding the serialized timer collection.
pub const TIMER_DATA_KEY: &str = "timerData";

pub type RepoResult<T> = Result<T, RepoError>;

/// Persistence gateway error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoError {
    /// The stored value is not a JSON array of `{name, duration, category}`
    /// string objects.
    CorruptData(String),
    Storage(StorageError),
}

impl RepoError {
    pub fn is_corrupt(&self) -> bool {
        matches!(self, Self::CorruptData(_))
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CorruptData(details) => write!(f, "corrupt timer data: {details}"),
            Self::Storage(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::CorruptData(_) => None,
            Self::Storage(err) => Some(err),
        }
    }
}

impl From<StorageError> for RepoError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

/// Load/save contract for the full timer collection.
pub trait TimerRepository {
    fn load(&self) -> RepoResult<Vec<TimerDefinition>>;
    fn save(&mut self, timers: &[TimerDefinition]) -> RepoResult<()>;
}

/// `TimerRepository` storing the collection in a `KeyValueStore` slot.
pub struct KvTimerRepository<S: KeyValueStore> {
    store: S,
    key: String,
}

impl<S: KeyValueStore> KvTimerRepository<S> {
    /// Uses the default `TIMER_DATA_KEY` slot.
    pub fn new(store: S) -> Self {
        Self::with_key(store, TIMER_DATA_KEY)
    }

    pub fn with_key(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S: KeyValueStore> TimerRepository for KvTimerRepository<S> {
    fn load(&self) -> RepoResult<Vec<TimerDefinition>> {
        let Some(raw) = self.store.get_item(&self.key)? else {
            debug!("event=timer_load module=repo status=empty key={}", self.key);
            return Ok(Vec::new());
        };

        let timers = decode_timers(&raw).inspect_err(|err| {
            warn!(
                "event=timer_load module=repo status=corrupt key={} bytes={} error={}",
                self.key,
                raw.len(),
                err
            );
        })?;
        debug!(
            "event=timer_load module=repo status=ok key={} count={}",
            self.key,
            timers.len()
        );
        Ok(timers)
    }

    fn save(&mut self, timers: &[TimerDefinition]) -> RepoResult<()> {
        let raw = encode_timers(timers)?;
        self.store.set_item(&self.key, &raw)?;
        debug!(
            "event=timer_save module=repo status=ok key={} count={} bytes={}",
            self.key,
            timers.len(),
            raw.len()
        );
        Ok(())
    }
}

/// Decodes a slot value into a timer collection.
pub fn decode_timers(raw: &str) -> RepoResult<Vec<TimerDefinition>> {
    serde_json::from_str::<Vec<TimerDefinition>>(raw)
        .map_err(|err| RepoError::CorruptData(err.to_string()))
}

/// Encodes a timer collection into a slot value.
pub fn encode_timers(timers: &[TimerDefinition]) -> RepoResult<String> {
    serde_json::to_string(timers).map_err(|err| RepoError::CorruptData(err.to_string()))
}
