//! Core domain logic for TimerDeck.
//! This crate is the single source of truth for timer definition invariants.

pub mod kv;
pub mod logging;
pub mod model;
pub mod repo;
pub mod rules;
pub mod service;

pub use kv::{
    KeyValueStore, MemoryKeyValueStore, SqliteKeyValueStore, StorageError, StorageResult,
};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::draft::TimerDraft;
pub use model::timer::{FieldErrorState, TimerDefinition, TimerField, UnknownFieldError};
pub use repo::timer_repo::{
    KvTimerRepository, RepoError, RepoResult, TimerRepository, TIMER_DATA_KEY,
};
pub use rules::{is_duplicate, validate};
pub use service::shared::SharedTimerService;
pub use service::timer_service::{SubmitError, SubmitOutcome, TimerService};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
