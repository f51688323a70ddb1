//! FFI use-case API for the Flutter timer screens.
//!
//! # Responsibility
//! - Expose the add-timer form (field edits, submit) and the saved timer
//!   list to Dart via FRB.
//! - Translate core outcomes and errors into plain response envelopes.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - One timer store session per process; all calls share its cache and
//!   form state.

use log::warn;
use once_cell::sync::OnceCell;
use std::path::PathBuf;
use std::sync::OnceLock;
use timerdeck_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    FieldErrorState, KvTimerRepository, SharedTimerService, SqliteKeyValueStore, SubmitError,
    SubmitOutcome, TimerDefinition, TimerField, TimerService,
};

const TIMER_DB_FILE_NAME: &str = "timerdeck.sqlite3";
const TIMER_DB_PATH_ENV: &str = "TIMERDECK_DB_PATH";

type Session = SharedTimerService<KvTimerRepository<SqliteKeyValueStore>>;

static TIMER_DB_PATH: OnceLock<PathBuf> = OnceLock::new();
static TIMER_SESSION: OnceCell<Session> = OnceCell::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir`.
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Inline error flags for the add-timer form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimerFormErrors {
    pub name: bool,
    pub duration: bool,
    pub category: bool,
    pub duplicate: bool,
}

impl From<FieldErrorState> for TimerFormErrors {
    fn from(value: FieldErrorState) -> Self {
        Self {
            name: value.name,
            duration: value.duration,
            category: value.category,
            duplicate: value.duplicate,
        }
    }
}

/// Response envelope for one field edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerFieldResponse {
    /// Whether the edit was applied.
    pub ok: bool,
    /// Value stored after input normalization (digits only, max length).
    pub value: String,
    /// Flags to render after this edit.
    pub errors: TimerFormErrors,
    /// Empty on success; diagnostic text otherwise.
    pub message: String,
}

/// Response envelope for a form submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerSubmitResponse {
    /// `true` only when the timer was persisted; the UI navigates away.
    pub ok: bool,
    /// Flags to render when the timer was rejected.
    pub errors: TimerFormErrors,
    /// Stable failure code (`storage_unavailable|storage_quota|corrupt_data|busy|session`).
    pub error_code: Option<String>,
    /// Human-readable message for diagnostics/UI.
    pub message: String,
}

impl TimerSubmitResponse {
    fn failure(code: &str, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            errors: TimerFormErrors::default(),
            error_code: Some(code.to_string()),
            message: message.into(),
        }
    }
}

/// Saved timer projection for the list screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerItem {
    pub name: String,
    pub duration: String,
    pub category: String,
    /// Parsed duration; `None` when the stored value is not a positive integer.
    pub duration_secs: Option<u32>,
}

/// Response envelope for the saved timer list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerListResponse {
    /// Saved timers in insertion order.
    pub items: Vec<TimerItem>,
    /// Set when unreadable saved data was replaced by an empty list.
    pub data_loss_warning: Option<String>,
    pub message: String,
}

/// Applies one add-timer field edit.
///
/// `field` is one of `name|duration|category`.
///
/// # FFI contract
/// - Sync call; no storage I/O after the session is open.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn timer_form_set_field(field: String, value: String) -> TimerFieldResponse {
    let parsed = match TimerField::parse(&field) {
        Ok(parsed) => parsed,
        Err(err) => return field_failure(err.to_string()),
    };
    let session = match session() {
        Ok(session) => session,
        Err(err) => return field_failure(err),
    };

    session.with(|service| {
        let errors = service.set_field(parsed, &value);
        TimerFieldResponse {
            ok: true,
            value: service.draft().field(parsed).to_string(),
            errors: errors.into(),
            message: String::new(),
        }
    })
}

/// Submits the add-timer form.
///
/// # FFI contract
/// - Sync call, DB-backed execution; returns only after the write settled.
/// - A second submit while one is persisting returns `error_code=busy`.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn timer_form_submit() -> TimerSubmitResponse {
    let session = match session() {
        Ok(session) => session,
        Err(err) => return TimerSubmitResponse::failure("session", err),
    };

    match session.submit_draft() {
        Ok(SubmitOutcome::Accepted(_)) => TimerSubmitResponse {
            ok: true,
            errors: TimerFormErrors::default(),
            error_code: None,
            message: "Timer saved.".to_string(),
        },
        Ok(SubmitOutcome::Rejected(errors)) => TimerSubmitResponse {
            ok: false,
            errors: errors.into(),
            error_code: None,
            message: rejection_message(errors).to_string(),
        },
        Err(err) => {
            warn!("event=ffi_timer_submit module=ffi status=error error={err}");
            TimerSubmitResponse::failure(submit_error_code(&err), err.to_string())
        }
    }
}

/// Lists saved timers.
///
/// # FFI contract
/// - Sync call; served from the session cache.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn timer_list() -> TimerListResponse {
    let session = match session() {
        Ok(session) => session,
        Err(err) => {
            return TimerListResponse {
                items: Vec::new(),
                data_loss_warning: None,
                message: format!("timer_list failed: {err}"),
            }
        }
    };

    session.with(|service| {
        let items = service
            .definitions()
            .iter()
            .map(to_timer_item)
            .collect::<Vec<_>>();
        let message = if items.is_empty() {
            "No timers yet.".to_string()
        } else {
            format!("{} timer(s).", items.len())
        };
        TimerListResponse {
            items,
            data_loss_warning: service.load_issue().map(|issue| issue.to_string()),
            message,
        }
    })
}

fn session() -> Result<&'static Session, String> {
    TIMER_SESSION.get_or_try_init(|| {
        let db_path = resolve_timer_db_path();
        let store = SqliteKeyValueStore::open(&db_path)
            .map_err(|err| format!("timer store open failed: {err}"))?;
        let service = TimerService::open(KvTimerRepository::new(store))
            .map_err(|err| format!("timer store load failed: {err}"))?;
        Ok(SharedTimerService::new(service))
    })
}

fn resolve_timer_db_path() -> PathBuf {
    TIMER_DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var(TIMER_DB_PATH_ENV) {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(TIMER_DB_FILE_NAME)
        })
        .clone()
}

fn field_failure(message: String) -> TimerFieldResponse {
    TimerFieldResponse {
        ok: false,
        value: String::new(),
        errors: TimerFormErrors::default(),
        message,
    }
}

fn rejection_message(errors: FieldErrorState) -> &'static str {
    if errors.duplicate {
        "Timer already exists. Please check name and category."
    } else {
        "Please fill in all required fields."
    }
}

fn submit_error_code(err: &SubmitError) -> &'static str {
    match err {
        SubmitError::Busy => "busy",
        SubmitError::Repo(repo_err) => match err.storage_error() {
            Some(storage_err) => storage_err.code(),
            None if repo_err.is_corrupt() => "corrupt_data",
            None => "storage_unavailable",
        },
    }
}

fn to_timer_item(timer: &TimerDefinition) -> TimerItem {
    TimerItem {
        name: timer.name.clone(),
        duration: timer.duration.clone(),
        category: timer.category.clone(),
        duration_secs: timer.duration_secs(),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        core_version, init_logging, ping, submit_error_code, timer_form_set_field,
        timer_form_submit, timer_list,
    };
    use std::sync::Mutex;
    use std::time::{SystemTime, UNIX_EPOCH};
    use timerdeck_core::{RepoError, StorageError, SubmitError};

    // Form state is process-wide; keep form tests from interleaving.
    static FORM_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), String::new());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "tmp/logs".to_string());
        assert!(!error.is_empty());
    }

    #[test]
    fn set_field_rejects_unknown_key() {
        let response = timer_form_set_field("color".to_string(), "red".to_string());
        assert!(!response.ok);
        assert!(response.message.contains("color"));
    }

    #[test]
    fn set_field_filters_duration_digits() {
        let _guard = FORM_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let response = timer_form_set_field("duration".to_string(), "9a0s".to_string());
        assert!(response.ok, "{}", response.message);
        assert_eq!(response.value, "90");
        assert!(!response.errors.duration);
    }

    #[test]
    fn submit_saves_then_flags_duplicate() {
        let _guard = FORM_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let name = unique_token("tea");

        fill_form(&name, "180", "Kitchen");
        let saved = timer_form_submit();
        assert!(saved.ok, "{}", saved.message);
        assert!(timer_list().items.iter().any(|item| item.name == name
            && item.duration_secs == Some(180)));

        fill_form(&name.to_ascii_uppercase(), "60", "kitchen");
        let duplicate = timer_form_submit();
        assert!(!duplicate.ok);
        assert!(duplicate.errors.duplicate);
        assert_eq!(duplicate.error_code, None);
    }

    #[test]
    fn submit_with_blank_fields_flags_them() {
        let _guard = FORM_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        fill_form("", "60", "Work");

        let response = timer_form_submit();
        assert!(!response.ok);
        assert!(response.errors.name);
        assert!(!response.errors.duration);
        assert!(!response.errors.category);
    }

    #[test]
    fn submit_error_codes_are_stable() {
        assert_eq!(submit_error_code(&SubmitError::Busy), "busy");
        let unavailable =
            SubmitError::Repo(RepoError::Storage(StorageError::Unavailable("x".to_string())));
        assert_eq!(submit_error_code(&unavailable), "storage_unavailable");
        let corrupt = SubmitError::Repo(RepoError::CorruptData("x".to_string()));
        assert_eq!(submit_error_code(&corrupt), "corrupt_data");
    }

    fn fill_form(name: &str, duration: &str, category: &str) {
        for (field, value) in [("name", name), ("duration", duration), ("category", category)] {
            let response = timer_form_set_field(field.to_string(), value.to_string());
            assert!(response.ok, "{}", response.message);
        }
    }

    fn unique_token(prefix: &str) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time went backwards")
            .as_nanos();
        format!("{prefix}-{nanos}")
    }
}
