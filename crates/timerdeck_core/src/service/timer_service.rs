//! Timer definition store.
//!
//! # Responsibility
//! - Own the session cache of saved timers, loaded once at open.
//! - Run `submit`: normalize, validate, reject duplicates, persist.
//! - Hold the form session state (draft + field error flags).
//!
//! # Invariants
//! - The cache always equals the last successfully persisted collection:
//!   it is replaced only after `save` returns `Ok`.
//! - Rejected submits never touch storage.
//! - Cached `(category, name)` pairs stay unique under ASCII case folding.

use crate::kv::StorageError;
use crate::model::draft::TimerDraft;
use crate::model::timer::{FieldErrorState, TimerDefinition, TimerField};
use crate::repo::timer_repo::{RepoError, RepoResult, TimerRepository};
use crate::rules::{is_duplicate, validate};
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result of a submit that reached a decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Persisted; carries the normalized definition that was appended.
    Accepted(TimerDefinition),
    /// Not persisted; carries the flags to render.
    Rejected(FieldErrorState),
}

impl SubmitOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }
}

/// Submit failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    /// The write did not happen; the cache was left as it was.
    Repo(RepoError),
    /// Another submit on the same shared store is still persisting.
    Busy,
}

impl SubmitError {
    /// Storage-layer cause, when there is one.
    pub fn storage_error(&self) -> Option<&StorageError> {
        match self {
            Self::Repo(RepoError::Storage(err)) => Some(err),
            _ => None,
        }
    }
}

impl Display for SubmitError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "could not save timer: {err}"),
            Self::Busy => write!(f, "a timer save is already in progress"),
        }
    }
}

impl Error for SubmitError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Busy => None,
        }
    }
}

impl From<RepoError> for SubmitError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Session-scoped store of timer definitions.
pub struct TimerService<R: TimerRepository> {
    repo: R,
    timers: Vec<TimerDefinition>,
    draft: TimerDraft,
    field_errors: FieldErrorState,
    load_issue: Option<RepoError>,
}

impl<R: TimerRepository> TimerService<R> {
    /// Opens the store and loads the saved collection into the cache.
    ///
    /// Corrupt saved data is recovered as an empty collection and kept in
    /// [`TimerService::load_issue`]; any other load failure is returned.
    pub fn open(repo: R) -> RepoResult<Self> {
        let (timers, load_issue) = load_or_recover(&repo)?;
        info!(
            "event=timer_store_open module=service status=ok count={} recovered={}",
            timers.len(),
            load_issue.is_some()
        );
        Ok(Self {
            repo,
            timers,
            draft: TimerDraft::new(),
            field_errors: FieldErrorState::default(),
            load_issue,
        })
    }

    /// Saved timers in insertion order.
    pub fn definitions(&self) -> &[TimerDefinition] {
        &self.timers
    }

    /// Corrupt-data error recovered by the last load, if any.
    ///
    /// The slot still holds the unreadable value until the next successful
    /// submit overwrites it.
    pub fn load_issue(&self) -> Option<&RepoError> {
        self.load_issue.as_ref()
    }

    /// Re-reads the saved collection, replacing the cache.
    ///
    /// Same corrupt-data policy as [`TimerService::open`]. On a storage
    /// failure the cache is left unchanged.
    pub fn reload(&mut self) -> RepoResult<&[TimerDefinition]> {
        let (timers, load_issue) = load_or_recover(&self.repo)?;
        self.timers = timers;
        self.load_issue = load_issue;
        Ok(&self.timers)
    }

    /// Validates, de-duplicates and persists one candidate.
    ///
    /// # Contract
    /// - Any field empty after trimming -> `Rejected` with those fields set.
    /// - Same `(category, name)` as a saved timer -> `Rejected` with only
    ///   `duplicate` set.
    /// - Otherwise the normalized candidate is appended and the whole
    ///   collection saved; `Accepted` is returned only after the write.
    ///
    /// # Errors
    /// - `SubmitError::Repo` when the write fails; nothing is cached and the
    ///   field flags are cleared.
    pub fn submit(&mut self, candidate: &TimerDefinition) -> Result<SubmitOutcome, SubmitError> {
        let candidate = candidate.normalized();

        let errors = validate(&candidate);
        if errors.has_missing_fields() {
            info!(
                "event=timer_submit module=service status=rejected reason=missing_fields name={} duration={} category={}",
                errors.name, errors.duration, errors.category
            );
            self.field_errors = errors;
            return Ok(SubmitOutcome::Rejected(errors));
        }

        if is_duplicate(&candidate, &self.timers) {
            info!("event=timer_submit module=service status=rejected reason=duplicate");
            self.field_errors = FieldErrorState::duplicate();
            return Ok(SubmitOutcome::Rejected(self.field_errors));
        }

        let mut next = Vec::with_capacity(self.timers.len() + 1);
        next.extend_from_slice(&self.timers);
        next.push(candidate.clone());

        if let Err(err) = self.repo.save(&next) {
            error!(
                "event=timer_submit module=service status=error count={} error={}",
                self.timers.len(),
                err
            );
            self.field_errors = FieldErrorState::default();
            return Err(err.into());
        }

        self.timers = next;
        self.field_errors = FieldErrorState::default();
        self.load_issue = None;
        info!(
            "event=timer_submit module=service status=accepted count={}",
            self.timers.len()
        );
        Ok(SubmitOutcome::Accepted(candidate))
    }

    /// Applies one form edit to the draft and returns the updated flags.
    ///
    /// The edited field is flagged iff it is empty after trimming; the
    /// `duplicate` flag is cleared. Other field flags are kept.
    pub fn set_field(&mut self, field: TimerField, raw: &str) -> FieldErrorState {
        let missing = self.draft.set_field(field, raw).trim().is_empty();
        self.field_errors.set_field(field, missing);
        self.field_errors.duplicate = false;
        self.field_errors
    }

    /// Submits the current draft; clears the form when accepted.
    pub fn submit_draft(&mut self) -> Result<SubmitOutcome, SubmitError> {
        let candidate = self.draft.as_candidate().clone();
        let outcome = self.submit(&candidate)?;
        if outcome.is_accepted() {
            self.draft.clear();
        }
        Ok(outcome)
    }

    pub fn draft(&self) -> &TimerDraft {
        &self.draft
    }

    /// Flags from the last edit or submit.
    pub fn field_errors(&self) -> FieldErrorState {
        self.field_errors
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }
}

fn load_or_recover<R: TimerRepository>(
    repo: &R,
) -> RepoResult<(Vec<TimerDefinition>, Option<RepoError>)> {
    match repo.load() {
        Ok(timers) => Ok((timers, None)),
        Err(err) if err.is_corrupt() => {
            warn!(
                "event=timer_store_load module=service status=recovered fallback=empty error={}",
                err
            );
            Ok((Vec::new(), Some(err)))
        }
        Err(err) => Err(err),
    }
}
