//! Timer definition domain model.
//!
//! # Responsibility
//! - Define the saved timer template shared by the store and its callers.
//! - Define the per-field error flags rendered by the form collaborator.
//!
//! # Invariants
//! - Stored definitions are trimmed and length-capped
//!   (`TimerDefinition::normalized`).
//! - `duration` only ever holds ASCII digits once it passed the input layer.
//! - Within one persisted collection, `(category, name)` is unique under
//!   ASCII case-insensitive comparison (enforced by the service layer).

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Maximum accepted `name` length, in characters.
pub const NAME_MAX_CHARS: usize = 48;
/// Maximum accepted `duration` length, in characters.
pub const DURATION_MAX_CHARS: usize = 5;
/// Maximum accepted `category` length, in characters.
pub const CATEGORY_MAX_CHARS: usize = 48;

/// Named, categorized countdown template.
///
/// All fields stay strings on the wire so the slot format matches what the
/// form collaborator edits; use [`TimerDefinition::duration_secs`] to get a
/// number.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerDefinition {
    pub name: String,
    /// Seconds, as ASCII digits.
    pub duration: String,
    pub category: String,
}

impl TimerDefinition {
    pub fn new(
        name: impl Into<String>,
        duration: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            duration: duration.into(),
            category: category.into(),
        }
    }

    /// Returns the canonical stored form.
    ///
    /// Trims every field, strips non-digits from `duration`, then caps each
    /// field at `TimerField::max_chars` characters.
    pub fn normalized(&self) -> Self {
        Self {
            name: trim_capped(&self.name, NAME_MAX_CHARS),
            duration: truncate_chars(&digits_only(&self.duration), DURATION_MAX_CHARS),
            category: trim_capped(&self.category, CATEGORY_MAX_CHARS),
        }
    }

    /// Returns one field value by key.
    pub fn field(&self, field: TimerField) -> &str {
        match field {
            TimerField::Name => &self.name,
            TimerField::Duration => &self.duration,
            TimerField::Category => &self.category,
        }
    }

    pub(crate) fn field_mut(&mut self, field: TimerField) -> &mut String {
        match field {
            TimerField::Name => &mut self.name,
            TimerField::Duration => &mut self.duration,
            TimerField::Category => &mut self.category,
        }
    }

    /// Parses `duration` as whole seconds.
    ///
    /// Returns `None` for empty, zero, overflowing or non-digit values, so a
    /// countdown caller never starts a zero-length timer.
    pub fn duration_secs(&self) -> Option<u32> {
        let trimmed = self.duration.trim();
        if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        trimmed.parse::<u32>().ok().filter(|secs| *secs > 0)
    }
}

/// Editable field of a timer definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerField {
    Name,
    Duration,
    Category,
}

impl TimerField {
    /// Every field, in form order.
    pub const ALL: [TimerField; 3] = [Self::Name, Self::Duration, Self::Category];

    /// Stable key used by the form collaborator.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Duration => "duration",
            Self::Category => "category",
        }
    }

    /// Maximum input length in characters.
    pub fn max_chars(self) -> usize {
        match self {
            Self::Name => NAME_MAX_CHARS,
            Self::Duration => DURATION_MAX_CHARS,
            Self::Category => CATEGORY_MAX_CHARS,
        }
    }

    /// Parses a field key (`name|duration|category`).
    pub fn parse(raw: &str) -> Result<Self, UnknownFieldError> {
        match raw.trim() {
            "name" => Ok(Self::Name),
            "duration" => Ok(Self::Duration),
            "category" => Ok(Self::Category),
            other => Err(UnknownFieldError(other.to_string())),
        }
    }
}

impl Display for TimerField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field key outside `name|duration|category`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownFieldError(pub String);

impl Display for UnknownFieldError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unknown timer field `{}`; expected name|duration|category",
            self.0
        )
    }
}

impl Error for UnknownFieldError {}

/// Per-field error flags from the last validation attempt.
///
/// Transient and UI-facing; never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldErrorState {
    pub name: bool,
    pub duration: bool,
    pub category: bool,
    pub duplicate: bool,
}

impl FieldErrorState {
    /// Flags only `duplicate`.
    pub fn duplicate() -> Self {
        Self {
            duplicate: true,
            ..Self::default()
        }
    }

    /// Returns whether any flag is raised.
    pub fn has_errors(&self) -> bool {
        self.name || self.duration || self.category || self.duplicate
    }

    /// Returns whether any required-field flag is raised.
    pub fn has_missing_fields(&self) -> bool {
        self.name || self.duration || self.category
    }

    /// Returns the flag for one field.
    pub fn for_field(&self, field: TimerField) -> bool {
        match field {
            TimerField::Name => self.name,
            TimerField::Duration => self.duration,
            TimerField::Category => self.category,
        }
    }

    pub(crate) fn set_field(&mut self, field: TimerField, missing: bool) {
        match field {
            TimerField::Name => self.name = missing,
            TimerField::Duration => self.duration = missing,
            TimerField::Category => self.category = missing,
        }
    }
}

pub(crate) fn digits_only(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

pub(crate) fn truncate_chars(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}

fn trim_capped(value: &str, max_chars: usize) -> String {
    truncate_chars(value.trim(), max_chars).trim_end().to_string()
}
