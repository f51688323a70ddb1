//! In-progress timer form input.
//!
//! # Responsibility
//! - Hold the candidate being edited before it is submitted.
//! - Apply input-layer rules on every edit: digit filtering for `duration`
//!   and per-field max length.
//!
//! # Invariants
//! - `duration` holds ASCII digits only.
//! - No field exceeds `TimerField::max_chars` characters.

use super::timer::{digits_only, truncate_chars, TimerDefinition, TimerField};

/// Candidate timer being edited by the form collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimerDraft {
    values: TimerDefinition,
}

impl TimerDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces one field with `raw` after input-layer normalization.
    ///
    /// Returns the value actually stored.
    pub fn set_field(&mut self, field: TimerField, raw: &str) -> &str {
        let value = normalize_input(field, raw);
        let slot = self.values.field_mut(field);
        *slot = value;
        slot.as_str()
    }

    pub fn field(&self, field: TimerField) -> &str {
        self.values.field(field)
    }

    /// Returns the candidate as entered (not yet trimmed).
    pub fn as_candidate(&self) -> &TimerDefinition {
        &self.values
    }

    pub fn clear(&mut self) {
        self.values = TimerDefinition::default();
    }
}

/// Applies the per-field input rules to one raw edit.
pub fn normalize_input(field: TimerField, raw: &str) -> String {
    let filtered = match field {
        TimerField::Duration => digits_only(raw),
        TimerField::Name | TimerField::Category => raw.to_string(),
    };
    truncate_chars(&filtered, field.max_chars())
}

#[cfg(test)]
mod tests {
    use super::{normalize_input, TimerDraft};
    use crate::model::timer::TimerField;

    #[test]
    fn duration_keeps_digits_only() {
        assert_eq!(normalize_input(TimerField::Duration, "1a2-3.4"), "1234");
        assert_eq!(normalize_input(TimerField::Duration, "abc"), "");
    }

    #[test]
    fn fields_are_capped_to_max_chars() {
        let long = "x".repeat(60);
        assert_eq!(normalize_input(TimerField::Name, &long).chars().count(), 48);
        assert_eq!(normalize_input(TimerField::Duration, "1234567"), "12345");
    }

    #[test]
    fn cap_counts_characters_not_bytes() {
        let accented = "é".repeat(50);
        let capped = normalize_input(TimerField::Category, &accented);
        assert_eq!(capped.chars().count(), 48);
    }

    #[test]
    fn set_field_stores_normalized_value() {
        let mut draft = TimerDraft::new();
        assert_eq!(draft.set_field(TimerField::Duration, " 90s "), "90");
        draft.set_field(TimerField::Name, " Tea ");

        assert_eq!(draft.field(TimerField::Duration), "90");
        assert_eq!(draft.field(TimerField::Name), " Tea ");

        draft.clear();
        assert_eq!(draft.as_candidate().name, "");
    }
}
