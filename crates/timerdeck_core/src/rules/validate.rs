//! Required-field validation.

use crate::model::timer::{FieldErrorState, TimerDefinition, TimerField};

/// Flags every field that is empty after trimming whitespace.
///
/// `duplicate` is never set here. Character filtering is the input layer's
/// job; a `duration` of `"abc"` is only rejected once it was filtered to `""`.
pub fn validate(candidate: &TimerDefinition) -> FieldErrorState {
    let mut errors = FieldErrorState::default();
    for field in TimerField::ALL {
        errors.set_field(field, candidate.field(field).trim().is_empty());
    }
    errors
}
