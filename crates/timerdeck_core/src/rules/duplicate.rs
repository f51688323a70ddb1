//! Duplicate detection over `(category, name)`.

use crate::model::timer::TimerDefinition;

/// Returns whether `existing` already holds a definition with the same
/// category and name.
///
/// Both sides are trimmed and compared with ASCII case folding only:
/// `"TEA"` matches `"tea"`, but `"ÄPFEL"` does not match `"äpfel"`.
pub fn is_duplicate(candidate: &TimerDefinition, existing: &[TimerDefinition]) -> bool {
    let name = candidate.name.trim();
    let category = candidate.category.trim();
    existing.iter().any(|entry| {
        entry.category.trim().eq_ignore_ascii_case(category)
            && entry.name.trim().eq_ignore_ascii_case(name)
    })
}
