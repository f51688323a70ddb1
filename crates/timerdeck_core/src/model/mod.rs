//! Domain model for saved countdown timers.
//!
//! # Responsibility
//! - Define the timer definition record persisted in the timer slot.
//! - Define transient form types (draft input, field error flags).
//!
//! # Invariants
//! - Only `TimerDefinition` is persisted; drafts and error flags are
//!   session-local.

pub mod draft;
pub mod timer;
