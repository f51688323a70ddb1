//! Pure checks applied to a timer candidate before it is persisted.
//!
//! # Responsibility
//! - Required-field validation (`validate`).
//! - Duplicate detection against an existing collection (`is_duplicate`).
//!
//! # Invariants
//! - Checks are pure: no I/O, no logging, deterministic output.

pub mod duplicate;
pub mod validate;

pub use duplicate::is_duplicate;
pub use validate::validate;
