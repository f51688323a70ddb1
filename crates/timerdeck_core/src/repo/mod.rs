//! Persistence gateways between in-memory collections and durable storage.
//!
//! # Responsibility
//! - Define the load/save contract used by the timer service.
//! - Keep the slot encoding (JSON) out of service orchestration.
//!
//! # Invariants
//! - Load paths reject malformed persisted state instead of masking it.

pub mod timer_repo;
