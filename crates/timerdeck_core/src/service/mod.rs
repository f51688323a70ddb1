//! Timer store use-case services.
//!
//! # Responsibility
//! - Compose validation, duplicate detection and persistence into `submit`.
//! - Keep UI/FFI callers decoupled from storage details.

pub mod shared;
pub mod timer_service;
