//! Flutter-facing bridge for the TimerDeck core.

pub mod api;
