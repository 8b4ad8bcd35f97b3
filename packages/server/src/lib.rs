//! One-night werewolf game session server.
//!
//! A chat dispatcher posts pre-classified intents; this crate runs the
//! rooms, phases and timers and pushes structured notices back out.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub mod config;
