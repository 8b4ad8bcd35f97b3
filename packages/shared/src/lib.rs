//! Shared utilities for the jinro workspace: logging bootstrap and time helpers.

pub mod logger;
pub mod time;
