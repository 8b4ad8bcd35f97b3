//! Notifier implementations.

mod http;
mod log;

pub use http::HttpNotifier;
pub use log::LogNotifier;
