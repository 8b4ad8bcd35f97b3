//! UI layer: the HTTP surface the chat dispatcher talks to.

pub mod handler;
pub mod server;
pub mod signal;
pub mod state;

pub use server::Server;
