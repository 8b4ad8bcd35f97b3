//! HTTP handlers.

mod http;
mod intent;

pub use http::{get_room_detail, get_rooms, health_check};
pub use intent::{post_intent, status_for};
