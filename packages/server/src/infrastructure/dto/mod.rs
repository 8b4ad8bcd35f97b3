//! Data Transfer Objects (DTOs).
//!
//! - `http`: intent endpoint and debug API bodies
//! - `push`: outbound notice envelope

pub mod conversion;
pub mod http;
pub mod push;

pub use http::{ErrorResponse, IntentRequest, RoomSummaryDto};
pub use push::{PushRecipient, PushRequest, RecipientKind};
