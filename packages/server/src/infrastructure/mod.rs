//! Infrastructure layer: stores, outbound transport and wire DTOs.

pub mod dto;
pub mod notifier;
pub mod store;
