//! GameStore implementations.

mod file;
mod inmemory;
mod snapshot;

pub use file::FileGameStore;
pub use inmemory::InMemoryGameStore;
pub use snapshot::StoreSnapshot;
