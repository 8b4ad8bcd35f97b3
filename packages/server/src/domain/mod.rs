//! Domain layer: game rules and the interfaces the game needs from the outside.

pub mod error;
pub mod notice;
pub mod notifier;
pub mod registry;
pub mod role;
pub mod room;
pub mod store;
pub mod value_object;
pub mod verdict;

pub use error::{NotifyError, StoreError, ValueObjectError};
pub use notice::Notice;
pub use notifier::Notifier;
pub use registry::RoomRegistry;
pub use role::{Deal, Faction, Role, RoleAssignment, RoleDescription, RoleDistribution};
pub use room::{Divination, GameSettings, Room, RoomStatus, Votes};
pub use store::{GameStore, PlayerRecord, RoomRecord, StoredRoomStatus, VoteRecord};
pub use value_object::{ContextId, PlayerId, RoomId, RoomIdFactory, VoteTarget};
pub use verdict::{Outcome, TieBreak, Verdict, VoteTally};

#[cfg(test)]
pub use notifier::MockNotifier;
#[cfg(test)]
pub use store::MockGameStore;
