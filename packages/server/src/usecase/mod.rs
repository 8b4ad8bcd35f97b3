//! UseCase layer: the game session orchestrator.
//!
//! `GameService` is split by phase across the submodules; all of them
//! share the registry lock, the phase scheduler and the outbound collaborators.

pub mod discussion;
pub mod error;
pub mod intent;
pub mod lobby;
pub mod night;
pub mod recovery;
pub mod scheduler;
pub mod service;
pub mod settings;
pub mod voting;

pub use error::{ErrorKind, GameError};
pub use intent::{Intent, IntentOutcome};
pub use lobby::{CloseOutcome, JoinOutcome, synthetic_name};
pub use recovery::RecoveryAdapter;
pub use scheduler::{PhaseScheduler, TimerKind};
pub use service::{GameService, PhaseTiming};
pub use voting::VoteOutcome;
