//! Room entity: one game tied to a chat context.

use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use super::{
    role::{Deal, MAX_PLAYERS, Role, RoleAssignment},
    value_object::{ContextId, PlayerId, RoomId, VoteTarget},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    Recruiting,
    Night,
    Day,
    Voting,
    Finished,
}

impl RoomStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Recruiting => "recruiting",
            Self::Night => "night",
            Self::Day => "day",
            Self::Voting => "voting",
            Self::Finished => "finished",
        }
    }
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Process-wide defaults captured into each room at creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameSettings {
    pub night_duration: Duration,
    pub thief_sub_phase_duration: Duration,
    pub include_thief: bool,
}

impl GameSettings {
    pub const DEFAULT_NIGHT: Duration = Duration::from_secs(45);
    pub const MIN_NIGHT: Duration = Duration::from_secs(10);
    pub const MAX_NIGHT: Duration = Duration::from_secs(600);

    /// Swap window is half the night, rounded down to the millisecond.
    pub fn with_night_duration(night_duration: Duration, include_thief: bool) -> Self {
        Self {
            night_duration,
            thief_sub_phase_duration: half_of(night_duration),
            include_thief,
        }
    }
}

impl Default for GameSettings {
    fn default() -> Self {
        Self::with_night_duration(Self::DEFAULT_NIGHT, false)
    }
}

pub(crate) fn half_of(duration: Duration) -> Duration {
    Duration::from_millis((duration.as_millis() / 2) as u64)
}

/// Voter → choice, in first-vote order; re-voting overwrites in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Votes {
    entries: Vec<(PlayerId, VoteTarget)>,
}

impl Votes {
    /// Records a vote. Returns the previous choice when the voter re-voted.
    pub fn record(&mut self, voter: PlayerId, target: VoteTarget) -> Option<VoteTarget> {
        match self.entries.iter_mut().find(|(id, _)| *id == voter) {
            Some((_, existing)) => Some(std::mem::replace(existing, target)),
            None => {
                self.entries.push((voter, target));
                None
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, voter: &PlayerId) -> Option<&VoteTarget> {
        self.entries
            .iter()
            .find(|(id, _)| id == voter)
            .map(|(_, target)| target)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PlayerId, &VoteTarget)> {
        self.entries.iter().map(|(id, target)| (id, target))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Result of a divination, kept for the room's lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Divination {
    pub seer_id: PlayerId,
    pub target_id: PlayerId,
    pub is_werewolf: bool,
}

/// One active game.
#[derive(Debug, Clone)]
pub struct Room {
    pub room_id: RoomId,
    /// Absent after recovery from a direct-message vote.
    pub context_id: Option<ContextId>,
    pub gm_id: PlayerId,
    pub participants: Vec<PlayerId>,
    pub status: RoomStatus,
    pub recruitment_closed: bool,
    pub role_assignment: Option<RoleAssignment>,
    pub field_cards: Vec<Role>,
    pub votes: Votes,
    pub discussion_end_at: Option<Instant>,
    pub night_duration: Option<Duration>,
    pub thief_sub_phase_duration: Option<Duration>,
    pub include_thief: bool,
    pub original_swapper_id: Option<PlayerId>,
    pub original_seer_id: Option<PlayerId>,
    pub swap_done: bool,
    pub divination: Option<Divination>,
    pub result_scheduled: bool,
    /// Bumped on every phase transition; timers armed under an older
    /// generation are ignored when they fire.
    pub generation: u64,
    defaults: GameSettings,
}

impl Room {
    /// Creates a recruiting room with the GM as first participant.
    pub fn new(
        room_id: RoomId,
        context_id: ContextId,
        gm_id: PlayerId,
        settings: GameSettings,
    ) -> Self {
        Self {
            room_id,
            context_id: Some(context_id),
            participants: vec![gm_id.clone()],
            gm_id,
            status: RoomStatus::Recruiting,
            recruitment_closed: false,
            role_assignment: None,
            field_cards: Vec::new(),
            votes: Votes::default(),
            discussion_end_at: None,
            night_duration: None,
            thief_sub_phase_duration: None,
            include_thief: settings.include_thief,
            original_swapper_id: None,
            original_seer_id: None,
            swap_done: false,
            divination: None,
            result_scheduled: false,
            generation: 0,
            defaults: settings,
        }
    }

    /// Rebuilds a room that is already in the voting phase.
    pub fn recovered(
        room_id: RoomId,
        gm_id: PlayerId,
        participants: Vec<PlayerId>,
        assignment: RoleAssignment,
        settings: GameSettings,
    ) -> Self {
        let mut room = Self::new(room_id, ContextId::from(gm_id.clone()), gm_id, settings);
        room.context_id = None;
        room.participants = participants;
        room.recruitment_closed = true;
        room.role_assignment = Some(assignment);
        room.status = RoomStatus::Voting;
        room
    }

    pub fn is_gm(&self, player: &PlayerId) -> bool {
        self.gm_id == *player
    }

    pub fn is_participant(&self, player: &PlayerId) -> bool {
        self.participants.contains(player)
    }

    /// Adds a participant. Returns `false` if already present.
    pub fn add_participant(&mut self, player: PlayerId) -> bool {
        if self.is_participant(&player) {
            return false;
        }
        self.participants.push(player);
        true
    }

    pub fn remaining_capacity(&self) -> usize {
        MAX_PLAYERS.saturating_sub(self.participants.len())
    }

    pub fn synthetic_count(&self) -> usize {
        self.participants.iter().filter(|p| p.is_synthetic()).count()
    }

    pub fn night_duration(&self) -> Duration {
        self.night_duration.unwrap_or(self.defaults.night_duration)
    }

    pub fn thief_sub_phase_duration(&self) -> Duration {
        self.thief_sub_phase_duration
            .unwrap_or(self.defaults.thief_sub_phase_duration)
    }

    /// Length of the swap window; zero when the deck had no swap card.
    pub fn swap_window(&self) -> Duration {
        if self.include_thief {
            self.thief_sub_phase_duration().min(self.night_duration())
        } else {
            Duration::ZERO
        }
    }

    pub fn assigned_count(&self) -> usize {
        self.role_assignment.as_ref().map_or(0, RoleAssignment::len)
    }

    pub fn role_of(&self, player: &PlayerId) -> Option<Role> {
        self.role_assignment.as_ref()?.get(player)
    }

    /// Applies a deal and enters the night phase.
    pub fn begin_night(&mut self, deal: Deal) {
        self.original_swapper_id = deal.assignment.holder_of(Role::Thief).cloned();
        self.original_seer_id = deal.assignment.holder_of(Role::Seer).cloned();
        self.role_assignment = Some(deal.assignment);
        self.field_cards = deal.field_cards;
        self.swap_done = false;
        self.divination = None;
        self.enter(RoomStatus::Night);
    }

    /// Moves to `status` and invalidates timers armed for the previous phase.
    pub fn enter(&mut self, status: RoomStatus) {
        self.status = status;
        self.generation += 1;
        if status != RoomStatus::Day {
            self.discussion_end_at = None;
        }
        if status == RoomStatus::Voting {
            self.votes.clear();
            self.result_scheduled = false;
        }
    }

    /// Invalidates outstanding timers without changing phase.
    pub fn rearm(&mut self) {
        self.generation += 1;
    }

    /// Where phase-wide announcements go: the group context when known,
    /// else the GM directly.
    pub fn broadcast_target(&self) -> ContextId {
        self.context_id
            .clone()
            .unwrap_or_else(|| ContextId::from(self.gm_id.clone()))
    }

    pub fn real_participants(&self) -> impl Iterator<Item = &PlayerId> {
        self.participants.iter().filter(|p| !p.is_synthetic())
    }
}
