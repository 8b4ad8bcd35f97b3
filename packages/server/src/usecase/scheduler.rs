//! Per-room delayed transitions.
//!
//! Every timer belongs to exactly one room. A phase transition cancels the
//! room's whole set in one step before arming the next phase's timers.

use std::{
    collections::HashMap,
    future::Future,
    sync::{Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use tokio::task::AbortHandle;

use crate::domain::RoomId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Night → day.
    NightEnd,
    /// Advisory boundary between the swap and divine windows.
    DivineWindow,
    /// Automatic night action of a synthetic participant.
    SyntheticAction,
    Countdown,
    /// Day → voting.
    DiscussionEnd,
    SyntheticVote,
    ResultAnnouncement,
}

#[derive(Debug, Default)]
pub struct PhaseScheduler {
    timers: Mutex<HashMap<RoomId, Vec<(TimerKind, AbortHandle)>>>,
}

impl PhaseScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<RoomId, Vec<(TimerKind, AbortHandle)>>> {
        self.timers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs `action` after `delay` unless the room's timers are cancelled first.
    ///
    /// The action is spawned as its own task once the delay elapses, so a
    /// transition that cancels this room's timers never aborts itself.
    pub fn arm<F>(&self, room_id: &RoomId, kind: TimerKind, delay: Duration, action: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            tokio::spawn(action);
        });

        tracing::debug!(%room_id, ?kind, ?delay, "Timer armed");
        let mut timers = self.lock();
        let entry = timers.entry(room_id.clone()).or_default();
        entry.retain(|(_, handle)| !handle.is_finished());
        entry.push((kind, handle.abort_handle()));
    }

    /// Cancels every outstanding timer of the room. Returns how many were still pending.
    pub fn cancel_all(&self, room_id: &RoomId) -> usize {
        let Some(entries) = self.lock().remove(room_id) else {
            return 0;
        };
        let mut cancelled = 0;
        for (_, handle) in entries {
            if !handle.is_finished() {
                handle.abort();
                cancelled += 1;
            }
        }
        if cancelled > 0 {
            tracing::debug!(%room_id, cancelled, "Timers cancelled");
        }
        cancelled
    }

    /// Number of pending timers for the room, optionally of one kind.
    pub fn pending(&self, room_id: &RoomId, kind: Option<TimerKind>) -> usize {
        self.lock().get(room_id).map_or(0, |entries| {
            entries
                .iter()
                .filter(|(k, handle)| kind.is_none_or(|kind| kind == *k) && !handle.is_finished())
                .count()
        })
    }
}
