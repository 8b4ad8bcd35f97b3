//! UseCase: 夜フェーズ
//!
//! 夜は固定時間の外側タイマー 1 本で昼に進む。交換と占いはその間の
//! 任意の行動で、行動が済んでもタイマーは短縮されない。

use std::time::Duration;

use crate::domain::{
    Divination, Notice, PlayerId, Role, RoomId, RoomStatus, StoredRoomStatus,
    role::{self, describe, distribution_for},
};

use super::{
    error::GameError,
    scheduler::TimerKind,
    service::{GameService, Outbox, pick_random, random_delay},
};

/// `actor` 以外の役職保持者
fn other_role_holders(room: &crate::domain::Room, actor: &PlayerId) -> Vec<PlayerId> {
    room.role_assignment
        .as_ref()
        .map(|assignment| {
            assignment
                .players()
                .filter(|player| *player != actor)
                .cloned()
                .collect()
        })
        .unwrap_or_default()
}

impl GameService {
    /// 役職を配り、夜フェーズを開始する（GM のみ）
    ///
    /// 募集を締め切った 3〜8 人のルームでのみ可能。
    pub async fn assign_roles(&self, room_id: RoomId, actor: PlayerId) -> Result<usize, GameError> {
        let (roles, field_cards, outbox) = {
            let mut registry = self.registry.lock().await;
            let room = registry
                .by_room_id_mut(&room_id)
                .ok_or(GameError::RoomNotFound)?;
            Self::require_gm(room, &actor)?;
            if room.status != RoomStatus::Recruiting {
                return Err(GameError::wrong_phase(RoomStatus::Recruiting, room.status));
            }
            if !room.recruitment_closed {
                return Err(GameError::RecruitmentOpen);
            }

            let participant_count = room.participants.len();
            let mut distribution = distribution_for(participant_count).ok_or(
                GameError::UnsupportedPlayerCount {
                    count: participant_count,
                },
            )?;
            if room.include_thief {
                distribution = distribution.with_thief();
            }

            self.scheduler.cancel_all(&room_id);
            room.begin_night(role::assign(&room.participants, &distribution));

            let context = room.broadcast_target();
            let mut outbox = Outbox::for_room(room);
            outbox.to_context(
                context.clone(),
                Notice::GameStarted {
                    participant_count,
                    composition: distribution.composition(),
                    total_cards: distribution.total(),
                    field_card_count: room.field_cards.len(),
                },
            );
            let roles: Vec<(PlayerId, Role)> = room
                .role_assignment
                .iter()
                .flat_map(|assignment| assignment.iter())
                .map(|(player, role)| (player.clone(), role))
                .collect();
            for (player, role) in &roles {
                outbox.to_player(
                    player,
                    Notice::RoleCard {
                        role: *role,
                        description: describe(*role),
                    },
                );
            }
            outbox.to_context(
                context,
                Notice::NightFallen {
                    night_seconds: room.night_duration().as_secs(),
                },
            );

            let swap_window = room.swap_window();
            if let Some(swapper) = room.original_swapper_id.clone() {
                outbox.to_player(
                    &swapper,
                    Notice::SwapPrompt {
                        room_id: room_id.clone(),
                        candidates: other_role_holders(room, &swapper),
                    },
                );
                if swapper.is_synthetic() {
                    let delay = random_delay(&self.timing.synthetic_action_delay);
                    self.arm(room, TimerKind::SyntheticAction, delay, |service, room_id, generation| async move {
                        service.act_as_synthetic_swapper(room_id, generation).await;
                    });
                }
            }
            if let Some(seer) = room.original_seer_id.clone() {
                if swap_window.is_zero() {
                    outbox.to_player(
                        &seer,
                        Notice::DivinePrompt {
                            room_id: room_id.clone(),
                            candidates: other_role_holders(room, &seer),
                        },
                    );
                } else {
                    self.arm(room, TimerKind::DivineWindow, swap_window, |service, room_id, generation| async move {
                        service.open_divine_window(room_id, generation).await;
                    });
                }
                if seer.is_synthetic() {
                    let delay = swap_window + random_delay(&self.timing.synthetic_action_delay);
                    self.arm(room, TimerKind::SyntheticAction, delay, |service, room_id, generation| async move {
                        service.act_as_synthetic_seer(room_id, generation).await;
                    });
                }
            }
            self.arm(room, TimerKind::NightEnd, room.night_duration(), |service, room_id, generation| async move {
                service.begin_day(room_id, generation).await;
            });

            (roles, room.field_cards.clone(), outbox)
        };

        tracing::info!(%room_id, participants = roles.len(), "Roles assigned; night has fallen");
        for (player, role) in &roles {
            self.persist(
                "update_player_role",
                &room_id,
                self.store.update_player_role(&room_id, player, *role),
            )
            .await;
        }
        self.persist(
            "update_field_cards",
            &room_id,
            self.store.update_field_cards(&room_id, field_cards),
        )
        .await;
        self.persist(
            "update_room_status",
            &room_id,
            self.store
                .update_room_status(&room_id, StoredRoomStatus::InGame),
        )
        .await;
        self.deliver(outbox).await;
        Ok(roles.len())
    }

    /// 交換：配布時の交換役が他の 1 人と役職を入れ替える
    ///
    /// 戻り値は交換後の自分の役職。
    pub async fn swap(&self, room_id: RoomId, actor: PlayerId, target: PlayerId) -> Result<Role, GameError> {
        let (new_role, old_role, outbox) = {
            let mut registry = self.registry.lock().await;
            let room = registry
                .by_room_id_mut(&room_id)
                .ok_or(GameError::RoomNotFound)?;
            if room.status != RoomStatus::Night {
                return Err(GameError::wrong_phase(RoomStatus::Night, room.status));
            }
            if room.original_swapper_id.as_ref() != Some(&actor) {
                return Err(GameError::NotRoleHolder);
            }
            if room.swap_done {
                return Err(GameError::AlreadyActed);
            }
            if target == actor {
                return Err(GameError::InvalidTarget(target.into_string()));
            }
            let Some(actor_role) = room.role_of(&actor) else {
                return Err(GameError::RoleNotFound(actor.into_string()));
            };
            let Some(target_role) = room.role_of(&target) else {
                return Err(GameError::RoleNotFound(target.into_string()));
            };

            if let Some(assignment) = room.role_assignment.as_mut() {
                assignment.swap(&actor, &target);
            }
            room.swap_done = true;

            let mut outbox = Outbox::for_room(room);
            outbox.to_player(
                &actor,
                Notice::SwapResult {
                    target_id: target.clone(),
                    new_role: target_role,
                    description: describe(target_role),
                },
            );
            (target_role, actor_role, outbox)
        };

        tracing::info!(%room_id, %actor, %target, "Roles swapped");
        self.persist(
            "update_player_role",
            &room_id,
            self.store.update_player_role(&room_id, &actor, new_role),
        )
        .await;
        self.persist(
            "update_player_role",
            &room_id,
            self.store.update_player_role(&room_id, &target, old_role),
        )
        .await;
        self.deliver(outbox).await;
        Ok(new_role)
    }

    /// 占い：配布時の占い師が他の 1 人の現在の役職が人狼かを知る
    pub async fn divine(&self, room_id: RoomId, actor: PlayerId, target: PlayerId) -> Result<bool, GameError> {
        let (is_werewolf, outbox) = {
            let mut registry = self.registry.lock().await;
            let room = registry
                .by_room_id_mut(&room_id)
                .ok_or(GameError::RoomNotFound)?;
            if room.status != RoomStatus::Night {
                return Err(GameError::wrong_phase(RoomStatus::Night, room.status));
            }
            if room.original_seer_id.as_ref() != Some(&actor) {
                return Err(GameError::NotRoleHolder);
            }
            if room.divination.is_some() {
                return Err(GameError::AlreadyActed);
            }
            if target == actor {
                return Err(GameError::InvalidTarget(target.into_string()));
            }
            let Some(target_role) = room.role_of(&target) else {
                return Err(GameError::RoleNotFound(target.into_string()));
            };

            let is_werewolf = target_role == Role::Werewolf;
            room.divination = Some(Divination {
                seer_id: actor.clone(),
                target_id: target.clone(),
                is_werewolf,
            });

            let mut outbox = Outbox::for_room(room);
            outbox.to_player(
                &actor,
                Notice::DivinationResult {
                    target_id: target.clone(),
                    is_werewolf,
                },
            );
            (is_werewolf, outbox)
        };

        tracing::info!(%room_id, %actor, %target, "Divination performed");
        self.deliver(outbox).await;
        Ok(is_werewolf)
    }

    async fn open_divine_window(&self, room_id: RoomId, generation: u64) {
        let outbox = {
            let mut registry = self.registry.lock().await;
            let Some(room) = Self::timer_room(&mut registry, &room_id, generation) else {
                return;
            };
            let Some(seer) = room.original_seer_id.clone() else {
                return;
            };
            let mut outbox = Outbox::for_room(room);
            outbox.to_player(
                &seer,
                Notice::DivinePrompt {
                    room_id: room_id.clone(),
                    candidates: other_role_holders(room, &seer),
                },
            );
            outbox
        };

        tracing::debug!(%room_id, "Divine window opened");
        self.deliver(outbox).await;
    }

    async fn act_as_synthetic_swapper(&self, room_id: RoomId, generation: u64) {
        let Some((actor, target)) = self.synthetic_night_target(&room_id, generation, |room| {
            room.original_swapper_id.clone()
        })
        .await
        else {
            return;
        };
        if let Err(error) = self.swap(room_id.clone(), actor, target).await {
            tracing::warn!(%room_id, %error, "Synthetic swap was rejected");
        }
    }

    async fn act_as_synthetic_seer(&self, room_id: RoomId, generation: u64) {
        let Some((actor, target)) = self.synthetic_night_target(&room_id, generation, |room| {
            room.original_seer_id.clone()
        })
        .await
        else {
            return;
        };
        if let Err(error) = self.divine(room_id.clone(), actor, target).await {
            tracing::warn!(%room_id, %error, "Synthetic divination was rejected");
        }
    }

    /// 合成参加者の行動者と、ランダムに選んだ対象
    async fn synthetic_night_target<F>(
        &self,
        room_id: &RoomId,
        generation: u64,
        actor_of: F,
    ) -> Option<(PlayerId, PlayerId)>
    where
        F: FnOnce(&crate::domain::Room) -> Option<PlayerId>,
    {
        let mut registry = self.registry.lock().await;
        let room = Self::timer_room(&mut registry, room_id, generation)?;
        let actor = actor_of(room).filter(PlayerId::is_synthetic)?;
        let target = pick_random(&other_role_holders(room, &actor))?;
        Some((actor, target))
    }

    /// 夜の外側タイマー満了：昼（議論）フェーズへ
    pub(crate) async fn begin_day(&self, room_id: RoomId, generation: u64) {
        let outbox = {
            let mut registry = self.registry.lock().await;
            let Some(room) = Self::timer_room(&mut registry, &room_id, generation) else {
                return;
            };
            if room.status != RoomStatus::Night {
                return;
            }

            self.scheduler.cancel_all(&room_id);
            room.enter(RoomStatus::Day);
            let discussion = self.timing.discussion;
            room.discussion_end_at = Some(tokio::time::Instant::now() + discussion);
            self.arm_discussion_timers(room);

            let mut outbox = Outbox::for_room(room);
            outbox.to_context(
                room.broadcast_target(),
                Notice::DayBegan {
                    discussion_seconds: discussion.as_secs(),
                },
            );
            outbox
        };

        tracing::info!(%room_id, "Night is over; discussion started");
        self.deliver(outbox).await;
    }
}

/// 夜の長さの検証（設定変更で使う）
pub(crate) fn validate_night_duration(seconds: u64) -> Result<Duration, GameError> {
    use crate::domain::GameSettings;

    let duration = Duration::from_secs(seconds);
    if (GameSettings::MIN_NIGHT..=GameSettings::MAX_NIGHT).contains(&duration) {
        Ok(duration)
    } else {
        Err(GameError::InvalidSetting {
            min: GameSettings::MIN_NIGHT.as_secs(),
            max: GameSettings::MAX_NIGHT.as_secs(),
        })
    }
}
