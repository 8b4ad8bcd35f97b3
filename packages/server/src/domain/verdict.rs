//! Vote tallying and win-condition classification.

use serde::Serialize;

use super::{
    role::{Faction, Role, RoleAssignment},
    room::Votes,
    value_object::{PlayerId, VoteTarget},
};

/// Per-target vote counts in the order each target first received a vote.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VoteTally {
    counts: Vec<(VoteTarget, usize)>,
}

impl VoteTally {
    pub fn from_votes(votes: &Votes) -> Self {
        let mut counts: Vec<(VoteTarget, usize)> = Vec::new();
        for (_, target) in votes.iter() {
            match counts.iter_mut().find(|(t, _)| t == target) {
                Some((_, count)) => *count += 1,
                None => counts.push((target.clone(), 1)),
            }
        }
        Self { counts }
    }

    pub fn count_for(&self, target: &VoteTarget) -> usize {
        self.counts
            .iter()
            .find(|(t, _)| t == target)
            .map_or(0, |(_, count)| *count)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&VoteTarget, usize)> {
        self.counts.iter().map(|(t, c)| (t, *c))
    }

    pub fn max_votes(&self) -> usize {
        self.counts.iter().map(|(_, c)| *c).max().unwrap_or(0)
    }

    /// Every target with the maximum count, in first-vote order.
    pub fn leaders(&self) -> Vec<&VoteTarget> {
        let max = self.max_votes();
        if max == 0 {
            return Vec::new();
        }
        self.counts
            .iter()
            .filter(|(_, c)| *c == max)
            .map(|(t, _)| t)
            .collect()
    }
}

/// How equal top counts are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TieBreak {
    /// The tied target that received its first vote earliest wins.
    #[default]
    FirstVoted,
}

impl TieBreak {
    pub fn pick<'a>(&self, tally: &'a VoteTally) -> Option<&'a VoteTarget> {
        match self {
            Self::FirstVoted => tally.leaders().into_iter().next(),
        }
    }
}

/// Who is expelled when nobody received a vote: the first dealt participant.
pub fn fallback_expulsion(assignment: &RoleAssignment) -> Option<&PlayerId> {
    assignment.players().next()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Outcome {
    /// The crowd chose "no-expulsion".
    PeaceVillage {
        werewolf_among_players: bool,
        werewolf_in_field: bool,
    },
    Expulsion {
        player_id: PlayerId,
        role: Role,
        /// True when nobody received a vote and the fallback rule applied.
        by_fallback: bool,
    },
}

/// Full result of a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub tally: VoteTally,
    pub outcome: Outcome,
    pub winner: Faction,
    /// Every participant's final role, in deal order.
    pub reveal: Vec<(PlayerId, Role)>,
    pub field_cards: Vec<Role>,
}

impl Verdict {
    pub fn expelled(&self) -> Option<&PlayerId> {
        match &self.outcome {
            Outcome::Expulsion { player_id, .. } => Some(player_id),
            Outcome::PeaceVillage { .. } => None,
        }
    }

    /// Votes received by each participant, in deal order.
    pub fn participant_counts(&self) -> Vec<(PlayerId, usize)> {
        self.reveal
            .iter()
            .map(|(id, _)| (id.clone(), self.tally.count_for(&VoteTarget::Player(id.clone()))))
            .collect()
    }

    pub fn no_expulsion_votes(&self) -> usize {
        self.tally.count_for(&VoteTarget::NoExpulsion)
    }
}

/// Computes the verdict. `None` only when nobody holds a role.
pub fn decide(
    votes: &Votes,
    assignment: &RoleAssignment,
    field_cards: &[Role],
    tie_break: TieBreak,
) -> Option<Verdict> {
    let tally = VoteTally::from_votes(votes);
    let werewolf_among_players = assignment.contains_role(Role::Werewolf);
    let werewolf_in_field = field_cards.contains(&Role::Werewolf);

    let (outcome, winner) = match tie_break.pick(&tally) {
        Some(VoteTarget::NoExpulsion) => {
            let winner = if !werewolf_among_players && werewolf_in_field {
                Faction::Villagers
            } else {
                Faction::Werewolves
            };
            (
                Outcome::PeaceVillage {
                    werewolf_among_players,
                    werewolf_in_field,
                },
                winner,
            )
        }
        Some(VoteTarget::Player(player_id)) => expulsion(assignment, player_id.clone(), false),
        None => {
            let player_id = fallback_expulsion(assignment)?.clone();
            tracing::warn!(%player_id, "No votes were cast; expelling the first dealt participant");
            expulsion(assignment, player_id, true)
        }
    };

    Some(Verdict {
        tally,
        outcome,
        winner,
        reveal: assignment.iter().map(|(id, role)| (id.clone(), role)).collect(),
        field_cards: field_cards.to_vec(),
    })
}

fn expulsion(assignment: &RoleAssignment, player_id: PlayerId, by_fallback: bool) -> (Outcome, Faction) {
    let role = assignment.get(&player_id).unwrap_or(Role::Citizen);
    let winner = if role == Role::Werewolf {
        Faction::Villagers
    } else {
        Faction::Werewolves
    };
    (
        Outcome::Expulsion {
            player_id,
            role,
            by_fallback,
        },
        winner,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(value: &str) -> PlayerId {
        PlayerId::new(value.to_string()).unwrap()
    }

    fn vote_for(value: &str) -> VoteTarget {
        VoteTarget::Player(pid(value))
    }

    fn assignment(entries: &[(&str, Role)]) -> RoleAssignment {
        RoleAssignment::from_entries(entries.iter().map(|(id, role)| (pid(id), *role)).collect())
    }

    #[test]
    fn test_peace_village_correct_when_werewolf_in_field() {
        // テスト項目: 全員平和村に投票し、人狼が場札にのみいる場合は市民チームの勝利
        // given (前提条件):
        let roles = assignment(&[("a", Role::Seer), ("b", Role::Citizen), ("c", Role::Citizen)]);
        let field = [Role::Werewolf, Role::Citizen];
        let mut votes = Votes::default();
        for voter in ["a", "b", "c"] {
            votes.record(pid(voter), VoteTarget::NoExpulsion);
        }

        // when (操作):
        let verdict = decide(&votes, &roles, &field, TieBreak::default()).unwrap();

        // then (期待する結果):
        assert_eq!(verdict.winner, Faction::Villagers);
        assert!(matches!(verdict.outcome, Outcome::PeaceVillage { .. }));
        assert_eq!(verdict.no_expulsion_votes(), 3);
        assert_eq!(verdict.reveal.len(), 3);
    }

    #[test]
    fn test_peace_village_wrong_when_werewolf_among_players() {
        // テスト項目: 参加者に人狼がいるのに平和村を選ぶと人狼チームの勝利
        // given (前提条件):
        let roles = assignment(&[("a", Role::Werewolf), ("b", Role::Seer), ("c", Role::Citizen)]);
        let mut votes = Votes::default();
        votes.record(pid("a"), VoteTarget::NoExpulsion);
        votes.record(pid("b"), VoteTarget::NoExpulsion);
        votes.record(pid("c"), vote_for("b"));

        // when (操作):
        let verdict = decide(&votes, &roles, &[Role::Citizen, Role::Citizen], TieBreak::default()).unwrap();

        // then (期待する結果):
        assert_eq!(verdict.winner, Faction::Werewolves);
        assert!(verdict.expelled().is_none());
    }

    #[test]
    fn test_majority_expels_werewolf() {
        // テスト項目: 2 対 1 で A が追放され、A が人狼なら市民チームの勝利
        // given (前提条件):
        let roles = assignment(&[("a", Role::Werewolf), ("b", Role::Seer), ("c", Role::Citizen)]);
        let mut votes = Votes::default();
        votes.record(pid("b"), vote_for("a"));
        votes.record(pid("c"), vote_for("a"));
        votes.record(pid("a"), vote_for("b"));

        // when (操作):
        let verdict = decide(&votes, &roles, &[Role::Citizen, Role::Citizen], TieBreak::default()).unwrap();

        // then (期待する結果):
        assert_eq!(verdict.expelled(), Some(&pid("a")));
        assert_eq!(verdict.winner, Faction::Villagers);
        assert_eq!(verdict.participant_counts()[0], (pid("a"), 2));
    }

    #[test]
    fn test_majority_expels_villager() {
        // テスト項目: 人狼以外が追放された場合は人狼チームの勝利
        // given (前提条件):
        let roles = assignment(&[("a", Role::Citizen), ("b", Role::Werewolf), ("c", Role::Seer)]);
        let mut votes = Votes::default();
        votes.record(pid("b"), vote_for("a"));
        votes.record(pid("c"), vote_for("a"));
        votes.record(pid("a"), vote_for("b"));

        // when (操作):
        let verdict = decide(&votes, &roles, &[Role::Citizen, Role::Citizen], TieBreak::default()).unwrap();

        // then (期待する結果):
        assert_eq!(verdict.expelled(), Some(&pid("a")));
        assert_eq!(verdict.winner, Faction::Werewolves);
    }

    #[test]
    fn test_tie_goes_to_first_voted_target() {
        // テスト項目: 同票の場合は最初に票を得た対象が選ばれる
        // given (前提条件):
        let roles = assignment(&[
            ("a", Role::Citizen),
            ("b", Role::Werewolf),
            ("c", Role::Seer),
            ("d", Role::Citizen),
        ]);
        let mut votes = Votes::default();
        votes.record(pid("a"), vote_for("c"));
        votes.record(pid("b"), vote_for("b"));
        votes.record(pid("c"), vote_for("b"));
        votes.record(pid("d"), vote_for("c"));

        // when (操作):
        let verdict = decide(&votes, &roles, &[Role::Citizen, Role::Citizen], TieBreak::default()).unwrap();

        // then (期待する結果):
        assert_eq!(verdict.expelled(), Some(&pid("c")));
        assert_eq!(verdict.tally.leaders().len(), 2);
    }

    #[test]
    fn test_no_votes_falls_back_to_first_dealt() {
        // テスト項目: 投票が 1 件もない場合は最初に配られた参加者が追放される
        // given (前提条件):
        let roles = assignment(&[("a", Role::Werewolf), ("b", Role::Seer), ("c", Role::Citizen)]);

        // when (操作):
        let verdict = decide(&Votes::default(), &roles, &[], TieBreak::default()).unwrap();

        // then (期待する結果):
        assert_eq!(
            verdict.outcome,
            Outcome::Expulsion {
                player_id: pid("a"),
                role: Role::Werewolf,
                by_fallback: true,
            }
        );
        assert_eq!(verdict.winner, Faction::Villagers);
    }

    #[test]
    fn test_decide_without_roles() {
        // テスト項目: 役職が誰にもない場合は判定できない
        assert!(decide(&Votes::default(), &RoleAssignment::default(), &[], TieBreak::default()).is_none());
    }
}
