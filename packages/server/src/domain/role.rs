//! Roles, role-count tables and dealing.
//!
//! Every function here is pure apart from the shuffle's entropy source.

use std::fmt;

use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};

use super::value_object::PlayerId;

/// Number of cards that are never dealt.
pub const FIELD_CARD_COUNT: usize = 2;

/// Supported participant counts.
pub const MIN_PLAYERS: usize = 3;
pub const MAX_PLAYERS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Werewolf,
    Seer,
    /// Swap-capable role: may trade cards with one other participant at night.
    Thief,
    Citizen,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Werewolf => "werewolf",
            Self::Seer => "seer",
            Self::Thief => "thief",
            Self::Citizen => "citizen",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "werewolf" => Some(Self::Werewolf),
            "seer" => Some(Self::Seer),
            "thief" => Some(Self::Thief),
            "citizen" => Some(Self::Citizen),
            _ => None,
        }
    }

    pub fn faction(&self) -> Faction {
        match self {
            Self::Werewolf => Faction::Werewolves,
            Self::Seer | Self::Thief | Self::Citizen => Faction::Villagers,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Faction {
    Villagers,
    Werewolves,
}

/// Card counts per role for one game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleDistribution {
    pub werewolf: usize,
    pub seer: usize,
    pub thief: usize,
    pub citizen: usize,
}

impl RoleDistribution {
    pub fn total(&self) -> usize {
        self.werewolf + self.seer + self.thief + self.citizen
    }

    /// Replaces one citizen card with a thief card.
    pub fn with_thief(mut self) -> Self {
        if self.thief == 0 && self.citizen > 0 {
            self.citizen -= 1;
            self.thief = 1;
        }
        self
    }

    pub fn count_of(&self, role: Role) -> usize {
        match role {
            Role::Werewolf => self.werewolf,
            Role::Seer => self.seer,
            Role::Thief => self.thief,
            Role::Citizen => self.citizen,
        }
    }

    /// (role, count) pairs with a non-zero count, in table order.
    pub fn composition(&self) -> Vec<(Role, usize)> {
        [Role::Werewolf, Role::Seer, Role::Thief, Role::Citizen]
            .into_iter()
            .map(|role| (role, self.count_of(role)))
            .filter(|(_, count)| *count > 0)
            .collect()
    }

    /// The full card multiset, unshuffled.
    pub fn cards(&self) -> Vec<Role> {
        self.composition()
            .into_iter()
            .flat_map(|(role, count)| std::iter::repeat_n(role, count))
            .collect()
    }
}

/// Fixed role-count table; `None` outside `MIN_PLAYERS..=MAX_PLAYERS`.
pub fn distribution_for(player_count: usize) -> Option<RoleDistribution> {
    let (werewolf, citizen) = match player_count {
        3 => (1, 3),
        4 => (1, 4),
        5 => (2, 4),
        6 => (2, 5),
        7 => (2, 6),
        8 => (2, 7),
        _ => return None,
    };
    Some(RoleDistribution {
        werewolf,
        seer: 1,
        thief: 0,
        citizen,
    })
}

/// Participant → role, in deal order.
///
/// Entries are only ever exchanged, never added or removed, once dealt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    entries: Vec<(PlayerId, Role)>,
}

impl RoleAssignment {
    pub fn from_entries(entries: Vec<(PlayerId, Role)>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, player: &PlayerId) -> Option<Role> {
        self.entries
            .iter()
            .find(|(id, _)| id == player)
            .map(|(_, role)| *role)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PlayerId, Role)> {
        self.entries.iter().map(|(id, role)| (id, *role))
    }

    pub fn players(&self) -> impl Iterator<Item = &PlayerId> {
        self.entries.iter().map(|(id, _)| id)
    }

    /// First player currently holding `role`.
    pub fn holder_of(&self, role: Role) -> Option<&PlayerId> {
        self.entries
            .iter()
            .find(|(_, r)| *r == role)
            .map(|(id, _)| id)
    }

    pub fn contains_role(&self, role: Role) -> bool {
        self.entries.iter().any(|(_, r)| *r == role)
    }

    /// Exchanges the roles of `a` and `b`. Returns `false` (and changes
    /// nothing) when either player has no role.
    pub fn swap(&mut self, a: &PlayerId, b: &PlayerId) -> bool {
        let pos_a = self.entries.iter().position(|(id, _)| id == a);
        let pos_b = self.entries.iter().position(|(id, _)| id == b);
        match (pos_a, pos_b) {
            (Some(i), Some(j)) => {
                let role_a = self.entries[i].1;
                self.entries[i].1 = self.entries[j].1;
                self.entries[j].1 = role_a;
                true
            }
            _ => false,
        }
    }
}

/// Result of dealing a deck to the participants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deal {
    pub assignment: RoleAssignment,
    pub field_cards: Vec<Role>,
}

/// Deals with a fresh OS-seeded generator, so no two calls share shuffle state.
pub fn assign(player_ids: &[PlayerId], distribution: &RoleDistribution) -> Deal {
    let mut rng = StdRng::from_os_rng();
    assign_with_rng(player_ids, distribution, &mut rng)
}

/// Builds the multiset, Fisher–Yates shuffles it, deals the first
/// `player_ids.len()` cards in input order and keeps the rest as field cards.
pub fn assign_with_rng<R: Rng + ?Sized>(
    player_ids: &[PlayerId],
    distribution: &RoleDistribution,
    rng: &mut R,
) -> Deal {
    let mut cards = distribution.cards();
    for i in (1..cards.len()).rev() {
        let j = rng.random_range(0..=i);
        cards.swap(i, j);
    }

    let dealt = player_ids.len().min(cards.len());
    let field_cards = cards.split_off(dealt);
    let entries = player_ids.iter().cloned().zip(cards).collect();

    Deal {
        assignment: RoleAssignment::from_entries(entries),
        field_cards,
    }
}

/// Static faction, win-condition and ability text for a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RoleDescription {
    pub faction: Faction,
    pub win_condition: &'static str,
    pub ability: &'static str,
}

pub fn describe(role: Role) -> RoleDescription {
    match role {
        Role::Werewolf => RoleDescription {
            faction: Faction::Werewolves,
            win_condition: "Someone other than you is expelled in the final vote.",
            ability: "Hide your identity and mislead the villagers.",
        },
        Role::Seer => RoleDescription {
            faction: Faction::Villagers,
            win_condition: "A werewolf is expelled in the final vote.",
            ability: "Tonight, choose one player and learn whether they are a werewolf.",
        },
        Role::Thief => RoleDescription {
            faction: Faction::Villagers,
            win_condition: "Your team after the swap wins.",
            ability: "Tonight, you may swap your card with another player's and become their role.",
        },
        Role::Citizen => RoleDescription {
            faction: Faction::Villagers,
            win_condition: "A werewolf is expelled in the final vote.",
            ability: "No special ability. Use the seer's information to find the werewolf.",
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn players(n: usize) -> Vec<PlayerId> {
        (0..n)
            .map(|i| PlayerId::new(format!("player{i}")).unwrap())
            .collect()
    }

    fn sorted(mut roles: Vec<Role>) -> Vec<&'static str> {
        roles.sort_by_key(|r| r.as_str());
        roles.into_iter().map(|r| r.as_str()).collect()
    }

    #[test]
    fn test_distribution_totals_for_supported_counts() {
        // テスト項目: 3〜8 人の配役表は合計が人数 + 2 枚になる
        for count in MIN_PLAYERS..=MAX_PLAYERS {
            // when (操作):
            let distribution = distribution_for(count).unwrap();

            // then (期待する結果):
            assert_eq!(distribution.total(), count + FIELD_CARD_COUNT);
            assert_eq!(distribution.seer, 1);
        }
    }

    #[test]
    fn test_distribution_unsupported_counts() {
        // テスト項目: 範囲外の人数は未サポート
        assert!(distribution_for(0).is_none());
        assert!(distribution_for(2).is_none());
        assert!(distribution_for(9).is_none());
    }

    #[test]
    fn test_with_thief_keeps_total() {
        // テスト項目: 怪盗入りの配役でも総枚数は変わらない
        // given (前提条件):
        let base = distribution_for(4).unwrap();

        // when (操作):
        let with_thief = base.with_thief();

        // then (期待する結果):
        assert_eq!(with_thief.total(), base.total());
        assert_eq!(with_thief.thief, 1);
        assert_eq!(with_thief.citizen, base.citizen - 1);
        assert_eq!(with_thief.with_thief(), with_thief);
    }

    #[test]
    fn test_three_player_deal_shape() {
        // テスト項目: 3 人の配布で 3 人に役職、場札が 2 枚になる
        // given (前提条件):
        let ids = players(3);
        let distribution = distribution_for(3).unwrap();

        // when (操作):
        let deal = assign(&ids, &distribution);

        // then (期待する結果):
        assert_eq!(deal.assignment.len(), 3);
        assert_eq!(deal.field_cards.len(), 2);
        let dealt: Vec<&PlayerId> = deal.assignment.players().collect();
        assert_eq!(dealt, ids.iter().collect::<Vec<_>>());
    }

    #[test]
    fn test_deal_is_a_bijection_over_the_deck() {
        // テスト項目: 配布済み + 場札のカードは元の山札と一致する
        for count in MIN_PLAYERS..=MAX_PLAYERS {
            // given (前提条件):
            let ids = players(count);
            let distribution = distribution_for(count).unwrap().with_thief();
            let mut rng = StdRng::seed_from_u64(count as u64);

            // when (操作):
            let deal = assign_with_rng(&ids, &distribution, &mut rng);

            // then (期待する結果):
            let mut all: Vec<Role> = deal.assignment.iter().map(|(_, r)| r).collect();
            all.extend(deal.field_cards.iter().copied());
            assert_eq!(sorted(all), sorted(distribution.cards()));
        }
    }

    #[test]
    fn test_repeated_deals_vary() {
        // テスト項目: 繰り返し配布すると異なる並びが出る
        // given (前提条件):
        let ids = players(8);
        let distribution = distribution_for(8).unwrap();

        // when (操作):
        let orderings: HashSet<Vec<Role>> = (0..50)
            .map(|_| {
                let deal = assign(&ids, &distribution);
                deal.assignment.iter().map(|(_, r)| r).collect()
            })
            .collect();

        // then (期待する結果):
        assert!(orderings.len() > 1);
    }

    #[test]
    fn test_shuffle_is_roughly_uniform() {
        // テスト項目: 人狼カードが各位置に偏りなく配られる
        // given (前提条件):
        let ids = players(3);
        let distribution = distribution_for(3).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let mut werewolf_at = [0usize; 5];
        let trials = 5000;

        // when (操作):
        for _ in 0..trials {
            let deal = assign_with_rng(&ids, &distribution, &mut rng);
            let mut all: Vec<Role> = deal.assignment.iter().map(|(_, r)| r).collect();
            all.extend(deal.field_cards);
            for (pos, role) in all.iter().enumerate() {
                if *role == Role::Werewolf {
                    werewolf_at[pos] += 1;
                }
            }
        }

        // then (期待する結果): 各位置 1/5 前後
        for hits in werewolf_at {
            assert!((800..1200).contains(&hits), "position hits {hits}");
        }
    }

    #[test]
    fn test_swap_exchanges_roles() {
        // テスト項目: swap は 2 人の役職を入れ替えるだけで件数は変わらない
        // given (前提条件):
        let ids = players(3);
        let mut assignment = RoleAssignment::from_entries(vec![
            (ids[0].clone(), Role::Thief),
            (ids[1].clone(), Role::Werewolf),
            (ids[2].clone(), Role::Citizen),
        ]);

        // when (操作):
        let swapped = assignment.swap(&ids[0], &ids[1]);

        // then (期待する結果):
        assert!(swapped);
        assert_eq!(assignment.get(&ids[0]), Some(Role::Werewolf));
        assert_eq!(assignment.get(&ids[1]), Some(Role::Thief));
        assert_eq!(assignment.len(), 3);
    }

    #[test]
    fn test_swap_with_unknown_player_is_noop() {
        // テスト項目: 役職のないプレイヤーとの swap は何も変えない
        // given (前提条件):
        let ids = players(2);
        let stranger = PlayerId::new("stranger".to_string()).unwrap();
        let mut assignment = RoleAssignment::from_entries(vec![
            (ids[0].clone(), Role::Thief),
            (ids[1].clone(), Role::Seer),
        ]);
        let before = assignment.clone();

        // when (操作):
        let swapped = assignment.swap(&ids[0], &stranger);

        // then (期待する結果):
        assert!(!swapped);
        assert_eq!(assignment, before);
    }

    #[test]
    fn test_describe_factions() {
        // テスト項目: 役職説明の陣営が役職の陣営と一致する
        for role in [Role::Werewolf, Role::Seer, Role::Thief, Role::Citizen] {
            assert_eq!(describe(role).faction, role.faction());
        }
    }
}
