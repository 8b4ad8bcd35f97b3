//! Value Objects
//!
//! 識別子はすべて文字列ベースの newtype。検証は生成時に一度だけ行う。

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::ValueObjectError;

/// 識別子の最大長（チャットプラットフォームの ID を収める長さ）
const MAX_ID_LENGTH: usize = 128;

/// 合成参加者（ダミー）の ID プレフィックス
const SYNTHETIC_PREFIX: &str = "dummy_";

fn validate_id(kind: &'static str, value: &str) -> Result<(), ValueObjectError> {
    if value.trim().is_empty() {
        return Err(ValueObjectError::Empty(kind));
    }
    if value.len() > MAX_ID_LENGTH {
        return Err(ValueObjectError::TooLong {
            kind,
            max: MAX_ID_LENGTH,
        });
    }
    Ok(())
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            pub fn new(value: String) -> Result<Self, ValueObjectError> {
                validate_id($kind, &value)?;
                Ok(Self(value))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValueObjectError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// ゲームごとに一意なルーム ID
    RoomId,
    "room id"
);

string_id!(
    /// プレイヤー（チャットユーザーまたは合成参加者）の ID
    PlayerId,
    "player id"
);

string_id!(
    /// ルームを作成したチャットコンテキスト（グループ ID、1:1 の場合は開始者のユーザー ID）
    ContextId,
    "context id"
);

/// Generates fresh room ids.
pub struct RoomIdFactory;

impl RoomIdFactory {
    pub fn generate() -> RoomId {
        RoomId(format!("room_{}", Uuid::new_v4().simple()))
    }
}

impl PlayerId {
    /// n 番目の合成参加者の ID を作る
    pub fn synthetic(room_id: &RoomId, index: usize) -> Self {
        Self(format!("{SYNTHETIC_PREFIX}{}_{index}", room_id.as_str()))
    }

    /// 合成参加者かどうか（個別通知の対象外）
    pub fn is_synthetic(&self) -> bool {
        self.0.starts_with(SYNTHETIC_PREFIX)
    }
}

impl From<PlayerId> for ContextId {
    /// 1:1 チャットではユーザー ID がそのままコンテキストになる
    fn from(value: PlayerId) -> Self {
        ContextId(value.0)
    }
}

/// 投票先：参加者、または「誰も追放しない」（平和村）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "player_id")]
pub enum VoteTarget {
    Player(PlayerId),
    NoExpulsion,
}

impl VoteTarget {
    /// Wire value for "no-expulsion" used by the dispatcher.
    pub const NO_EXPULSION: &'static str = "PEACE_VILLAGE";

    /// Parse the dispatcher's raw target string.
    pub fn parse(raw: String) -> Result<Self, ValueObjectError> {
        if raw == Self::NO_EXPULSION {
            Ok(Self::NoExpulsion)
        } else {
            PlayerId::new(raw).map(Self::Player)
        }
    }

    pub fn player(&self) -> Option<&PlayerId> {
        match self {
            Self::Player(id) => Some(id),
            Self::NoExpulsion => None,
        }
    }
}

impl fmt::Display for VoteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Player(id) => write!(f, "{id}"),
            Self::NoExpulsion => f.write_str(Self::NO_EXPULSION),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_id_rejects_empty() {
        // テスト項目: 空文字列の PlayerId は生成できない
        // given (前提条件):
        let value = "   ".to_string();

        // when (操作):
        let result = PlayerId::new(value);

        // then (期待する結果):
        assert_eq!(result, Err(ValueObjectError::Empty("player id")));
    }

    #[test]
    fn test_player_id_rejects_too_long() {
        // テスト項目: 最大長を超える ID は生成できない
        // given (前提条件):
        let value = "a".repeat(MAX_ID_LENGTH + 1);

        // when (操作):
        let result = PlayerId::new(value);

        // then (期待する結果):
        assert!(matches!(result, Err(ValueObjectError::TooLong { .. })));
    }

    #[test]
    fn test_synthetic_player_id_is_recognized() {
        // テスト項目: 合成参加者の ID はパターンで判別できる
        // given (前提条件):
        let room_id = RoomId::new("room_1".to_string()).unwrap();

        // when (操作):
        let dummy = PlayerId::synthetic(&room_id, 2);
        let real = PlayerId::new("U123".to_string()).unwrap();

        // then (期待する結果):
        assert_eq!(dummy.as_str(), "dummy_room_1_2");
        assert!(dummy.is_synthetic());
        assert!(!real.is_synthetic());
    }

    #[test]
    fn test_room_id_factory_generates_unique_ids() {
        // テスト項目: RoomIdFactory は毎回異なる ID を生成する
        // given (前提条件):

        // when (操作):
        let a = RoomIdFactory::generate();
        let b = RoomIdFactory::generate();

        // then (期待する結果):
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("room_"));
    }

    #[test]
    fn test_vote_target_parse() {
        // テスト項目: ディスパッチャの投票先文字列が正しく解釈される
        // given (前提条件):

        // when (操作):
        let peace = VoteTarget::parse("PEACE_VILLAGE".to_string()).unwrap();
        let player = VoteTarget::parse("alice".to_string()).unwrap();

        // then (期待する結果):
        assert_eq!(peace, VoteTarget::NoExpulsion);
        assert_eq!(player.player().map(PlayerId::as_str), Some("alice"));
        assert!(VoteTarget::parse(String::new()).is_err());
    }
}
