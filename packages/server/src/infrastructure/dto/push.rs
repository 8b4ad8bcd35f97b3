//! Outbound push envelope.

use serde::Serialize;

use crate::domain::{ContextId, Notice, PlayerId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecipientKind {
    Context,
    Player,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct PushRecipient<'a> {
    pub kind: RecipientKind,
    pub id: &'a str,
}

impl<'a> PushRecipient<'a> {
    pub fn context(context: &'a ContextId) -> Self {
        Self {
            kind: RecipientKind::Context,
            id: context.as_str(),
        }
    }

    pub fn player(player: &'a PlayerId) -> Self {
        Self {
            kind: RecipientKind::Player,
            id: player.as_str(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct PushRequest<'a> {
    pub to: PushRecipient<'a>,
    pub notice: &'a Notice,
}
