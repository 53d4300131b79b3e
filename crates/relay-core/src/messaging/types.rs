use crate::domain::{ChatId, Format, UserId};

/// Inbound bot update, already stripped of messenger specifics.
#[derive(Clone, Debug)]
pub enum IncomingUpdate {
    Command(Command),
    Text(TextMessage),
}

impl IncomingUpdate {
    pub fn chat_id(&self) -> ChatId {
        match self {
            Self::Command(c) => c.chat_id,
            Self::Text(t) => t.chat_id,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Command {
    pub chat_id: ChatId,
    pub user_id: UserId,
    pub username: Option<String>,
    /// Lowercased, without the leading `/` or `@botname` suffix.
    pub name: String,
    pub args: String,
}

#[derive(Clone, Debug)]
pub struct TextMessage {
    pub chat_id: ChatId,
    pub user_id: UserId,
    pub username: Option<String>,
    pub text: String,
}

/// Bot answer to an update.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reply {
    pub chat_id: ChatId,
    pub text: String,
    pub format: Format,
    /// Ask the client to open a reply field (used while a dialogue waits for input).
    pub force_reply: bool,
}

impl Reply {
    pub fn plain(chat_id: ChatId, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            format: Format::Unspecified,
            force_reply: false,
        }
    }

    pub fn html(chat_id: ChatId, text: impl Into<String>) -> Self {
        Self {
            format: Format::Html,
            ..Self::plain(chat_id, text)
        }
    }

    pub fn prompt(chat_id: ChatId, text: impl Into<String>) -> Self {
        Self {
            force_reply: true,
            ..Self::plain(chat_id, text)
        }
    }
}
