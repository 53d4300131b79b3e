use async_trait::async_trait;

use crate::{
    domain::{ChatId, Format},
    Result,
};

/// Per-call delivery outcome.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: Vec<ChatId>,
    pub failed: Vec<(ChatId, String)>,
}

impl DeliveryReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Pushes one message to a list of chats.
///
/// Implementations attempt every chat in order. `Err` means the call as a whole could not
/// run; individual chat failures are listed in the report instead.
#[async_trait]
pub trait DeliveryPort: Send + Sync {
    async fn deliver(&self, chat_ids: &[ChatId], text: &str, format: Format)
        -> Result<DeliveryReport>;
}
