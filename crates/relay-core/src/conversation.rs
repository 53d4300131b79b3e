//! Pending multi-step dialogues, keyed by chat id.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::{ChatId, OwnerInfo};

/// Where a chat currently is in a multi-step dialogue.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Conversation {
    /// `/register` was accepted; the next text is the company name.
    AwaitCompanyName,
    /// Company name received; the next text is the contact email.
    AwaitEmail { company_name: String, owner: OwnerInfo },
}

/// Exclusive access to one chat's conversation slot. The slot stays locked until the guard
/// is dropped, so updates from the same chat are processed one at a time while other chats
/// proceed independently.
pub type ConversationGuard = OwnedMutexGuard<Option<Conversation>>;

#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn lock(&self, chat_id: ChatId) -> ConversationGuard;

    /// Forget the chat's slot if no dialogue is pending and nobody holds or awaits it.
    /// Call after the guard from [`ConversationStore::lock`] is dropped.
    async fn release(&self, chat_id: ChatId);
}

/// Process-local store: a map of per-chat mutexes. The outer map lock is held only long
/// enough to fetch, create or drop the chat's slot.
#[derive(Default)]
pub struct InMemoryConversations {
    inner: Mutex<HashMap<i64, Arc<Mutex<Option<Conversation>>>>>,
}

impl InMemoryConversations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of chats with a live slot.
    pub async fn tracked(&self) -> usize {
        self.inner.lock().await.len()
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversations {
    async fn lock(&self, chat_id: ChatId) -> ConversationGuard {
        let slot = {
            let mut map = self.inner.lock().await;
            map.entry(chat_id.0)
                .or_insert_with(|| Arc::new(Mutex::new(None)))
                .clone()
        };
        slot.lock_owned().await
    }

    async fn release(&self, chat_id: ChatId) {
        let mut map = self.inner.lock().await;
        let Some(slot) = map.get(&chat_id.0) else {
            return;
        };
        // Another handler holding or waiting on the slot keeps its own clone of the Arc, and
        // `lock` cannot hand out a new one while the map lock is held here.
        if Arc::strong_count(slot) > 1 {
            return;
        }
        let idle = slot.try_lock().map(|c| c.is_none()).unwrap_or(false);
        if idle {
            map.remove(&chat_id.0);
        }
    }
}
