use std::{collections::HashMap, sync::Arc, time::Duration};

use tokio::sync::Mutex;
use tokio::time::{sleep_until, timeout, Instant};

use crate::{
    domain::{ChatId, Format},
    messaging::port::{DeliveryPort, DeliveryReport},
    Result,
};

#[derive(Clone, Copy, Debug)]
pub struct ThrottleConfig {
    /// Minimum spacing between *any* two sends (bot-wide flood control).
    pub global_min_interval: Duration,
    /// Minimum spacing between sends to the same chat (Telegram ~1 msg/sec/chat).
    pub per_chat_min_interval: Duration,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            global_min_interval: Duration::from_millis(40), // ~25/sec
            per_chat_min_interval: Duration::from_millis(1050), // ~0.95/sec
        }
    }
}

/// Send slots handed out so far. A slot satisfies both the bot-wide and the per-chat spacing.
///
/// A chat whose next slot is already in the past is indistinguishable from a chat never
/// seen, so such entries are dropped on every reservation and the map only holds chats sent
/// to within the last `per_chat_min_interval` (plus whatever is queued).
#[derive(Debug)]
struct SendSchedule {
    cfg: ThrottleConfig,
    next_any: Instant,
    next_per_chat: HashMap<ChatId, Instant>,
}

impl SendSchedule {
    fn new(cfg: ThrottleConfig) -> Self {
        Self {
            cfg,
            next_any: Instant::now(),
            next_per_chat: HashMap::new(),
        }
    }

    /// Reserve the earliest slot for `chat` and return when it opens.
    fn reserve(&mut self, chat: ChatId, now: Instant) -> Instant {
        self.next_per_chat.retain(|_, next| *next > now);

        let mut at = now.max(self.next_any);
        if let Some(&chat_next) = self.next_per_chat.get(&chat) {
            at = at.max(chat_next);
        }

        self.next_any = at + self.cfg.global_min_interval;
        self.next_per_chat
            .insert(chat, at + self.cfg.per_chat_min_interval);
        at
    }
}

/// DeliveryPort decorator that paces outbound sends.
///
/// A fan-out becomes one inner call per chat, each started at its reserved slot. Waiting for
/// a slot is unbounded; with a send timeout set, only the inner call itself is bounded. A
/// failed or timed-out chat is recorded in the report and the remaining chats are still
/// attempted.
pub struct ThrottledDelivery {
    inner: Arc<dyn DeliveryPort>,
    schedule: Mutex<SendSchedule>,
    send_timeout: Option<Duration>,
}

impl ThrottledDelivery {
    pub fn new(inner: Arc<dyn DeliveryPort>, cfg: ThrottleConfig) -> Self {
        Self {
            inner,
            schedule: Mutex::new(SendSchedule::new(cfg)),
            send_timeout: None,
        }
    }

    /// Bound every inner send by `limit`.
    pub fn with_send_timeout(mut self, limit: Duration) -> Self {
        self.send_timeout = Some(limit);
        self
    }

    async fn wait_for_slot(&self, chat_id: ChatId) {
        let at = {
            let mut schedule = self.schedule.lock().await;
            schedule.reserve(chat_id, Instant::now())
        };
        sleep_until(at).await;
    }

    async fn send_one(&self, chat_id: ChatId, text: &str, format: Format) -> DeliveryReport {
        let chats = [chat_id];
        let send = self.inner.deliver(&chats, text, format);
        let outcome = match self.send_timeout {
            Some(limit) => match timeout(limit, send).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    tracing::warn!(
                        op = "delivery.send",
                        chat_id = chat_id.0,
                        ?limit,
                        "send timed out"
                    );
                    return DeliveryReport {
                        delivered: Vec::new(),
                        failed: vec![(chat_id, "send timed out".to_string())],
                    };
                }
            },
            None => send.await,
        };

        outcome.unwrap_or_else(|e| DeliveryReport {
            delivered: Vec::new(),
            failed: vec![(chat_id, e.to_string())],
        })
    }

    #[cfg(test)]
    async fn scheduled_chats(&self) -> usize {
        self.schedule.lock().await.next_per_chat.len()
    }
}

#[async_trait::async_trait]
impl DeliveryPort for ThrottledDelivery {
    async fn deliver(
        &self,
        chat_ids: &[ChatId],
        text: &str,
        format: Format,
    ) -> Result<DeliveryReport> {
        let mut report = DeliveryReport::default();
        for &chat_id in chat_ids {
            self.wait_for_slot(chat_id).await;
            let one = self.send_one(chat_id, text, format).await;
            report.delivered.extend(one.delivered);
            report.failed.extend(one.failed);
        }
        Ok(report)
    }
}
