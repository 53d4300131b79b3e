//! Token → recipients → delivery.

use std::{sync::Arc, time::Duration};

use tokio::time::timeout;

use crate::{
    domain::{Chat, ChatId, OutboundMessage},
    errors::{SendError, StorageError},
    messaging::port::DeliveryPort,
    ports::RecipientDirectory,
};

/// Resolves a company token to its chats, applies the caller's allow-list and drives one
/// delivery call. Holds no per-call state.
///
/// Only the lookup is bounded here. The delivery call runs to completion; a pacing transport
/// (`ThrottledDelivery`) bounds each send on its own.
pub struct MessageRouter {
    directory: Arc<dyn RecipientDirectory>,
    transport: Arc<dyn DeliveryPort>,
    lookup_timeout: Option<Duration>,
}

impl MessageRouter {
    pub fn new(directory: Arc<dyn RecipientDirectory>, transport: Arc<dyn DeliveryPort>) -> Self {
        Self {
            directory,
            transport,
            lookup_timeout: None,
        }
    }

    /// Bound the recipient lookup of each call.
    pub fn with_lookup_timeout(mut self, limit: Duration) -> Self {
        self.lookup_timeout = Some(limit);
        self
    }

    async fn resolve(&self, token: &str) -> Result<Vec<Chat>, SendError> {
        let op = "routing.resolve";
        let lookup = self.directory.chats_by_token(token);
        let found = match self.lookup_timeout {
            Some(limit) => match timeout(limit, lookup).await {
                Ok(found) => found,
                Err(_) => {
                    tracing::error!(op, "get chats by company token: deadline exceeded");
                    return Err(SendError::ChatsNotFound);
                }
            },
            None => lookup.await,
        };

        match found {
            Ok(chats) => Ok(chats),
            Err(StorageError::NotFound) => {
                tracing::debug!(op, "chats not found");
                Err(SendError::ChatsNotFound)
            }
            Err(e) => {
                tracing::error!(op, error = %e, "get chats by company token");
                Err(SendError::ChatsNotFound)
            }
        }
    }

    pub async fn send_message(&self, msg: OutboundMessage) -> Result<(), SendError> {
        let op = "routing.send_message";
        let chats = self.resolve(&msg.token).await?;

        let recipients = select_recipients(&chats, &msg.chat_ids);
        if recipients.is_empty() {
            tracing::debug!(op, requested = msg.chat_ids.len(), "chats not allowed");
            return Err(SendError::ChatsNotAllowed);
        }

        match self.transport.deliver(&recipients, &msg.text, msg.format).await {
            Ok(report) if report.is_complete() => {
                tracing::debug!(op, delivered = report.delivered.len(), "message sent");
                Ok(())
            }
            Ok(report) => {
                tracing::error!(
                    op,
                    delivered = report.delivered.len(),
                    failed = report.failed.len(),
                    "can not send message to some chats"
                );
                for (chat, reason) in &report.failed {
                    tracing::debug!(op, chat_id = chat.0, reason = %reason, "delivery failed");
                }
                Err(SendError::CannotSend)
            }
            Err(e) => {
                tracing::error!(op, error = %e, "can not send message");
                Err(SendError::CannotSend)
            }
        }
    }
}

/// Every resolved chat when `filter` is empty, otherwise the resolved chats whose id is in
/// `filter`. Order follows `chats`; an id appears once per resolved entry.
fn select_recipients(chats: &[Chat], filter: &[ChatId]) -> Vec<ChatId> {
    chats
        .iter()
        .map(|c| c.external_id)
        .filter(|id| filter.is_empty() || filter.contains(id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{CompanyId, Format},
        messaging::{
            port::DeliveryReport,
            throttled::{ThrottleConfig, ThrottledDelivery},
        },
        ports::StorageResult,
        Error, Result,
    };
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FakeDirectory {
        result: StorageResult<Vec<Chat>>,
        delay: Option<Duration>,
    }

    impl FakeDirectory {
        fn with_chats(ids: &[i64]) -> Self {
            let chats = ids
                .iter()
                .enumerate()
                .map(|(i, id)| Chat {
                    id: i as i64 + 1,
                    company_id: CompanyId(1),
                    external_id: ChatId(*id),
                })
                .collect();
            Self {
                result: Ok(chats),
                delay: None,
            }
        }

        fn failing(e: StorageError) -> Self {
            Self {
                result: Err(e),
                delay: None,
            }
        }
    }

    #[async_trait]
    impl RecipientDirectory for FakeDirectory {
        async fn chats_by_token(&self, token: &str) -> StorageResult<Vec<Chat>> {
            if let Some(d) = self.delay {
                tokio::time::sleep(d).await;
            }
            if token == "unknown" {
                return Err(StorageError::NotFound);
            }
            self.result.clone()
        }

        async fn chats_by_company_id(&self, _company_id: CompanyId) -> StorageResult<Vec<Chat>> {
            self.result.clone()
        }
    }

    #[derive(Default)]
    struct FakeTransport {
        calls: Mutex<Vec<(Vec<ChatId>, String, Format)>>,
        fail_whole_call: bool,
        fail_chat: Option<ChatId>,
        delay: Option<Duration>,
    }

    impl FakeTransport {
        fn calls(&self) -> Vec<(Vec<ChatId>, String, Format)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl DeliveryPort for FakeTransport {
        async fn deliver(
            &self,
            chat_ids: &[ChatId],
            text: &str,
            format: Format,
        ) -> Result<DeliveryReport> {
            self.calls
                .lock()
                .unwrap()
                .push((chat_ids.to_vec(), text.to_string(), format));
            if let Some(d) = self.delay {
                tokio::time::sleep(d).await;
            }
            if self.fail_whole_call {
                return Err(Error::External("telegram is down".to_string()));
            }
            let mut report = DeliveryReport::default();
            for id in chat_ids {
                if Some(*id) == self.fail_chat {
                    report.failed.push((*id, "blocked".to_string()));
                } else {
                    report.delivered.push(*id);
                }
            }
            Ok(report)
        }
    }

    fn msg(token: &str, filter: &[i64]) -> OutboundMessage {
        OutboundMessage {
            text: "hi".to_string(),
            format: Format::Unspecified,
            token: token.to_string(),
            chat_ids: filter.iter().copied().map(ChatId).collect(),
        }
    }

    fn router(dir: FakeDirectory, transport: Arc<FakeTransport>) -> MessageRouter {
        MessageRouter::new(Arc::new(dir), transport)
    }

    #[tokio::test]
    async fn empty_filter_delivers_to_every_chat_in_order() {
        let transport = Arc::new(FakeTransport::default());
        let r = router(FakeDirectory::with_chats(&[100, 200]), transport.clone());

        r.send_message(msg("T1", &[])).await.unwrap();

        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, vec![ChatId(100), ChatId(200)]);
        assert_eq!(calls[0].1, "hi");
        assert_eq!(calls[0].2, Format::Unspecified);
    }

    #[tokio::test]
    async fn filter_keeps_only_registered_chats() {
        let transport = Arc::new(FakeTransport::default());
        let r = router(FakeDirectory::with_chats(&[100, 200]), transport.clone());

        r.send_message(msg("T1", &[200, 999])).await.unwrap();

        assert_eq!(transport.calls()[0].0, vec![ChatId(200)]);
    }

    #[tokio::test]
    async fn filter_follows_resolved_order() {
        let transport = Arc::new(FakeTransport::default());
        let r = router(FakeDirectory::with_chats(&[1, 2, 3]), transport.clone());

        r.send_message(msg("T1", &[3, 1])).await.unwrap();

        assert_eq!(transport.calls()[0].0, vec![ChatId(1), ChatId(3)]);
    }

    #[tokio::test]
    async fn duplicate_resolved_chats_are_not_deduplicated() {
        let transport = Arc::new(FakeTransport::default());
        let r = router(FakeDirectory::with_chats(&[5, 5, 6]), transport.clone());

        r.send_message(msg("T1", &[5])).await.unwrap();

        assert_eq!(transport.calls()[0].0, vec![ChatId(5), ChatId(5)]);
    }

    #[tokio::test]
    async fn disjoint_filter_is_not_allowed_and_never_delivers() {
        let transport = Arc::new(FakeTransport::default());
        let r = router(FakeDirectory::with_chats(&[100, 200]), transport.clone());

        let err = r.send_message(msg("T1", &[999])).await.unwrap_err();

        assert_eq!(err, SendError::ChatsNotAllowed);
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn unknown_token_is_chats_not_found() {
        let transport = Arc::new(FakeTransport::default());
        let r = router(FakeDirectory::with_chats(&[100]), transport.clone());

        let err = r.send_message(msg("unknown", &[])).await.unwrap_err();

        assert_eq!(err, SendError::ChatsNotFound);
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn backend_failure_is_reported_as_chats_not_found() {
        let transport = Arc::new(FakeTransport::default());
        let dir = FakeDirectory::failing(StorageError::Backend("db gone".to_string()));
        let r = router(dir, transport.clone());

        let err = r.send_message(msg("T1", &[])).await.unwrap_err();

        assert_eq!(err, SendError::ChatsNotFound);
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn transport_failure_is_cannot_send() {
        let transport = Arc::new(FakeTransport {
            fail_whole_call: true,
            ..Default::default()
        });
        let r = router(FakeDirectory::with_chats(&[1, 2, 3]), transport.clone());

        let err = r.send_message(msg("T1", &[])).await.unwrap_err();

        assert_eq!(err, SendError::CannotSend);
        assert_eq!(transport.calls().len(), 1);
    }

    #[tokio::test]
    async fn partial_failure_is_cannot_send() {
        let transport = Arc::new(FakeTransport {
            fail_chat: Some(ChatId(2)),
            ..Default::default()
        });
        let r = router(FakeDirectory::with_chats(&[1, 2, 3]), transport.clone());

        let err = r.send_message(msg("T1", &[])).await.unwrap_err();

        assert_eq!(err, SendError::CannotSend);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_lookup_hits_the_timeout() {
        let transport = Arc::new(FakeTransport::default());
        let mut dir = FakeDirectory::with_chats(&[1]);
        dir.delay = Some(Duration::from_secs(10));
        let r = router(dir, transport.clone()).with_lookup_timeout(Duration::from_secs(1));

        let err = r.send_message(msg("T1", &[])).await.unwrap_err();

        assert_eq!(err, SendError::ChatsNotFound);
        assert!(transport.calls().is_empty());
    }

    fn paced(transport: Arc<FakeTransport>) -> Arc<dyn DeliveryPort> {
        Arc::new(
            ThrottledDelivery::new(transport, ThrottleConfig::default())
                .with_send_timeout(Duration::from_secs(4)),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn large_fan_out_is_paced_to_completion() {
        let transport = Arc::new(FakeTransport {
            delay: Some(Duration::from_millis(60)),
            ..Default::default()
        });
        let ids: Vec<i64> = (1..=100).collect();
        let r = MessageRouter::new(
            Arc::new(FakeDirectory::with_chats(&ids)),
            paced(transport.clone()),
        )
        .with_lookup_timeout(Duration::from_secs(4));

        r.send_message(msg("T1", &[])).await.unwrap();

        let calls = transport.calls();
        assert_eq!(calls.len(), 100);
        assert!(calls.iter().all(|(chats, _, _)| chats.len() == 1));
    }

    #[tokio::test(start_paused = true)]
    async fn burst_to_one_company_queues_instead_of_failing() {
        let transport = Arc::new(FakeTransport {
            delay: Some(Duration::from_millis(60)),
            ..Default::default()
        });
        let r = Arc::new(
            MessageRouter::new(
                Arc::new(FakeDirectory::with_chats(&[1, 2])),
                paced(transport.clone()),
            )
            .with_lookup_timeout(Duration::from_secs(4)),
        );

        let sends: Vec<_> = (0..6)
            .map(|_| {
                let r = r.clone();
                tokio::spawn(async move { r.send_message(msg("T1", &[])).await })
            })
            .collect();
        for send in sends {
            assert_eq!(send.await.unwrap(), Ok(()));
        }
        assert_eq!(transport.calls().len(), 12);
    }

    #[tokio::test(start_paused = true)]
    async fn stuck_send_fails_the_request_after_the_rest_are_tried() {
        let transport = Arc::new(FakeTransport {
            delay: Some(Duration::from_secs(10)),
            ..Default::default()
        });
        let r = MessageRouter::new(
            Arc::new(FakeDirectory::with_chats(&[1, 2])),
            paced(transport.clone()),
        );

        let err = r.send_message(msg("T1", &[])).await.unwrap_err();

        assert_eq!(err, SendError::CannotSend);
        assert_eq!(transport.calls().len(), 2);
    }
}
