//! Telegram adapter (teloxide).
//!
//! Implements the `relay-core` DeliveryPort over the Telegram Bot API and runs the bot's
//! update loop.

use async_trait::async_trait;

use teloxide::{
    prelude::*,
    types::{ForceReply, ParseMode},
};

use std::time::Duration;

use tokio::time::sleep;

pub mod handlers;
pub mod router;

use relay_core::{
    domain::{ChatId, Format},
    errors::Error,
    messaging::{
        port::{DeliveryPort, DeliveryReport},
        types::Reply,
    },
    Result,
};

/// Longest flood-control wait honoured inside a single send.
const MAX_RETRY_WAIT: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(chat_id.0)
    }

    #[allow(deprecated)]
    fn parse_mode(format: Format) -> Option<ParseMode> {
        match format {
            Format::Unspecified => None,
            Format::MarkdownV2 => Some(ParseMode::MarkdownV2),
            Format::Markdown => Some(ParseMode::Markdown),
            Format::Html => Some(ParseMode::Html),
        }
    }

    fn map_err(e: teloxide::RequestError) -> Error {
        Error::External(format!("telegram error: {e}"))
    }

    /// How long to sit out a flood-control reply before the one retry, or `None` to fail the
    /// send now. Waits beyond [`MAX_RETRY_WAIT`] fail the send.
    fn retry_wait(e: &teloxide::RequestError, retried: bool) -> Option<Duration> {
        match e {
            teloxide::RequestError::RetryAfter(wait) if !retried && *wait <= MAX_RETRY_WAIT => {
                Some(*wait)
            }
            _ => None,
        }
    }

    async fn send_with_retry<T, Fut>(
        &self,
        chat_id: ChatId,
        mut request: impl FnMut() -> Fut,
    ) -> Result<()>
    where
        Fut: std::future::IntoFuture<Output = std::result::Result<T, teloxide::RequestError>>,
        Fut::IntoFuture: Send,
    {
        let mut retried = false;
        loop {
            let err = match request().await {
                Ok(_) => return Ok(()),
                Err(e) => e,
            };
            let Some(wait) = Self::retry_wait(&err, retried) else {
                return Err(Self::map_err(err));
            };
            tracing::warn!(
                op = "telegram.retry_after",
                chat_id = chat_id.0,
                ?wait,
                "rate limited"
            );
            retried = true;
            sleep(wait).await;
        }
    }

    async fn send_text(&self, chat_id: ChatId, text: &str, format: Format) -> Result<()> {
        let mode = Self::parse_mode(format);
        self.send_with_retry(chat_id, || {
            let req = self.bot.send_message(Self::tg_chat(chat_id), text.to_string());
            match mode {
                Some(mode) => req.parse_mode(mode),
                None => req,
            }
        })
        .await
    }

    /// Answer a bot update. Prompts open the client's reply field.
    pub async fn send_reply(&self, reply: &Reply) -> Result<()> {
        if !reply.force_reply {
            return self.send_text(reply.chat_id, &reply.text, reply.format).await;
        }

        let mode = Self::parse_mode(reply.format);
        self.send_with_retry(reply.chat_id, || {
            let req = self
                .bot
                .send_message(Self::tg_chat(reply.chat_id), reply.text.clone())
                .reply_markup(ForceReply::new());
            match mode {
                Some(mode) => req.parse_mode(mode),
                None => req,
            }
        })
        .await
    }
}

#[async_trait]
impl DeliveryPort for TelegramMessenger {
    async fn deliver(
        &self,
        chat_ids: &[ChatId],
        text: &str,
        format: Format,
    ) -> Result<DeliveryReport> {
        let mut report = DeliveryReport::default();
        for &chat_id in chat_ids {
            match self.send_text(chat_id, text, format).await {
                Ok(()) => report.delivered.push(chat_id),
                Err(e) => {
                    tracing::warn!(
                        op = "telegram.deliver",
                        chat_id = chat_id.0,
                        error = %e,
                        "send failed"
                    );
                    report.failed.push((chat_id, e.to_string()));
                }
            }
        }
        Ok(report)
    }
}
