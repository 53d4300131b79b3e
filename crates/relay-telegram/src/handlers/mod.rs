//! Telegram update handlers.
//!
//! Each message is translated into a `relay-core` update, handed to the command service and
//! the reply (if any) is sent back to the same chat.

use std::sync::Arc;

use teloxide::{prelude::*, types::User};

use relay_core::domain::{ChatId, UserId};

use crate::router::AppState;

mod commands;

pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    // Only text from a real user drives the bot; media and channel posts are ignored.
    let (Some(user), Some(text)) = (msg.from(), msg.text()) else {
        return Ok(());
    };

    let update = commands::to_update(
        ChatId(msg.chat.id.0),
        UserId(user.id.0 as i64),
        display_name(user),
        text,
    );

    let Some(reply) = state.commands.handle(update).await else {
        return Ok(());
    };

    if let Err(e) = state.messenger.send_reply(&reply).await {
        tracing::warn!(
            op = "telegram.reply",
            chat_id = reply.chat_id.0,
            error = %e,
            "reply failed"
        );
    }
    Ok(())
}

fn display_name(user: &User) -> Option<String> {
    user.username.clone().or_else(|| {
        let full = user.full_name();
        (!full.trim().is_empty()).then_some(full)
    })
}
