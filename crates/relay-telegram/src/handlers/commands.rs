use relay_core::{
    domain::{ChatId, UserId},
    messaging::types::{Command, IncomingUpdate, TextMessage},
};

fn parse_command(text: &str) -> (String, String) {
    // Telegram may send `/cmd@botname arg1 ...`
    let mut parts = text.trim().splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("").trim();
    let rest = parts.next().unwrap_or("").trim().to_string();

    let cmd = first
        .trim_start_matches('/')
        .split('@')
        .next()
        .unwrap_or("")
        .to_lowercase();

    (cmd, rest)
}

/// Classify a text message as a bot command or dialogue input.
pub(crate) fn to_update(
    chat_id: ChatId,
    user_id: UserId,
    username: Option<String>,
    text: &str,
) -> IncomingUpdate {
    if text.trim_start().starts_with('/') {
        let (name, args) = parse_command(text);
        return IncomingUpdate::Command(Command {
            chat_id,
            user_id,
            username,
            name,
            args,
        });
    }

    IncomingUpdate::Text(TextMessage {
        chat_id,
        user_id,
        username,
        text: text.to_string(),
    })
}
