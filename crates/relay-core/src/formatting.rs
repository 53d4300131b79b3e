//! Telegram HTML rendering for bot replies.

use crate::domain::CompanyInfo;

/// Escape HTML special characters for Telegram HTML parse mode.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub fn format_company_info(info: &CompanyInfo) -> String {
    let mut lines = vec![
        "<b>Your company:</b>".to_string(),
        format!("<b>Name:</b> <i>{}</i>", escape_html(&info.name)),
        format!("<b>Email:</b> <i>{}</i>", escape_html(&info.email)),
        format!("<b>Token:</b> <code>{}</code>", escape_html(&info.token)),
    ];

    if info.chat_ids.is_empty() {
        lines.push("\n<i>No chats yet. Add one with /addchat {chat_id}</i>".to_string());
    } else {
        lines.push("\n<b>Chats:</b>".to_string());
        lines.extend(info.chat_ids.iter().map(|c| format!("<code>{}</code>", c.0)));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChatId, CompanyId, OwnerId};

    fn info(chat_ids: Vec<ChatId>) -> CompanyInfo {
        CompanyInfo {
            id: CompanyId(1),
            owner_id: OwnerId(1),
            token: "abc123".to_string(),
            name: "R&D <Lab>".to_string(),
            email: "ops@acme.io".to_string(),
            chat_ids,
        }
    }

    #[test]
    fn escapes_html() {
        let s = r#"<a href="x&y">"#;
        assert_eq!(escape_html(s), "&lt;a href=&quot;x&amp;y&quot;&gt;");
    }

    #[test]
    fn company_info_escapes_user_input() {
        let html = format_company_info(&info(vec![]));
        assert!(html.contains("R&amp;D &lt;Lab&gt;"));
        assert!(html.contains("<code>abc123</code>"));
        assert!(html.contains("No chats yet"));
    }

    #[test]
    fn company_info_lists_chats() {
        let html = format_company_info(&info(vec![ChatId(-100123), ChatId(42)]));
        assert!(html.contains("<b>Chats:</b>\n<code>-100123</code>\n<code>42</code>"));
    }
}
