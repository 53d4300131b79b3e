use relay_core::domain::{Chat, ChatId, Company, CompanyId, OwnerId};

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct CompanyRow {
    pub id: i64,
    pub owner_id: i64,
    pub token: String,
    pub name: String,
    pub email: String,
}

impl From<CompanyRow> for Company {
    fn from(row: CompanyRow) -> Self {
        Self {
            id: CompanyId(row.id),
            owner_id: OwnerId(row.owner_id),
            token: row.token,
            name: row.name,
            email: row.email,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ChatRow {
    pub id: i64,
    pub company_id: i64,
    pub telegram_id: i64,
}

impl From<ChatRow> for Chat {
    fn from(row: ChatRow) -> Self {
        Self {
            id: row.id,
            company_id: CompanyId(row.company_id),
            external_id: ChatId(row.telegram_id),
        }
    }
}

pub(crate) fn non_empty_chats(rows: Vec<ChatRow>) -> Option<Vec<Chat>> {
    if rows.is_empty() {
        None
    } else {
        Some(rows.into_iter().map(Chat::from).collect())
    }
}
