use async_trait::async_trait;
use relay_core::{
    domain::{Chat, ChatId, CompanyId},
    errors::StorageError,
    ports::{ChatStore, RecipientDirectory, StorageResult},
    utils::iso_timestamp_utc,
};

use crate::{
    map_err,
    rows::{non_empty_chats, ChatRow},
    SqliteStore,
};

#[async_trait]
impl RecipientDirectory for SqliteStore {
    async fn chats_by_token(&self, token: &str) -> StorageResult<Vec<Chat>> {
        let rows: Vec<ChatRow> = sqlx::query_as(
            r#"SELECT ch.id, ch.company_id, ch.telegram_id
               FROM chats ch
               JOIN companies c ON c.id = ch.company_id
               WHERE c.token = ?
               ORDER BY ch.id"#,
        )
        .bind(token)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_err("chats_by_token", e))?;

        non_empty_chats(rows).ok_or(StorageError::NotFound)
    }

    async fn chats_by_company_id(&self, company_id: CompanyId) -> StorageResult<Vec<Chat>> {
        let rows: Vec<ChatRow> = sqlx::query_as(
            "SELECT id, company_id, telegram_id FROM chats WHERE company_id = ? ORDER BY id",
        )
        .bind(company_id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_err("chats_by_company_id", e))?;

        non_empty_chats(rows).ok_or(StorageError::NotFound)
    }
}

#[async_trait]
impl ChatStore for SqliteStore {
    async fn add_chat(&self, company_id: CompanyId, external_id: ChatId) -> StorageResult<Chat> {
        let row: ChatRow = sqlx::query_as(
            r#"INSERT INTO chats (company_id, telegram_id, created_at)
               VALUES (?, ?, ?)
               RETURNING id, company_id, telegram_id"#,
        )
        .bind(company_id.0)
        .bind(external_id.0)
        .bind(iso_timestamp_utc())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_err("add_chat", e))?;

        tracing::info!(
            op = "storage.add_chat",
            company_id = company_id.0,
            chat_id = external_id.0,
            "chat added"
        );
        Ok(row.into())
    }

    async fn delete_chat_by_id(&self, id: i64) -> StorageResult<()> {
        let result = sqlx::query("DELETE FROM chats WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_err("delete_chat_by_id", e))?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}
