use std::sync::Arc;

use crate::{
    domain::{Chat, ChatId, UserId},
    errors::{ChatError, CompanyError, StorageError},
    ports::{ChatStore, CompanyStore, RecipientDirectory},
};

/// Adds and removes destination chats on behalf of a company owner.
pub struct ChatService {
    chats: Arc<dyn ChatStore>,
    companies: Arc<dyn CompanyStore>,
    directory: Arc<dyn RecipientDirectory>,
}

impl ChatService {
    pub fn new(
        chats: Arc<dyn ChatStore>,
        companies: Arc<dyn CompanyStore>,
        directory: Arc<dyn RecipientDirectory>,
    ) -> Self {
        Self {
            chats,
            companies,
            directory,
        }
    }

    pub async fn add_chat(&self, owner: UserId, chat_id: ChatId) -> Result<Chat, ChatError> {
        let company = self
            .companies
            .company_by_owner(owner)
            .await
            .map_err(CompanyError::from)?;

        match self.chats.add_chat(company.id, chat_id).await {
            Ok(chat) => {
                tracing::info!(
                    op = "chat.add_chat",
                    company_id = company.id.0,
                    chat_id = chat_id.0,
                    "chat added"
                );
                Ok(chat)
            }
            Err(StorageError::AlreadyExists) => Err(ChatError::ChatAlreadyAdded),
            Err(e) => Err(ChatError::Storage(e)),
        }
    }

    /// Delete the chat with Telegram id `chat_id` from the owner's company.
    pub async fn delete_chat(&self, owner: UserId, chat_id: ChatId) -> Result<(), ChatError> {
        let company = self
            .companies
            .company_by_owner(owner)
            .await
            .map_err(CompanyError::from)?;

        let chats = match self.directory.chats_by_company_id(company.id).await {
            Ok(chats) => chats,
            Err(StorageError::NotFound) => return Err(ChatError::ChatNotFound),
            Err(e) => return Err(ChatError::Storage(e)),
        };

        let Some(chat) = chats.into_iter().find(|c| c.external_id == chat_id) else {
            return Err(ChatError::ChatNotFound);
        };

        self.chats
            .delete_chat_by_id(chat.id)
            .await
            .map_err(ChatError::Storage)?;
        tracing::info!(
            op = "chat.delete_chat",
            company_id = company.id.0,
            chat_id = chat_id.0,
            "chat deleted"
        );
        Ok(())
    }
}
