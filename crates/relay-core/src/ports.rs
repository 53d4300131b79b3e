//! Storage ports consumed by the use cases.
//!
//! The delivery side lives in [`crate::messaging::port`].

use async_trait::async_trait;

use crate::{
    domain::{Chat, ChatId, Company, CompanyId, CompanyRegistrationInfo, UserId},
    errors::StorageError,
};

pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Lookup service mapping a token or company id to its destination chats.
///
/// Implementations return chats in a stable order for a given company state and report
/// `StorageError::NotFound` when there is nothing to return.
#[async_trait]
pub trait RecipientDirectory: Send + Sync {
    async fn chats_by_token(&self, token: &str) -> StorageResult<Vec<Chat>>;
    async fn chats_by_company_id(&self, company_id: CompanyId) -> StorageResult<Vec<Chat>>;
}

#[async_trait]
pub trait ChatStore: Send + Sync {
    async fn add_chat(&self, company_id: CompanyId, external_id: ChatId) -> StorageResult<Chat>;
    async fn delete_chat_by_id(&self, id: i64) -> StorageResult<()>;
}

#[async_trait]
pub trait CompanyStore: Send + Sync {
    async fn company_by_owner(&self, owner: UserId) -> StorageResult<Company>;
    async fn update_token(&self, company_id: CompanyId, token: &str) -> StorageResult<()>;
    /// Removes the company and all of its chats atomically.
    async fn delete_company(&self, company_id: CompanyId) -> StorageResult<()>;
}

#[async_trait]
pub trait RegistrationStore: Send + Sync {
    /// Get-or-create the owner, then create the company, as one unit of work.
    ///
    /// Fails with `StorageError::AlreadyExists` if the owner already has a company.
    async fn register_company(
        &self,
        info: &CompanyRegistrationInfo,
        token: &str,
    ) -> StorageResult<Company>;
}
