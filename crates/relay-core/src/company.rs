use std::sync::Arc;

use crate::{
    domain::{CompanyInfo, UserId},
    errors::{CompanyError, StorageError},
    ports::{CompanyStore, RecipientDirectory},
    security::generate_token,
};

/// Company management for owners: view, token rotation, deletion.
pub struct CompanyService {
    companies: Arc<dyn CompanyStore>,
    directory: Arc<dyn RecipientDirectory>,
    token_length: usize,
}

impl CompanyService {
    pub fn new(
        companies: Arc<dyn CompanyStore>,
        directory: Arc<dyn RecipientDirectory>,
        token_length: usize,
    ) -> Self {
        Self {
            companies,
            directory,
            token_length,
        }
    }

    /// The owner's company with its chat ids. A company without chats yields an empty list.
    pub async fn company_by_owner(&self, owner: UserId) -> Result<CompanyInfo, CompanyError> {
        let company = self.companies.company_by_owner(owner).await?;
        let company_id = company.id;

        let chats = match self.directory.chats_by_company_id(company_id).await {
            Ok(chats) => chats,
            Err(StorageError::NotFound) => Vec::new(),
            Err(e) => {
                tracing::error!(op = "company.company_by_owner", error = %e, "get chats by company id");
                return Err(CompanyError::Storage(e));
            }
        };

        Ok(CompanyInfo::new(
            company,
            chats.into_iter().map(|c| c.external_id).collect(),
        ))
    }

    /// Replace the owner's token. The previous token stops resolving immediately.
    pub async fn update_token(&self, owner: UserId) -> Result<String, CompanyError> {
        let company = self.companies.company_by_owner(owner).await?;
        let token = generate_token(self.token_length);
        self.companies.update_token(company.id, &token).await?;
        tracing::info!(op = "company.update_token", company_id = company.id.0, "token rotated");
        Ok(token)
    }

    pub async fn delete_company(&self, owner: UserId) -> Result<(), CompanyError> {
        let company = self.companies.company_by_owner(owner).await?;
        self.companies.delete_company(company.id).await?;
        tracing::info!(op = "company.delete_company", company_id = company.id.0, "company deleted");
        Ok(())
    }
}
