use std::sync::Arc;

use crate::{
    domain::{Company, CompanyRegistrationInfo, UserId},
    errors::{RegistrationError, StorageError},
    ports::{CompanyStore, RegistrationStore},
    security::{generate_token, validate_company_name, validate_email},
};

pub struct RegistrationService {
    store: Arc<dyn RegistrationStore>,
    companies: Arc<dyn CompanyStore>,
    token_length: usize,
}

impl RegistrationService {
    pub fn new(
        store: Arc<dyn RegistrationStore>,
        companies: Arc<dyn CompanyStore>,
        token_length: usize,
    ) -> Self {
        Self {
            store,
            companies,
            token_length,
        }
    }

    pub async fn check_company_exists(&self, owner: UserId) -> Result<bool, RegistrationError> {
        match self.companies.company_by_owner(owner).await {
            Ok(_) => Ok(true),
            Err(StorageError::NotFound) => Ok(false),
            Err(e) => Err(RegistrationError::Storage(e)),
        }
    }

    /// Validate input, then create owner (if new) and company in one storage transaction.
    pub async fn register_company(
        &self,
        info: CompanyRegistrationInfo,
    ) -> Result<Company, RegistrationError> {
        validate_company_name(&info.name)?;
        validate_email(&info.email)?;

        let info = CompanyRegistrationInfo {
            name: info.name.trim().to_string(),
            email: info.email.trim().to_string(),
            owner: info.owner,
        };
        let token = generate_token(self.token_length);

        let company = self.store.register_company(&info, &token).await?;
        tracing::info!(
            op = "registration.register_company",
            company_id = company.id.0,
            owner = info.owner.external_id.0,
            "company registered"
        );
        Ok(company)
    }
}
