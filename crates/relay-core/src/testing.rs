//! In-memory store used by the use-case tests.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::{
    domain::{Chat, ChatId, Company, CompanyId, CompanyRegistrationInfo, Owner, OwnerId, UserId},
    errors::StorageError,
    ports::{ChatStore, CompanyStore, RecipientDirectory, RegistrationStore, StorageResult},
};

#[derive(Default)]
struct Tables {
    next_id: i64,
    owners: Vec<Owner>,
    companies: Vec<Company>,
    chats: Vec<Chat>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn owner_or_create(&mut self, external_id: UserId, display_name: &str) -> OwnerId {
        if let Some(o) = self.owners.iter().find(|o| o.external_id == external_id) {
            return o.id;
        }
        let id = OwnerId(self.next_id());
        self.owners.push(Owner {
            id,
            external_id,
            display_name: display_name.to_string(),
        });
        id
    }

    fn company_by_owner(&self, owner: UserId) -> Option<&Company> {
        let owner = self.owners.iter().find(|o| o.external_id == owner)?;
        self.companies.iter().find(|c| c.owner_id == owner.id)
    }

    fn chats_of(&self, company_id: CompanyId) -> StorageResult<Vec<Chat>> {
        let chats: Vec<Chat> = self
            .chats
            .iter()
            .filter(|c| c.company_id == company_id)
            .cloned()
            .collect();
        if chats.is_empty() {
            return Err(StorageError::NotFound);
        }
        Ok(chats)
    }
}

/// Single-lock store: every operation is trivially atomic.
#[derive(Default)]
pub(crate) struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub(crate) fn seed_company(&self, owner: UserId, token: &str) -> CompanyId {
        let mut t = self.tables.lock().unwrap();
        let owner_id = t.owner_or_create(owner, "seed");
        let id = CompanyId(t.next_id());
        t.companies.push(Company {
            id,
            owner_id,
            token: token.to_string(),
            name: "Seed".to_string(),
            email: "seed@example.com".to_string(),
        });
        id
    }

    pub(crate) fn seed_chat(&self, company_id: CompanyId, external_id: i64) {
        let mut t = self.tables.lock().unwrap();
        let id = t.next_id();
        t.chats.push(Chat {
            id,
            company_id,
            external_id: ChatId(external_id),
        });
    }

    pub(crate) fn owner_count(&self) -> usize {
        self.tables.lock().unwrap().owners.len()
    }
}

#[async_trait]
impl RecipientDirectory for MemoryStore {
    async fn chats_by_token(&self, token: &str) -> StorageResult<Vec<Chat>> {
        let t = self.tables.lock().unwrap();
        let company = t
            .companies
            .iter()
            .find(|c| c.token == token)
            .ok_or(StorageError::NotFound)?;
        t.chats_of(company.id)
    }

    async fn chats_by_company_id(&self, company_id: CompanyId) -> StorageResult<Vec<Chat>> {
        self.tables.lock().unwrap().chats_of(company_id)
    }
}

#[async_trait]
impl ChatStore for MemoryStore {
    async fn add_chat(&self, company_id: CompanyId, external_id: ChatId) -> StorageResult<Chat> {
        let mut t = self.tables.lock().unwrap();
        if t
            .chats
            .iter()
            .any(|c| c.company_id == company_id && c.external_id == external_id)
        {
            return Err(StorageError::AlreadyExists);
        }
        let chat = Chat {
            id: t.next_id(),
            company_id,
            external_id,
        };
        t.chats.push(chat.clone());
        Ok(chat)
    }

    async fn delete_chat_by_id(&self, id: i64) -> StorageResult<()> {
        self.tables.lock().unwrap().chats.retain(|c| c.id != id);
        Ok(())
    }
}

#[async_trait]
impl CompanyStore for MemoryStore {
    async fn company_by_owner(&self, owner: UserId) -> StorageResult<Company> {
        let t = self.tables.lock().unwrap();
        t.company_by_owner(owner)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn update_token(&self, company_id: CompanyId, token: &str) -> StorageResult<()> {
        let mut t = self.tables.lock().unwrap();
        let company = t
            .companies
            .iter_mut()
            .find(|c| c.id == company_id)
            .ok_or(StorageError::NotFound)?;
        company.token = token.to_string();
        Ok(())
    }

    async fn delete_company(&self, company_id: CompanyId) -> StorageResult<()> {
        let mut t = self.tables.lock().unwrap();
        t.chats.retain(|c| c.company_id != company_id);
        t.companies.retain(|c| c.id != company_id);
        Ok(())
    }
}

#[async_trait]
impl RegistrationStore for MemoryStore {
    async fn register_company(
        &self,
        info: &CompanyRegistrationInfo,
        token: &str,
    ) -> StorageResult<Company> {
        let mut t = self.tables.lock().unwrap();
        let owner_id = t.owner_or_create(info.owner.external_id, &info.owner.display_name);
        if t.companies.iter().any(|c| c.owner_id == owner_id) {
            return Err(StorageError::AlreadyExists);
        }
        let company = Company {
            id: CompanyId(t.next_id()),
            owner_id,
            token: token.to_string(),
            name: info.name.clone(),
            email: info.email.clone(),
        };
        t.companies.push(company.clone());
        Ok(company)
    }
}
