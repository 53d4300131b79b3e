use async_trait::async_trait;
use relay_core::{
    domain::{Company, CompanyId, CompanyRegistrationInfo, UserId},
    errors::StorageError,
    ports::{CompanyStore, RegistrationStore, StorageResult},
    utils::iso_timestamp_utc,
};

use crate::{map_err, rows::CompanyRow, SqliteStore};

#[async_trait]
impl CompanyStore for SqliteStore {
    async fn company_by_owner(&self, owner: UserId) -> StorageResult<Company> {
        let row: Option<CompanyRow> = sqlx::query_as(
            r#"SELECT c.id, c.owner_id, c.token, c.name, c.email
               FROM companies c
               JOIN owners o ON o.id = c.owner_id
               WHERE o.telegram_id = ?"#,
        )
        .bind(owner.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_err("company_by_owner", e))?;

        row.map(Company::from).ok_or(StorageError::NotFound)
    }

    async fn update_token(&self, company_id: CompanyId, token: &str) -> StorageResult<()> {
        let result = sqlx::query("UPDATE companies SET token = ? WHERE id = ?")
            .bind(token)
            .bind(company_id.0)
            .execute(&self.pool)
            .await
            .map_err(|e| map_err("update_token", e))?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        tracing::info!(op = "storage.update_token", company_id = company_id.0, "token rotated");
        Ok(())
    }

    async fn delete_company(&self, company_id: CompanyId) -> StorageResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_err("delete_company", e))?;

        sqlx::query("DELETE FROM chats WHERE company_id = ?")
            .bind(company_id.0)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_err("delete_company", e))?;

        let result = sqlx::query("DELETE FROM companies WHERE id = ?")
            .bind(company_id.0)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_err("delete_company", e))?;

        if result.rows_affected() == 0 {
            // Dropping the transaction rolls it back.
            return Err(StorageError::NotFound);
        }

        tx.commit()
            .await
            .map_err(|e| map_err("delete_company", e))?;
        tracing::info!(
            op = "storage.delete_company",
            company_id = company_id.0,
            "company deleted"
        );
        Ok(())
    }
}

#[async_trait]
impl RegistrationStore for SqliteStore {
    async fn register_company(
        &self,
        info: &CompanyRegistrationInfo,
        token: &str,
    ) -> StorageResult<Company> {
        let now = iso_timestamp_utc();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_err("register_company", e))?;

        let (owner_id,): (i64,) = sqlx::query_as(
            r#"INSERT INTO owners (telegram_id, telegram_name, created_at)
               VALUES (?, ?, ?)
               ON CONFLICT (telegram_id) DO UPDATE SET telegram_name = excluded.telegram_name
               RETURNING id"#,
        )
        .bind(info.owner.external_id.0)
        .bind(&info.owner.display_name)
        .bind(&now)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_err("register_company", e))?;

        // `companies.owner_id` is UNIQUE, so a second company for the owner surfaces as
        // AlreadyExists here.
        let row: CompanyRow = sqlx::query_as(
            r#"INSERT INTO companies (owner_id, token, name, email, created_at)
               VALUES (?, ?, ?, ?, ?)
               RETURNING id, owner_id, token, name, email"#,
        )
        .bind(owner_id)
        .bind(token)
        .bind(&info.name)
        .bind(&info.email)
        .bind(&now)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_err("register_company", e))?;

        tx.commit()
            .await
            .map_err(|e| map_err("register_company", e))?;

        tracing::info!(
            op = "storage.register_company",
            company_id = row.id,
            owner = info.owner.external_id.0,
            "company registered"
        );
        Ok(row.into())
    }
}
