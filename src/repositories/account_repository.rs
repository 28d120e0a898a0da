//! Cuentas del proveedor de identidad local

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::AccountRepository;
use crate::models::auth::IdentityAccount;
use crate::utils::errors::{map_unique_violation, AppResult};

pub struct PgAccountRepository {
    pool: PgPool,
}

impl PgAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountRepository for PgAccountRepository {
    async fn insert(&self, account: &IdentityAccount) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO identity_accounts (id, email, password_hash, display_name, disabled, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(account.id)
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(&account.display_name)
        .bind(account.disabled)
        .bind(account.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            map_unique_violation(e, format!("Account with email '{}' already exists", account.email))
        })?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<IdentityAccount>> {
        let account =
            sqlx::query_as::<_, IdentityAccount>("SELECT * FROM identity_accounts WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(account)
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<IdentityAccount>> {
        let account = sqlx::query_as::<_, IdentityAccount>(
            "SELECT * FROM identity_accounts WHERE lower(email) = lower($1)",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(account)
    }

    async fn set_disabled(&self, id: Uuid, disabled: bool) -> AppResult<bool> {
        let result = sqlx::query("UPDATE identity_accounts SET disabled = $2 WHERE id = $1")
            .bind(id)
            .bind(disabled)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM identity_accounts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
