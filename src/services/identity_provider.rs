//! Proveedor de identidad
//!
//! El núcleo sólo confía en la identidad verificada por el proveedor; los
//! permisos se leen después del documento `User`. `LocalIdentityProvider`
//! guarda las cuentas en el almacén, con contraseñas bcrypt y tokens JWT.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::auth::{IdentityAccount, IssuedToken, NewAccount};
use crate::repositories::AccountRepository;
use crate::services::jwt_service::JwtService;
use crate::utils::errors::{AppError, AppResult};
use crate::utils::password::PasswordHasher;
use crate::utils::validation::normalize_email;

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Crea la cuenta y devuelve su id; email duplicado → conflicto
    async fn create_account(&self, account: NewAccount) -> AppResult<Uuid>;
    async fn set_disabled(&self, provider_id: Uuid, disabled: bool) -> AppResult<()>;
    async fn delete_account(&self, provider_id: Uuid) -> AppResult<()>;
    /// Devuelve el id de la cuenta si el token es válido y la cuenta está habilitada
    async fn verify_token(&self, token: &str) -> AppResult<Uuid>;
    async fn sign_in(&self, email: &str, password: &str) -> AppResult<IssuedToken>;
}

pub struct LocalIdentityProvider {
    accounts: Arc<dyn AccountRepository>,
    jwt: JwtService,
}

impl LocalIdentityProvider {
    pub fn new(accounts: Arc<dyn AccountRepository>, jwt: JwtService) -> Self {
        Self { accounts, jwt }
    }
}

#[async_trait]
impl IdentityProvider for LocalIdentityProvider {
    async fn create_account(&self, account: NewAccount) -> AppResult<Uuid> {
        let record = IdentityAccount {
            id: Uuid::new_v4(),
            email: normalize_email(&account.email),
            password_hash: account.password_hash,
            display_name: account.display_name,
            disabled: false,
            created_at: Utc::now(),
        };
        self.accounts.insert(&record).await?;
        info!("🔐 Cuenta de identidad creada: {}", record.email);
        Ok(record.id)
    }

    async fn set_disabled(&self, provider_id: Uuid, disabled: bool) -> AppResult<()> {
        if !self.accounts.set_disabled(provider_id, disabled).await? {
            return Err(AppError::NotFound(format!(
                "Identity account '{}' not found",
                provider_id
            )));
        }
        info!(account_id = %provider_id, disabled, "🔐 Estado de cuenta actualizado");
        Ok(())
    }

    async fn delete_account(&self, provider_id: Uuid) -> AppResult<()> {
        if !self.accounts.delete(provider_id).await? {
            return Err(AppError::NotFound(format!(
                "Identity account '{}' not found",
                provider_id
            )));
        }
        info!(account_id = %provider_id, "🗑️ Cuenta de identidad eliminada");
        Ok(())
    }

    async fn verify_token(&self, token: &str) -> AppResult<Uuid> {
        let claims = self.jwt.validate_token(token)?;
        let account_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::Unauthorized("Invalid token subject".to_string()))?;

        match self.accounts.find_by_id(account_id).await? {
            Some(account) if !account.disabled => Ok(account.id),
            Some(_) => Err(AppError::Unauthorized("Account is disabled".to_string())),
            None => Err(AppError::Unauthorized("Account no longer exists".to_string())),
        }
    }

    async fn sign_in(&self, email: &str, password: &str) -> AppResult<IssuedToken> {
        let invalid = || AppError::Unauthorized("Invalid email or password".to_string());

        let account = self
            .accounts
            .find_by_email(&normalize_email(email))
            .await?
            .ok_or_else(invalid)?;

        if !PasswordHasher::verify(password, &account.password_hash)? {
            warn!("⚠️ Intento de login fallido para {}", account.email);
            return Err(invalid());
        }
        if account.disabled {
            return Err(AppError::Unauthorized("Account is disabled".to_string()));
        }

        self.jwt.generate_access_token(account.id, &account.email)
    }
}
