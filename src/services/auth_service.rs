//! Servicio de autenticación
//!
//! Login contra el proveedor de identidad y verificación de tokens para el
//! portal. La identidad viene del proveedor; el rol y los permisos, del
//! documento `User`.

use std::sync::Arc;

use tracing::{info, warn};
use validator::Validate;

use crate::dto::auth_dto::{LoginRequest, LoginResponse};
use crate::models::user::User;
use crate::repositories::{Repositories, UserRepository};
use crate::services::authorization_service::AuthorizationService;
use crate::services::identity_provider::IdentityProvider;
use crate::utils::errors::{AppError, AppResult};

pub struct AuthService {
    users: Arc<dyn UserRepository>,
    identity: Arc<dyn IdentityProvider>,
}

impl AuthService {
    pub fn new(repos: &Repositories, identity: Arc<dyn IdentityProvider>) -> Self {
        Self {
            users: repos.users.clone(),
            identity,
        }
    }

    pub async fn login(&self, request: LoginRequest) -> AppResult<LoginResponse> {
        request.validate()?;
        let token = self.identity.sign_in(&request.email, &request.password).await?;

        let user = self
            .users
            .find_by_id(token.account_id)
            .await?
            .ok_or_else(|| {
                warn!("⚠️ Cuenta {} sin documento de usuario", token.account_id);
                AppError::Unauthorized("User profile not found".to_string())
            })?;
        if !user.is_active {
            return Err(AppError::Forbidden("Account is deactivated".to_string()));
        }

        info!("🔑 Login correcto: {}", user.email);
        Ok(LoginResponse { token, user })
    }

    /// Verificación del portal: usuario existente, administrador y activo
    pub async fn verify(&self, token: &str) -> AppResult<User> {
        let user_id = self.identity.verify_token(token).await?;
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        AuthorizationService::ensure_portal_admin(&user)?;
        Ok(user)
    }
}
