//! Servicio de usuarios
//!
//! Alta administrativa, listados, cambios de rol/estado y borrado. Toda
//! escritura que afecte a la cuenta del proveedor de identidad se refleja
//! en ambos lados.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::dto::user_dto::{CreateUserRequest, UpdateProfileRequest, UserListQuery};
use crate::models::auth::{NewAccount, Principal};
use crate::models::permission::Permission;
use crate::models::user::{ProfileChanges, User, UserFilter, UserRole};
use crate::repositories::{Repositories, UserRepository};
use crate::services::authorization_service::AuthorizationService;
use crate::services::identity_provider::IdentityProvider;
use crate::utils::errors::{
    conflict_error, invalid_status_error, not_found_error, AppError, AppResult,
};
use crate::utils::pagination::{paginate, Page, PageRequest, DEFAULT_PAGE_SIZE};
use crate::utils::password::PasswordHasher;
use crate::utils::validation::{matches_search, normalize_email};

pub struct UserService {
    users: Arc<dyn UserRepository>,
    identity: Arc<dyn IdentityProvider>,
    hasher: PasswordHasher,
}

impl UserService {
    pub fn new(
        repos: &Repositories,
        identity: Arc<dyn IdentityProvider>,
        hasher: PasswordHasher,
    ) -> Self {
        Self {
            users: repos.users.clone(),
            identity,
            hasher,
        }
    }

    pub async fn list(&self, principal: &Principal, query: &UserListQuery) -> AppResult<Page<User>> {
        principal.require(Permission::ManageUsers)?;

        let filter = UserFilter {
            role: query
                .role
                .as_deref()
                .filter(|r| !r.is_empty() && *r != "all")
                .map(str::parse::<UserRole>)
                .transpose()?,
            is_active: match query.status.as_deref() {
                None | Some("") | Some("all") => None,
                Some("active") => Some(true),
                Some("inactive") => Some(false),
                Some(other) => {
                    return Err(invalid_status_error("status", other, &["active", "inactive", "all"]))
                }
            },
        };

        let mut users = self.users.list(&filter).await?;
        if let Some(search) = query.search.as_deref() {
            users.retain(|u| {
                matches_search(
                    search,
                    [Some(u.full_name.as_str()), Some(u.email.as_str()), u.phone.as_deref()],
                )
            });
        }

        Ok(paginate(
            users,
            PageRequest::new(query.page, query.limit, DEFAULT_PAGE_SIZE),
        ))
    }

    /// Un usuario puede leer su propio documento sin `manage_users`
    pub async fn get(&self, principal: &Principal, id: Uuid) -> AppResult<User> {
        AuthorizationService::require_self_or(principal, id, Permission::ManageUsers)?;
        self.find(id).await
    }

    pub async fn find(&self, id: Uuid) -> AppResult<User> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("User", id))
    }

    /// Alta administrativa: cuenta de identidad + documento de usuario
    pub async fn create(&self, principal: &Principal, request: CreateUserRequest) -> AppResult<User> {
        principal.require(Permission::ManageUsers)?;
        request.validate()?;
        let role: UserRole = request.role.parse()?;

        let password_hash = self.hasher.hash(&request.password)?;
        let user = self
            .provision(
                &request.email,
                password_hash,
                &request.full_name,
                request.phone,
                role,
                Some(principal.user_id),
            )
            .await?;

        info!("👤 Usuario {} creado por {}", user.email, principal.email);
        Ok(user)
    }

    /// Crea la cuenta y el documento; si el documento falla, elimina la cuenta
    pub(crate) async fn provision(
        &self,
        email: &str,
        password_hash: String,
        full_name: &str,
        phone: Option<String>,
        role: UserRole,
        created_by: Option<Uuid>,
    ) -> AppResult<User> {
        let email = normalize_email(email);
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(conflict_error("User", "email", &email));
        }

        let account_id = self
            .identity
            .create_account(NewAccount {
                email: email.clone(),
                password_hash,
                display_name: full_name.to_string(),
            })
            .await?;

        let user = User::new(account_id, email, full_name.to_string(), phone, role, created_by);
        match self.users.insert(&user).await {
            Ok(user) => Ok(user),
            Err(e) => {
                warn!("⚠️ Alta de usuario fallida, revirtiendo cuenta {}: {}", account_id, e);
                if let Err(cleanup) = self.identity.delete_account(account_id).await {
                    tracing::error!("❌ No se pudo revertir la cuenta {}: {}", account_id, cleanup);
                }
                Err(e)
            }
        }
    }

    /// Primer administrador del sistema; no requiere principal
    pub async fn bootstrap_admin(&self, email: &str, password: &str, full_name: &str) -> AppResult<User> {
        let password_hash = self.hasher.hash(password)?;
        self.provision(email, password_hash, full_name, None, UserRole::Admin, None)
            .await
    }

    pub async fn update_role(&self, principal: &Principal, id: Uuid, role: &str) -> AppResult<User> {
        principal.require(Permission::ManageUsers)?;
        let role: UserRole = role.parse()?;

        let user = self
            .users
            .update_role(id, role, principal.user_id)
            .await?
            .ok_or_else(|| not_found_error("User", id))?;

        info!(user_id = %id, role = %role, "🔑 Rol actualizado y permisos regenerados");
        Ok(user)
    }

    /// Activa/desactiva el usuario y refleja el cambio en el proveedor
    pub async fn update_active_status(
        &self,
        principal: &Principal,
        id: Uuid,
        is_active: bool,
    ) -> AppResult<User> {
        principal.require(Permission::ManageUsers)?;
        self.find(id).await?;

        self.identity.set_disabled(id, !is_active).await?;

        match self.users.set_active(id, is_active, principal.user_id).await {
            Ok(Some(user)) => {
                info!(user_id = %id, is_active, "👤 Estado de usuario actualizado");
                Ok(user)
            }
            Ok(None) => Err(not_found_error("User", id)),
            Err(e) => {
                warn!("⚠️ No se pudo guardar el estado de {}, restaurando proveedor", id);
                if let Err(cleanup) = self.identity.set_disabled(id, is_active).await {
                    tracing::error!("❌ Proveedor y documento divergen para {}: {}", id, cleanup);
                }
                Err(e)
            }
        }
    }

    /// Borra el usuario y revoca su cuenta de identidad
    pub async fn delete(&self, principal: &Principal, id: Uuid) -> AppResult<()> {
        principal.require(Permission::ManageUsers)?;
        let user = self.find(id).await?;

        match self.identity.delete_account(id).await {
            Ok(()) => {}
            Err(AppError::NotFound(_)) => {
                warn!("⚠️ Usuario {} sin cuenta de identidad; se borra sólo el documento", user.email)
            }
            Err(e) => return Err(e),
        }

        self.users.delete(id).await?;
        info!("🗑️ Usuario {} eliminado por {}", user.email, principal.email);
        Ok(())
    }

    pub async fn profile(&self, principal: &Principal) -> AppResult<User> {
        self.find(principal.user_id).await
    }

    pub async fn update_profile(
        &self,
        principal: &Principal,
        request: UpdateProfileRequest,
    ) -> AppResult<User> {
        request.validate()?;
        let changes = ProfileChanges {
            full_name: request.full_name.map(|n| n.trim().to_string()),
            phone: request.phone.map(|p| p.trim().to_string()),
        };

        self.users
            .update_profile(principal.user_id, &changes, principal.user_id)
            .await?
            .ok_or_else(|| not_found_error("User", principal.user_id))
    }
}
