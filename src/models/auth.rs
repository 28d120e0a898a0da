//! Modelos de autenticación
//!
//! `Principal` es la identidad explícita que recibe cada operación de
//! servicio; nunca se lee de un estado global.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::permission::{Permission, PermissionSet};
use crate::models::user::{User, UserRole};
use crate::utils::errors::{AppError, AppResult};

/// Usuario autenticado que se inyecta en las requests
#[derive(Debug, Clone, Serialize)]
pub struct Principal {
    pub user_id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: UserRole,
    pub permissions: PermissionSet,
}

impl Principal {
    pub fn from_user(user: &User) -> Self {
        Self {
            user_id: user.id,
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            role: user.role,
            permissions: user.permissions.clone(),
        }
    }

    pub fn has(&self, permission: Permission) -> bool {
        self.permissions.allows(permission)
    }

    pub fn require(&self, permission: Permission) -> AppResult<()> {
        if self.has(permission) {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "Permission denied. Required permission: {}",
                permission
            )))
        }
    }
}

/// Claims del JWT emitido por el proveedor local
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// id de la cuenta en el proveedor
    pub sub: String,
    pub email: String,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuedToken {
    pub token: String,
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
    pub account_id: Uuid,
}

/// Cuenta del proveedor de identidad - mapea a la tabla identity_accounts
#[derive(Debug, Clone, FromRow, PartialEq)]
pub struct IdentityAccount {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub display_name: String,
    pub disabled: bool,
    pub created_at: DateTime<Utc>,
}

/// Datos para dar de alta una cuenta; la credencial llega ya hasheada
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub password_hash: String,
    pub display_name: String,
}
