//! Modelo de User
//!
//! Un usuario del portal. Su `id` coincide con el id de la cuenta en el
//! proveedor de identidad, y sus permisos se derivan siempre de su rol.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Type;
use uuid::Uuid;

use crate::models::permission::PermissionSet;
use crate::utils::errors::{invalid_status_error, AppError};

/// Rol del usuario - mapea al ENUM user_role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    TransportContractor,
    SwachhHr,
    Driver,
}

impl UserRole {
    pub const ALL: [UserRole; 4] = [
        UserRole::Admin,
        UserRole::TransportContractor,
        UserRole::SwachhHr,
        UserRole::Driver,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::TransportContractor => "transport_contractor",
            UserRole::SwachhHr => "swachh_hr",
            UserRole::Driver => "driver",
        }
    }

    pub fn default_permissions(&self) -> PermissionSet {
        PermissionSet::for_role(*self)
    }
}

impl Default for UserRole {
    fn default() -> Self {
        UserRole::Driver
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UserRole::ALL
            .into_iter()
            .find(|role| role.as_str() == s.trim())
            .ok_or_else(|| {
                invalid_status_error("role", s, &UserRole::ALL.map(|r| r.as_str()))
            })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub role: UserRole,
    pub is_active: bool,
    pub permissions: PermissionSet,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub approved_by: Option<Uuid>,
}

impl User {
    /// Nuevo usuario activo con permisos derivados del rol
    pub fn new(
        id: Uuid,
        email: String,
        full_name: String,
        phone: Option<String>,
        role: UserRole,
        created_by: Option<Uuid>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            email,
            full_name,
            phone,
            role,
            is_active: true,
            permissions: role.default_permissions(),
            created_at: now,
            updated_at: now,
            updated_by: created_by,
            approved_at: None,
            approved_by: None,
        }
    }
}

/// Resumen de usuario para uniones en listados
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserSummary {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub role: UserRole,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            full_name: user.full_name.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

/// Filtros de igualdad aplicados por el almacén
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub role: Option<UserRole>,
    pub is_active: Option<bool>,
}

/// Cambios de perfil permitidos
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub full_name: Option<String>,
    pub phone: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_closed_role_set() {
        assert_eq!("swachh_hr".parse::<UserRole>().unwrap(), UserRole::SwachhHr);
        let err = "supervisor".parse::<UserRole>().unwrap_err();
        assert!(matches!(err, AppError::InvalidStatus(_)));
    }

    #[test]
    fn new_user_is_active_with_role_permissions() {
        let user = User::new(
            Uuid::new_v4(),
            "driver@example.com".into(),
            "Ravi Kumar".into(),
            None,
            UserRole::Driver,
            None,
        );
        assert!(user.is_active);
        assert_eq!(user.permissions, PermissionSet::for_role(UserRole::Driver));
    }
}
