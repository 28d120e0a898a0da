//! Servicio de autorización
//!
//! Comprobaciones de permisos y rol que se repiten en varias operaciones.
//! Los permisos siempre vienen del documento `User`, nunca del token.

use uuid::Uuid;

use crate::models::auth::Principal;
use crate::models::permission::Permission;
use crate::models::user::{User, UserRole};
use crate::utils::errors::{AppError, AppResult};

pub struct AuthorizationService;

impl AuthorizationService {
    /// Acceso a datos propios, o a ajenos con el permiso indicado
    pub fn require_self_or(
        principal: &Principal,
        owner_id: Uuid,
        permission: Permission,
    ) -> AppResult<()> {
        if principal.user_id == owner_id {
            Ok(())
        } else {
            principal.require(permission)
        }
    }

    /// Puerta de entrada del portal: administrador y activo
    pub fn ensure_portal_admin(user: &User) -> AppResult<()> {
        if user.role != UserRole::Admin {
            return Err(AppError::Forbidden("Access denied. Admin role required.".to_string()));
        }
        if !user.is_active {
            return Err(AppError::Forbidden("Account is deactivated".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(role: UserRole) -> Principal {
        Principal::from_user(&User::new(
            Uuid::new_v4(),
            "p@example.com".into(),
            "P".into(),
            None,
            role,
            None,
        ))
    }

    #[test]
    fn self_access_needs_no_permission() {
        let driver = principal(UserRole::Driver);
        assert!(
            AuthorizationService::require_self_or(&driver, driver.user_id, Permission::ManageUsers)
                .is_ok()
        );
        assert!(AuthorizationService::require_self_or(
            &driver,
            Uuid::new_v4(),
            Permission::ManageUsers
        )
        .is_err());
    }

    #[test]
    fn portal_gate_rejects_inactive_admin() {
        let mut admin = User::new(
            Uuid::new_v4(),
            "a@example.com".into(),
            "A".into(),
            None,
            UserRole::Admin,
            None,
        );
        assert!(AuthorizationService::ensure_portal_admin(&admin).is_ok());
        admin.is_active = false;
        assert!(matches!(
            AuthorizationService::ensure_portal_admin(&admin),
            Err(AppError::Forbidden(_))
        ));
    }
}
