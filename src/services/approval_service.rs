//! Servicio de aprobaciones
//!
//! Una solicitud se consume una sola vez. La aprobación vuelve a comprobar
//! `pending`, aprovisiona la cuenta y el usuario, y cierra la solicitud con
//! una transición condicional; si otra decisión gana la carrera se deshace
//! lo aprovisionado.

use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::dto::approval_dto::{ApprovalResult, RegistrationRequest};
use crate::models::approval::{
    ApprovalDecision, ApprovalRequest, ApprovalStatus, DecisionOutcome,
};
use crate::models::auth::{NewAccount, Principal};
use crate::models::permission::Permission;
use crate::models::user::{User, UserRole};
use crate::repositories::{ApprovalRepository, Repositories, UserRepository};
use crate::services::identity_provider::IdentityProvider;
use crate::utils::errors::{conflict_error, not_found_error, AppError, AppResult};
use crate::utils::password::PasswordHasher;
use crate::utils::validation::normalize_email;

pub struct ApprovalService {
    approvals: Arc<dyn ApprovalRepository>,
    users: Arc<dyn UserRepository>,
    identity: Arc<dyn IdentityProvider>,
    hasher: PasswordHasher,
}

impl ApprovalService {
    pub fn new(
        repos: &Repositories,
        identity: Arc<dyn IdentityProvider>,
        hasher: PasswordHasher,
    ) -> Self {
        Self {
            approvals: repos.approvals.clone(),
            users: repos.users.clone(),
            identity,
            hasher,
        }
    }

    /// Guarda una solicitud pendiente; la contraseña sólo se conserva como hash
    pub async fn submit_request(&self, request: RegistrationRequest) -> AppResult<ApprovalRequest> {
        request.validate()?;
        let role = match request.role.as_deref() {
            None | Some("") => UserRole::default(),
            Some(raw) => raw.parse()?,
        };

        let credential_hash = self.hasher.hash(&request.password)?;
        let pending = ApprovalRequest::new_pending(
            normalize_email(&request.email),
            request.full_name.trim().to_string(),
            request.phone,
            role,
            credential_hash,
        );

        let stored = self.approvals.insert(&pending).await?;
        info!("📝 Solicitud de alta recibida para {}", stored.email);
        Ok(stored)
    }

    pub async fn list_pending(&self, principal: &Principal) -> AppResult<Vec<ApprovalRequest>> {
        principal.require(Permission::ApproveRequests)?;
        self.approvals.list(Some(ApprovalStatus::Pending)).await
    }

    pub async fn decide(
        &self,
        principal: &Principal,
        id: Uuid,
        approved: bool,
    ) -> AppResult<ApprovalResult> {
        if approved {
            self.approve(principal, id).await
        } else {
            self.reject(principal, id).await
        }
    }

    pub async fn approve(&self, principal: &Principal, id: Uuid) -> AppResult<ApprovalResult> {
        principal.require(Permission::ApproveRequests)?;

        let request = self
            .approvals
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Approval request", id))?;
        if request.status != ApprovalStatus::Pending {
            return Err(already_decided(request.status));
        }
        if self.users.find_by_email(&request.email).await?.is_some() {
            return Err(conflict_error("User", "email", &request.email));
        }

        let account_id = self
            .identity
            .create_account(NewAccount {
                email: request.email.clone(),
                password_hash: request.credential_hash.clone(),
                display_name: request.full_name.clone(),
            })
            .await?;

        let now = Utc::now();
        let mut user = User::new(
            account_id,
            request.email.clone(),
            request.full_name.clone(),
            request.phone.clone(),
            request.role,
            Some(principal.user_id),
        );
        user.approved_at = Some(now);
        user.approved_by = Some(principal.user_id);

        let user = match self.users.insert(&user).await {
            Ok(user) => user,
            Err(e) => {
                warn!("⚠️ Alta aprobada fallida, revirtiendo cuenta {}: {}", account_id, e);
                self.revoke_account(account_id).await;
                return Err(e);
            }
        };

        let decision = ApprovalDecision {
            status: ApprovalStatus::Approved,
            decided_by: principal.user_id,
            decided_at: now,
            user_id: Some(user.id),
        };
        match self.approvals.decide(id, &decision).await {
            Ok(DecisionOutcome::Decided(request)) => {
                info!("✅ Solicitud {} aprobada: usuario {} ({})", id, user.email, user.role);
                Ok(ApprovalResult {
                    request,
                    user: Some(user),
                })
            }
            Ok(outcome) => {
                warn!("⚠️ La solicitud {} cambió durante la aprobación; deshaciendo alta", id);
                self.rollback_user(&user).await;
                Err(match outcome {
                    DecisionOutcome::NotPending(status) => already_decided(status),
                    _ => not_found_error("Approval request", id),
                })
            }
            Err(e) => {
                self.rollback_user(&user).await;
                Err(e)
            }
        }
    }

    pub async fn reject(&self, principal: &Principal, id: Uuid) -> AppResult<ApprovalResult> {
        principal.require(Permission::ApproveRequests)?;

        let decision = ApprovalDecision {
            status: ApprovalStatus::Rejected,
            decided_by: principal.user_id,
            decided_at: Utc::now(),
            user_id: None,
        };
        match self.approvals.decide(id, &decision).await? {
            DecisionOutcome::Decided(request) => {
                info!("🚫 Solicitud {} rechazada por {}", id, principal.email);
                Ok(ApprovalResult {
                    request,
                    user: None,
                })
            }
            DecisionOutcome::Missing => Err(not_found_error("Approval request", id)),
            DecisionOutcome::NotPending(status) => Err(already_decided(status)),
        }
    }

    async fn rollback_user(&self, user: &User) {
        if let Err(e) = self.users.delete(user.id).await {
            error!("❌ No se pudo borrar el usuario {} al revertir: {}", user.id, e);
        }
        self.revoke_account(user.id).await;
    }

    async fn revoke_account(&self, account_id: Uuid) {
        if let Err(e) = self.identity.delete_account(account_id).await {
            error!("❌ No se pudo revertir la cuenta {}: {}", account_id, e);
        }
    }
}

fn already_decided(status: ApprovalStatus) -> AppError {
    AppError::Conflict(format!("Approval request has already been {}", status))
}
