//! Modelo de ApprovalRequest
//!
//! Solicitud de alta creada por el registro externo; se consume una sola
//! vez: `pending` → `approved` | `rejected`.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, Type};
use uuid::Uuid;

use crate::models::user::UserRole;

/// Estado de la solicitud - mapea al ENUM approval_status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Type)]
#[sqlx(type_name = "approval_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApprovalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "pending",
            ApprovalStatus::Approved => "approved",
            ApprovalStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, FromRow, PartialEq)]
pub struct ApprovalRequest {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub role: UserRole,
    #[serde(skip_serializing)]
    pub credential_hash: String,
    pub status: ApprovalStatus,
    pub created_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
    pub decided_by: Option<Uuid>,
    pub user_id: Option<Uuid>,
}

impl ApprovalRequest {
    pub fn new_pending(
        email: String,
        full_name: String,
        phone: Option<String>,
        role: UserRole,
        credential_hash: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            email,
            full_name,
            phone,
            role,
            credential_hash,
            status: ApprovalStatus::Pending,
            created_at: Utc::now(),
            decided_at: None,
            decided_by: None,
            user_id: None,
        }
    }
}

/// Decisión a aplicar sobre una solicitud pendiente
#[derive(Debug, Clone)]
pub struct ApprovalDecision {
    pub status: ApprovalStatus,
    pub decided_by: Uuid,
    pub decided_at: DateTime<Utc>,
    pub user_id: Option<Uuid>,
}

#[derive(Debug)]
pub enum DecisionOutcome {
    Decided(ApprovalRequest),
    Missing,
    NotPending(ApprovalStatus),
}
