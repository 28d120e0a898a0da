//! Registro de auditoría (sólo inserción)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct AuditLogEntry {
    pub id: Uuid,
    pub actor_id: Option<Uuid>,
    pub actor_email: Option<String>,
    pub action: String,
    pub timestamp: DateTime<Utc>,
    pub status_code: i32,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub body: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    pub actor_id: Option<Uuid>,
    /// Prefijo de la acción, p. ej. "POST /api/vehicles"
    pub action_prefix: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl AuditFilter {
    pub fn matches(&self, entry: &AuditLogEntry) -> bool {
        self.actor_id.map_or(true, |id| entry.actor_id == Some(id))
            && self
                .action_prefix
                .as_deref()
                .map_or(true, |p| entry.action.starts_with(p))
            && self.start.map_or(true, |s| entry.timestamp >= s)
            && self.end.map_or(true, |e| entry.timestamp <= e)
    }
}
