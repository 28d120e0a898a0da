use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Default, Deserialize)]
pub struct AuditLogQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub actor_id: Option<Uuid>,
    pub action: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ComponentStatus {
    Online,
    Offline,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceStatuses {
    pub database: ComponentStatus,
    pub authentication: ComponentStatus,
    pub api: ComponentStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemStatus {
    pub timestamp: DateTime<Utc>,
    pub services: ServiceStatuses,
    pub version: String,
    pub uptime_seconds: u64,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateBackupRequest {
    /// Por defecto `users`, `vehicles` y `assignments`
    pub collections: Option<Vec<String>>,
}
