//! Servicio de configuración y auditoría
//!
//! Configuración global del sistema, preferencias de notificación por
//! usuario, consulta del registro de auditoría, copias de seguridad y
//! estado de los servicios.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::dto::settings_dto::{
    AuditLogQuery, ComponentStatus, CreateBackupRequest, ServiceStatuses, SystemStatus,
};
use crate::models::assignment::AssignmentFilter;
use crate::models::audit::{AuditFilter, AuditLogEntry};
use crate::models::auth::Principal;
use crate::models::permission::Permission;
use crate::models::settings::{
    notification_settings_key, BackupRecord, NotificationSettings, SystemSettings,
    BACKUP_COLLECTIONS, DEFAULT_BACKUP_COLLECTIONS, RECENT_BACKUPS, SYSTEM_SETTINGS_KEY,
};
use crate::models::user::UserFilter;
use crate::models::vehicle::VehicleFilter;
use crate::repositories::{
    AssignmentRepository, AuditRepository, BackupRepository, FeederPointRepository, Repositories,
    SettingsRepository, StoreHealth, UserRepository, VehicleRepository,
};
use crate::utils::errors::{AppError, AppResult};
use crate::utils::pagination::{Page, PageRequest, PaginationMeta};
use crate::utils::validation::DateRange;

pub const AUDIT_PAGE_SIZE: u32 = 50;

pub struct SettingsService {
    settings: Arc<dyn SettingsRepository>,
    audit: Arc<dyn AuditRepository>,
    backups: Arc<dyn BackupRepository>,
    users: Arc<dyn UserRepository>,
    vehicles: Arc<dyn VehicleRepository>,
    feeder_points: Arc<dyn FeederPointRepository>,
    assignments: Arc<dyn AssignmentRepository>,
    health: Arc<dyn StoreHealth>,
    started_at: Instant,
}

impl SettingsService {
    pub fn new(repos: &Repositories, started_at: Instant) -> Self {
        Self {
            settings: repos.settings.clone(),
            audit: repos.audit.clone(),
            backups: repos.backups.clone(),
            users: repos.users.clone(),
            vehicles: repos.vehicles.clone(),
            feeder_points: repos.feeder_points.clone(),
            assignments: repos.assignments.clone(),
            health: repos.health.clone(),
            started_at,
        }
    }

    pub async fn system_settings(&self, principal: &Principal) -> AppResult<SystemSettings> {
        principal.require(Permission::ManageSystem)?;
        self.load_system().await
    }

    async fn load_system(&self) -> AppResult<SystemSettings> {
        match self.settings.get(SYSTEM_SETTINGS_KEY).await? {
            Some(value) => serde_json::from_value(value)
                .map_err(|e| AppError::Internal(format!("Stored system settings are invalid: {}", e))),
            None => Ok(SystemSettings::default()),
        }
    }

    /// Fusión superficial del objeto recibido sobre la configuración actual
    pub async fn update_system_settings(
        &self,
        principal: &Principal,
        patch: Value,
    ) -> AppResult<SystemSettings> {
        principal.require(Permission::ManageSystem)?;
        let Value::Object(patch) = patch else {
            return Err(AppError::BadRequest(
                "Settings update must be a JSON object".to_string(),
            ));
        };

        let current = serde_json::to_value(self.load_system().await?)
            .map_err(|e| AppError::Internal(e.to_string()))?;
        let mut merged = match current {
            Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };
        for (key, value) in patch {
            merged.insert(key, value);
        }

        let mut settings: SystemSettings = serde_json::from_value(Value::Object(merged))
            .map_err(|e| AppError::BadRequest(format!("Invalid settings: {}", e)))?;
        settings.updated_at = Some(Utc::now());
        settings.updated_by = Some(principal.user_id);

        let stored = serde_json::to_value(&settings).map_err(|e| AppError::Internal(e.to_string()))?;
        self.settings.put(SYSTEM_SETTINGS_KEY, &stored).await?;
        info!("⚙️ Configuración del sistema actualizada por {}", principal.email);
        Ok(settings)
    }

    pub async fn notification_settings(
        &self,
        principal: &Principal,
    ) -> AppResult<NotificationSettings> {
        match self
            .settings
            .get(&notification_settings_key(principal.user_id))
            .await?
        {
            Some(value) => serde_json::from_value(value).map_err(|e| {
                AppError::Internal(format!("Stored notification settings are invalid: {}", e))
            }),
            None => Ok(NotificationSettings::default()),
        }
    }

    pub async fn update_notification_settings(
        &self,
        principal: &Principal,
        settings: NotificationSettings,
    ) -> AppResult<NotificationSettings> {
        let value = serde_json::to_value(&settings).map_err(|e| AppError::Internal(e.to_string()))?;
        self.settings
            .put(&notification_settings_key(principal.user_id), &value)
            .await?;
        Ok(settings)
    }

    pub async fn audit_logs(
        &self,
        principal: &Principal,
        query: &AuditLogQuery,
    ) -> AppResult<Page<AuditLogEntry>> {
        principal.require(Permission::ManageSystem)?;

        let range = DateRange::from_dates(query.start_date, query.end_date)?;
        let filter = AuditFilter {
            actor_id: query.actor_id,
            action_prefix: query.action.clone().filter(|a| !a.is_empty()),
            start: range.start,
            end: range.end,
        };
        let request = PageRequest::new(query.page, query.limit, AUDIT_PAGE_SIZE);

        let (items, total) = self
            .audit
            .list(&filter, request.offset(), request.limit as usize)
            .await?;
        let limit = request.limit as u64;

        Ok(Page {
            items,
            pagination: PaginationMeta {
                page: request.page,
                limit: request.limit,
                total,
                pages: (total + limit - 1) / limit,
            },
        })
    }

    /// Añade una entrada; los fallos se registran y no se propagan
    pub async fn record_audit(&self, entry: AuditLogEntry) {
        if let Err(e) = self.audit.append(&entry).await {
            warn!("⚠️ No se pudo guardar la auditoría de '{}': {}", entry.action, e);
        }
    }

    /// Vuelca las colecciones pedidas y guarda sólo los metadatos
    pub async fn create_backup(
        &self,
        principal: &Principal,
        request: CreateBackupRequest,
    ) -> AppResult<BackupRecord> {
        principal.require(Permission::ManageSystem)?;

        let collections = match request.collections {
            Some(names) if !names.is_empty() => names,
            _ => DEFAULT_BACKUP_COLLECTIONS
                .iter()
                .map(|name| name.to_string())
                .collect(),
        };
        if let Some(unknown) = collections
            .iter()
            .find(|name| !BACKUP_COLLECTIONS.contains(&name.as_str()))
        {
            return Err(AppError::BadRequest(format!(
                "Unknown backup collection '{}'. Allowed: {}",
                unknown,
                BACKUP_COLLECTIONS.join(", ")
            )));
        }

        let mut dump = serde_json::Map::new();
        for name in &collections {
            dump.insert(name.clone(), self.snapshot(name).await?);
        }
        let size = serde_json::to_vec(&Value::Object(dump))
            .map_err(|e| AppError::Internal(e.to_string()))?
            .len();

        let backup = BackupRecord {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            created_by: principal.user_id,
            collections,
            size: size as i64,
        };
        self.backups.insert(&backup).await?;

        info!(
            backup_id = %backup.id,
            size = backup.size,
            "💾 Copia de seguridad creada por {}",
            principal.email
        );
        Ok(backup)
    }

    pub async fn list_backups(&self, principal: &Principal) -> AppResult<Vec<BackupRecord>> {
        principal.require(Permission::ManageSystem)?;
        self.backups.recent(RECENT_BACKUPS).await
    }

    async fn snapshot(&self, collection: &str) -> AppResult<Value> {
        let value = match collection {
            "users" => serde_json::to_value(self.users.list(&UserFilter::default()).await?),
            "vehicles" => serde_json::to_value(self.vehicles.list(&VehicleFilter::default()).await?),
            "feeder_points" => serde_json::to_value(self.feeder_points.list().await?),
            "assignments" => {
                serde_json::to_value(self.assignments.list(&AssignmentFilter::default()).await?)
            }
            other => return Err(AppError::Internal(format!("No snapshot for '{}'", other))),
        };
        value.map_err(|e| AppError::Internal(e.to_string()))
    }

    pub async fn system_status(&self, _principal: &Principal) -> AppResult<SystemStatus> {
        let database = match self.health.ping().await {
            Ok(()) => ComponentStatus::Online,
            Err(e) => {
                warn!("⚠️ El almacén no responde: {}", e);
                ComponentStatus::Offline
            }
        };

        Ok(SystemStatus {
            timestamp: Utc::now(),
            services: ServiceStatuses {
                authentication: database.clone(),
                database,
                api: ComponentStatus::Online,
            },
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: self.started_at.elapsed().as_secs(),
        })
    }
}

/// Entrada de auditoría a partir de una request atendida
pub fn audit_entry(
    actor: Option<&Principal>,
    action: String,
    status_code: u16,
    ip: Option<String>,
    user_agent: Option<String>,
    body: Option<Value>,
) -> AuditLogEntry {
    AuditLogEntry {
        id: Uuid::new_v4(),
        actor_id: actor.map(|p| p.user_id),
        actor_email: actor.map(|p| p.email.clone()),
        action,
        timestamp: Utc::now(),
        status_code: i32::from(status_code),
        ip,
        user_agent,
        body,
    }
}
