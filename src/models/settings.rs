//! Configuración del sistema y preferencias de notificación

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const SYSTEM_SETTINGS_KEY: &str = "system";

/// Colecciones que admite una copia de seguridad
pub const BACKUP_COLLECTIONS: &[&str] = &["users", "vehicles", "feeder_points", "assignments"];

/// Colecciones copiadas cuando la petición no indica ninguna
pub const DEFAULT_BACKUP_COLLECTIONS: &[&str] = &["users", "vehicles", "assignments"];

/// Cuántas copias devuelve el listado
pub const RECENT_BACKUPS: usize = 20;

/// Metadatos de una copia de seguridad; el volcado no se persiste
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct BackupRecord {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub created_by: Uuid,
    pub collections: Vec<String>,
    /// Bytes del volcado JSON
    pub size: i64,
}

pub fn notification_settings_key(user_id: Uuid) -> String {
    format!("notifications:{}", user_id)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PasswordPolicy {
    pub min_length: u32,
    pub require_uppercase: bool,
    pub require_lowercase: bool,
    pub require_numbers: bool,
    pub require_special_chars: bool,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 8,
            require_uppercase: true,
            require_lowercase: true,
            require_numbers: true,
            require_special_chars: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NotificationChannels {
    pub email_enabled: bool,
    pub sms_enabled: bool,
    pub push_enabled: bool,
}

impl Default for NotificationChannels {
    fn default() -> Self {
        Self {
            email_enabled: true,
            sms_enabled: false,
            push_enabled: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SystemSettings {
    pub app_name: String,
    pub version: String,
    pub maintenance_mode: bool,
    pub allow_registrations: bool,
    pub max_file_size: u64,
    pub allowed_file_types: Vec<String>,
    /// Horas
    pub session_timeout: u32,
    pub password_policy: PasswordPolicy,
    pub notifications: NotificationChannels,
    pub updated_at: Option<DateTime<Utc>>,
    pub updated_by: Option<Uuid>,
}

impl Default for SystemSettings {
    fn default() -> Self {
        Self {
            app_name: "Swachh Netra Admin Portal".to_string(),
            version: "1.0.0".to_string(),
            maintenance_mode: false,
            allow_registrations: true,
            max_file_size: 5 * 1024 * 1024,
            allowed_file_types: ["image/jpeg", "image/png", "image/gif", "application/pdf"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            session_timeout: 24,
            password_policy: PasswordPolicy::default(),
            notifications: NotificationChannels::default(),
            updated_at: None,
            updated_by: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChannelPreferences {
    pub user_approvals: bool,
    pub system_alerts: bool,
    pub reports: bool,
    pub assignments: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NotificationSettings {
    pub email: ChannelPreferences,
    pub push: ChannelPreferences,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            email: ChannelPreferences {
                user_approvals: true,
                system_alerts: true,
                reports: false,
                assignments: true,
            },
            push: ChannelPreferences {
                user_approvals: true,
                system_alerts: true,
                reports: false,
                assignments: false,
            },
        }
    }
}

impl Default for ChannelPreferences {
    fn default() -> Self {
        Self {
            user_approvals: true,
            system_alerts: true,
            reports: false,
            assignments: false,
        }
    }
}
