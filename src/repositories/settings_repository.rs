use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;

use super::{BackupRepository, SettingsRepository};
use crate::models::settings::BackupRecord;
use crate::utils::errors::AppResult;

pub struct PgSettingsRepository {
    pool: PgPool,
}

impl PgSettingsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SettingsRepository for PgSettingsRepository {
    async fn get(&self, key: &str) -> AppResult<Option<serde_json::Value>> {
        let row: Option<(serde_json::Value,)> =
            sqlx::query_as("SELECT value FROM settings WHERE key = $1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(value,)| value))
    }

    async fn put(&self, key: &str, value: &serde_json::Value) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO settings (key, value, updated_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

pub struct PgBackupRepository {
    pool: PgPool,
}

impl PgBackupRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BackupRepository for PgBackupRepository {
    async fn insert(&self, backup: &BackupRecord) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO backups (id, timestamp, created_by, collections, size) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(backup.id)
        .bind(backup.timestamp)
        .bind(backup.created_by)
        .bind(&backup.collections)
        .bind(backup.size)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn recent(&self, limit: usize) -> AppResult<Vec<BackupRecord>> {
        let backups = sqlx::query_as::<_, BackupRecord>(
            "SELECT * FROM backups ORDER BY timestamp DESC LIMIT $1",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        Ok(backups)
    }
}
