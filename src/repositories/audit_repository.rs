use async_trait::async_trait;
use sqlx::PgPool;

use super::AuditRepository;
use crate::models::audit::{AuditFilter, AuditLogEntry};
use crate::utils::errors::AppResult;

pub struct PgAuditRepository {
    pool: PgPool,
}

impl PgAuditRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const FILTER_CLAUSE: &str = r#"
    WHERE ($1::uuid IS NULL OR actor_id = $1)
      AND ($2::text IS NULL OR action LIKE $2 || '%')
      AND ($3::timestamptz IS NULL OR timestamp >= $3)
      AND ($4::timestamptz IS NULL OR timestamp <= $4)
"#;

#[async_trait]
impl AuditRepository for PgAuditRepository {
    async fn append(&self, entry: &AuditLogEntry) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO audit_logs (id, actor_id, actor_email, action, timestamp, status_code,
                                    ip, user_agent, body)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(entry.id)
        .bind(entry.actor_id)
        .bind(&entry.actor_email)
        .bind(&entry.action)
        .bind(entry.timestamp)
        .bind(entry.status_code)
        .bind(&entry.ip)
        .bind(&entry.user_agent)
        .bind(&entry.body)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn recent(&self, limit: usize) -> AppResult<Vec<AuditLogEntry>> {
        let entries = sqlx::query_as::<_, AuditLogEntry>(
            "SELECT * FROM audit_logs ORDER BY timestamp DESC LIMIT $1",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }

    async fn list(
        &self,
        filter: &AuditFilter,
        offset: usize,
        limit: usize,
    ) -> AppResult<(Vec<AuditLogEntry>, u64)> {
        let count_sql = format!("SELECT COUNT(*) FROM audit_logs {}", FILTER_CLAUSE);
        let (total,): (i64,) = sqlx::query_as(&count_sql)
            .bind(filter.actor_id)
            .bind(&filter.action_prefix)
            .bind(filter.start)
            .bind(filter.end)
            .fetch_one(&self.pool)
            .await?;

        let page_sql = format!(
            "SELECT * FROM audit_logs {} ORDER BY timestamp DESC OFFSET $5 LIMIT $6",
            FILTER_CLAUSE
        );
        let entries = sqlx::query_as::<_, AuditLogEntry>(&page_sql)
            .bind(filter.actor_id)
            .bind(&filter.action_prefix)
            .bind(filter.start)
            .bind(filter.end)
            .bind(offset as i64)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;

        Ok((entries, total.max(0) as u64))
    }
}
