use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::ApprovalRepository;
use crate::models::approval::{ApprovalDecision, ApprovalRequest, ApprovalStatus, DecisionOutcome};
use crate::utils::errors::AppResult;

pub struct PgApprovalRepository {
    pool: PgPool,
}

impl PgApprovalRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ApprovalRepository for PgApprovalRepository {
    async fn insert(&self, request: &ApprovalRequest) -> AppResult<ApprovalRequest> {
        let request = sqlx::query_as::<_, ApprovalRequest>(
            r#"
            INSERT INTO approval_requests (id, email, full_name, phone, role, credential_hash,
                                           status, created_at, decided_at, decided_by, user_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(request.id)
        .bind(&request.email)
        .bind(&request.full_name)
        .bind(&request.phone)
        .bind(request.role)
        .bind(&request.credential_hash)
        .bind(request.status)
        .bind(request.created_at)
        .bind(request.decided_at)
        .bind(request.decided_by)
        .bind(request.user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(request)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<ApprovalRequest>> {
        let request =
            sqlx::query_as::<_, ApprovalRequest>("SELECT * FROM approval_requests WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(request)
    }

    async fn list(&self, status: Option<ApprovalStatus>) -> AppResult<Vec<ApprovalRequest>> {
        let requests = sqlx::query_as::<_, ApprovalRequest>(
            r#"
            SELECT * FROM approval_requests
            WHERE ($1::approval_status IS NULL OR status = $1)
            ORDER BY created_at DESC
            "#,
        )
        .bind(status)
        .fetch_all(&self.pool)
        .await?;
        Ok(requests)
    }

    async fn decide(&self, id: Uuid, decision: &ApprovalDecision) -> AppResult<DecisionOutcome> {
        let updated = sqlx::query_as::<_, ApprovalRequest>(
            r#"
            UPDATE approval_requests
            SET status = $2, decided_at = $3, decided_by = $4, user_id = $5
            WHERE id = $1 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(decision.status)
        .bind(decision.decided_at)
        .bind(decision.decided_by)
        .bind(decision.user_id)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(request) = updated {
            return Ok(DecisionOutcome::Decided(request));
        }

        Ok(match self.find_by_id(id).await? {
            Some(existing) => DecisionOutcome::NotPending(existing.status),
            None => DecisionOutcome::Missing,
        })
    }
}
