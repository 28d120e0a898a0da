use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use super::FeederPointRepository;
use crate::models::feeder_point::{FeederPoint, FeederPointChanges};
use crate::models::vehicle::DeleteOutcome;
use crate::utils::errors::AppResult;

pub struct PgFeederPointRepository {
    pool: PgPool,
}

impl PgFeederPointRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FeederPointRepository for PgFeederPointRepository {
    async fn insert(&self, point: &FeederPoint) -> AppResult<FeederPoint> {
        let point = sqlx::query_as::<_, FeederPoint>(
            r#"
            INSERT INTO feeder_points (id, name, location, area, created_at, created_by,
                                       updated_at, updated_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(point.id)
        .bind(&point.name)
        .bind(&point.location)
        .bind(&point.area)
        .bind(point.created_at)
        .bind(point.created_by)
        .bind(point.updated_at)
        .bind(point.updated_by)
        .fetch_one(&self.pool)
        .await?;
        Ok(point)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<FeederPoint>> {
        let point = sqlx::query_as::<_, FeederPoint>("SELECT * FROM feeder_points WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(point)
    }

    async fn list(&self) -> AppResult<Vec<FeederPoint>> {
        let points = sqlx::query_as::<_, FeederPoint>("SELECT * FROM feeder_points ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(points)
    }

    async fn update(
        &self,
        id: Uuid,
        changes: &FeederPointChanges,
        actor: Uuid,
    ) -> AppResult<Option<FeederPoint>> {
        let point = sqlx::query_as::<_, FeederPoint>(
            r#"
            UPDATE feeder_points
            SET name = COALESCE($2, name),
                location = COALESCE($3, location),
                area = COALESCE($4, area),
                updated_at = $5,
                updated_by = $6
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&changes.name)
        .bind(&changes.location)
        .bind(&changes.area)
        .bind(Utc::now())
        .bind(actor)
        .fetch_optional(&self.pool)
        .await?;
        Ok(point)
    }

    async fn delete_unassigned(&self, id: Uuid) -> AppResult<DeleteOutcome> {
        let mut tx = self.pool.begin().await?;

        let exists: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM feeder_points WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if exists.is_none() {
            return Ok(DeleteOutcome::Missing);
        }

        let (active,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM assignments WHERE kind = 'feeder_point' AND resource_id = $1 AND status = 'active'",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
        if active > 0 {
            return Ok(DeleteOutcome::HasActiveAssignments);
        }

        sqlx::query("DELETE FROM feeder_points WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(DeleteOutcome::Deleted)
    }
}
