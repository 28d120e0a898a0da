//! Repositorio PostgreSQL de asignaciones
//!
//! Ambos tipos de asignación comparten la tabla `assignments`; `kind` y
//! `resource_id` reconstruyen la variante al leer.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::AssignmentRepository;
use crate::models::assignment::{
    Assignment, AssignmentFilter, AssignmentKind, AssignmentStatus, AssignmentTarget,
    ClaimOutcome, CloseOutcome, PointClaimOutcome,
};
use crate::models::vehicle::VehicleStatus;
use crate::utils::errors::{AppError, AppResult};

#[derive(Debug, FromRow)]
struct AssignmentRow {
    id: Uuid,
    kind: AssignmentKind,
    resource_id: Uuid,
    assignment_type: Option<String>,
    assigned_to: Uuid,
    assigned_by: Uuid,
    assigned_at: DateTime<Utc>,
    start_date: DateTime<Utc>,
    end_date: Option<DateTime<Utc>>,
    status: AssignmentStatus,
    notes: String,
    completed_at: Option<DateTime<Utc>>,
    cancelled_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    updated_by: Option<Uuid>,
}

impl From<AssignmentRow> for Assignment {
    fn from(row: AssignmentRow) -> Self {
        let target = match row.kind {
            AssignmentKind::Vehicle => AssignmentTarget::Vehicle {
                vehicle_id: row.resource_id,
                assignment_type: row.assignment_type.unwrap_or_default(),
            },
            AssignmentKind::FeederPoint => AssignmentTarget::FeederPoint {
                feeder_point_id: row.resource_id,
            },
        };

        Self {
            id: row.id,
            target,
            assigned_to: row.assigned_to,
            assigned_by: row.assigned_by,
            assigned_at: row.assigned_at,
            start_date: row.start_date,
            end_date: row.end_date,
            status: row.status,
            notes: row.notes,
            completed_at: row.completed_at,
            cancelled_at: row.cancelled_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
            updated_by: row.updated_by,
        }
    }
}

pub struct PgAssignmentRepository {
    pool: PgPool,
}

impl PgAssignmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert_in(
        tx: &mut Transaction<'_, Postgres>,
        assignment: &Assignment,
    ) -> Result<Assignment, sqlx::Error> {
        let row = sqlx::query_as::<_, AssignmentRow>(
            r#"
            INSERT INTO assignments (id, kind, resource_id, assignment_type, assigned_to,
                                     assigned_by, assigned_at, start_date, end_date, status,
                                     notes, completed_at, cancelled_at, created_at,
                                     updated_at, updated_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            RETURNING *
            "#,
        )
        .bind(assignment.id)
        .bind(assignment.kind())
        .bind(assignment.target.resource_id())
        .bind(assignment.target.assignment_type())
        .bind(assignment.assigned_to)
        .bind(assignment.assigned_by)
        .bind(assignment.assigned_at)
        .bind(assignment.start_date)
        .bind(assignment.end_date)
        .bind(assignment.status)
        .bind(&assignment.notes)
        .bind(assignment.completed_at)
        .bind(assignment.cancelled_at)
        .bind(assignment.created_at)
        .bind(assignment.updated_at)
        .bind(assignment.updated_by)
        .fetch_one(&mut **tx)
        .await?;

        Ok(row.into())
    }
}

#[async_trait]
impl AssignmentRepository for PgAssignmentRepository {
    async fn create_vehicle_assignment(&self, assignment: &Assignment) -> AppResult<ClaimOutcome> {
        let vehicle_id = assignment.target.vehicle_id().ok_or_else(|| {
            AppError::Internal("vehicle assignment without vehicle id".to_string())
        })?;

        let mut tx = self.pool.begin().await?;

        let current: Option<(VehicleStatus,)> =
            sqlx::query_as("SELECT status FROM vehicles WHERE id = $1 FOR UPDATE")
                .bind(vehicle_id)
                .fetch_optional(&mut *tx)
                .await?;

        match current {
            None => return Ok(ClaimOutcome::VehicleMissing),
            Some((status,)) if status != VehicleStatus::Available => {
                return Ok(ClaimOutcome::VehicleUnavailable(status))
            }
            Some(_) => {}
        }

        sqlx::query(
            "UPDATE vehicles SET status = 'assigned', updated_at = $2, updated_by = $3 WHERE id = $1",
        )
        .bind(vehicle_id)
        .bind(assignment.assigned_at)
        .bind(assignment.assigned_by)
        .execute(&mut *tx)
        .await?;

        let created = Self::insert_in(&mut tx, assignment).await?;
        tx.commit().await?;

        Ok(ClaimOutcome::Created(created))
    }

    async fn insert_feeder_point_assignment(
        &self,
        assignment: &Assignment,
    ) -> AppResult<PointClaimOutcome> {
        let mut tx = self.pool.begin().await?;

        // Bloqueo compartido: impide un borrado concurrente del punto
        let point: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM feeder_points WHERE id = $1 FOR SHARE")
                .bind(assignment.target.resource_id())
                .fetch_optional(&mut *tx)
                .await?;
        if point.is_none() {
            return Ok(PointClaimOutcome::PointMissing);
        }

        let created = Self::insert_in(&mut tx, assignment).await?;
        tx.commit().await?;
        Ok(PointClaimOutcome::Created(created))
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Assignment>> {
        let row = sqlx::query_as::<_, AssignmentRow>("SELECT * FROM assignments WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Assignment::from))
    }

    async fn list(&self, filter: &AssignmentFilter) -> AppResult<Vec<Assignment>> {
        let rows = sqlx::query_as::<_, AssignmentRow>(
            r#"
            SELECT * FROM assignments
            WHERE ($1::assignment_kind IS NULL OR kind = $1)
              AND ($2::assignment_status IS NULL OR status = $2)
              AND ($3::text IS NULL OR assignment_type = $3)
              AND ($4::uuid IS NULL OR resource_id = $4)
            ORDER BY assigned_at DESC
            "#,
        )
        .bind(filter.kind)
        .bind(filter.status)
        .bind(&filter.assignment_type)
        .bind(filter.resource_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Assignment::from).collect())
    }

    async fn close(
        &self,
        id: Uuid,
        status: AssignmentStatus,
        at: DateTime<Utc>,
        actor: Uuid,
    ) -> AppResult<CloseOutcome> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, AssignmentRow>(
            "SELECT * FROM assignments WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let mut assignment = match row {
            Some(row) => Assignment::from(row),
            None => return Ok(CloseOutcome::Missing),
        };

        if let Err(current) = assignment.close(status, at, actor) {
            return Ok(CloseOutcome::NotActive(current));
        }

        sqlx::query(
            r#"
            UPDATE assignments
            SET status = $2, completed_at = $3, cancelled_at = $4, updated_at = $5, updated_by = $6
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(assignment.status)
        .bind(assignment.completed_at)
        .bind(assignment.cancelled_at)
        .bind(assignment.updated_at)
        .bind(assignment.updated_by)
        .execute(&mut *tx)
        .await?;

        if let Some(vehicle_id) = assignment.target.vehicle_id() {
            sqlx::query(
                "UPDATE vehicles SET status = 'available', updated_at = $2, updated_by = $3 WHERE id = $1",
            )
            .bind(vehicle_id)
            .bind(at)
            .bind(actor)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(CloseOutcome::Closed(assignment))
    }
}
