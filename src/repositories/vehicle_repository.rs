use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use super::VehicleRepository;
use crate::models::vehicle::{
    DeleteOutcome, StatusChange, Vehicle, VehicleChanges, VehicleFilter, VehicleStatus,
};
use crate::utils::errors::{map_unique_violation, AppResult};

pub struct PgVehicleRepository {
    pool: PgPool,
}

impl PgVehicleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn duplicate_registration(registration: &str) -> String {
    format!("Vehicle with registration number '{}' already exists", registration)
}

#[async_trait]
impl VehicleRepository for PgVehicleRepository {
    async fn insert(&self, vehicle: &Vehicle) -> AppResult<Vehicle> {
        let vehicle = sqlx::query_as::<_, Vehicle>(
            r#"
            INSERT INTO vehicles (id, registration_number, make, model, year, vehicle_type,
                                  capacity, fuel_type, status, created_at, created_by,
                                  updated_at, updated_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *
            "#,
        )
        .bind(vehicle.id)
        .bind(&vehicle.registration_number)
        .bind(&vehicle.make)
        .bind(&vehicle.model)
        .bind(vehicle.year)
        .bind(&vehicle.vehicle_type)
        .bind(vehicle.capacity)
        .bind(&vehicle.fuel_type)
        .bind(vehicle.status)
        .bind(vehicle.created_at)
        .bind(vehicle.created_by)
        .bind(vehicle.updated_at)
        .bind(vehicle.updated_by)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, duplicate_registration(&vehicle.registration_number)))?;

        Ok(vehicle)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Vehicle>> {
        let vehicle = sqlx::query_as::<_, Vehicle>("SELECT * FROM vehicles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(vehicle)
    }

    async fn find_by_registration(&self, registration: &str) -> AppResult<Option<Vehicle>> {
        let vehicle =
            sqlx::query_as::<_, Vehicle>("SELECT * FROM vehicles WHERE registration_number = $1")
                .bind(registration)
                .fetch_optional(&self.pool)
                .await?;
        Ok(vehicle)
    }

    async fn list(&self, filter: &VehicleFilter) -> AppResult<Vec<Vehicle>> {
        let vehicles = sqlx::query_as::<_, Vehicle>(
            r#"
            SELECT * FROM vehicles
            WHERE ($1::vehicle_status IS NULL OR status = $1)
              AND ($2::text IS NULL OR vehicle_type = $2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(filter.status)
        .bind(&filter.vehicle_type)
        .fetch_all(&self.pool)
        .await?;
        Ok(vehicles)
    }

    async fn update(
        &self,
        id: Uuid,
        changes: &VehicleChanges,
        actor: Uuid,
    ) -> AppResult<Option<Vehicle>> {
        let vehicle = sqlx::query_as::<_, Vehicle>(
            r#"
            UPDATE vehicles
            SET registration_number = COALESCE($2, registration_number),
                make = COALESCE($3, make),
                model = COALESCE($4, model),
                year = COALESCE($5, year),
                vehicle_type = COALESCE($6, vehicle_type),
                capacity = COALESCE($7, capacity),
                fuel_type = COALESCE($8, fuel_type),
                updated_at = $9,
                updated_by = $10
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&changes.registration_number)
        .bind(&changes.make)
        .bind(&changes.model)
        .bind(changes.year)
        .bind(&changes.vehicle_type)
        .bind(changes.capacity)
        .bind(&changes.fuel_type)
        .bind(Utc::now())
        .bind(actor)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            map_unique_violation(
                e,
                duplicate_registration(changes.registration_number.as_deref().unwrap_or_default()),
            )
        })?;
        Ok(vehicle)
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: VehicleStatus,
        actor: Uuid,
    ) -> AppResult<StatusChange> {
        let updated = sqlx::query_as::<_, Vehicle>(
            r#"
            UPDATE vehicles
            SET status = $2, updated_at = $3, updated_by = $4
            WHERE id = $1 AND status <> 'assigned'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(Utc::now())
        .bind(actor)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(vehicle) = updated {
            return Ok(StatusChange::Updated(vehicle));
        }

        // Sin fila actualizada: o no existe o está asignado
        Ok(match self.find_by_id(id).await? {
            Some(_) => StatusChange::Assigned,
            None => StatusChange::Missing,
        })
    }

    async fn delete_unassigned(&self, id: Uuid) -> AppResult<DeleteOutcome> {
        let mut tx = self.pool.begin().await?;

        let exists: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM vehicles WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if exists.is_none() {
            return Ok(DeleteOutcome::Missing);
        }

        let (active,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM assignments WHERE kind = 'vehicle' AND resource_id = $1 AND status = 'active'",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
        if active > 0 {
            return Ok(DeleteOutcome::HasActiveAssignments);
        }

        sqlx::query("DELETE FROM vehicles WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(DeleteOutcome::Deleted)
    }
}
