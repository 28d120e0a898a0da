//! Modelo de Vehicle
//!
//! El estado `assigned` es el punto de unión con las asignaciones: sólo lo
//! fijan y lo liberan las operaciones atómicas del flujo de asignación.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

use crate::utils::errors::{invalid_status_error, AppError};

/// Estado del vehículo - mapea al ENUM vehicle_status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[sqlx(type_name = "vehicle_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum VehicleStatus {
    Available,
    Assigned,
    Maintenance,
    OutOfService,
}

impl VehicleStatus {
    pub const ALL: [VehicleStatus; 4] = [
        VehicleStatus::Available,
        VehicleStatus::Assigned,
        VehicleStatus::Maintenance,
        VehicleStatus::OutOfService,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleStatus::Available => "available",
            VehicleStatus::Assigned => "assigned",
            VehicleStatus::Maintenance => "maintenance",
            VehicleStatus::OutOfService => "out_of_service",
        }
    }
}

impl Default for VehicleStatus {
    fn default() -> Self {
        VehicleStatus::Available
    }
}

impl fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VehicleStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VehicleStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s.trim())
            .ok_or_else(|| {
                invalid_status_error("vehicle status", s, &VehicleStatus::ALL.map(|v| v.as_str()))
            })
    }
}

/// Vehicle principal - mapea a la tabla vehicles
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Vehicle {
    pub id: Uuid,
    pub registration_number: String,
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub vehicle_type: String,
    pub capacity: Option<Decimal>,
    pub fuel_type: Option<String>,
    pub status: VehicleStatus,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<Uuid>,
}

/// Filtros de igualdad aplicados por el almacén
#[derive(Debug, Clone, Default)]
pub struct VehicleFilter {
    pub status: Option<VehicleStatus>,
    pub vehicle_type: Option<String>,
}

/// Cambios descriptivos; el estado se cambia por separado
#[derive(Debug, Clone, Default)]
pub struct VehicleChanges {
    pub registration_number: Option<String>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub vehicle_type: Option<String>,
    pub capacity: Option<Decimal>,
    pub fuel_type: Option<String>,
}

impl VehicleChanges {
    pub fn apply(&self, vehicle: &mut Vehicle) {
        if let Some(v) = &self.registration_number {
            vehicle.registration_number = v.clone();
        }
        if let Some(v) = &self.make {
            vehicle.make = Some(v.clone());
        }
        if let Some(v) = &self.model {
            vehicle.model = Some(v.clone());
        }
        if let Some(v) = self.year {
            vehicle.year = Some(v);
        }
        if let Some(v) = &self.vehicle_type {
            vehicle.vehicle_type = v.clone();
        }
        if let Some(v) = self.capacity {
            vehicle.capacity = Some(v);
        }
        if let Some(v) = &self.fuel_type {
            vehicle.fuel_type = Some(v.clone());
        }
    }
}

/// Resultado de un cambio manual de estado
#[derive(Debug)]
pub enum StatusChange {
    Updated(Vehicle),
    Missing,
    /// El vehículo tiene una asignación activa
    Assigned,
}

/// Resultado de un borrado condicionado a no tener asignaciones activas
#[derive(Debug, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    Missing,
    HasActiveAssignments,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_out_of_service() {
        assert_eq!(
            "out_of_service".parse::<VehicleStatus>().unwrap(),
            VehicleStatus::OutOfService
        );
        assert!(matches!(
            "retired".parse::<VehicleStatus>(),
            Err(AppError::InvalidStatus(_))
        ));
    }
}
