//! Modelo de Assignment
//!
//! Una asignación enlaza un recurso (vehículo o punto de recogida) con un
//! usuario. Ambos tipos comparten la misma máquina de estados:
//! `active` → `completed` | `cancelled`, ambos terminales.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Type;
use uuid::Uuid;

use crate::utils::errors::{invalid_status_error, AppError, AppResult};

/// Tipo de recurso asignado - mapea al ENUM assignment_kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[sqlx(type_name = "assignment_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AssignmentKind {
    Vehicle,
    FeederPoint,
}

impl AssignmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentKind::Vehicle => "vehicle",
            AssignmentKind::FeederPoint => "feeder_point",
        }
    }
}

/// Estado de la asignación - mapea al ENUM assignment_status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[sqlx(type_name = "assignment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    Active,
    Completed,
    Cancelled,
}

impl AssignmentStatus {
    pub const ALL: [AssignmentStatus; 3] = [
        AssignmentStatus::Active,
        AssignmentStatus::Completed,
        AssignmentStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentStatus::Active => "active",
            AssignmentStatus::Completed => "completed",
            AssignmentStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, AssignmentStatus::Active)
    }

    pub fn can_transition_to(&self, next: AssignmentStatus) -> bool {
        *self == AssignmentStatus::Active && next.is_terminal()
    }

    /// Interpreta el estado destino de una transición; sólo se admiten terminales
    pub fn parse_terminal(value: &str) -> AppResult<AssignmentStatus> {
        const TERMINAL: [&str; 2] = ["completed", "cancelled"];
        match value.parse::<AssignmentStatus>() {
            Ok(status) if status.is_terminal() => Ok(status),
            _ => Err(invalid_status_error("status", value, &TERMINAL)),
        }
    }
}

impl fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssignmentStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AssignmentStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s.trim())
            .ok_or_else(|| {
                invalid_status_error(
                    "assignment status",
                    s,
                    &AssignmentStatus::ALL.map(|a| a.as_str()),
                )
            })
    }
}

/// Recurso asignado
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AssignmentTarget {
    Vehicle {
        vehicle_id: Uuid,
        assignment_type: String,
    },
    FeederPoint {
        feeder_point_id: Uuid,
    },
}

impl AssignmentTarget {
    pub fn kind(&self) -> AssignmentKind {
        match self {
            AssignmentTarget::Vehicle { .. } => AssignmentKind::Vehicle,
            AssignmentTarget::FeederPoint { .. } => AssignmentKind::FeederPoint,
        }
    }

    pub fn resource_id(&self) -> Uuid {
        match self {
            AssignmentTarget::Vehicle { vehicle_id, .. } => *vehicle_id,
            AssignmentTarget::FeederPoint { feeder_point_id } => *feeder_point_id,
        }
    }

    pub fn vehicle_id(&self) -> Option<Uuid> {
        match self {
            AssignmentTarget::Vehicle { vehicle_id, .. } => Some(*vehicle_id),
            AssignmentTarget::FeederPoint { .. } => None,
        }
    }

    pub fn assignment_type(&self) -> Option<&str> {
        match self {
            AssignmentTarget::Vehicle { assignment_type, .. } => Some(assignment_type),
            AssignmentTarget::FeederPoint { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Assignment {
    pub id: Uuid,
    #[serde(flatten)]
    pub target: AssignmentTarget,
    pub assigned_to: Uuid,
    pub assigned_by: Uuid,
    pub assigned_at: DateTime<Utc>,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub status: AssignmentStatus,
    pub notes: String,
    pub completed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<Uuid>,
}

/// Datos de entrada de una nueva asignación
#[derive(Debug, Clone)]
pub struct NewAssignment {
    pub target: AssignmentTarget,
    pub assigned_to: Uuid,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

impl Assignment {
    /// Toda asignación nace activa
    pub fn new_active(input: NewAssignment, assigned_by: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            target: input.target,
            assigned_to: input.assigned_to,
            assigned_by,
            assigned_at: now,
            start_date: input.start_date.unwrap_or(now),
            end_date: input.end_date,
            status: AssignmentStatus::Active,
            notes: input.notes.unwrap_or_default(),
            completed_at: None,
            cancelled_at: None,
            created_at: now,
            updated_at: now,
            updated_by: None,
        }
    }

    pub fn kind(&self) -> AssignmentKind {
        self.target.kind()
    }

    pub fn is_active(&self) -> bool {
        self.status == AssignmentStatus::Active
    }

    /// Aplica una transición terminal y sella su marca de tiempo
    pub fn close(
        &mut self,
        status: AssignmentStatus,
        at: DateTime<Utc>,
        actor: Uuid,
    ) -> Result<(), AssignmentStatus> {
        if !self.status.can_transition_to(status) {
            return Err(self.status);
        }
        self.status = status;
        match status {
            AssignmentStatus::Completed => self.completed_at = Some(at),
            AssignmentStatus::Cancelled => self.cancelled_at = Some(at),
            AssignmentStatus::Active => {}
        }
        self.updated_at = at;
        self.updated_by = Some(actor);
        Ok(())
    }

    /// Duración en días entre asignación y finalización
    pub fn duration_days(&self) -> Option<f64> {
        self.completed_at
            .map(|done| (done - self.assigned_at).num_seconds() as f64 / 86_400.0)
    }
}

/// Filtros de igualdad para listados
#[derive(Debug, Clone, Default)]
pub struct AssignmentFilter {
    pub kind: Option<AssignmentKind>,
    pub status: Option<AssignmentStatus>,
    pub assignment_type: Option<String>,
    pub resource_id: Option<Uuid>,
}

impl AssignmentFilter {
    pub fn matches(&self, assignment: &Assignment) -> bool {
        self.kind.map_or(true, |k| assignment.kind() == k)
            && self.status.map_or(true, |s| assignment.status == s)
            && self
                .assignment_type
                .as_deref()
                .map_or(true, |t| assignment.target.assignment_type() == Some(t))
            && self
                .resource_id
                .map_or(true, |id| assignment.target.resource_id() == id)
    }
}

/// Resultado de crear una asignación de vehículo de forma atómica
#[derive(Debug)]
pub enum ClaimOutcome {
    Created(Assignment),
    VehicleMissing,
    VehicleUnavailable(crate::models::vehicle::VehicleStatus),
}

/// Resultado de asignar un punto de recogida de forma atómica
#[derive(Debug)]
pub enum PointClaimOutcome {
    Created(Assignment),
    PointMissing,
}

/// Resultado de cerrar una asignación de forma atómica
#[derive(Debug)]
pub enum CloseOutcome {
    Closed(Assignment),
    Missing,
    NotActive(AssignmentStatus),
}
