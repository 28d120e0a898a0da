//! Servicio de asignaciones
//!
//! Orquesta la máquina de estados `active → completed | cancelled`. La
//! comprobación de disponibilidad del vehículo y el cambio a `assigned`
//! ocurren dentro de una sola operación atómica del repositorio.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::dto::assignment_dto::{
    AssignmentListQuery, CreateFeederPointAssignmentRequest, CreateVehicleAssignmentRequest,
    FeederPointAssignmentView, VehicleAssignmentView,
};
use crate::models::analytics::{AssignmentStatistics, StatusCounts};
use crate::models::assignment::{
    Assignment, AssignmentFilter, AssignmentKind, AssignmentStatus, AssignmentTarget,
    ClaimOutcome, CloseOutcome, NewAssignment, PointClaimOutcome,
};
use crate::models::auth::Principal;
use crate::models::permission::Permission;
use crate::models::user::UserSummary;
use crate::repositories::{
    AssignmentRepository, FeederPointRepository, Repositories, UserRepository, VehicleRepository,
};
use crate::utils::errors::{not_found_error, validation_error, AppError, AppResult};

pub struct AssignmentService {
    assignments: Arc<dyn AssignmentRepository>,
    vehicles: Arc<dyn VehicleRepository>,
    feeder_points: Arc<dyn FeederPointRepository>,
    users: Arc<dyn UserRepository>,
}

impl AssignmentService {
    pub fn new(repos: &Repositories) -> Self {
        Self {
            assignments: repos.assignments.clone(),
            vehicles: repos.vehicles.clone(),
            feeder_points: repos.feeder_points.clone(),
            users: repos.users.clone(),
        }
    }

    pub async fn create_vehicle_assignment(
        &self,
        principal: &Principal,
        request: CreateVehicleAssignmentRequest,
    ) -> AppResult<Assignment> {
        principal.require(Permission::ManageAssignments)?;
        request.validate()?;
        let now = Utc::now();
        check_dates(request.start_date.unwrap_or(now), request.end_date)?;

        let vehicle_id = request
            .vehicle_id
            .ok_or_else(|| validation_error("vehicle_id", "Vehicle ID is required"))?;
        let assignee = self.require_assignee(request.assigned_to).await?;

        let assignment = Assignment::new_active(
            NewAssignment {
                target: AssignmentTarget::Vehicle {
                    vehicle_id,
                    assignment_type: request.assignment_type.trim().to_string(),
                },
                assigned_to: assignee,
                start_date: request.start_date,
                end_date: request.end_date,
                notes: request.notes,
            },
            principal.user_id,
            now,
        );

        match self.assignments.create_vehicle_assignment(&assignment).await? {
            ClaimOutcome::Created(created) => {
                info!(
                    assignment_id = %created.id,
                    vehicle_id = %vehicle_id,
                    assigned_to = %assignee,
                    "🚛 Vehículo asignado"
                );
                Ok(created)
            }
            ClaimOutcome::VehicleMissing => Err(not_found_error("Vehicle", vehicle_id)),
            ClaimOutcome::VehicleUnavailable(status) => {
                warn!(vehicle_id = %vehicle_id, status = %status, "⚠️ Vehículo no disponible");
                Err(AppError::Conflict(format!(
                    "Vehicle is not available for assignment (current status: {})",
                    status
                )))
            }
        }
    }

    pub async fn create_feeder_point_assignment(
        &self,
        principal: &Principal,
        request: CreateFeederPointAssignmentRequest,
    ) -> AppResult<Assignment> {
        principal.require(Permission::ManageAssignments)?;
        request.validate()?;
        let now = Utc::now();
        check_dates(request.start_date.unwrap_or(now), request.end_date)?;

        let feeder_point_id = request
            .feeder_point_id
            .ok_or_else(|| validation_error("feeder_point_id", "Feeder point ID is required"))?;
        if self.feeder_points.find_by_id(feeder_point_id).await?.is_none() {
            return Err(not_found_error("Feeder point", feeder_point_id));
        }
        let assignee = self.require_assignee(request.assigned_to).await?;

        let assignment = Assignment::new_active(
            NewAssignment {
                target: AssignmentTarget::FeederPoint { feeder_point_id },
                assigned_to: assignee,
                start_date: request.start_date,
                end_date: request.end_date,
                notes: request.notes,
            },
            principal.user_id,
            now,
        );

        let created = match self
            .assignments
            .insert_feeder_point_assignment(&assignment)
            .await?
        {
            PointClaimOutcome::Created(created) => created,
            PointClaimOutcome::PointMissing => {
                return Err(not_found_error("Feeder point", feeder_point_id))
            }
        };
        info!(
            assignment_id = %created.id,
            feeder_point_id = %feeder_point_id,
            assigned_to = %assignee,
            "📍 Punto de recogida asignado"
        );
        Ok(created)
    }

    /// Cierra una asignación activa; el vehículo vuelve a `available`
    pub async fn change_status(
        &self,
        principal: &Principal,
        id: Uuid,
        status: &str,
    ) -> AppResult<Assignment> {
        principal.require(Permission::ManageAssignments)?;
        let status = AssignmentStatus::parse_terminal(status)?;

        match self
            .assignments
            .close(id, status, Utc::now(), principal.user_id)
            .await?
        {
            CloseOutcome::Closed(assignment) => {
                info!(assignment_id = %id, status = %status, "✅ Asignación cerrada");
                Ok(assignment)
            }
            CloseOutcome::Missing => Err(not_found_error("Assignment", id)),
            CloseOutcome::NotActive(current) => Err(AppError::InvalidStatus(format!(
                "Assignment is already {}; only active assignments can be {}",
                current, status
            ))),
        }
    }

    pub async fn get(&self, principal: &Principal, id: Uuid) -> AppResult<Assignment> {
        principal.require(Permission::ManageAssignments)?;
        self.assignments
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Assignment", id))
    }

    pub async fn list_vehicle_assignments(
        &self,
        principal: &Principal,
        query: &AssignmentListQuery,
    ) -> AppResult<Vec<VehicleAssignmentView>> {
        principal.require(Permission::ManageAssignments)?;
        let filter = AssignmentFilter {
            kind: Some(AssignmentKind::Vehicle),
            status: parse_status_filter(query.status.as_deref())?,
            assignment_type: query
                .assignment_type
                .clone()
                .filter(|t| !t.is_empty() && t != "all"),
            resource_id: None,
        };

        let assignments = self.assignments.list(&filter).await?;
        try_join_all(assignments.into_iter().map(|assignment| async move {
            let vehicle = match assignment.target.vehicle_id() {
                Some(id) => self.vehicles.find_by_id(id).await?,
                None => None,
            };
            let assignee = self.assignee_summary(assignment.assigned_to).await?;
            Ok::<_, AppError>(VehicleAssignmentView {
                assignment,
                vehicle,
                assignee,
            })
        }))
        .await
    }

    pub async fn list_feeder_point_assignments(
        &self,
        principal: &Principal,
        query: &AssignmentListQuery,
    ) -> AppResult<Vec<FeederPointAssignmentView>> {
        principal.require(Permission::ManageAssignments)?;
        let filter = AssignmentFilter {
            kind: Some(AssignmentKind::FeederPoint),
            status: parse_status_filter(query.status.as_deref())?,
            ..Default::default()
        };

        let assignments = self.assignments.list(&filter).await?;
        try_join_all(assignments.into_iter().map(|assignment| async move {
            let feeder_point = self
                .feeder_points
                .find_by_id(assignment.target.resource_id())
                .await?;
            let assignee = self.assignee_summary(assignment.assigned_to).await?;
            Ok::<_, AppError>(FeederPointAssignmentView {
                assignment,
                feeder_point,
                assignee,
            })
        }))
        .await
    }

    /// Conteo por estado de cada tipo; sólo lectura
    pub async fn statistics(&self, principal: &Principal) -> AppResult<AssignmentStatistics> {
        principal.require(Permission::ManageAssignments)?;
        let all = self.assignments.list(&AssignmentFilter::default()).await?;

        Ok(AssignmentStatistics {
            vehicle_assignments: StatusCounts::from_assignments(
                all.iter().filter(|a| a.kind() == AssignmentKind::Vehicle),
            ),
            feeder_point_assignments: StatusCounts::from_assignments(
                all.iter().filter(|a| a.kind() == AssignmentKind::FeederPoint),
            ),
        })
    }

    async fn require_assignee(&self, assigned_to: Option<Uuid>) -> AppResult<Uuid> {
        let id = assigned_to.ok_or_else(|| validation_error("assigned_to", "Assignee is required"))?;
        match self.users.find_by_id(id).await? {
            Some(user) => Ok(user.id),
            None => Err(not_found_error("User", id)),
        }
    }

    async fn assignee_summary(&self, id: Uuid) -> AppResult<Option<UserSummary>> {
        Ok(self
            .users
            .find_by_id(id)
            .await?
            .as_ref()
            .map(UserSummary::from))
    }
}

fn parse_status_filter(raw: Option<&str>) -> AppResult<Option<AssignmentStatus>> {
    raw.filter(|s| !s.is_empty() && *s != "all")
        .map(str::parse::<AssignmentStatus>)
        .transpose()
}

/// `start` es el inicio efectivo: el enviado o, si falta, el instante de alta
fn check_dates(start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> AppResult<()> {
    match end {
        Some(e) if e < start => Err(AppError::BadRequest(
            "end_date must not be before start_date".to_string(),
        )),
        _ => Ok(()),
    }
}
