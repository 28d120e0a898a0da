//! Servicio de reportes
//!
//! Agregaciones de sólo lectura sobre el estado actual del almacén.
//! Los rangos de fechas filtran por fecha de creación (asignaciones:
//! `assigned_at`).

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use crate::models::analytics::{
    trend, AssignmentReport, DashboardSummary, PerformanceMetrics, StatusCounts, TimeBucket,
    UserCounts, UserReport, VehicleReport, VehicleUtilization,
};
use crate::models::approval::ApprovalStatus;
use crate::models::assignment::{Assignment, AssignmentFilter, AssignmentKind};
use crate::models::auth::Principal;
use crate::models::permission::Permission;
use crate::models::user::UserFilter;
use crate::models::vehicle::VehicleFilter;
use crate::repositories::{
    ApprovalRepository, AssignmentRepository, AuditRepository, Repositories, UserRepository,
    VehicleRepository,
};
use crate::services::vehicle_service::count_by_status;
use crate::utils::errors::{invalid_status_error, AppResult};
use crate::utils::validation::DateRange;

pub struct ReportService {
    users: Arc<dyn UserRepository>,
    vehicles: Arc<dyn VehicleRepository>,
    assignments: Arc<dyn AssignmentRepository>,
    approvals: Arc<dyn ApprovalRepository>,
    audit: Arc<dyn AuditRepository>,
    recent_activity_limit: usize,
}

/// Tipo de asignaciones incluidas en el reporte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AssignmentScope {
    #[default]
    All,
    Vehicle,
    FeederPoint,
}

impl AssignmentScope {
    pub fn parse(raw: Option<&str>) -> AppResult<Self> {
        match raw.map(str::trim) {
            None | Some("") | Some("all") => Ok(AssignmentScope::All),
            Some("vehicle") => Ok(AssignmentScope::Vehicle),
            Some("feeder_point") => Ok(AssignmentScope::FeederPoint),
            Some(other) => Err(invalid_status_error(
                "type",
                other,
                &["all", "vehicle", "feeder_point"],
            )),
        }
    }

    fn includes(&self, kind: AssignmentKind) -> bool {
        match self {
            AssignmentScope::All => true,
            AssignmentScope::Vehicle => kind == AssignmentKind::Vehicle,
            AssignmentScope::FeederPoint => kind == AssignmentKind::FeederPoint,
        }
    }
}

impl ReportService {
    pub fn new(repos: &Repositories, recent_activity_limit: usize) -> Self {
        Self {
            users: repos.users.clone(),
            vehicles: repos.vehicles.clone(),
            assignments: repos.assignments.clone(),
            approvals: repos.approvals.clone(),
            audit: repos.audit.clone(),
            recent_activity_limit,
        }
    }

    /// Instantánea del panel; disponible para cualquier usuario autenticado
    pub async fn dashboard(&self, _principal: &Principal) -> AppResult<DashboardSummary> {
        let users = self.users.list(&UserFilter::default()).await?;
        let pending = self.approvals.list(Some(ApprovalStatus::Pending)).await?;
        let vehicles = self.vehicles.list(&VehicleFilter::default()).await?;
        let vehicle_assignments = self
            .assignments
            .list(&AssignmentFilter {
                kind: Some(AssignmentKind::Vehicle),
                ..Default::default()
            })
            .await?;
        let recent_activities = self.audit.recent(self.recent_activity_limit).await?;

        debug!(
            users = users.len(),
            vehicles = vehicles.len(),
            assignments = vehicle_assignments.len(),
            "📊 Dashboard calculado"
        );

        Ok(DashboardSummary {
            users: UserCounts {
                total: users.len() as u64,
                active: users.iter().filter(|u| u.is_active).count() as u64,
                pending: pending.len() as u64,
            },
            vehicles: count_by_status(&vehicles),
            assignments: StatusCounts::from_assignments(&vehicle_assignments),
            recent_activities,
        })
    }

    pub async fn user_report(
        &self,
        principal: &Principal,
        range: DateRange,
        bucket: TimeBucket,
    ) -> AppResult<UserReport> {
        principal.require(Permission::ViewAllReports)?;
        let mut users = self.users.list(&UserFilter::default()).await?;
        users.retain(|u| range.contains(u.created_at));

        let mut role_stats = BTreeMap::new();
        for u in &users {
            *role_stats.entry(u.role.as_str().to_string()).or_insert(0u64) += 1;
        }

        Ok(UserReport {
            total: users.len() as u64,
            registration_trend: trend(users.iter().map(|u| u.created_at), bucket),
            role_stats,
            users,
        })
    }

    pub async fn vehicle_report(
        &self,
        principal: &Principal,
        range: DateRange,
        bucket: TimeBucket,
    ) -> AppResult<VehicleReport> {
        principal.require(Permission::ViewAllReports)?;
        let mut vehicles = self.vehicles.list(&VehicleFilter::default()).await?;
        vehicles.retain(|v| range.contains(v.created_at));

        let assignments = self
            .assignments
            .list(&AssignmentFilter {
                kind: Some(AssignmentKind::Vehicle),
                ..Default::default()
            })
            .await?;

        let mut status_stats = BTreeMap::new();
        let mut type_stats = BTreeMap::new();
        for v in &vehicles {
            *status_stats.entry(v.status.as_str().to_string()).or_insert(0u64) += 1;
            *type_stats.entry(v.vehicle_type.clone()).or_insert(0u64) += 1;
        }

        let utilization = vehicles
            .iter()
            .map(|v| {
                let history: Vec<&Assignment> = assignments
                    .iter()
                    .filter(|a| a.target.vehicle_id() == Some(v.id))
                    .collect();
                let active = history.iter().filter(|a| a.is_active()).count() as u64;
                let total = history.len() as u64;
                VehicleUtilization {
                    vehicle_id: v.id,
                    registration_number: v.registration_number.clone(),
                    active_assignments: active,
                    total_assignments: total,
                    utilization_rate: if total == 0 {
                        0.0
                    } else {
                        active as f64 / total as f64
                    },
                }
            })
            .collect();

        Ok(VehicleReport {
            total: vehicles.len() as u64,
            creation_trend: trend(vehicles.iter().map(|v| v.created_at), bucket),
            status_stats,
            type_stats,
            utilization,
            vehicles,
        })
    }

    pub async fn assignment_report(
        &self,
        principal: &Principal,
        range: DateRange,
        scope: AssignmentScope,
        bucket: TimeBucket,
    ) -> AppResult<AssignmentReport> {
        principal.require(Permission::ViewAllReports)?;
        let all = self.assignments.list(&AssignmentFilter::default()).await?;

        let (vehicle_assignments, feeder_point_assignments): (Vec<_>, Vec<_>) = all
            .into_iter()
            .filter(|a| scope.includes(a.kind()) && range.contains(a.assigned_at))
            .partition(|a| a.kind() == AssignmentKind::Vehicle);

        let combined = || vehicle_assignments.iter().chain(&feeder_point_assignments);

        let mut status_stats = BTreeMap::new();
        for a in combined() {
            let key = format!("{}_{}", a.kind().as_str(), a.status.as_str());
            *status_stats.entry(key).or_insert(0u64) += 1;
        }

        Ok(AssignmentReport {
            performance: PerformanceMetrics::from_assignments(combined()),
            assignment_trend: trend(combined().map(|a| a.assigned_at), bucket),
            status_stats,
            vehicle_assignments,
            feeder_point_assignments,
        })
    }
}
