//! Almacén en memoria
//!
//! Implementa todos los repositorios sobre un único `RwLock`, de modo que
//! cada operación atómica se ejecuta bajo un solo bloqueo de escritura.
//! Se usa en pruebas y con `STORE_BACKEND=memory`.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    AccountRepository, ApprovalRepository, AssignmentRepository, AuditRepository,
    BackupRepository, FeederPointRepository, SettingsRepository, StoreHealth, UserRepository,
    VehicleRepository,
};
use crate::models::{
    approval::{ApprovalDecision, ApprovalRequest, ApprovalStatus, DecisionOutcome},
    assignment::{
        Assignment, AssignmentFilter, AssignmentKind, AssignmentStatus, ClaimOutcome, CloseOutcome,
        PointClaimOutcome,
    },
    audit::{AuditFilter, AuditLogEntry},
    auth::IdentityAccount,
    feeder_point::{FeederPoint, FeederPointChanges},
    settings::BackupRecord,
    user::{ProfileChanges, User, UserFilter, UserRole},
    vehicle::{DeleteOutcome, StatusChange, Vehicle, VehicleChanges, VehicleFilter, VehicleStatus},
};
use crate::utils::errors::{AppError, AppResult};

#[derive(Default)]
struct MemoryData {
    users: HashMap<Uuid, User>,
    accounts: HashMap<Uuid, IdentityAccount>,
    vehicles: HashMap<Uuid, Vehicle>,
    feeder_points: HashMap<Uuid, FeederPoint>,
    assignments: HashMap<Uuid, Assignment>,
    approvals: HashMap<Uuid, ApprovalRequest>,
    audit: Vec<AuditLogEntry>,
    settings: HashMap<String, serde_json::Value>,
    backups: Vec<BackupRecord>,
}

impl MemoryData {
    fn has_active_assignment(&self, kind: AssignmentKind, resource_id: Uuid) -> bool {
        self.assignments.values().any(|a| {
            a.is_active() && a.kind() == kind && a.target.resource_id() == resource_id
        })
    }
}

#[derive(Default)]
pub struct MemoryStore {
    data: RwLock<MemoryData>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn same_email(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn insert(&self, user: &User) -> AppResult<User> {
        let mut data = self.data.write().await;
        if data.users.values().any(|u| same_email(&u.email, &user.email)) {
            return Err(AppError::Conflict(format!(
                "User with email '{}' already exists",
                user.email
            )));
        }
        data.users.insert(user.id, user.clone());
        Ok(user.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.data.read().await.users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let data = self.data.read().await;
        Ok(data.users.values().find(|u| same_email(&u.email, email)).cloned())
    }

    async fn list(&self, filter: &UserFilter) -> AppResult<Vec<User>> {
        let data = self.data.read().await;
        let mut users: Vec<User> = data
            .users
            .values()
            .filter(|u| filter.role.map_or(true, |r| u.role == r))
            .filter(|u| filter.is_active.map_or(true, |a| u.is_active == a))
            .cloned()
            .collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }

    async fn update_profile(
        &self,
        id: Uuid,
        changes: &ProfileChanges,
        actor: Uuid,
    ) -> AppResult<Option<User>> {
        let mut data = self.data.write().await;
        Ok(data.users.get_mut(&id).map(|user| {
            if let Some(name) = &changes.full_name {
                user.full_name = name.clone();
            }
            if let Some(phone) = &changes.phone {
                user.phone = Some(phone.clone());
            }
            user.updated_at = Utc::now();
            user.updated_by = Some(actor);
            user.clone()
        }))
    }

    async fn update_role(&self, id: Uuid, role: UserRole, actor: Uuid) -> AppResult<Option<User>> {
        let mut data = self.data.write().await;
        Ok(data.users.get_mut(&id).map(|user| {
            user.role = role;
            user.permissions = role.default_permissions();
            user.updated_at = Utc::now();
            user.updated_by = Some(actor);
            user.clone()
        }))
    }

    async fn set_active(&self, id: Uuid, is_active: bool, actor: Uuid) -> AppResult<Option<User>> {
        let mut data = self.data.write().await;
        Ok(data.users.get_mut(&id).map(|user| {
            user.is_active = is_active;
            user.updated_at = Utc::now();
            user.updated_by = Some(actor);
            user.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.data.write().await.users.remove(&id).is_some())
    }
}

#[async_trait]
impl VehicleRepository for MemoryStore {
    async fn insert(&self, vehicle: &Vehicle) -> AppResult<Vehicle> {
        let mut data = self.data.write().await;
        if data
            .vehicles
            .values()
            .any(|v| v.registration_number == vehicle.registration_number)
        {
            return Err(AppError::Conflict(format!(
                "Vehicle with registration number '{}' already exists",
                vehicle.registration_number
            )));
        }
        data.vehicles.insert(vehicle.id, vehicle.clone());
        Ok(vehicle.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Vehicle>> {
        Ok(self.data.read().await.vehicles.get(&id).cloned())
    }

    async fn find_by_registration(&self, registration: &str) -> AppResult<Option<Vehicle>> {
        let data = self.data.read().await;
        Ok(data
            .vehicles
            .values()
            .find(|v| v.registration_number == registration)
            .cloned())
    }

    async fn list(&self, filter: &VehicleFilter) -> AppResult<Vec<Vehicle>> {
        let data = self.data.read().await;
        let mut vehicles: Vec<Vehicle> = data
            .vehicles
            .values()
            .filter(|v| filter.status.map_or(true, |s| v.status == s))
            .filter(|v| {
                filter
                    .vehicle_type
                    .as_deref()
                    .map_or(true, |t| v.vehicle_type == t)
            })
            .cloned()
            .collect();
        vehicles.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(vehicles)
    }

    async fn update(
        &self,
        id: Uuid,
        changes: &VehicleChanges,
        actor: Uuid,
    ) -> AppResult<Option<Vehicle>> {
        let mut data = self.data.write().await;
        if let Some(registration) = &changes.registration_number {
            if data
                .vehicles
                .values()
                .any(|v| v.id != id && &v.registration_number == registration)
            {
                return Err(AppError::Conflict(format!(
                    "Vehicle with registration number '{}' already exists",
                    registration
                )));
            }
        }
        Ok(data.vehicles.get_mut(&id).map(|vehicle| {
            changes.apply(vehicle);
            vehicle.updated_at = Utc::now();
            vehicle.updated_by = Some(actor);
            vehicle.clone()
        }))
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: VehicleStatus,
        actor: Uuid,
    ) -> AppResult<StatusChange> {
        let mut data = self.data.write().await;
        let vehicle = match data.vehicles.get_mut(&id) {
            Some(vehicle) => vehicle,
            None => return Ok(StatusChange::Missing),
        };
        if vehicle.status == VehicleStatus::Assigned {
            return Ok(StatusChange::Assigned);
        }
        vehicle.status = status;
        vehicle.updated_at = Utc::now();
        vehicle.updated_by = Some(actor);
        Ok(StatusChange::Updated(vehicle.clone()))
    }

    async fn delete_unassigned(&self, id: Uuid) -> AppResult<DeleteOutcome> {
        let mut data = self.data.write().await;
        if !data.vehicles.contains_key(&id) {
            return Ok(DeleteOutcome::Missing);
        }
        if data.has_active_assignment(AssignmentKind::Vehicle, id) {
            return Ok(DeleteOutcome::HasActiveAssignments);
        }
        data.vehicles.remove(&id);
        Ok(DeleteOutcome::Deleted)
    }
}

#[async_trait]
impl FeederPointRepository for MemoryStore {
    async fn insert(&self, point: &FeederPoint) -> AppResult<FeederPoint> {
        self.data
            .write()
            .await
            .feeder_points
            .insert(point.id, point.clone());
        Ok(point.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<FeederPoint>> {
        Ok(self.data.read().await.feeder_points.get(&id).cloned())
    }

    async fn list(&self) -> AppResult<Vec<FeederPoint>> {
        let data = self.data.read().await;
        let mut points: Vec<FeederPoint> = data.feeder_points.values().cloned().collect();
        points.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(points)
    }

    async fn update(
        &self,
        id: Uuid,
        changes: &FeederPointChanges,
        actor: Uuid,
    ) -> AppResult<Option<FeederPoint>> {
        let mut data = self.data.write().await;
        Ok(data.feeder_points.get_mut(&id).map(|point| {
            changes.apply(point);
            point.updated_at = Utc::now();
            point.updated_by = Some(actor);
            point.clone()
        }))
    }

    async fn delete_unassigned(&self, id: Uuid) -> AppResult<DeleteOutcome> {
        let mut data = self.data.write().await;
        if !data.feeder_points.contains_key(&id) {
            return Ok(DeleteOutcome::Missing);
        }
        if data.has_active_assignment(AssignmentKind::FeederPoint, id) {
            return Ok(DeleteOutcome::HasActiveAssignments);
        }
        data.feeder_points.remove(&id);
        Ok(DeleteOutcome::Deleted)
    }
}

#[async_trait]
impl AssignmentRepository for MemoryStore {
    async fn create_vehicle_assignment(&self, assignment: &Assignment) -> AppResult<ClaimOutcome> {
        let vehicle_id = assignment.target.vehicle_id().ok_or_else(|| {
            AppError::Internal("vehicle assignment without vehicle id".to_string())
        })?;

        let mut data = self.data.write().await;
        let vehicle = match data.vehicles.get_mut(&vehicle_id) {
            Some(vehicle) => vehicle,
            None => return Ok(ClaimOutcome::VehicleMissing),
        };
        if vehicle.status != VehicleStatus::Available {
            return Ok(ClaimOutcome::VehicleUnavailable(vehicle.status));
        }

        vehicle.status = VehicleStatus::Assigned;
        vehicle.updated_at = assignment.assigned_at;
        vehicle.updated_by = Some(assignment.assigned_by);
        data.assignments.insert(assignment.id, assignment.clone());

        Ok(ClaimOutcome::Created(assignment.clone()))
    }

    async fn insert_feeder_point_assignment(
        &self,
        assignment: &Assignment,
    ) -> AppResult<PointClaimOutcome> {
        let mut data = self.data.write().await;
        if !data.feeder_points.contains_key(&assignment.target.resource_id()) {
            return Ok(PointClaimOutcome::PointMissing);
        }

        data.assignments.insert(assignment.id, assignment.clone());
        Ok(PointClaimOutcome::Created(assignment.clone()))
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Assignment>> {
        Ok(self.data.read().await.assignments.get(&id).cloned())
    }

    async fn list(&self, filter: &AssignmentFilter) -> AppResult<Vec<Assignment>> {
        let data = self.data.read().await;
        let mut assignments: Vec<Assignment> = data
            .assignments
            .values()
            .filter(|a| filter.matches(a))
            .cloned()
            .collect();
        assignments.sort_by(|a, b| b.assigned_at.cmp(&a.assigned_at));
        Ok(assignments)
    }

    async fn close(
        &self,
        id: Uuid,
        status: AssignmentStatus,
        at: DateTime<Utc>,
        actor: Uuid,
    ) -> AppResult<CloseOutcome> {
        let mut data = self.data.write().await;
        let assignment = match data.assignments.get_mut(&id) {
            Some(assignment) => assignment,
            None => return Ok(CloseOutcome::Missing),
        };
        if let Err(current) = assignment.close(status, at, actor) {
            return Ok(CloseOutcome::NotActive(current));
        }
        let closed = assignment.clone();

        if let Some(vehicle_id) = closed.target.vehicle_id() {
            if let Some(vehicle) = data.vehicles.get_mut(&vehicle_id) {
                vehicle.status = VehicleStatus::Available;
                vehicle.updated_at = at;
                vehicle.updated_by = Some(actor);
            }
        }

        Ok(CloseOutcome::Closed(closed))
    }
}

#[async_trait]
impl ApprovalRepository for MemoryStore {
    async fn insert(&self, request: &ApprovalRequest) -> AppResult<ApprovalRequest> {
        self.data
            .write()
            .await
            .approvals
            .insert(request.id, request.clone());
        Ok(request.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<ApprovalRequest>> {
        Ok(self.data.read().await.approvals.get(&id).cloned())
    }

    async fn list(&self, status: Option<ApprovalStatus>) -> AppResult<Vec<ApprovalRequest>> {
        let data = self.data.read().await;
        let mut requests: Vec<ApprovalRequest> = data
            .approvals
            .values()
            .filter(|r| status.map_or(true, |s| r.status == s))
            .cloned()
            .collect();
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(requests)
    }

    async fn decide(&self, id: Uuid, decision: &ApprovalDecision) -> AppResult<DecisionOutcome> {
        let mut data = self.data.write().await;
        let request = match data.approvals.get_mut(&id) {
            Some(request) => request,
            None => return Ok(DecisionOutcome::Missing),
        };
        if request.status != ApprovalStatus::Pending {
            return Ok(DecisionOutcome::NotPending(request.status));
        }
        request.status = decision.status;
        request.decided_at = Some(decision.decided_at);
        request.decided_by = Some(decision.decided_by);
        request.user_id = decision.user_id;
        Ok(DecisionOutcome::Decided(request.clone()))
    }
}

#[async_trait]
impl AuditRepository for MemoryStore {
    async fn append(&self, entry: &AuditLogEntry) -> AppResult<()> {
        self.data.write().await.audit.push(entry.clone());
        Ok(())
    }

    async fn recent(&self, limit: usize) -> AppResult<Vec<AuditLogEntry>> {
        let data = self.data.read().await;
        let mut entries = data.audit.clone();
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        entries.truncate(limit);
        Ok(entries)
    }

    async fn list(
        &self,
        filter: &AuditFilter,
        offset: usize,
        limit: usize,
    ) -> AppResult<(Vec<AuditLogEntry>, u64)> {
        let data = self.data.read().await;
        let mut entries: Vec<AuditLogEntry> = data
            .audit
            .iter()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        let total = entries.len() as u64;
        Ok((entries.into_iter().skip(offset).take(limit).collect(), total))
    }
}

#[async_trait]
impl SettingsRepository for MemoryStore {
    async fn get(&self, key: &str) -> AppResult<Option<serde_json::Value>> {
        Ok(self.data.read().await.settings.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &serde_json::Value) -> AppResult<()> {
        self.data
            .write()
            .await
            .settings
            .insert(key.to_string(), value.clone());
        Ok(())
    }
}

#[async_trait]
impl BackupRepository for MemoryStore {
    async fn insert(&self, backup: &BackupRecord) -> AppResult<()> {
        self.data.write().await.backups.push(backup.clone());
        Ok(())
    }

    async fn recent(&self, limit: usize) -> AppResult<Vec<BackupRecord>> {
        let data = self.data.read().await;
        let mut backups = data.backups.clone();
        backups.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        backups.truncate(limit);
        Ok(backups)
    }
}

#[async_trait]
impl AccountRepository for MemoryStore {
    async fn insert(&self, account: &IdentityAccount) -> AppResult<()> {
        let mut data = self.data.write().await;
        if data
            .accounts
            .values()
            .any(|a| same_email(&a.email, &account.email))
        {
            return Err(AppError::Conflict(format!(
                "Account with email '{}' already exists",
                account.email
            )));
        }
        data.accounts.insert(account.id, account.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<IdentityAccount>> {
        Ok(self.data.read().await.accounts.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<IdentityAccount>> {
        let data = self.data.read().await;
        Ok(data
            .accounts
            .values()
            .find(|a| same_email(&a.email, email))
            .cloned())
    }

    async fn set_disabled(&self, id: Uuid, disabled: bool) -> AppResult<bool> {
        let mut data = self.data.write().await;
        Ok(data
            .accounts
            .get_mut(&id)
            .map(|account| account.disabled = disabled)
            .is_some())
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.data.write().await.accounts.remove(&id).is_some())
    }
}

#[async_trait]
impl StoreHealth for MemoryStore {
    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}
