//! Repositorios
//!
//! Frontera con el almacén de documentos. Cada colección es un trait
//! asíncrono con dos implementaciones: PostgreSQL (`sqlx`) y memoria
//! (`MemoryStore`). Las invariantes entre documentos se expresan como
//! operaciones atómicas únicas, nunca como lectura + escritura separadas.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{
    approval::{ApprovalDecision, ApprovalRequest, ApprovalStatus, DecisionOutcome},
    assignment::{
        Assignment, AssignmentFilter, AssignmentStatus, ClaimOutcome, CloseOutcome,
        PointClaimOutcome,
    },
    audit::{AuditFilter, AuditLogEntry},
    auth::IdentityAccount,
    feeder_point::{FeederPoint, FeederPointChanges},
    settings::BackupRecord,
    user::{ProfileChanges, User, UserFilter, UserRole},
    vehicle::{DeleteOutcome, StatusChange, Vehicle, VehicleChanges, VehicleFilter, VehicleStatus},
};
use crate::utils::errors::AppResult;

pub mod account_repository;
pub mod approval_repository;
pub mod assignment_repository;
pub mod audit_repository;
pub mod feeder_point_repository;
pub mod memory;
pub mod settings_repository;
pub mod user_repository;
pub mod vehicle_repository;

pub use memory::MemoryStore;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Falla con conflicto si el email ya existe
    async fn insert(&self, user: &User) -> AppResult<User>;
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;
    /// Ordenados por `created_at` descendente
    async fn list(&self, filter: &UserFilter) -> AppResult<Vec<User>>;
    async fn update_profile(
        &self,
        id: Uuid,
        changes: &ProfileChanges,
        actor: Uuid,
    ) -> AppResult<Option<User>>;
    /// Escribe rol y permisos derivados del rol en una sola operación
    async fn update_role(&self, id: Uuid, role: UserRole, actor: Uuid) -> AppResult<Option<User>>;
    async fn set_active(&self, id: Uuid, is_active: bool, actor: Uuid) -> AppResult<Option<User>>;
    async fn delete(&self, id: Uuid) -> AppResult<bool>;
}

#[async_trait]
pub trait VehicleRepository: Send + Sync {
    /// Falla con conflicto si la matrícula ya existe
    async fn insert(&self, vehicle: &Vehicle) -> AppResult<Vehicle>;
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Vehicle>>;
    async fn find_by_registration(&self, registration: &str) -> AppResult<Option<Vehicle>>;
    /// Ordenados por `created_at` descendente
    async fn list(&self, filter: &VehicleFilter) -> AppResult<Vec<Vehicle>>;
    async fn update(
        &self,
        id: Uuid,
        changes: &VehicleChanges,
        actor: Uuid,
    ) -> AppResult<Option<Vehicle>>;
    /// Cambio manual de estado; nunca toca un vehículo `assigned`
    async fn set_status(
        &self,
        id: Uuid,
        status: VehicleStatus,
        actor: Uuid,
    ) -> AppResult<StatusChange>;
    /// Borra sólo si ninguna asignación activa lo referencia
    async fn delete_unassigned(&self, id: Uuid) -> AppResult<DeleteOutcome>;
}

#[async_trait]
pub trait FeederPointRepository: Send + Sync {
    async fn insert(&self, point: &FeederPoint) -> AppResult<FeederPoint>;
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<FeederPoint>>;
    /// Ordenados por nombre
    async fn list(&self) -> AppResult<Vec<FeederPoint>>;
    async fn update(
        &self,
        id: Uuid,
        changes: &FeederPointChanges,
        actor: Uuid,
    ) -> AppResult<Option<FeederPoint>>;
    /// Borra sólo si ninguna asignación activa lo referencia
    async fn delete_unassigned(&self, id: Uuid) -> AppResult<DeleteOutcome>;
}

#[async_trait]
pub trait AssignmentRepository: Send + Sync {
    /// Atómico: exige vehículo `available`, lo marca `assigned` e inserta
    async fn create_vehicle_assignment(&self, assignment: &Assignment) -> AppResult<ClaimOutcome>;
    /// Atómico: inserta sólo si el punto de recogida sigue existiendo
    async fn insert_feeder_point_assignment(
        &self,
        assignment: &Assignment,
    ) -> AppResult<PointClaimOutcome>;
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Assignment>>;
    /// Ordenadas por `assigned_at` descendente
    async fn list(&self, filter: &AssignmentFilter) -> AppResult<Vec<Assignment>>;
    /// Atómico: cierra una asignación activa y libera su vehículo
    async fn close(
        &self,
        id: Uuid,
        status: AssignmentStatus,
        at: DateTime<Utc>,
        actor: Uuid,
    ) -> AppResult<CloseOutcome>;
}

#[async_trait]
pub trait ApprovalRepository: Send + Sync {
    async fn insert(&self, request: &ApprovalRequest) -> AppResult<ApprovalRequest>;
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<ApprovalRequest>>;
    /// Ordenadas por `created_at` descendente
    async fn list(&self, status: Option<ApprovalStatus>) -> AppResult<Vec<ApprovalRequest>>;
    /// Transición condicional desde `pending`
    async fn decide(&self, id: Uuid, decision: &ApprovalDecision) -> AppResult<DecisionOutcome>;
}

#[async_trait]
pub trait AuditRepository: Send + Sync {
    async fn append(&self, entry: &AuditLogEntry) -> AppResult<()>;
    async fn recent(&self, limit: usize) -> AppResult<Vec<AuditLogEntry>>;
    /// Devuelve la página pedida y el total filtrado
    async fn list(
        &self,
        filter: &AuditFilter,
        offset: usize,
        limit: usize,
    ) -> AppResult<(Vec<AuditLogEntry>, u64)>;
}

#[async_trait]
pub trait SettingsRepository: Send + Sync {
    async fn get(&self, key: &str) -> AppResult<Option<serde_json::Value>>;
    async fn put(&self, key: &str, value: &serde_json::Value) -> AppResult<()>;
}

#[async_trait]
pub trait BackupRepository: Send + Sync {
    async fn insert(&self, backup: &BackupRecord) -> AppResult<()>;
    /// Las más recientes primero
    async fn recent(&self, limit: usize) -> AppResult<Vec<BackupRecord>>;
}

#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Falla con conflicto si el email ya existe
    async fn insert(&self, account: &IdentityAccount) -> AppResult<()>;
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<IdentityAccount>>;
    async fn find_by_email(&self, email: &str) -> AppResult<Option<IdentityAccount>>;
    async fn set_disabled(&self, id: Uuid, disabled: bool) -> AppResult<bool>;
    async fn delete(&self, id: Uuid) -> AppResult<bool>;
}

#[async_trait]
pub trait StoreHealth: Send + Sync {
    async fn ping(&self) -> AppResult<()>;
}

/// Conjunto de repositorios compartido por servicios y rutas
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub vehicles: Arc<dyn VehicleRepository>,
    pub feeder_points: Arc<dyn FeederPointRepository>,
    pub assignments: Arc<dyn AssignmentRepository>,
    pub approvals: Arc<dyn ApprovalRepository>,
    pub audit: Arc<dyn AuditRepository>,
    pub settings: Arc<dyn SettingsRepository>,
    pub backups: Arc<dyn BackupRepository>,
    pub accounts: Arc<dyn AccountRepository>,
    pub health: Arc<dyn StoreHealth>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(user_repository::PgUserRepository::new(pool.clone())),
            vehicles: Arc::new(vehicle_repository::PgVehicleRepository::new(pool.clone())),
            feeder_points: Arc::new(feeder_point_repository::PgFeederPointRepository::new(
                pool.clone(),
            )),
            assignments: Arc::new(assignment_repository::PgAssignmentRepository::new(
                pool.clone(),
            )),
            approvals: Arc::new(approval_repository::PgApprovalRepository::new(pool.clone())),
            audit: Arc::new(audit_repository::PgAuditRepository::new(pool.clone())),
            settings: Arc::new(settings_repository::PgSettingsRepository::new(pool.clone())),
            backups: Arc::new(settings_repository::PgBackupRepository::new(pool.clone())),
            accounts: Arc::new(account_repository::PgAccountRepository::new(pool.clone())),
            health: Arc::new(PgHealth { pool }),
        }
    }

    pub fn in_memory() -> Self {
        Self::from_memory(MemoryStore::new())
    }

    pub fn from_memory(store: MemoryStore) -> Self {
        let store = Arc::new(store);
        Self {
            users: store.clone(),
            vehicles: store.clone(),
            feeder_points: store.clone(),
            assignments: store.clone(),
            approvals: store.clone(),
            audit: store.clone(),
            settings: store.clone(),
            backups: store.clone(),
            accounts: store.clone(),
            health: store,
        }
    }
}

struct PgHealth {
    pool: PgPool,
}

#[async_trait]
impl StoreHealth for PgHealth {
    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
