//! Servicio de vehículos
//!
//! Registro de la flota. El estado `assigned` no se fija nunca a mano:
//! pertenece al flujo de asignaciones.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::dto::vehicle_dto::{CreateVehicleRequest, UpdateVehicleRequest, VehicleListQuery};
use crate::models::analytics::{VehicleCounts, VehicleStats};
use crate::models::assignment::{Assignment, AssignmentFilter, AssignmentKind};
use crate::models::auth::Principal;
use crate::models::permission::Permission;
use crate::models::vehicle::{
    DeleteOutcome, StatusChange, Vehicle, VehicleChanges, VehicleFilter, VehicleStatus,
};
use crate::repositories::{AssignmentRepository, Repositories, VehicleRepository};
use crate::utils::errors::{conflict_error, not_found_error, AppError, AppResult};
use crate::utils::pagination::{paginate, Page, PageRequest, DEFAULT_PAGE_SIZE};
use crate::utils::validation::{matches_search, normalize_registration};

pub struct VehicleService {
    vehicles: Arc<dyn VehicleRepository>,
    assignments: Arc<dyn AssignmentRepository>,
}

impl VehicleService {
    pub fn new(repos: &Repositories) -> Self {
        Self {
            vehicles: repos.vehicles.clone(),
            assignments: repos.assignments.clone(),
        }
    }

    pub async fn list(
        &self,
        _principal: &Principal,
        query: &VehicleListQuery,
    ) -> AppResult<Page<Vehicle>> {
        let filter = VehicleFilter {
            status: query
                .status
                .as_deref()
                .filter(|s| !s.is_empty() && *s != "all")
                .map(str::parse::<VehicleStatus>)
                .transpose()?,
            vehicle_type: query
                .vehicle_type
                .clone()
                .filter(|t| !t.is_empty() && t != "all"),
        };

        let mut vehicles = self.vehicles.list(&filter).await?;
        if let Some(search) = query.search.as_deref() {
            vehicles.retain(|v| {
                matches_search(
                    search,
                    [
                        Some(v.registration_number.as_str()),
                        v.model.as_deref(),
                        v.make.as_deref(),
                    ],
                )
            });
        }

        Ok(paginate(
            vehicles,
            PageRequest::new(query.page, query.limit, DEFAULT_PAGE_SIZE),
        ))
    }

    pub async fn get(&self, _principal: &Principal, id: Uuid) -> AppResult<Vehicle> {
        self.find(id).await
    }

    async fn find(&self, id: Uuid) -> AppResult<Vehicle> {
        self.vehicles
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Vehicle", id))
    }

    pub async fn create(
        &self,
        principal: &Principal,
        request: CreateVehicleRequest,
    ) -> AppResult<Vehicle> {
        principal.require(Permission::ManageVehicles)?;
        request.validate()?;

        let status = match request.status.as_deref() {
            None | Some("") => VehicleStatus::Available,
            Some(raw) => raw.parse()?,
        };
        if status == VehicleStatus::Assigned {
            return Err(AppError::Conflict(
                "A vehicle can only become assigned through an assignment".to_string(),
            ));
        }

        let registration = normalize_registration(&request.registration_number);
        // Comprobación previa; el índice único del almacén cubre las carreras
        if self.vehicles.find_by_registration(&registration).await?.is_some() {
            return Err(conflict_error("Vehicle", "registration number", &registration));
        }

        let now = Utc::now();
        let vehicle = Vehicle {
            id: Uuid::new_v4(),
            registration_number: registration,
            make: request.make,
            model: request.model,
            year: request.year,
            vehicle_type: request.vehicle_type.trim().to_string(),
            capacity: request.capacity,
            fuel_type: request.fuel_type,
            status,
            created_at: now,
            created_by: Some(principal.user_id),
            updated_at: now,
            updated_by: Some(principal.user_id),
        };

        let vehicle = self.vehicles.insert(&vehicle).await?;
        info!("🚛 Vehículo {} registrado", vehicle.registration_number);
        Ok(vehicle)
    }

    pub async fn update(
        &self,
        principal: &Principal,
        id: Uuid,
        request: UpdateVehicleRequest,
    ) -> AppResult<Vehicle> {
        principal.require(Permission::ManageVehicles)?;
        request.validate()?;

        let registration = request
            .registration_number
            .as_deref()
            .map(normalize_registration);
        if let Some(registration) = &registration {
            if let Some(existing) = self.vehicles.find_by_registration(registration).await? {
                if existing.id != id {
                    return Err(conflict_error("Vehicle", "registration number", registration));
                }
            }
        }

        let changes = VehicleChanges {
            registration_number: registration,
            make: request.make,
            model: request.model,
            year: request.year,
            vehicle_type: request.vehicle_type.map(|t| t.trim().to_string()),
            capacity: request.capacity,
            fuel_type: request.fuel_type,
        };

        self.vehicles
            .update(id, &changes, principal.user_id)
            .await?
            .ok_or_else(|| not_found_error("Vehicle", id))
    }

    /// Cambio manual de estado (mantenimiento, fuera de servicio, disponible)
    pub async fn update_status(
        &self,
        principal: &Principal,
        id: Uuid,
        status: &str,
    ) -> AppResult<Vehicle> {
        principal.require(Permission::ManageVehicles)?;
        let status: VehicleStatus = status.parse()?;
        if status == VehicleStatus::Assigned {
            return Err(AppError::Conflict(
                "A vehicle can only become assigned through an assignment".to_string(),
            ));
        }

        match self.vehicles.set_status(id, status, principal.user_id).await? {
            StatusChange::Updated(vehicle) => {
                info!(vehicle_id = %id, status = %status, "🚛 Estado de vehículo actualizado");
                Ok(vehicle)
            }
            StatusChange::Missing => Err(not_found_error("Vehicle", id)),
            StatusChange::Assigned => Err(AppError::Conflict(
                "Vehicle has an active assignment; complete or cancel it first".to_string(),
            )),
        }
    }

    pub async fn delete(&self, principal: &Principal, id: Uuid) -> AppResult<()> {
        principal.require(Permission::ManageVehicles)?;

        match self.vehicles.delete_unassigned(id).await? {
            DeleteOutcome::Deleted => {
                info!(vehicle_id = %id, "🗑️ Vehículo eliminado");
                Ok(())
            }
            DeleteOutcome::Missing => Err(not_found_error("Vehicle", id)),
            DeleteOutcome::HasActiveAssignments => Err(AppError::Conflict(
                "Cannot delete vehicle with active assignments".to_string(),
            )),
        }
    }

    /// Todas las asignaciones que han apuntado al vehículo, más recientes primero
    pub async fn assignment_history(
        &self,
        principal: &Principal,
        id: Uuid,
    ) -> AppResult<Vec<Assignment>> {
        principal.require(Permission::ManageVehicles)?;
        self.find(id).await?;

        self.assignments
            .list(&AssignmentFilter {
                kind: Some(AssignmentKind::Vehicle),
                resource_id: Some(id),
                ..Default::default()
            })
            .await
    }

    pub async fn available(&self, principal: &Principal) -> AppResult<Vec<Vehicle>> {
        principal.require(Permission::ManageVehicles)?;
        self.vehicles
            .list(&VehicleFilter {
                status: Some(VehicleStatus::Available),
                vehicle_type: None,
            })
            .await
    }

    pub async fn stats(&self, principal: &Principal) -> AppResult<VehicleStats> {
        principal.require(Permission::ManageVehicles)?;
        let vehicles = self.vehicles.list(&VehicleFilter::default()).await?;

        let mut by_type = BTreeMap::new();
        for v in &vehicles {
            *by_type.entry(v.vehicle_type.clone()).or_insert(0u64) += 1;
        }

        Ok(VehicleStats {
            total: vehicles.len() as u64,
            by_status: count_by_status(&vehicles),
            by_type,
        })
    }
}

/// Conteo de vehículos por estado
pub fn count_by_status(vehicles: &[Vehicle]) -> VehicleCounts {
    let mut counts = VehicleCounts::default();
    for v in vehicles {
        counts.total += 1;
        match v.status {
            VehicleStatus::Available => counts.available += 1,
            VehicleStatus::Assigned => counts.assigned += 1,
            VehicleStatus::Maintenance => counts.maintenance += 1,
            VehicleStatus::OutOfService => counts.out_of_service += 1,
        }
    }
    counts
}
