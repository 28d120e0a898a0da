//! Servicio de puntos de recogida

use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::dto::feeder_point_dto::{
    CreateFeederPointRequest, FeederPointListQuery, UpdateFeederPointRequest,
};
use crate::models::auth::Principal;
use crate::models::feeder_point::{FeederPoint, FeederPointChanges};
use crate::models::permission::Permission;
use crate::models::vehicle::DeleteOutcome;
use crate::repositories::{FeederPointRepository, Repositories};
use crate::utils::errors::{not_found_error, AppError, AppResult};
use crate::utils::pagination::{paginate, Page, PageRequest, DEFAULT_PAGE_SIZE};
use crate::utils::validation::matches_search;

pub struct FeederPointService {
    points: Arc<dyn FeederPointRepository>,
}

impl FeederPointService {
    pub fn new(repos: &Repositories) -> Self {
        Self {
            points: repos.feeder_points.clone(),
        }
    }

    pub async fn list(
        &self,
        _principal: &Principal,
        query: &FeederPointListQuery,
    ) -> AppResult<Page<FeederPoint>> {
        let mut points = self.points.list().await?;
        if let Some(search) = query.search.as_deref() {
            points.retain(|p| {
                matches_search(
                    search,
                    [Some(p.name.as_str()), Some(p.location.as_str()), p.area.as_deref()],
                )
            });
        }
        Ok(paginate(
            points,
            PageRequest::new(query.page, query.limit, DEFAULT_PAGE_SIZE),
        ))
    }

    pub async fn get(&self, _principal: &Principal, id: Uuid) -> AppResult<FeederPoint> {
        self.points
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Feeder point", id))
    }

    pub async fn create(
        &self,
        principal: &Principal,
        request: CreateFeederPointRequest,
    ) -> AppResult<FeederPoint> {
        principal.require(Permission::ManageFeederPoints)?;
        request.validate()?;

        let now = Utc::now();
        let point = FeederPoint {
            id: Uuid::new_v4(),
            name: request.name.trim().to_string(),
            location: request.location.trim().to_string(),
            area: request.area.map(|a| a.trim().to_string()).filter(|a| !a.is_empty()),
            created_at: now,
            created_by: Some(principal.user_id),
            updated_at: now,
            updated_by: Some(principal.user_id),
        };

        let point = self.points.insert(&point).await?;
        info!("📍 Punto de recogida '{}' creado", point.name);
        Ok(point)
    }

    pub async fn update(
        &self,
        principal: &Principal,
        id: Uuid,
        request: UpdateFeederPointRequest,
    ) -> AppResult<FeederPoint> {
        principal.require(Permission::ManageFeederPoints)?;
        request.validate()?;

        let changes = FeederPointChanges {
            name: request.name.map(|n| n.trim().to_string()),
            location: request.location.map(|l| l.trim().to_string()),
            area: request.area.map(|a| a.trim().to_string()),
        };

        self.points
            .update(id, &changes, principal.user_id)
            .await?
            .ok_or_else(|| not_found_error("Feeder point", id))
    }

    pub async fn delete(&self, principal: &Principal, id: Uuid) -> AppResult<()> {
        principal.require(Permission::ManageFeederPoints)?;

        match self.points.delete_unassigned(id).await? {
            DeleteOutcome::Deleted => {
                info!(feeder_point_id = %id, "🗑️ Punto de recogida eliminado");
                Ok(())
            }
            DeleteOutcome::Missing => Err(not_found_error("Feeder point", id)),
            DeleteOutcome::HasActiveAssignments => Err(AppError::Conflict(
                "Cannot delete feeder point with active assignments".to_string(),
            )),
        }
    }
}
