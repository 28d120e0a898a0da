//! Rutas de vehículos

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, put},
    Extension, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::dto::vehicle_dto::{
    CreateVehicleRequest, UpdateVehicleRequest, UpdateVehicleStatusRequest, VehicleListQuery,
};
use crate::dto::ApiResponse;
use crate::models::analytics::VehicleStats;
use crate::models::assignment::Assignment;
use crate::models::auth::Principal;
use crate::models::vehicle::Vehicle;
use crate::state::AppState;
use crate::utils::errors::AppResult;
use crate::utils::extract::{Json, Path, Query};
use crate::utils::pagination::Page;

pub fn create_vehicle_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_vehicles).post(create_vehicle))
        .route("/available", get(available_vehicles))
        .route("/stats", get(vehicle_stats))
        .route(
            "/:id",
            get(get_vehicle).put(update_vehicle).delete(delete_vehicle),
        )
        .route("/:id/status", put(update_vehicle_status))
        .route("/:id/assignments", get(assignment_history))
}

async fn list_vehicles(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<VehicleListQuery>,
) -> AppResult<Json<ApiResponse<Page<Vehicle>>>> {
    let page = state.services.vehicles.list(&principal, &query).await?;
    Ok(Json(ApiResponse::success(page)))
}

async fn create_vehicle(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(request): Json<CreateVehicleRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Vehicle>>)> {
    let vehicle = state.services.vehicles.create(&principal, request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(vehicle, "Vehicle created successfully")),
    ))
}

async fn get_vehicle(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Vehicle>>> {
    let vehicle = state.services.vehicles.get(&principal, id).await?;
    Ok(Json(ApiResponse::success(vehicle)))
}

async fn update_vehicle(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateVehicleRequest>,
) -> AppResult<Json<ApiResponse<Vehicle>>> {
    let vehicle = state.services.vehicles.update(&principal, id, request).await?;
    Ok(Json(ApiResponse::success_with_message(
        vehicle,
        "Vehicle updated successfully",
    )))
}

async fn update_vehicle_status(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateVehicleStatusRequest>,
) -> AppResult<Json<ApiResponse<Vehicle>>> {
    request.validate()?;
    let vehicle = state
        .services
        .vehicles
        .update_status(&principal, id, &request.status)
        .await?;
    Ok(Json(ApiResponse::success_with_message(
        vehicle,
        "Vehicle status updated successfully",
    )))
}

async fn delete_vehicle(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<()>>> {
    state.services.vehicles.delete(&principal, id).await?;
    Ok(Json(ApiResponse::message("Vehicle deleted successfully")))
}

async fn assignment_history(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Vec<Assignment>>>> {
    let history = state
        .services
        .vehicles
        .assignment_history(&principal, id)
        .await?;
    Ok(Json(ApiResponse::success(history)))
}

async fn available_vehicles(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> AppResult<Json<ApiResponse<Vec<Vehicle>>>> {
    let vehicles = state.services.vehicles.available(&principal).await?;
    Ok(Json(ApiResponse::success(vehicles)))
}

async fn vehicle_stats(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> AppResult<Json<ApiResponse<VehicleStats>>> {
    let stats = state.services.vehicles.stats(&principal).await?;
    Ok(Json(ApiResponse::success(stats)))
}
