//! Rutas de asignaciones

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, put},
    Extension, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::dto::assignment_dto::{
    AssignmentListQuery, ChangeAssignmentStatusRequest, CreateFeederPointAssignmentRequest,
    CreateVehicleAssignmentRequest, FeederPointAssignmentView, VehicleAssignmentView,
};
use crate::dto::ApiResponse;
use crate::models::analytics::AssignmentStatistics;
use crate::models::assignment::Assignment;
use crate::models::auth::Principal;
use crate::state::AppState;
use crate::utils::errors::AppResult;
use crate::utils::extract::{Json, Path, Query};

pub fn create_assignment_router() -> Router<AppState> {
    Router::new()
        .route(
            "/vehicles",
            get(list_vehicle_assignments).post(create_vehicle_assignment),
        )
        .route(
            "/feeder-points",
            get(list_feeder_point_assignments).post(create_feeder_point_assignment),
        )
        .route("/statistics", get(assignment_statistics))
        .route("/:id", get(get_assignment))
        .route("/:id/status", put(change_status))
        .route("/vehicles/:id/status", put(change_status))
}

async fn list_vehicle_assignments(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<AssignmentListQuery>,
) -> AppResult<Json<ApiResponse<Vec<VehicleAssignmentView>>>> {
    let views = state
        .services
        .assignments
        .list_vehicle_assignments(&principal, &query)
        .await?;
    Ok(Json(ApiResponse::success(views)))
}

async fn create_vehicle_assignment(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(request): Json<CreateVehicleAssignmentRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Assignment>>)> {
    let assignment = state
        .services
        .assignments
        .create_vehicle_assignment(&principal, request)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(
            assignment,
            "Vehicle assigned successfully",
        )),
    ))
}

async fn list_feeder_point_assignments(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<AssignmentListQuery>,
) -> AppResult<Json<ApiResponse<Vec<FeederPointAssignmentView>>>> {
    let views = state
        .services
        .assignments
        .list_feeder_point_assignments(&principal, &query)
        .await?;
    Ok(Json(ApiResponse::success(views)))
}

async fn create_feeder_point_assignment(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(request): Json<CreateFeederPointAssignmentRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Assignment>>)> {
    let assignment = state
        .services
        .assignments
        .create_feeder_point_assignment(&principal, request)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(
            assignment,
            "Feeder point assigned successfully",
        )),
    ))
}

async fn assignment_statistics(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> AppResult<Json<ApiResponse<AssignmentStatistics>>> {
    let stats = state.services.assignments.statistics(&principal).await?;
    Ok(Json(ApiResponse::success(stats)))
}

async fn get_assignment(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Assignment>>> {
    let assignment = state.services.assignments.get(&principal, id).await?;
    Ok(Json(ApiResponse::success(assignment)))
}

async fn change_status(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    Json(request): Json<ChangeAssignmentStatusRequest>,
) -> AppResult<Json<ApiResponse<Assignment>>> {
    request.validate()?;
    let assignment = state
        .services
        .assignments
        .change_status(&principal, id, &request.status)
        .await?;
    Ok(Json(ApiResponse::success_with_message(
        assignment,
        "Assignment status updated successfully",
    )))
}
