//! Rutas de puntos de recogida

use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Extension, Router,
};
use uuid::Uuid;

use crate::dto::feeder_point_dto::{
    CreateFeederPointRequest, FeederPointListQuery, UpdateFeederPointRequest,
};
use crate::dto::ApiResponse;
use crate::models::auth::Principal;
use crate::models::feeder_point::FeederPoint;
use crate::state::AppState;
use crate::utils::errors::AppResult;
use crate::utils::extract::{Json, Path, Query};
use crate::utils::pagination::Page;

pub fn create_feeder_point_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_feeder_points).post(create_feeder_point))
        .route(
            "/:id",
            get(get_feeder_point)
                .put(update_feeder_point)
                .delete(delete_feeder_point),
        )
}

async fn list_feeder_points(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<FeederPointListQuery>,
) -> AppResult<Json<ApiResponse<Page<FeederPoint>>>> {
    let page = state.services.feeder_points.list(&principal, &query).await?;
    Ok(Json(ApiResponse::success(page)))
}

async fn create_feeder_point(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(request): Json<CreateFeederPointRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<FeederPoint>>)> {
    let point = state
        .services
        .feeder_points
        .create(&principal, request)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(
            point,
            "Feeder point created successfully",
        )),
    ))
}

async fn get_feeder_point(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<FeederPoint>>> {
    let point = state.services.feeder_points.get(&principal, id).await?;
    Ok(Json(ApiResponse::success(point)))
}

async fn update_feeder_point(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateFeederPointRequest>,
) -> AppResult<Json<ApiResponse<FeederPoint>>> {
    let point = state
        .services
        .feeder_points
        .update(&principal, id, request)
        .await?;
    Ok(Json(ApiResponse::success_with_message(
        point,
        "Feeder point updated successfully",
    )))
}

async fn delete_feeder_point(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<()>>> {
    state.services.feeder_points.delete(&principal, id).await?;
    Ok(Json(ApiResponse::message("Feeder point deleted successfully")))
}
