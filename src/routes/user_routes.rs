//! Rutas de usuarios y solicitudes de aprobación

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
    Extension, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::dto::approval_dto::{ApprovalDecisionRequest, ApprovalResult};
use crate::dto::user_dto::{CreateUserRequest, UpdateRoleRequest, UpdateStatusRequest, UserListQuery};
use crate::dto::ApiResponse;
use crate::models::approval::ApprovalRequest;
use crate::models::auth::Principal;
use crate::models::user::User;
use crate::state::AppState;
use crate::utils::errors::{validation_error, AppResult};
use crate::utils::extract::{Json, Path, Query};
use crate::utils::pagination::Page;

pub fn create_user_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/pending-approvals", get(pending_approvals))
        .route("/approve-request/:id", post(decide_request))
        .route("/approvals/:id/approve", post(approve_request))
        .route("/approvals/:id/reject", post(reject_request))
        .route("/:id", get(get_user).delete(delete_user))
        .route("/:id/role", put(update_role))
        .route("/:id/status", put(update_status))
}

async fn list_users(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<UserListQuery>,
) -> AppResult<Json<ApiResponse<Page<User>>>> {
    let page = state.services.users.list(&principal, &query).await?;
    Ok(Json(ApiResponse::success(page)))
}

async fn create_user(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(request): Json<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<User>>)> {
    let user = state.services.users.create(&principal, request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(user, "User created successfully")),
    ))
}

async fn get_user(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<User>>> {
    let user = state.services.users.get(&principal, id).await?;
    Ok(Json(ApiResponse::success(user)))
}

async fn delete_user(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<()>>> {
    state.services.users.delete(&principal, id).await?;
    Ok(Json(ApiResponse::message("User deleted successfully")))
}

async fn update_role(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateRoleRequest>,
) -> AppResult<Json<ApiResponse<User>>> {
    request.validate()?;
    let user = state
        .services
        .users
        .update_role(&principal, id, &request.role)
        .await?;
    Ok(Json(ApiResponse::success_with_message(
        user,
        "User role updated successfully",
    )))
}

async fn update_status(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateStatusRequest>,
) -> AppResult<Json<ApiResponse<User>>> {
    request.validate()?;
    let is_active = request
        .is_active
        .ok_or_else(|| validation_error("is_active", "is_active is required"))?;
    let user = state
        .services
        .users
        .update_active_status(&principal, id, is_active)
        .await?;
    let message = if is_active {
        "User activated successfully"
    } else {
        "User deactivated successfully"
    };
    Ok(Json(ApiResponse::success_with_message(user, message)))
}

async fn pending_approvals(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> AppResult<Json<ApiResponse<Vec<ApprovalRequest>>>> {
    let requests = state.services.approvals.list_pending(&principal).await?;
    Ok(Json(ApiResponse::success(requests)))
}

async fn decide_request(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    Json(request): Json<ApprovalDecisionRequest>,
) -> AppResult<Json<ApiResponse<ApprovalResult>>> {
    request.validate()?;
    let approved = request
        .approved
        .ok_or_else(|| validation_error("approved", "approved is required"))?;
    let result = state
        .services
        .approvals
        .decide(&principal, id, approved)
        .await?;
    Ok(Json(decision_response(result, approved)))
}

async fn approve_request(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ApprovalResult>>> {
    let result = state.services.approvals.approve(&principal, id).await?;
    Ok(Json(decision_response(result, true)))
}

async fn reject_request(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ApprovalResult>>> {
    let result = state.services.approvals.reject(&principal, id).await?;
    Ok(Json(decision_response(result, false)))
}

fn decision_response(result: ApprovalResult, approved: bool) -> ApiResponse<ApprovalResult> {
    let message = if approved {
        "Request approved successfully"
    } else {
        "Request rejected successfully"
    };
    ApiResponse::success_with_message(result, message)
}
