//! Rutas de autenticación y perfil propio

use axum::{
    extract::State,
    routing::{get, post},
    Extension, Router,
};
use validator::Validate;

use crate::dto::auth_dto::{LoginRequest, LoginResponse, VerifyTokenRequest};
use crate::dto::user_dto::UpdateProfileRequest;
use crate::dto::ApiResponse;
use crate::models::auth::Principal;
use crate::models::user::User;
use crate::state::AppState;
use crate::utils::errors::AppResult;
use crate::utils::extract::Json;

/// Rutas públicas: login y verificación de token
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/verify", post(verify_token))
}

/// Rutas que requieren un usuario autenticado
pub fn profile_routes() -> Router<AppState> {
    Router::new().route("/profile", get(get_profile).put(update_profile))
}

async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<ApiResponse<LoginResponse>>> {
    let response = state.services.auth.login(request).await?;
    Ok(Json(ApiResponse::success_with_message(response, "Login successful")))
}

async fn verify_token(
    State(state): State<AppState>,
    Json(request): Json<VerifyTokenRequest>,
) -> AppResult<Json<ApiResponse<User>>> {
    request.validate()?;
    let user = state.services.auth.verify(&request.token).await?;
    Ok(Json(ApiResponse::success(user)))
}

async fn get_profile(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> AppResult<Json<ApiResponse<User>>> {
    let user = state.services.users.profile(&principal).await?;
    Ok(Json(ApiResponse::success(user)))
}

async fn update_profile(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(request): Json<UpdateProfileRequest>,
) -> AppResult<Json<ApiResponse<User>>> {
    let user = state
        .services
        .users
        .update_profile(&principal, request)
        .await?;
    Ok(Json(ApiResponse::success_with_message(
        user,
        "Profile updated successfully",
    )))
}
