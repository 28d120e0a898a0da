//! Middleware de autenticación
//!
//! Verifica el bearer token con el proveedor de identidad, carga el
//! documento `User` y exige que exista y esté activo. El `Principal`
//! resultante se inyecta en las extensions de la request.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::models::auth::Principal;
use crate::state::AppState;
use crate::utils::errors::AppError;

/// Extrae el token del header `Authorization: Bearer <token>`
pub fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(&request)
        .ok_or_else(|| AppError::Unauthorized("No token provided".to_string()))?;

    let principal = authenticate(&state, token).await?;
    debug!(user_id = %principal.user_id, "🔐 Request autenticada");

    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}

/// Token → id del proveedor → documento `User` activo
pub async fn authenticate(state: &AppState, token: &str) -> Result<Principal, AppError> {
    let user_id = state.identity.verify_token(token).await?;

    let user = state
        .repos
        .users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;

    if !user.is_active {
        return Err(AppError::Forbidden("Account is deactivated".to_string()));
    }

    Ok(Principal::from_user(&user))
}
