//! Rutas de configuración, auditoría y estado del sistema

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Extension, Router,
};
use serde_json::Value;

use crate::dto::settings_dto::{AuditLogQuery, CreateBackupRequest, SystemStatus};
use crate::dto::ApiResponse;
use crate::models::audit::AuditLogEntry;
use crate::models::auth::Principal;
use crate::models::settings::{BackupRecord, NotificationSettings, SystemSettings};
use crate::state::AppState;
use crate::utils::errors::AppResult;
use crate::utils::extract::{Json, Query};
use crate::utils::pagination::Page;

pub fn create_settings_router() -> Router<AppState> {
    Router::new()
        .route(
            "/system",
            get(get_system_settings).put(update_system_settings),
        )
        .route(
            "/notifications",
            get(get_notification_settings).put(update_notification_settings),
        )
        .route("/audit-logs", get(audit_logs))
        .route("/backup", post(create_backup))
        .route("/backups", get(list_backups))
        .route("/system-status", get(system_status))
}

async fn get_system_settings(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> AppResult<Json<ApiResponse<SystemSettings>>> {
    let settings = state.services.settings.system_settings(&principal).await?;
    Ok(Json(ApiResponse::success(settings)))
}

async fn update_system_settings(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(patch): Json<Value>,
) -> AppResult<Json<ApiResponse<SystemSettings>>> {
    let settings = state
        .services
        .settings
        .update_system_settings(&principal, patch)
        .await?;
    Ok(Json(ApiResponse::success_with_message(
        settings,
        "System settings updated successfully",
    )))
}

async fn get_notification_settings(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> AppResult<Json<ApiResponse<NotificationSettings>>> {
    let settings = state
        .services
        .settings
        .notification_settings(&principal)
        .await?;
    Ok(Json(ApiResponse::success(settings)))
}

async fn update_notification_settings(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(settings): Json<NotificationSettings>,
) -> AppResult<Json<ApiResponse<NotificationSettings>>> {
    let settings = state
        .services
        .settings
        .update_notification_settings(&principal, settings)
        .await?;
    Ok(Json(ApiResponse::success_with_message(
        settings,
        "Notification settings updated successfully",
    )))
}

async fn audit_logs(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<AuditLogQuery>,
) -> AppResult<Json<ApiResponse<Page<AuditLogEntry>>>> {
    let page = state.services.settings.audit_logs(&principal, &query).await?;
    Ok(Json(ApiResponse::success(page)))
}

async fn system_status(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> AppResult<Json<ApiResponse<SystemStatus>>> {
    let status = state.services.settings.system_status(&principal).await?;
    Ok(Json(ApiResponse::success(status)))
}

async fn create_backup(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(request): Json<CreateBackupRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<BackupRecord>>)> {
    let backup = state
        .services
        .settings
        .create_backup(&principal, request)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(
            backup,
            "Backup created successfully",
        )),
    ))
}

async fn list_backups(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> AppResult<Json<ApiResponse<Vec<BackupRecord>>>> {
    let backups = state.services.settings.list_backups(&principal).await?;
    Ok(Json(ApiResponse::success(backups)))
}
