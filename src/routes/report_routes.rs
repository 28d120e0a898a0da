//! Rutas de reportes y exportación

use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
    routing::get,
    Extension, Router,
};

use crate::dto::report_dto::{ExportQuery, ReportQuery};
use crate::dto::ApiResponse;
use crate::models::analytics::{
    AssignmentReport, DashboardSummary, TimeBucket, UserReport, VehicleReport,
};
use crate::models::auth::Principal;
use crate::services::export_service::{ExportFormat, ExportType};
use crate::services::report_service::AssignmentScope;
use crate::state::AppState;
use crate::utils::errors::AppResult;
use crate::utils::extract::{Json, Query};
use crate::utils::validation::DateRange;

pub fn create_report_router() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/users", get(user_report))
        .route("/vehicles", get(vehicle_report))
        .route("/assignments", get(assignment_report))
        .route("/export", get(export))
}

fn range_and_bucket(query: &ReportQuery) -> AppResult<(DateRange, TimeBucket)> {
    let range = DateRange::from_dates(query.start_date, query.end_date)?;
    let bucket = match query.group_by.as_deref() {
        None | Some("") => TimeBucket::default(),
        Some(raw) => raw.parse()?,
    };
    Ok((range, bucket))
}

async fn dashboard(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> AppResult<Json<ApiResponse<DashboardSummary>>> {
    let summary = state.services.reports.dashboard(&principal).await?;
    Ok(Json(ApiResponse::success(summary)))
}

async fn user_report(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<ReportQuery>,
) -> AppResult<Json<ApiResponse<UserReport>>> {
    let (range, bucket) = range_and_bucket(&query)?;
    let report = state
        .services
        .reports
        .user_report(&principal, range, bucket)
        .await?;
    Ok(Json(ApiResponse::success(report)))
}

async fn vehicle_report(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<ReportQuery>,
) -> AppResult<Json<ApiResponse<VehicleReport>>> {
    let (range, bucket) = range_and_bucket(&query)?;
    let report = state
        .services
        .reports
        .vehicle_report(&principal, range, bucket)
        .await?;
    Ok(Json(ApiResponse::success(report)))
}

async fn assignment_report(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<ReportQuery>,
) -> AppResult<Json<ApiResponse<AssignmentReport>>> {
    let (range, bucket) = range_and_bucket(&query)?;
    let scope = AssignmentScope::parse(query.assignment_type.as_deref())?;
    let report = state
        .services
        .reports
        .assignment_report(&principal, range, scope, bucket)
        .await?;
    Ok(Json(ApiResponse::success(report)))
}

async fn export(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<ExportQuery>,
) -> AppResult<impl IntoResponse> {
    let export_type: ExportType = query.export_type.parse()?;
    let format = ExportFormat::parse(query.format.as_deref())?;

    let file = state
        .services
        .exports
        .export(&principal, export_type, format)
        .await?;

    Ok((
        [
            (header::CONTENT_TYPE, file.content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file.filename),
            ),
        ],
        file.body,
    ))
}
