//! Sistema de manejo de errores
//!
//! Este módulo define todos los tipos de errores del sistema,
//! su clasificación estable (`ErrorKind`) y su conversión a respuestas HTTP.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// Errores principales de la aplicación
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("JWT error: {0}")]
    Jwt(String),

    #[error("Hash error: {0}")]
    Hash(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Clasificación estable de errores expuesta a los clientes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    InvalidStatus,
    Unauthorized,
    Forbidden,
    UpstreamUnavailable,
    Internal,
}

impl ErrorKind {
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "VALIDATION_ERROR",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::Conflict => "CONFLICT",
            ErrorKind::InvalidStatus => "INVALID_STATUS",
            ErrorKind::Unauthorized => "UNAUTHORIZED",
            ErrorKind::Forbidden => "FORBIDDEN",
            ErrorKind::UpstreamUnavailable => "UPSTREAM_UNAVAILABLE",
            ErrorKind::Internal => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ErrorKind::Validation | ErrorKind::InvalidStatus => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::UpstreamUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Database(e) => match e {
                sqlx::Error::PoolTimedOut
                | sqlx::Error::PoolClosed
                | sqlx::Error::Io(_)
                | sqlx::Error::Tls(_) => ErrorKind::UpstreamUnavailable,
                _ => ErrorKind::Internal,
            },
            AppError::Validation(_) | AppError::BadRequest(_) => ErrorKind::Validation,
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::Conflict(_) => ErrorKind::Conflict,
            AppError::InvalidStatus(_) => ErrorKind::InvalidStatus,
            AppError::Unauthorized(_) | AppError::Jwt(_) => ErrorKind::Unauthorized,
            AppError::Forbidden(_) => ErrorKind::Forbidden,
            AppError::ServiceUnavailable(_) => ErrorKind::UpstreamUnavailable,
            AppError::Hash(_) | AppError::Internal(_) => ErrorKind::Internal,
        }
    }
}

/// Respuesta de error para la API
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
    code: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let kind = self.kind();

        let (error, message, details) = match self {
            AppError::Database(e) => {
                tracing::error!("❌ Database error: {}", e);
                let message = if kind == ErrorKind::UpstreamUnavailable {
                    "The data store is unavailable"
                } else {
                    "An error occurred while accessing the database"
                };
                ("Database Error", message.to_string(), None)
            }
            AppError::Validation(e) => {
                tracing::debug!("Validation error: {}", e);
                (
                    "Validation Error",
                    "The provided data is invalid".to_string(),
                    Some(json!(e)),
                )
            }
            AppError::BadRequest(msg) => ("Validation Error", msg, None),
            AppError::NotFound(msg) => ("Not Found", msg, None),
            AppError::Conflict(msg) => {
                tracing::warn!("⚠️ Conflict: {}", msg);
                ("Conflict", msg, None)
            }
            AppError::InvalidStatus(msg) => ("Invalid Status", msg, None),
            AppError::Unauthorized(msg) => ("Unauthorized", msg, None),
            AppError::Jwt(msg) => ("Unauthorized", msg, None),
            AppError::Forbidden(msg) => {
                tracing::warn!("🚫 Forbidden: {}", msg);
                ("Forbidden", msg, None)
            }
            AppError::ServiceUnavailable(msg) => {
                tracing::error!("❌ Upstream unavailable: {}", msg);
                ("Service Unavailable", msg, None)
            }
            AppError::Hash(msg) => {
                tracing::error!("❌ Hash error: {}", msg);
                (
                    "Internal Server Error",
                    "An error occurred while processing credentials".to_string(),
                    None,
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("❌ Internal error: {}", msg);
                (
                    "Internal Server Error",
                    "An unexpected error occurred".to_string(),
                    None,
                )
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            message,
            details,
            code: kind.code().to_string(),
        };

        (kind.status(), Json(body)).into_response()
    }
}

// Rechazos de los extractores: cuerpo, ruta o query mal formados
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

/// Resultado tipado para operaciones que pueden fallar
pub type AppResult<T> = Result<T, AppError>;

/// Helper para errores de validación de un campo concreto
pub fn validation_error(field: &'static str, message: &'static str) -> AppError {
    use validator::ValidationError;

    let mut error = ValidationError::new("custom");
    error.message = Some(message.into());

    let mut errors = validator::ValidationErrors::new();
    errors.add(field, error);

    AppError::Validation(errors)
}

/// Helper para errores de recurso no encontrado
pub fn not_found_error(resource: &str, id: impl std::fmt::Display) -> AppError {
    AppError::NotFound(format!("{} with id '{}' not found", resource, id))
}

/// Helper para errores de conflicto por duplicado
pub fn conflict_error(resource: &str, field: &str, value: &str) -> AppError {
    AppError::Conflict(format!("{} with {} '{}' already exists", resource, field, value))
}

/// Helper para valores fuera de un conjunto cerrado
pub fn invalid_status_error(field: &str, value: &str, allowed: &[&str]) -> AppError {
    AppError::InvalidStatus(format!(
        "Invalid {} '{}'. Must be one of: {}",
        field,
        value,
        allowed.join(", ")
    ))
}

/// Traduce violaciones de índices únicos de PostgreSQL a conflictos
pub fn map_unique_violation(err: sqlx::Error, message: impl Into<String>) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => AppError::Conflict(message.into()),
        _ => AppError::Database(err),
    }
}
