//! Middleware de auditoría
//!
//! Registra cada request autenticada que termina con estado < 400. Los
//! cuerpos de métodos distintos de GET se guardan sin campos `password`.
//! Un fallo al escribir la auditoría nunca cambia la respuesta.

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::{header, HeaderMap, Method},
    middleware::Next,
    response::Response,
};
use serde_json::Value;

use crate::models::auth::Principal;
use crate::services::settings_service::audit_entry;
use crate::state::AppState;
use crate::utils::errors::AppError;

/// Tamaño máximo de cuerpo que se copia a la auditoría
const MAX_AUDITED_BODY: usize = 1024 * 1024;

/// Igual al límite por defecto de los extractores de axum
const MAX_BUFFERED_BODY: usize = 2 * 1024 * 1024;

pub async fn audit_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let principal = request.extensions().get::<Principal>().cloned();
    let action = format!("{} {}", request.method(), request.uri().path());
    let ip = client_ip(request.headers());
    let user_agent = request
        .headers()
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let (request, body) = if request.method() == Method::GET {
        (request, None)
    } else {
        let (parts, body) = request.into_parts();
        let bytes = to_bytes(body, MAX_BUFFERED_BODY)
            .await
            .map_err(|e| AppError::BadRequest(format!("Unreadable request body: {}", e)))?;
        let captured = capture_body(&bytes);
        (Request::from_parts(parts, Body::from(bytes)), captured)
    };

    let response = next.run(request).await;

    let status = response.status();
    if status.as_u16() < 400 {
        let entry = audit_entry(
            principal.as_ref(),
            action,
            status.as_u16(),
            ip,
            user_agent,
            body,
        );
        state.services.settings.record_audit(entry).await;
    }

    Ok(response)
}

/// Cuerpos por encima de `MAX_AUDITED_BODY` se auditan sin copia
fn capture_body(bytes: &[u8]) -> Option<Value> {
    if bytes.len() > MAX_AUDITED_BODY {
        return None;
    }
    serde_json::from_slice::<Value>(bytes).ok().map(redact_passwords)
}

fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .or_else(|| headers.get("x-real-ip").and_then(|v| v.to_str().ok()))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Elimina cualquier campo `password` a cualquier profundidad
pub fn redact_passwords(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(key, _)| key != "password")
                .map(|(key, v)| (key, redact_passwords(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(redact_passwords).collect()),
        other => other,
    }
}
