//! Rutas HTTP
//!
//! Todo lo que cuelga de `/api` pasa por autenticación y auditoría, salvo
//! login y verificación de token.

pub mod assignment_routes;
pub mod auth_routes;
pub mod feeder_point_routes;
pub mod report_routes;
pub mod settings_routes;
pub mod user_routes;
pub mod vehicle_routes;

use std::time::Duration;

use axum::{middleware::from_fn_with_state, response::Json, routing::get, Router};
use serde_json::{json, Value};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::middleware::{audit_middleware, auth_middleware, cors_layer};
use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let protected = Router::new()
        .nest("/api/auth", auth_routes::profile_routes())
        .nest("/api/users", user_routes::create_user_router())
        .nest("/api/vehicles", vehicle_routes::create_vehicle_router())
        .nest(
            "/api/feeder-points",
            feeder_point_routes::create_feeder_point_router(),
        )
        .nest(
            "/api/assignments",
            assignment_routes::create_assignment_router(),
        )
        .nest("/api/reports", report_routes::create_report_router())
        .nest("/api/settings", settings_routes::create_settings_router())
        // El último layer se ejecuta primero: auth inserta el Principal que lee audit
        .route_layer(from_fn_with_state(state.clone(), audit_middleware))
        .route_layer(from_fn_with_state(state.clone(), auth_middleware));

    let public = Router::new()
        .route("/health", get(health))
        .nest("/api/auth", auth_routes::auth_routes());

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(TimeoutLayer::new(Duration::from_secs(
            state.config.request_timeout_secs,
        )))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
