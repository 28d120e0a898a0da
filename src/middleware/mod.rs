//! Middleware del sistema
//!
//! Autenticación, auditoría y CORS.

pub mod audit;
pub mod auth;
pub mod cors;

pub use audit::audit_middleware;
pub use auth::auth_middleware;
pub use cors::cors_layer;
