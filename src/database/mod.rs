//! Módulo de base de datos
//!
//! Maneja la conexión con PostgreSQL y la creación idempotente del schema.

pub mod connection;
pub mod schema;

pub use connection::{connect, mask_database_url};
pub use schema::run_migrations;
