//! Modelos del sistema
//!
//! Entidades del dominio y los tipos de resultado de las operaciones
//! atómicas del almacén.

pub mod analytics;
pub mod approval;
pub mod assignment;
pub mod audit;
pub mod auth;
pub mod feeder_point;
pub mod permission;
pub mod settings;
pub mod user;
pub mod vehicle;
