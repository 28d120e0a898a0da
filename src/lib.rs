//! Portal de administración de gestión de residuos
//!
//! Registro de usuarios, vehículos y puntos de recogida; flujo de
//! asignaciones y aprobaciones; reportes sobre el almacén.

pub mod config;
pub mod database;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;
