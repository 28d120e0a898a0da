//! Utilidades del sistema
//!
//! Manejo de errores, extractores HTTP, validación/normalización de entradas,
//! paginación en memoria y hashing de contraseñas.

pub mod errors;
pub mod extract;
pub mod pagination;
pub mod password;
pub mod validation;

pub use errors::{AppError, AppResult};
