//! Configuración del proyecto
//!
//! Este módulo contiene la configuración de base de datos y las variables
//! de entorno del servidor.

pub mod database;
pub mod environment;

pub use database::DatabaseConfig;
pub use environment::*;

use thiserror::Error;

/// Errores al leer la configuración del entorno
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid value '{value}' for {key}")]
    Invalid { key: &'static str, value: String },
}

/// Lee una variable opcional y la convierte, con valor por defecto
pub(crate) fn parse_var<T: std::str::FromStr>(
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
        _ => Ok(default),
    }
}
