//! Configuración de variables de entorno
//!
//! Este módulo maneja la configuración del entorno del servidor. Las
//! variables ausentes toman valores por defecto; los valores mal formados
//! son un error, nunca un pánico.

use std::env;
use std::fmt;
use std::str::FromStr;

use super::{parse_var, ConfigError, DatabaseConfig};

const DEV_JWT_SECRET: &str = "fleet-portal-development-secret";

/// Almacén de documentos a utilizar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            _ => Err(()),
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreBackend::Postgres => f.write_str("postgres"),
            StoreBackend::Memory => f.write_str("memory"),
        }
    }
}

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub port: u16,
    pub host: String,
    pub jwt_secret: String,
    /// Segundos
    pub jwt_expiration: u64,
    pub cors_origins: Vec<String>,
    pub store_backend: StoreBackend,
    pub bcrypt_cost: u32,
    pub request_timeout_secs: u64,
    pub recent_activity_limit: usize,
    pub log_level: String,
    /// Sólo presente con el almacén PostgreSQL
    pub database: Option<DatabaseConfig>,
}

impl EnvironmentConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());
        let is_development = environment == "development";

        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => secret,
            _ if is_development => DEV_JWT_SECRET.to_string(),
            _ => return Err(ConfigError::Missing("JWT_SECRET")),
        };

        let store_backend = parse_var("STORE_BACKEND", StoreBackend::Postgres)?;
        let database = match store_backend {
            StoreBackend::Postgres => Some(DatabaseConfig::from_env()?),
            StoreBackend::Memory => None,
        };

        Ok(Self {
            port: parse_var("PORT", 3000)?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            jwt_secret,
            jwt_expiration: parse_var("JWT_EXPIRATION", 86_400)?,
            cors_origins: env::var("CORS_ORIGINS")
                .unwrap_or_default()
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            store_backend,
            bcrypt_cost: parse_var("BCRYPT_COST", bcrypt::DEFAULT_COST)?,
            request_timeout_secs: parse_var("REQUEST_TIMEOUT_SECS", 30)?,
            recent_activity_limit: parse_var("RECENT_ACTIVITY_LIMIT", 10)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            database,
            environment,
        })
    }

    /// Configuración en memoria para pruebas y desarrollo local
    pub fn for_memory_store(jwt_secret: impl Into<String>) -> Self {
        Self {
            environment: "test".to_string(),
            port: 0,
            host: "127.0.0.1".to_string(),
            jwt_secret: jwt_secret.into(),
            jwt_expiration: 3_600,
            cors_origins: Vec::new(),
            store_backend: StoreBackend::Memory,
            bcrypt_cost: 4,
            request_timeout_secs: 30,
            recent_activity_limit: 10,
            log_level: "debug".to_string(),
            database: None,
        }
    }

    /// Verificar si estamos en modo desarrollo
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Obtener la dirección del servidor
    pub fn server_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_backend_parses_aliases() {
        assert_eq!("PostgreSQL".parse::<StoreBackend>(), Ok(StoreBackend::Postgres));
        assert_eq!("memory".parse::<StoreBackend>(), Ok(StoreBackend::Memory));
        assert!("mongo".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn memory_config_uses_cheap_hashing() {
        let config = EnvironmentConfig::for_memory_store("secret");
        assert_eq!(config.bcrypt_cost, 4);
        assert!(config.database.is_none());
        assert_eq!(config.server_url(), "127.0.0.1:0");
    }
}
