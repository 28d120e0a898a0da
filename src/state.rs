//! Shared application state
//!
//! Estado compartido que se pasa a través del router de Axum: configuración,
//! repositorios, proveedor de identidad y servicios ya construidos.

use std::sync::Arc;

use crate::config::environment::EnvironmentConfig;
use crate::repositories::Repositories;
use crate::services::{IdentityProvider, JwtConfig, JwtService, LocalIdentityProvider, Services};
use crate::utils::password::PasswordHasher;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<EnvironmentConfig>,
    pub repos: Repositories,
    pub identity: Arc<dyn IdentityProvider>,
    pub services: Arc<Services>,
}

impl AppState {
    /// Construye el estado con el proveedor de identidad local sobre el almacén
    pub fn new(config: EnvironmentConfig, repos: Repositories) -> Self {
        let jwt = JwtService::new(JwtConfig::new(
            config.jwt_secret.clone(),
            config.jwt_expiration,
        ));
        let identity: Arc<dyn IdentityProvider> =
            Arc::new(LocalIdentityProvider::new(repos.accounts.clone(), jwt));
        Self::with_identity(config, repos, identity)
    }

    pub fn with_identity(
        config: EnvironmentConfig,
        repos: Repositories,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        let services = Services::new(
            &repos,
            identity.clone(),
            PasswordHasher::new(config.bcrypt_cost),
            config.recent_activity_limit,
        );
        Self {
            config: Arc::new(config),
            repos,
            identity,
            services: Arc::new(services),
        }
    }
}
