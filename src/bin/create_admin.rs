//! Alta del primer administrador
//!
//! Uso: `create_admin <email> <password> [nombre completo]`
//! Usa la misma configuración de entorno que el servidor.

use anyhow::{bail, Result};
use dotenvy::dotenv;
use tracing::info;

use fleet_portal::config::{EnvironmentConfig, StoreBackend};
use fleet_portal::database;
use fleet_portal::repositories::Repositories;
use fleet_portal::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt().init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (email, password) = match (args.first(), args.get(1)) {
        (Some(email), Some(password)) => (email.clone(), password.clone()),
        _ => bail!("usage: create_admin <email> <password> [full name]"),
    };
    let full_name = args
        .get(2)
        .cloned()
        .unwrap_or_else(|| "Administrator".to_string());

    let config = EnvironmentConfig::from_env()?;
    let repos = match (config.store_backend, &config.database) {
        (StoreBackend::Postgres, Some(db_config)) => {
            let pool = database::connect(db_config).await?;
            database::run_migrations(&pool).await?;
            Repositories::postgres(pool)
        }
        (StoreBackend::Postgres, None) => bail!("DATABASE_URL is required for the postgres store"),
        (StoreBackend::Memory, _) => bail!("create_admin needs a persistent store"),
    };

    let state = AppState::new(config, repos);
    let admin = state
        .services
        .users
        .bootstrap_admin(&email, &password, &full_name)
        .await?;

    info!("✅ Administrador creado: {} ({})", admin.email, admin.id);
    Ok(())
}
