//! Conexión a PostgreSQL

use sqlx::PgPool;
use tracing::info;

use crate::config::DatabaseConfig;

/// Crea el pool y comprueba que la base responde
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    info!("🔌 Conectando a {}", mask_database_url(&config.url));
    let pool = config.create_pool().await?;
    sqlx::query("SELECT 1").execute(&pool).await?;
    info!("✅ Base de datos conectada");
    Ok(pool)
}

/// Enmascara las credenciales de la URL para los logs
pub fn mask_database_url(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at_pos)) if at_pos > scheme_end => {
            format!("{}***:***@{}", &url[..scheme_end + 3], &url[at_pos + 1..])
        }
        _ => url.to_string(),
    }
}
