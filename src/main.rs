use std::net::SocketAddr;

use anyhow::Result;
use dotenvy::dotenv;
use tokio::signal;
use tracing::{error, info, warn, Level};

use fleet_portal::config::{EnvironmentConfig, StoreBackend};
use fleet_portal::database;
use fleet_portal::repositories::Repositories;
use fleet_portal::routes::create_router;
use fleet_portal::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    let config = EnvironmentConfig::from_env()?;

    // Configurar logging
    let level = config.log_level.parse::<Level>().unwrap_or(Level::INFO);
    tracing_subscriber::fmt().with_max_level(level).init();

    info!("♻️ Fleet Portal - API de administración");
    info!("================================================");
    info!("🌍 Entorno: {}", config.environment);

    let repos = match (config.store_backend, &config.database) {
        (StoreBackend::Postgres, Some(db_config)) => {
            let pool = match database::connect(db_config).await {
                Ok(pool) => pool,
                Err(e) => {
                    error!("❌ Error conectando a la base de datos: {}", e);
                    return Err(anyhow::anyhow!("Error de base de datos: {}", e));
                }
            };
            database::run_migrations(&pool).await?;
            info!("✅ Schema verificado");
            Repositories::postgres(pool)
        }
        (StoreBackend::Postgres, None) => {
            return Err(anyhow::anyhow!("DATABASE_URL is required for the postgres store"));
        }
        (StoreBackend::Memory, _) => {
            if !config.is_development() {
                warn!("⚠️ Almacén en memoria fuera de desarrollo: los datos no persisten");
            }
            info!("🧪 Usando almacén en memoria");
            Repositories::in_memory()
        }
    };

    let addr: SocketAddr = config.server_url().parse()?;
    let app = create_router(AppState::new(config, repos));

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("   GET  /health - Estado del servicio");
    info!("   POST /api/auth/login | /api/auth/verify");
    info!("   /api/users, /api/vehicles, /api/feeder-points, /api/assignments");
    info!("   /api/reports, /api/settings");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("❌ Error del servidor: {}", e);
        return Err(e.into());
    }

    info!("👋 Servidor terminado");
    Ok(())
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("❌ No se pudo instalar el manejador de Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("❌ No se pudo instalar el manejador de señales: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}
