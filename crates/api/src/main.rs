use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use roomdesigner_core::config::env_optional;
use roomdesigner_db::{MemoryTaskStore, PgTaskStore, TaskStore};
use roomdesigner_meshy::{MeshyClient, MeshyConfig};
use roomdesigner_pipeline::{GenerationConfig, GenerationService, ModelFileWriter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use roomdesigner_api::config::ServerConfig;
use roomdesigner_api::router::build_app_router;
use roomdesigner_api::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "roomdesigner_api=debug,roomdesigner_pipeline=debug,roomdesigner_meshy=debug,tower_http=debug"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env()?;
    let generation_config = GenerationConfig::from_env()?;
    let meshy_config = MeshyConfig::from_env()?;
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");
    tracing::info!(
        max_concurrent_tasks = generation_config.max_concurrent_tasks,
        max_retries = generation_config.max_retries,
        poll_interval_secs = generation_config.poll_interval.as_secs(),
        models_dir = %generation_config.models_dir.display(),
        "Loaded generation configuration",
    );
    if meshy_config.api_key.is_none() {
        tracing::warn!("MESHY_API_KEY not set, generation tasks will fail until it is configured");
    }

    // --- Task store ---
    let store = connect_store().await?;

    // --- Generation pipeline ---
    let generation = Arc::new(GenerationService::new(
        store,
        Arc::new(MeshyClient::new(&meshy_config)),
        Arc::new(ModelFileWriter::new(&generation_config.models_dir)),
        &generation_config,
    ));
    generation.start().await;

    // --- App state ---
    let state = AppState {
        generation: Arc::clone(&generation),
    };
    let app = build_app_router(state, &config);

    // --- Start server ---
    let host = config
        .host
        .parse::<IpAddr>()
        .with_context(|| format!("Invalid HOST address {:?}", config.host))?;
    let addr = SocketAddr::new(host, config.port);
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");
    generation
        .stop(Duration::from_secs(config.shutdown_timeout_secs))
        .await;

    tracing::info!("Graceful shutdown complete");
    Ok(())
}

/// PostgreSQL when `DATABASE_URL` is set, otherwise an in-memory store.
async fn connect_store() -> anyhow::Result<Arc<dyn TaskStore>> {
    let Some(database_url) = env_optional("DATABASE_URL") else {
        tracing::warn!("DATABASE_URL not set, generation tasks are kept in memory only");
        return Ok(Arc::new(MemoryTaskStore::new()));
    };

    let pool = roomdesigner_db::create_pool(&database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connection pool created");

    roomdesigner_db::health_check(&pool)
        .await
        .context("Database health check failed")?;
    tracing::info!("Database health check passed");

    roomdesigner_db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");

    Ok(Arc::new(PgTaskStore::new(pool)))
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
