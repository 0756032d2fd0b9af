use anyhow::Result;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use api::{AppState, limits::LimitPolicy, repositories::UsageRepository, routes};
use auth::{
    jwt::{JwtConfig, TokenService},
    repositories::UserRepository,
};
use common::{
    clock::system_clock,
    config::ServerConfig,
    database::{self, DatabaseConfig},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting API service");

    let server_config = ServerConfig::load("API", 3001)?;

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = database::init_pool(&db_config).await?;

    // Check database connectivity
    if database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }
    database::run_migrations(&pool).await?;

    let clock = system_clock();
    let token_service = TokenService::new(JwtConfig::from_env()?, clock.clone())?;

    let app_state = AppState::new(
        token_service,
        Arc::new(UserRepository::new(pool.clone())),
        Arc::new(UsageRepository::new(pool, clock)),
        Arc::new(LimitPolicy::standard()),
    );

    info!("API service initialized successfully");

    // Start the web server
    let app = routes::create_router(app_state);

    let address = server_config.bind_address();
    let listener = TcpListener::bind(&address).await?;
    info!("API service listening on {}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("API service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
