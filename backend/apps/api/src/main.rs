//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors, but application-level
//! errors should use `kernel::error::AppError`.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use api::{AppConfig, build_app};
use auth::application::BootstrapAdminUseCase;
use auth::domain::repository::UserRepository;
use auth::{AuthAppState, AuthServices, InMemoryUserRepository, PgUserRepository};
use platform::upload::UploadStore;
use reading::domain::repository::EntryRepository;
use reading::{InMemoryEntryRepository, PgEntryRepository, ReadingAppState};
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "api=info,auth=info,reading=info,platform=info,kernel=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = AppConfig::from_env()?;

    match config.database_url.take() {
        Some(database_url) => {
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(&database_url)
                .await
                .context("Failed to connect to database")?;

            tracing::info!("Connected to database");

            sqlx::migrate!("../../../database/migrations")
                .run(&pool)
                .await?;

            tracing::info!("Migrations completed");

            run(
                config,
                Arc::new(PgUserRepository::new(pool.clone())),
                Arc::new(PgEntryRepository::new(pool)),
            )
            .await
        }
        None => {
            tracing::warn!("DATABASE_URL not set, data is kept in memory and lost on restart");
            run(
                config,
                Arc::new(InMemoryUserRepository::new()),
                Arc::new(InMemoryEntryRepository::new()),
            )
            .await
        }
    }
}

async fn run<U, E>(config: AppConfig, users: Arc<U>, entries: Arc<E>) -> anyhow::Result<()>
where
    U: UserRepository + Clone + Send + Sync + 'static,
    E: EntryRepository + Clone + Send + Sync + 'static,
{
    let services = Arc::new(AuthServices::from_config(&config.auth)?);

    if let Some(seed) = config.admin {
        BootstrapAdminUseCase::new(users.clone(), services.clone())
            .execute(seed)
            .await
            .context("Admin bootstrap failed")?;
    }

    let uploads = Arc::new(UploadStore::new(config.upload.clone()));
    tracing::info!(
        root = %uploads.root().display(),
        max_bytes = uploads.max_bytes(),
        "Upload store ready"
    );

    let app = build_app(
        AuthAppState::new(users, services),
        ReadingAppState::new(entries, uploads, config.reading),
        &config.frontend_origins,
    );

    // Start server
    tracing::info!("Listening on {}", config.bind_addr);

    let listener = TcpListener::bind(config.bind_addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
