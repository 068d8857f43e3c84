//! services/web/src/bin/web.rs

use habit_tracker_core::ports::{
    CredentialService, EntryRepository, HabitRepository, UserRepository,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_sessions_sqlx_store::PostgresStore;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use web_lib::{
    adapters::{Argon2Credentials, DbAdapter},
    config::Config,
    error::ApiError,
    web::{build_app, render::Renderer, AppState},
};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await?;
    let db_adapter = Arc::new(DbAdapter::new(db_pool.clone(), config.db_timeout));
    info!("Running database migrations...");
    db_adapter.run_migrations().await?;

    let session_store = PostgresStore::new(db_pool);
    session_store.migrate().await?;
    info!("Database migrations complete.");

    // --- 3. Build the Shared AppState ---
    let users: Arc<dyn UserRepository> = db_adapter.clone();
    let habits: Arc<dyn HabitRepository> = db_adapter.clone();
    let entries: Arc<dyn EntryRepository> = db_adapter;
    let credentials: Arc<dyn CredentialService> = Arc::new(Argon2Credentials::new());

    let app_state = Arc::new(AppState {
        users,
        habits,
        entries,
        credentials,
        renderer: Renderer::new(),
        config: config.clone(),
    });

    // --- 4. Create the Web Router ---
    let app = build_app(app_state, session_store)?;

    // --- 5. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
