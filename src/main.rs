use dotenvy::dotenv;
use taskmarket::{
    api::{self, AppState},
    config::{self, database},
    core::seed,
    errors::Result,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, non-fatal since env vars can be set externally
    dotenv().ok();

    // 3. Load the application configuration
    let app_config = config::load_default_config()
        .inspect_err(|e| error!("Failed to load configuration: {e}"))?;
    info!("Configuration loaded");

    // 4. Connect and make sure the schema exists
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {e}"))?;
    database::create_tables(&db).await?;
    if !app_config.marketplace.allow_duplicate_submissions {
        database::create_submission_uniqueness_index(&db).await?;
    }

    // 5. Seed a fresh database
    seed::seed_from_config(&db, &app_config.seed)
        .await
        .inspect_err(|e| error!("Failed to seed database: {e}"))?;

    // 6. Serve the API until ctrl-c
    let bind_address = app_config.server.bind_address.clone();
    let app = api::router(AppState::new(db, app_config));
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!("Listening on {bind_address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}
