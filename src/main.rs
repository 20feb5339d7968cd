use sea_orm::Database;
use sea_orm_migration::MigratorTrait;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use protocol_sync::config::SyncConfig;
use protocol_sync::jobs::protocol_sync::start_protocol_sync_job;
use protocol_sync::services::catalog::LlamaCatalogService;
use protocol_sync::services::staleness::StalenessPolicy;
use protocol_sync::services::store::PgProtocolStore;
use protocol_sync::services::sync_engine::SyncEngine;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,protocol_sync=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let config = match SyncConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    // Connect to database
    tracing::info!("Connecting to database...");
    let db = match Database::connect(&config.database_url).await {
        Ok(db) => db,
        Err(e) => {
            tracing::error!(error = %e, "Failed to connect to database");
            return ExitCode::FAILURE;
        }
    };

    // Run migrations (tables and unique indexes)
    tracing::info!("Running migrations...");
    if let Err(e) = migration::Migrator::up(&db, None).await {
        tracing::error!(error = %e, "Failed to run migrations");
        return ExitCode::FAILURE;
    }

    let catalog = match LlamaCatalogService::new(
        config.catalog_base_url.clone(),
        config.catalog_timeout,
    ) {
        Ok(catalog) => catalog,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build catalog client");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(
        catalog = %catalog.base_url(),
        refresh_interval_secs = config.refresh_interval_secs,
        request_delay_ms = config.request_delay.as_millis() as u64,
        "Protocol sync configured"
    );

    let engine = SyncEngine::new(
        catalog,
        PgProtocolStore::new(db),
        StalenessPolicy::new(config.refresh_interval_secs),
    )
    .with_request_delay(config.request_delay);

    start_protocol_sync_job(engine, config.backoff, config.sweep_interval).await;

    ExitCode::SUCCESS
}
