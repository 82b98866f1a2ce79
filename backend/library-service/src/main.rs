/// Library Service - HTTP Server
///
/// Serves the video library and streams videos with HTTP range support.
use actix_web::{middleware as actix_middleware, web, App, HttpServer};
use anyhow::Context;
use crypto_core::jwt;
use library_service::config::LogFormat;
use library_service::db::{AssetDirectory, PgAssetDirectory};
use library_service::handlers;
use library_service::services::{
    AssetLocator, JwtVerifier, LibraryService, ProgressHub, TokenVerifier,
};
use library_service::Config;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {e}"))?;
    init_tracing(config.app.log_format);

    let bind_address = config.bind_address();
    tracing::info!(
        env = %config.app.env,
        media_root = %config.storage.media_root.display(),
        default_quality = config.storage.default_quality.as_str(),
        "Library service starting on {}",
        bind_address
    );

    match &config.auth.jwt_public_key_pem {
        Some(public_key) => jwt::initialize_jwt_validation_only(public_key)
            .context("Failed to initialize JWT keys")?,
        None => {
            tracing::warn!(
                "JWT_PUBLIC_KEY_PEM not set; authentication middleware will fail requests"
            )
        }
    }

    // Initialize database connection pool
    let db_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await
        .context("Failed to connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .context("Failed to run migrations")?;

    tokio::fs::create_dir_all(&config.storage.media_root)
        .await
        .with_context(|| {
            format!(
                "Failed to create media root {}",
                config.storage.media_root.display()
            )
        })?;

    let directory: Arc<dyn AssetDirectory> = Arc::new(PgAssetDirectory::new(db_pool));
    let library = web::Data::new(LibraryService::new(
        directory,
        AssetLocator::new(config.storage.media_root.clone()),
        config.storage.default_quality,
    ));
    let progress = web::Data::new(ProgressHub::default());
    let storage = web::Data::new(config.storage.clone());
    let verifier: Arc<dyn TokenVerifier> = Arc::new(JwtVerifier);

    HttpServer::new(move || {
        let verifier = verifier.clone();
        App::new()
            .app_data(library.clone())
            .app_data(progress.clone())
            .app_data(storage.clone())
            .wrap(actix_middleware::Logger::default())
            .configure(|cfg| handlers::configure(cfg, verifier))
    })
    .bind(&bind_address)?
    .run()
    .await?;

    tracing::info!("Library service shutting down");
    Ok(())
}
