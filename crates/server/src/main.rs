//! Memento server entry point.

use std::sync::Arc;

use axum::{Router, extract::DefaultBodyLimit};
use memento_api::{AppState, router as api_router};
use memento_common::{Config, StorageConfig, build_storage};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
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
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "memento=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting memento server...");

    // Load configuration
    let config = Config::load()?;

    // Connect to database
    let db = memento_db::init(&config).await?;
    info!("Connected to database");

    // Run migrations
    info!("Running database migrations...");
    memento_db::migrate(&db).await?;
    info!("Migrations completed");

    // Object storage
    let storage = build_storage(&config.storage).await?;
    info!(backend = config.storage.backend_name(), "Object storage ready");

    let state = AppState::new(Arc::new(db), storage, &config.media);

    // Keep the published feed snapshot current
    tokio::spawn(state.feed_refresher.clone().run());

    let max_upload_bytes = config.media.max_upload_bytes;
    let mut app = Router::new()
        .nest("/api", api_router())
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(RequestBodyLimitLayer::new(max_upload_bytes))
        .with_state(state);

    // Local storage is served by this process
    if let StorageConfig::Local {
        base_path,
        base_url,
    } = &config.storage
    {
        let mount = base_url.trim_end_matches('/');
        if mount.starts_with('/') {
            app = app.nest_service(mount, ServeDir::new(base_path));
            info!(path = %base_path.display(), url = %mount, "Serving local files");
        }
    }

    let app = app.layer(TraceLayer::new_for_http()).layer(
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    );

    // Start server with graceful shutdown
    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
