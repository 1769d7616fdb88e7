use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use creaition_api::config::ServerConfig;
use creaition_api::router::build_app_router;
use creaition_api::state::AppState;
use creaition_gemini::{GeminiClient, GeminiConfig, GenerativeModel};
use creaition_storage::{StorageBackend, StorageConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "creaition_api=debug,creaition_pipeline=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = creaition_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    creaition_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    creaition_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Generative model ---
    let model: Option<Arc<dyn GenerativeModel>> = match GeminiConfig::from_env() {
        Some(gemini) => {
            tracing::info!(
                text_model = %gemini.text_model,
                image_model = %gemini.image_model,
                "Gemini client configured",
            );
            Some(Arc::new(GeminiClient::new(gemini)))
        }
        None => {
            tracing::warn!("GEMINI_API_KEY not set, AI endpoints will answer 503");
            None
        }
    };

    // --- Blob storage ---
    let storage = StorageConfig::from_env();
    let store = storage.build().expect("Invalid storage configuration");
    let assets_dir = match storage.backend {
        StorageBackend::Local => {
            tokio::fs::create_dir_all(&storage.assets_dir)
                .await
                .expect("Failed to create assets directory");
            Some(storage.assets_dir.clone())
        }
        StorageBackend::Supabase => None,
    };
    tracing::info!(backend = store.backend_name(), "Blob store configured");

    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        model,
        store,
        assets_dir,
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .expect("Invalid HOST:PORT combination");

    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    let drain = Duration::from_secs(config.shutdown_timeout_secs);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            tokio::spawn(async move {
                tokio::time::sleep(drain).await;
                tracing::warn!(secs = drain.as_secs(), "Drain timeout elapsed, exiting");
                std::process::exit(1);
            });
        })
        .await
        .expect("Server error");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
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
