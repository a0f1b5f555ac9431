//! API server entry point.

use std::sync::Arc;

use api::config::LogFormat;
use api::{Config, create_app, create_state};
use checkout::{CatalogueService, IdentityProvider, JwtIdentityProvider};
use store::{DocumentStore, InMemoryDocumentStore, PostgresDocumentStore};
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match config.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn open_store(config: &Config) -> Arc<dyn DocumentStore> {
    let Some(url) = &config.database_url else {
        tracing::info!("DATABASE_URL not set, using the in-memory store");
        return Arc::new(InMemoryDocumentStore::new());
    };

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(10)
        .connect(url)
        .await
        .expect("failed to connect to PostgreSQL");
    let store = PostgresDocumentStore::new(pool);
    store
        .run_migrations()
        .await
        .expect("failed to run migrations");
    let _change_feed = store
        .start_change_feed()
        .await
        .expect("failed to start the change feed");

    tracing::info!("using the PostgreSQL store");
    Arc::new(store)
}

#[tokio::main]
async fn main() {
    // 1. Load configuration and initialize tracing
    let config = Config::from_env();
    init_tracing(&config);
    for warning in &config.warnings {
        tracing::warn!("{warning}");
    }

    // 2. Install Prometheus metrics recorder
    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Open the store and seed an empty catalogue
    let store = open_store(&config).await;
    if config.seed_catalogue {
        CatalogueService::new(store.clone())
            .seed_if_empty()
            .await
            .expect("failed to seed the catalogue");
    }

    // 4. Build services and start the live projections
    let identity: Arc<dyn IdentityProvider> =
        Arc::new(JwtIdentityProvider::new(config.jwt_secret.as_bytes()));
    let (state, _followers) = create_state(store, identity, &config);
    let app = create_app(state, metrics_handle);

    // 5. Start server
    let addr = config.addr();
    tracing::info!(%addr, stock_policy = ?config.stock_policy, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("server shut down gracefully");
}
