//! Reservation engine entry point: loads configuration, wires the
//! persistence/LLM/context/payment layers into a [`reserva_server::AppState`],
//! and serves the HTTP API.

use std::sync::Arc;
use std::time::Duration;

use reserva_agent::{BotEngine, ContextStore, ReservationFlow};
use reserva_config::{IntentCatalog, Settings};
use reserva_core::SystemClock;
use reserva_llm::{CircuitBreaker, LlmClassifier, LlmConfig};
use reserva_persistence::PgConfig;
use reserva_server::{create_router, metrics, sweep, AppState, ConfiguredPaymentProvider};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let env = std::env::var("RESERVA_ENV").ok();
    let config = match load_config(env.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("failed to load configuration: {e}. refusing to start with defaults");
            return Err(Box::new(e));
        }
    };

    init_tracing(&config);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting reserva-server");

    let metrics_handle = metrics::install_recorder();

    let store = reserva_persistence::init(PgConfig {
        url: config.datastore.url.clone(),
        max_connections: config.datastore.max_connections,
    })
    .await?;
    let pool = store.pool().clone();

    let catalog_path =
        std::env::var("RESERVA_CATALOG_PATH").unwrap_or_else(|_| "config/catalog.yaml".to_string());
    let catalog = IntentCatalog::load(&catalog_path).unwrap_or_else(|e| {
        tracing::warn!(error = %e, path = %catalog_path, "failed to load intent catalog, starting empty");
        Arc::new(IntentCatalog::default())
    });

    let clock = Arc::new(SystemClock);
    let context = Arc::new(ContextStore::new(Duration::from_secs(config.context_store.ttl_secs)));
    let breaker = Arc::new(CircuitBreaker::new());
    let llm = Arc::new(LlmClassifier::new(LlmConfig::from(&config), breaker));
    let payment_provider = Arc::new(ConfiguredPaymentProvider::from_settings(&config));
    let reservation_flow = Arc::new(ReservationFlow::new(pool.clone(), clock.clone()));

    let engine = Arc::new(BotEngine::new(
        pool,
        context.clone(),
        catalog,
        llm,
        reservation_flow.clone(),
        payment_provider,
        clock,
    ));

    let state = AppState {
        engine,
        reservation_flow,
        context,
        settings: Arc::new(config.clone()),
        metrics_handle,
    };

    tokio::spawn(sweep::run(state.clone()));

    let app = create_router(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.bind_port));
    tracing::info!(%addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server shutdown complete");
    Ok(())
}

fn load_config(env: Option<&str>) -> Result<Settings, reserva_config::SettingsError> {
    reserva_config::load_settings(env, "config")
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}

fn init_tracing(config: &Settings) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if config.environment.is_production() { "info" } else { "debug" };
        format!("reserva={level},tower_http=info").into()
    });

    let fmt_layer = if config.environment.is_production() {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}
