//! signal-relay server entry point.
//!
//! Wires configuration, stores, the dispatcher and the ingestion loop,
//! then starts the Axum HTTP server.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use signal_relay::api;
use signal_relay::app_state::AppState;
use signal_relay::config::RelayConfig;
use signal_relay::dispatch::Dispatcher;
use signal_relay::i18n::MessageCatalog;
use signal_relay::ingest::{HttpContentQueue, IngestLoop};
use signal_relay::render::NoCardRenderer;
use signal_relay::social::SocialGraphClient;
use signal_relay::store;
use signal_relay::store::groups::GroupStore;
use signal_relay::store::verification::VerificationStore;
use signal_relay::transport::{BotApiTransport, ChannelCache};
use signal_relay::verify::VerificationService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = RelayConfig::from_env().map_err(|e| anyhow::anyhow!(e.to_string()))?;
    tracing::info!(addr = %config.listen_addr, "starting signal-relay");

    // Database
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await?;
    store::init_schema(&pool).await?;

    // Outbound HTTP client shared by every collaborator
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.http_timeout_secs))
        .build()?;

    // Collaborators
    let catalog = Arc::new(MessageCatalog::load_dir(&config.i18n_dir));
    let targets = Arc::new(SocialGraphClient::new(
        http.clone(),
        config.social_api_url.clone(),
        config.brand.clone(),
        config.channel_type.clone(),
    ));
    let channel_cache = Arc::new(ChannelCache::default());
    let transport = Arc::new(BotApiTransport::new(
        http.clone(),
        config.bot_api_url.clone(),
        Arc::clone(&channel_cache),
    ));
    let dispatcher = Arc::new(Dispatcher::new(
        Arc::clone(&targets) as _,
        Arc::clone(&transport) as _,
        Arc::new(NoCardRenderer),
        catalog,
        http.clone(),
    ));
    let verification = Arc::new(VerificationService::new(
        Arc::new(VerificationStore::new(pool.clone())),
        http.clone(),
        config.verify_api_url.clone(),
        config.brand.clone(),
        config.channel_type.clone(),
    ));

    // Scheduled CMS ingestion
    if config.ingest_enabled {
        let ingest = IngestLoop::new(
            Arc::new(HttpContentQueue::new(
                http.clone(),
                config.content_queue_url.clone(),
            )),
            targets,
            transport,
            http,
        );
        ingest.spawn(Duration::from_secs(config.ingest_interval_secs));
        tracing::info!(interval = config.ingest_interval_secs, "ingestion loop running");
    } else {
        tracing::info!("ingestion loop disabled");
    }

    // Application state + router
    let app_state = AppState {
        dispatcher,
        verification,
        groups: GroupStore::new(pool),
        cache: channel_cache,
    };
    let app = Router::new()
        .merge(api::build_router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
