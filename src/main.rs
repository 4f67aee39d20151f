//! camwatch - camera registry and connection-state server
//!
//! Main entry point: wires the registry, prober, PTZ dispatcher and REST
//! surface together and serves.

use camwatch::{
    brand_catalog,
    command_dispatcher::{CommandDispatcher, OnvifPtzHandler},
    connection_tester::{ConnectionTester, LivenessCheck, SimulatedLivenessCheck, TcpLivenessCheck},
    device_registry::DeviceRegistry,
    site_directory::StaticSiteDirectory,
    state::{AppConfig, AppState},
    web_api,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "camwatch=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting camwatch v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = AppConfig::default();
    tracing::info!(
        host = %config.host,
        port = config.port,
        probe_mode = %config.probe_mode,
        probe_timeout_ms = config.probe_timeout_ms,
        "Configuration loaded"
    );

    // Device registry (SSoT)
    let registry = if config.seed_samples {
        Arc::new(DeviceRegistry::with_samples().await)
    } else {
        Arc::new(DeviceRegistry::new())
    };
    tracing::info!(
        cameras = registry.list().await.len(),
        "DeviceRegistry initialized"
    );

    // Liveness prober
    let checker: Arc<dyn LivenessCheck> = match config.probe_mode.as_str() {
        "simulated" => Arc::new(SimulatedLivenessCheck::default()),
        _ => Arc::new(TcpLivenessCheck::new(config.probe_timeout_ms)),
    };
    let tester = Arc::new(ConnectionTester::new(registry.clone(), checker));
    tracing::info!(mode = %config.probe_mode, "ConnectionTester initialized");

    // PTZ dispatcher: one ONVIF handler covers every PTZ-capable catalog brand
    let dispatcher = Arc::new(CommandDispatcher::new(registry.clone()));
    let onvif_handler = Arc::new(OnvifPtzHandler::new());
    for brand in brand_catalog::list_brands() {
        if brand_catalog::resolve_brand(brand).ptz_support {
            dispatcher.register_handler(brand, onvif_handler.clone()).await;
        }
    }
    tracing::info!("CommandDispatcher initialized with ONVIF PTZ handlers");

    // Site collaborator
    let sites = Arc::new(StaticSiteDirectory::new(config.default_site_id));

    // Create application state
    let state = AppState {
        config,
        registry,
        tester,
        dispatcher,
        sites,
    };

    // Create router
    let app = web_api::create_router(state.clone())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = format!("{}:{}", state.config.host, state.config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
