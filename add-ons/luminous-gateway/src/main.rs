//! Luminous gateway: axum app shell for the Skipper dashboard. Relays user
//! directives to the remote brain, exposes the visible agent state over
//! `/api/v1`, and runs the background sync, wake, and clock loops.

mod handlers;

use luminous_core::{
    start_background_loops, BrainClient, ClockState, Console, FirebaseLogSink, GatewayConfig,
    GemRegistry, GemType, InteractionBuffer, InteractionEngine, LogKind, LuminousConfig,
    MemorySink, ScheduleConfig, SyncEngine, SECURE_PROXY_PATH,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Shared handles behind every route.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<InteractionEngine>,
    pub sync: Arc<SyncEngine>,
    pub client: Arc<BrainClient>,
    pub gems: Arc<GemRegistry>,
    pub console: Console,
    pub clock: Arc<ClockState>,
    pub user_config_path: PathBuf,
}

/// Header label for the backend target, proxy-aware.
pub fn target_label(target: &str) -> String {
    if target.ends_with(SECURE_PROXY_PATH) {
        "SECURE PROXY".to_string()
    } else {
        target.to_string()
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let gateway = match GatewayConfig::load() {
        Ok(config) => config,
        Err(e) => {
            error!(target: "luminous::gateway", "config load failed: {}", e);
            std::process::exit(1);
        }
    };

    let user_config_path = PathBuf::from(&gateway.user_config_path);
    let user_config = match LuminousConfig::load_from_path(&user_config_path) {
        Ok(config) => config,
        Err(e) => {
            warn!(target: "luminous::gateway", "user config unreadable, using defaults: {}", e);
            LuminousConfig::default()
        }
    };

    let console = Console::with_firebase(FirebaseLogSink::from_config(&user_config.firebase));
    let gems = Arc::new(GemRegistry::new());
    if user_config.has_shopify() {
        gems.activate(GemType::Shopify, "Credentials Loaded");
    }
    if user_config.has_firebase() {
        gems.activate(GemType::Firebase, "Credentials Loaded");
    }

    let client = Arc::new(BrainClient::new(
        gateway.secure_transport,
        user_config.get_backend_url().as_deref(),
        gateway.public_origin.as_deref(),
        user_config.get_gemini_api_key(),
    ));
    let target = client.base_url().to_string();

    let buffer = Arc::new(InteractionBuffer::new());
    let engine = Arc::new(InteractionEngine::new(
        Arc::clone(&client),
        Arc::clone(&buffer),
        Arc::clone(&gems),
        console.clone(),
    ));
    let sync = Arc::new(SyncEngine::new(
        Arc::clone(&buffer),
        Arc::clone(&client) as Arc<dyn MemorySink>,
        console.clone(),
    ));
    let clock = Arc::new(ClockState::new());

    console.push("System", "Boot sequence initiated...", LogKind::System);
    {
        let console = console.clone();
        let target = target.clone();
        tokio::spawn(async move {
            console.push("Pinecone", "Connecting Memory Sector...", LogKind::Info);
            tokio::time::sleep(Duration::from_millis(1500)).await;
            console.push("Pinecone", "Vector DB Connected.", LogKind::Success);
            console.push(
                "Kore",
                format!("Consciousness Online. Target: {}", target_label(&target)),
                LogKind::Success,
            );
        });
    }

    let scheduler = start_background_loops(
        Arc::clone(&engine),
        Arc::clone(&sync),
        Arc::clone(&clock),
        ScheduleConfig::default(),
    );

    let state = AppState {
        engine,
        sync,
        client,
        gems,
        console,
        clock,
        user_config_path,
    };
    let app = handlers::router(state).layer(CorsLayer::permissive());

    let addr = SocketAddr::from(([0, 0, 0, 0], gateway.port));
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(target: "luminous::gateway", "bind {} failed: {}", addr, e);
            std::process::exit(1);
        }
    };
    info!(
        target: "luminous::gateway",
        "{} listening on {} (backend target: {})", gateway.app_name, addr, target
    );

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!(target: "luminous::gateway", "server error: {}", e);
    }

    scheduler.shutdown().await;
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!(target: "luminous::gateway", "shutdown signal received");
}
