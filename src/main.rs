use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use consult_signal::appointment::LoggingSummarySink;
use consult_signal::room::handlers;
use consult_signal::room::registry::InMemoryRoomRegistry;
use consult_signal::shared::AppState;
use consult_signal::websockets::{
    websocket_handler, InMemoryConnectionManager, SignalingGateway,
};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "consult_signal=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting consultation signaling server");

    // Explicitly constructed, explicitly scoped service instances.
    // The gateway wires the relay, presence handler and appointment hooks
    // on top of the registry; swap the summary sink for the real
    // record-keeping collaborator in deployment.
    let registry = Arc::new(InMemoryRoomRegistry::new());
    let connections = Arc::new(InMemoryConnectionManager::new());
    let gateway = Arc::new(SignalingGateway::new(
        registry.clone(),
        connections.clone(),
        Arc::new(LoggingSummarySink),
    ));

    let app_state = AppState::new(registry, connections, gateway);

    let app = Router::new()
        .route("/health", get(handlers::health))
        .route("/rooms", get(handlers::list_rooms))
        .route("/rooms/:room_id", get(handlers::get_room))
        .route("/ws", get(websocket_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = tokio::net::TcpListener::bind(&bind_addr).await.unwrap();
    info!("Server running on http://{}", bind_addr);
    axum::serve(listener, app).await.unwrap();
}
