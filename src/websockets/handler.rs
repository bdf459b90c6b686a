use axum::{
    extract::{State, WebSocketUpgrade},
    http::HeaderMap,
    response::Response,
};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::room::models::{Profile, Role};
use crate::shared::AppState;
use crate::websockets::messages::SignalEnvelope;

use super::socket::Connection;

/// Identity is authenticated upstream and forwarded as headers; this core
/// trusts it as given. Absent headers leave the profile unspecified until a
/// `set-profile` event arrives.
fn profile_from_headers(headers: &HeaderMap) -> Profile {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|h| h.to_str().ok())
            .map(|s| s.to_string())
    };

    let role = match header("x-role").as_deref() {
        Some("doctor") => Role::Doctor,
        Some("patient") => Role::Patient,
        _ => Role::Unspecified,
    };

    Profile {
        id: header("x-profile-id").unwrap_or_default(),
        display_name: header("x-display-name").unwrap_or_default(),
        role,
        avatar_url: header("x-avatar-url"),
    }
}

/// WebSocket endpoint. Rooms are joined via `join-room` events after the
/// upgrade, so the route is not room-scoped.
///
/// GET /ws
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    headers: HeaderMap,
    State(app_state): State<AppState>,
) -> Response {
    let profile = profile_from_headers(&headers);

    info!(
        profile_id = %profile.id,
        role = ?profile.role,
        "WebSocket connection requested"
    );

    ws.on_upgrade(move |socket| handle_websocket_connection(socket, profile, app_state))
}

/// Handle the upgraded WebSocket connection
async fn handle_websocket_connection(
    socket: axum::extract::ws::WebSocket,
    profile: Profile,
    app_state: AppState,
) {
    // Fresh transport identity, never reused while this connection lives
    let connection_id = Uuid::new_v4().to_string();

    info!(
        connection_id = %connection_id,
        "WebSocket connection established"
    );

    // Create the outbound channel (app -> client)
    let (outbound_sender, outbound_receiver) = mpsc::unbounded_channel::<String>();

    app_state
        .connections
        .add_connection(connection_id.clone(), outbound_sender.clone())
        .await;
    app_state
        .gateway
        .register_connection(connection_id.clone(), profile)
        .await;

    // Tell the client its assigned id before anything else
    let connected = SignalEnvelope::connected(connection_id.clone());
    if let Ok(message_json) = serde_json::to_string(&connected) {
        let _ = outbound_sender.send(message_json);
    }

    let connection = Connection::new(
        connection_id.clone(),
        Box::new(socket),
        outbound_receiver,
        app_state.gateway.clone(),
    );

    // Run the connection until disconnect
    match connection.run().await {
        Ok(()) => {
            info!(
                connection_id = %connection_id,
                "WebSocket connection closed cleanly"
            );
        }
        Err(e) => {
            warn!(
                connection_id = %connection_id,
                error = ?e,
                "WebSocket connection error"
            );
        }
    }

    // Cleanup: the registry reflects the departure before peers are told
    app_state
        .connections
        .remove_connection(&connection_id)
        .await;
    app_state.gateway.handle_disconnect(&connection_id).await;

    info!(
        connection_id = %connection_id,
        "WebSocket disconnect processed"
    );
}
