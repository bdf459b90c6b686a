use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::room::registry::RoomRegistry;
use crate::websockets::connection_manager::ConnectionManager;
use crate::websockets::gateway::SignalingGateway;

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<dyn RoomRegistry>,
    pub connections: Arc<dyn ConnectionManager>,
    pub gateway: Arc<SignalingGateway>,
}

impl AppState {
    pub fn new(
        registry: Arc<dyn RoomRegistry>,
        connections: Arc<dyn ConnectionManager>,
        gateway: Arc<SignalingGateway>,
    ) -> Self {
        Self {
            registry,
            connections,
            gateway,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Room is full")]
    RoomFull,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Malformed event: {0}")]
    MalformedEvent(String),

    #[error("Internal server error")]
    Internal,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::RoomFull => (StatusCode::CONFLICT, "Room is full".to_string()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::MalformedEvent(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
pub mod test_utils {
    use super::*;
    use crate::appointment::summary::{LoggingSummarySink, SummarySink};
    use crate::room::registry::InMemoryRoomRegistry;
    use crate::websockets::connection_manager::InMemoryConnectionManager;

    /// Builder for creating AppState with overrides for testing
    pub struct AppStateBuilder {
        registry: Option<Arc<dyn RoomRegistry>>,
        connections: Option<Arc<dyn ConnectionManager>>,
        summary_sink: Option<Arc<dyn SummarySink>>,
    }

    impl AppStateBuilder {
        pub fn new() -> Self {
            Self {
                registry: None,
                connections: None,
                summary_sink: None,
            }
        }

        pub fn with_registry(mut self, registry: Arc<dyn RoomRegistry>) -> Self {
            self.registry = Some(registry);
            self
        }

        pub fn with_connections(mut self, connections: Arc<dyn ConnectionManager>) -> Self {
            self.connections = Some(connections);
            self
        }

        pub fn with_summary_sink(mut self, sink: Arc<dyn SummarySink>) -> Self {
            self.summary_sink = Some(sink);
            self
        }

        pub fn build(self) -> AppState {
            let registry = self
                .registry
                .unwrap_or_else(|| Arc::new(InMemoryRoomRegistry::new()));
            let connections = self
                .connections
                .unwrap_or_else(|| Arc::new(InMemoryConnectionManager::new()));
            let summary_sink = self
                .summary_sink
                .unwrap_or_else(|| Arc::new(LoggingSummarySink));

            let gateway = Arc::new(SignalingGateway::new(
                registry.clone(),
                connections.clone(),
                summary_sink,
            ));

            AppState {
                registry,
                connections,
                gateway,
            }
        }
    }

    impl Default for AppStateBuilder {
        fn default() -> Self {
            Self::new()
        }
    }
}
