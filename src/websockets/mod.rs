// Public API
pub use connection_manager::{ConnectionManager, InMemoryConnectionManager};
pub use gateway::SignalingGateway;
pub use handler::websocket_handler;
pub use messages::{MessageType, SignalEnvelope};
pub use socket::MessageHandler;

// Internal modules
pub mod broadcast;
pub mod connection_manager;
pub mod gateway;
mod handler;
pub mod messages;
pub mod presence;
pub mod relay;
mod socket;
