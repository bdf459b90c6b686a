// Library crate for the consultation signaling server
// This file exposes the public API for integration tests

pub mod appointment;
pub mod room;
pub mod shared;
pub mod websockets;

// Re-export commonly used types for easier access in tests
pub use appointment::{AppointmentSummary, SummarySink};
pub use room::models::{Participant, Profile, Role, Room, RoomKind, RoomMetadata};
pub use room::registry::{InMemoryRoomRegistry, JoinOutcome, LeaveOutcome, RoomRegistry};
pub use shared::{AppError, AppState};
pub use websockets::{
    ConnectionManager, InMemoryConnectionManager, MessageHandler, MessageType, SignalEnvelope,
    SignalingGateway,
};
