use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::room::models::{Participant, Profile, ProfilePatch, RoomMetadata};

/// Event kinds for WebSocket communication. Names match the wire protocol.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum MessageType {
    // Client -> Server
    JoinRoom,
    SetProfile,
    StartMedicalRecord,
    UpdateMedicalRecord,
    EndAppointment,

    // Client -> Server, relayed back out to peers unchanged
    Offer,
    Answer,
    IceCandidate,
    ChatMessage,

    // Server -> Client
    Connected,
    RoomCreated,
    RoomJoined,
    PeerJoined,
    RoomFull,
    ProfileUpdated,
    PeerLeft,
    AppointmentEnded,
    RoomEnded,
    Rejected,
}

/// Metadata attached to server-emitted envelopes. `sender` carries the
/// gateway-assigned id and profile of the originating connection for
/// relayed events; it is never taken from client input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalMeta {
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<Participant>,
}

/// Base structure for all WebSocket traffic
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalEnvelope {
    #[serde(rename = "type")]
    pub message_type: MessageType,
    pub payload: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<SignalMeta>,
}

/// Client-to-Server payloads
#[derive(Debug, Clone, Deserialize)]
pub struct JoinRoomPayload {
    pub room_id: String,
    #[serde(default)]
    pub profile: Option<Profile>,
    /// Only honored when this join creates the room
    #[serde(default)]
    pub metadata: Option<RoomMetadata>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetProfilePayload {
    pub profile: ProfilePatch,
}

/// Common shape of every room-scoped event; used to authorize before the
/// payload is forwarded opaquely.
#[derive(Debug, Clone, Deserialize)]
pub struct RoomScopedPayload {
    pub room_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MedicalRecordPayload {
    pub room_id: String,
    pub appointment_id: String,
    #[serde(default)]
    pub notes: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EndAppointmentPayload {
    pub room_id: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub follow_up: Option<String>,
}

/// Server-to-Client payloads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectedPayload {
    pub connection_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomCreatedPayload {
    pub room_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomJoinedPayload {
    pub room_id: String,
    /// Members present before this join, in join order. The new joiner
    /// uses this roster to address its offers.
    pub participants: Vec<Participant>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeerJoinedPayload {
    pub room_id: String,
    pub peer: Participant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomFullPayload {
    pub room_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileUpdatedPayload {
    pub room_id: String,
    pub peer: Participant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeerLeftPayload {
    pub room_id: String,
    pub connection_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentEndedPayload {
    pub room_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow_up: Option<String>,
    pub ended_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomEndedPayload {
    pub room_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectedPayload {
    pub reason: String,
}

/// Helper functions for creating envelopes
impl SignalEnvelope {
    pub fn new(message_type: MessageType, payload: serde_json::Value) -> Self {
        Self {
            message_type,
            payload,
            meta: Some(SignalMeta {
                timestamp: Utc::now(),
                sender: None,
            }),
        }
    }

    /// An inbound payload forwarded unchanged, tagged with the sender's
    /// gateway-assigned identity and a server timestamp
    pub fn relayed(
        message_type: MessageType,
        sender: Participant,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            message_type,
            payload,
            meta: Some(SignalMeta {
                timestamp: Utc::now(),
                sender: Some(sender),
            }),
        }
    }

    /// Create a CONNECTED message carrying the assigned connection id
    pub fn connected(connection_id: String) -> Self {
        let payload = ConnectedPayload { connection_id };
        Self::new(
            MessageType::Connected,
            serde_json::to_value(payload).unwrap(),
        )
    }

    /// Create a ROOM_CREATED message
    pub fn room_created(room_id: String) -> Self {
        let payload = RoomCreatedPayload { room_id };
        Self::new(
            MessageType::RoomCreated,
            serde_json::to_value(payload).unwrap(),
        )
    }

    /// Create a ROOM_JOINED message with the existing roster
    pub fn room_joined(room_id: String, participants: Vec<Participant>) -> Self {
        let payload = RoomJoinedPayload {
            room_id,
            participants,
        };
        Self::new(
            MessageType::RoomJoined,
            serde_json::to_value(payload).unwrap(),
        )
    }

    /// Create a PEER_JOINED message
    pub fn peer_joined(room_id: String, peer: Participant) -> Self {
        let payload = PeerJoinedPayload { room_id, peer };
        Self::new(
            MessageType::PeerJoined,
            serde_json::to_value(payload).unwrap(),
        )
    }

    /// Create a ROOM_FULL rejection
    pub fn room_full(room_id: String) -> Self {
        let payload = RoomFullPayload { room_id };
        Self::new(
            MessageType::RoomFull,
            serde_json::to_value(payload).unwrap(),
        )
    }

    /// Create a PROFILE_UPDATED message
    pub fn profile_updated(room_id: String, peer: Participant) -> Self {
        let payload = ProfileUpdatedPayload { room_id, peer };
        Self::new(
            MessageType::ProfileUpdated,
            serde_json::to_value(payload).unwrap(),
        )
    }

    /// Create a PEER_LEFT message
    pub fn peer_left(room_id: String, connection_id: String) -> Self {
        let payload = PeerLeftPayload {
            room_id,
            connection_id,
        };
        Self::new(
            MessageType::PeerLeft,
            serde_json::to_value(payload).unwrap(),
        )
    }

    /// Create an APPOINTMENT_ENDED message with the server-assigned end time
    pub fn appointment_ended(
        room_id: String,
        summary: Option<String>,
        follow_up: Option<String>,
        ended_at: DateTime<Utc>,
    ) -> Self {
        let payload = AppointmentEndedPayload {
            room_id,
            summary,
            follow_up,
            ended_at,
        };
        Self::new(
            MessageType::AppointmentEnded,
            serde_json::to_value(payload).unwrap(),
        )
    }

    /// Create a ROOM_ENDED forced-teardown notice
    pub fn room_ended(room_id: String) -> Self {
        let payload = RoomEndedPayload { room_id };
        Self::new(
            MessageType::RoomEnded,
            serde_json::to_value(payload).unwrap(),
        )
    }

    /// Create a generic REJECTED message
    pub fn rejected(reason: String) -> Self {
        let payload = RejectedPayload { reason };
        Self::new(
            MessageType::Rejected,
            serde_json::to_value(payload).unwrap(),
        )
    }
}
