use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::{
    broadcast::MessageBroadcaster,
    connection_manager::ConnectionManager,
    messages::{
        EndAppointmentPayload, JoinRoomPayload, MedicalRecordPayload, MessageType,
        RoomScopedPayload, SetProfilePayload, SignalEnvelope,
    },
    presence::PresenceHandler,
    relay::SignalingRelay,
    socket::MessageHandler,
};
use crate::appointment::{AppointmentHooks, SummarySink};
use crate::room::models::{Participant, Profile};
use crate::room::registry::{JoinOutcome, LeaveOutcome, RoomRegistry};
use crate::shared::AppError;

/// Gateway-held state for one live connection: the room it has joined
/// (at most one) and its current profile.
#[derive(Debug, Clone)]
struct ConnectionState {
    room_id: Option<String>,
    profile: Profile,
}

/// Decodes inbound events and routes them to the registry, relay, presence
/// handler, or appointment hooks. Owns the connection-to-room mapping; the
/// sender identity attached to anything forwarded is always the
/// gateway-assigned connection id, never a client-supplied value.
pub struct SignalingGateway {
    registry: Arc<dyn RoomRegistry>,
    connections: Arc<dyn ConnectionManager>,
    relay: SignalingRelay,
    presence: PresenceHandler,
    hooks: AppointmentHooks,
    // connection_id -> state
    sessions: RwLock<HashMap<String, ConnectionState>>,
}

impl SignalingGateway {
    pub fn new(
        registry: Arc<dyn RoomRegistry>,
        connections: Arc<dyn ConnectionManager>,
        summary_sink: Arc<dyn SummarySink>,
    ) -> Self {
        let relay = SignalingRelay::new(registry.clone(), connections.clone());
        let presence = PresenceHandler::new(registry.clone(), connections.clone());
        let hooks = AppointmentHooks::new(registry.clone(), connections.clone(), summary_sink);

        Self {
            registry,
            connections,
            relay,
            presence,
            hooks,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Register a freshly accepted connection with its upstream-supplied
    /// identity. Must happen before any message from it is handled.
    pub async fn register_connection(&self, connection_id: String, profile: Profile) {
        let mut sessions = self.sessions.write().await;
        sessions.insert(
            connection_id,
            ConnectionState {
                room_id: None,
                profile,
            },
        );
    }

    /// The room the connection currently belongs to, if any.
    pub async fn current_room(&self, connection_id: &str) -> Option<String> {
        let sessions = self.sessions.read().await;
        sessions.get(connection_id).and_then(|s| s.room_id.clone())
    }

    /// Synchronous disconnect processing: the registry reflects the
    /// departure before this returns; peer notification is best-effort
    /// afterwards. Safe to call for a connection that never joined a room.
    pub async fn handle_disconnect(&self, connection_id: &str) {
        let state = {
            let mut sessions = self.sessions.write().await;
            sessions.remove(connection_id)
        };

        let room_id = match state.and_then(|s| s.room_id) {
            Some(room_id) => room_id,
            None => {
                debug!(connection_id = %connection_id, "Disconnect for connection in no room");
                return;
            }
        };

        match self.registry.leave(&room_id, connection_id).await {
            Ok(LeaveOutcome::Left { remaining }) => {
                if let Err(e) = self
                    .presence
                    .notify_leave(&room_id, connection_id, &remaining)
                    .await
                {
                    warn!(room_id = %room_id, error = %e, "Failed to broadcast peer-left");
                }
            }
            Ok(_) => {
                // Room already gone or membership already cleared
            }
            Err(e) => {
                warn!(
                    room_id = %room_id,
                    connection_id = %connection_id,
                    error = %e,
                    "Leave on disconnect failed"
                );
            }
        }

        info!(
            room_id = %room_id,
            connection_id = %connection_id,
            "Disconnect processed"
        );
    }

    async fn send_rejected(&self, connection_id: &str, reason: &str) {
        let envelope = SignalEnvelope::rejected(reason.to_string());
        let _ =
            MessageBroadcaster::send_to_connection(&self.connections, connection_id, &envelope)
                .await;
    }

    /// Gate every room-scoped event on actual membership: an event that
    /// references a room this connection has not joined is rejected and
    /// never forwarded.
    async fn authorize(&self, connection_id: &str, room_id: &str) -> bool {
        let authorized = {
            let sessions = self.sessions.read().await;
            sessions
                .get(connection_id)
                .and_then(|s| s.room_id.as_deref())
                == Some(room_id)
        };

        if !authorized {
            warn!(
                connection_id = %connection_id,
                room_id = %room_id,
                "Event for a room the sender has not joined"
            );
            self.send_rejected(connection_id, "Not a member of the referenced room")
                .await;
        }

        authorized
    }

    /// The sender's identity as this relay will stamp it: gateway-assigned
    /// id plus the profile the gateway holds for it.
    async fn sender_participant(&self, connection_id: &str) -> Participant {
        let sessions = self.sessions.read().await;
        Participant {
            connection_id: connection_id.to_string(),
            profile: sessions
                .get(connection_id)
                .map(|s| s.profile.clone())
                .unwrap_or_default(),
        }
    }

    async fn handle_join(&self, connection_id: &str, payload: JoinRoomPayload) {
        let profile = {
            let mut sessions = self.sessions.write().await;
            let state = match sessions.get_mut(connection_id) {
                Some(state) => state,
                None => {
                    warn!(connection_id = %connection_id, "Join from unregistered connection");
                    return;
                }
            };

            if let Some(ref joined) = state.room_id {
                if joined != &payload.room_id {
                    let joined = joined.clone();
                    drop(sessions);
                    warn!(
                        connection_id = %connection_id,
                        joined_room = %joined,
                        requested_room = %payload.room_id,
                        "Join refused, connection already in a room"
                    );
                    self.send_rejected(connection_id, "Already in a room; leave it first")
                        .await;
                    return;
                }
            }

            if let Some(profile) = payload.profile.clone() {
                state.profile = profile;
            }
            state.profile.clone()
        };

        let outcome = match self
            .registry
            .create_or_join(
                &payload.room_id,
                connection_id,
                profile.clone(),
                payload.metadata,
            )
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(room_id = %payload.room_id, error = %e, "Join failed");
                return;
            }
        };

        match outcome {
            JoinOutcome::Created => {
                self.set_room(connection_id, &payload.room_id).await;
                let envelope = SignalEnvelope::room_created(payload.room_id.clone());
                let _ = MessageBroadcaster::send_to_connection(
                    &self.connections,
                    connection_id,
                    &envelope,
                )
                .await;
            }
            JoinOutcome::Joined { existing } => {
                self.set_room(connection_id, &payload.room_id).await;
                let envelope =
                    SignalEnvelope::room_joined(payload.room_id.clone(), existing.clone());
                let _ = MessageBroadcaster::send_to_connection(
                    &self.connections,
                    connection_id,
                    &envelope,
                )
                .await;

                let joiner = Participant {
                    connection_id: connection_id.to_string(),
                    profile,
                };
                if let Err(e) = self
                    .presence
                    .notify_join(&payload.room_id, &joiner, &existing)
                    .await
                {
                    warn!(room_id = %payload.room_id, error = %e, "Failed to broadcast peer-joined");
                }
            }
            JoinOutcome::AlreadyJoined { existing } => {
                // Duplicate join of the same room: resend the roster only
                let envelope = SignalEnvelope::room_joined(payload.room_id.clone(), existing);
                let _ = MessageBroadcaster::send_to_connection(
                    &self.connections,
                    connection_id,
                    &envelope,
                )
                .await;
            }
            JoinOutcome::RoomFull => {
                if let Err(e) = self
                    .presence
                    .notify_room_full(connection_id, &payload.room_id)
                    .await
                {
                    warn!(room_id = %payload.room_id, error = %e, "Failed to send room-full");
                }
            }
        }
    }

    async fn set_room(&self, connection_id: &str, room_id: &str) {
        let mut sessions = self.sessions.write().await;
        if let Some(state) = sessions.get_mut(connection_id) {
            state.room_id = Some(room_id.to_string());
        }
    }

    async fn handle_set_profile(&self, connection_id: &str, payload: SetProfilePayload) {
        let profile = {
            let mut sessions = self.sessions.write().await;
            let state = match sessions.get_mut(connection_id) {
                Some(state) => state,
                None => {
                    warn!(connection_id = %connection_id, "Profile update from unregistered connection");
                    return;
                }
            };
            state.profile.apply(payload.profile);
            state.profile.clone()
        };

        if let Err(e) = self.presence.profile_updated(connection_id, profile).await {
            warn!(connection_id = %connection_id, error = %e, "Profile update broadcast failed");
        }
    }

    async fn handle_relay(
        &self,
        connection_id: &str,
        message_type: MessageType,
        payload: serde_json::Value,
    ) {
        let room_id = match serde_json::from_value::<RoomScopedPayload>(payload.clone()) {
            Ok(scoped) => scoped.room_id,
            Err(e) => {
                warn!(
                    connection_id = %connection_id,
                    message_type = ?message_type,
                    error = %e,
                    "Relay event without a valid room_id"
                );
                return;
            }
        };

        if !self.authorize(connection_id, &room_id).await {
            return;
        }

        let sender = self.sender_participant(connection_id).await;
        if let Err(e) = self.relay.relay(&room_id, sender, message_type, payload).await {
            warn!(room_id = %room_id, error = %e, "Relay failed");
        }
    }

    async fn handle_medical_record(
        &self,
        connection_id: &str,
        message_type: MessageType,
        payload: serde_json::Value,
    ) {
        let record = match serde_json::from_value::<MedicalRecordPayload>(payload.clone()) {
            Ok(record) => record,
            Err(e) => {
                warn!(
                    connection_id = %connection_id,
                    error = %e,
                    "Malformed medical record event"
                );
                return;
            }
        };

        if !self.authorize(connection_id, &record.room_id).await {
            return;
        }

        let sender = self.sender_participant(connection_id).await;
        match self
            .hooks
            .relay_record(&record.room_id, sender, message_type, payload)
            .await
        {
            Ok(()) => {}
            Err(AppError::Unauthorized(reason)) => {
                self.send_rejected(connection_id, &reason).await;
            }
            Err(e) => {
                warn!(room_id = %record.room_id, error = %e, "Medical record relay failed");
            }
        }
    }

    async fn handle_end_appointment(&self, connection_id: &str, payload: EndAppointmentPayload) {
        let is_member = {
            let sessions = self.sessions.read().await;
            sessions
                .get(connection_id)
                .and_then(|s| s.room_id.as_deref())
                == Some(payload.room_id.as_str())
        };

        if !is_member {
            // A retry after the room was already torn down is the expected
            // idempotent path and is swallowed. Only an existing room the
            // sender never joined is an authorization fault.
            if let Ok(None) = self.registry.get_room(&payload.room_id).await {
                debug!(
                    room_id = %payload.room_id,
                    connection_id = %connection_id,
                    "End requested for a room that is already gone"
                );
                return;
            }
            warn!(
                connection_id = %connection_id,
                room_id = %payload.room_id,
                "End requested for a room the sender has not joined"
            );
            self.send_rejected(connection_id, "Not a member of the referenced room")
                .await;
            return;
        }

        let evicted = match self
            .hooks
            .end_appointment(&payload.room_id, payload.summary, payload.follow_up)
            .await
        {
            Ok(evicted) => evicted,
            Err(e) => {
                warn!(room_id = %payload.room_id, error = %e, "End appointment failed");
                return;
            }
        };

        // The room is gone; clear the mapping of everyone it held
        let mut sessions = self.sessions.write().await;
        for participant in &evicted {
            if let Some(state) = sessions.get_mut(&participant.connection_id) {
                if state.room_id.as_deref() == Some(payload.room_id.as_str()) {
                    state.room_id = None;
                }
            }
        }
    }
}

#[async_trait]
impl MessageHandler for SignalingGateway {
    async fn handle_message(&self, connection_id: &str, message: String) {
        debug!(
            connection_id = %connection_id,
            message = %message,
            "Received message"
        );

        let envelope = match serde_json::from_str::<SignalEnvelope>(&message) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(
                    connection_id = %connection_id,
                    error = %e,
                    "Failed to parse event, dropping"
                );
                return;
            }
        };

        match envelope.message_type {
            MessageType::JoinRoom => {
                match serde_json::from_value::<JoinRoomPayload>(envelope.payload) {
                    Ok(payload) => self.handle_join(connection_id, payload).await,
                    Err(e) => {
                        warn!(connection_id = %connection_id, error = %e, "Malformed join-room event");
                    }
                }
            }
            MessageType::SetProfile => {
                match serde_json::from_value::<SetProfilePayload>(envelope.payload) {
                    Ok(payload) => self.handle_set_profile(connection_id, payload).await,
                    Err(e) => {
                        warn!(connection_id = %connection_id, error = %e, "Malformed set-profile event");
                    }
                }
            }
            MessageType::Offer
            | MessageType::Answer
            | MessageType::IceCandidate
            | MessageType::ChatMessage => {
                self.handle_relay(connection_id, envelope.message_type, envelope.payload)
                    .await;
            }
            MessageType::StartMedicalRecord | MessageType::UpdateMedicalRecord => {
                self.handle_medical_record(connection_id, envelope.message_type, envelope.payload)
                    .await;
            }
            MessageType::EndAppointment => {
                match serde_json::from_value::<EndAppointmentPayload>(envelope.payload) {
                    Ok(payload) => self.handle_end_appointment(connection_id, payload).await,
                    Err(e) => {
                        warn!(connection_id = %connection_id, error = %e, "Malformed end-appointment event");
                    }
                }
            }
            _ => {
                debug!(
                    message_type = ?envelope.message_type,
                    "Server-to-client message type from client, ignoring"
                );
            }
        }
    }
}
