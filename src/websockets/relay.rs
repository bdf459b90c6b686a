use std::sync::Arc;
use tracing::debug;

use super::{
    broadcast::MessageBroadcaster,
    connection_manager::ConnectionManager,
    messages::{MessageType, SignalEnvelope},
};
use crate::room::models::Participant;
use crate::room::registry::RoomRegistry;
use crate::shared::AppError;

/// Forwards session-negotiation payloads (offers, answers, ICE candidates,
/// chat) to the other members of a room. Stateless beyond reading the
/// registry's current membership; the payload itself is never inspected.
pub struct SignalingRelay {
    registry: Arc<dyn RoomRegistry>,
    connections: Arc<dyn ConnectionManager>,
}

impl SignalingRelay {
    pub fn new(registry: Arc<dyn RoomRegistry>, connections: Arc<dyn ConnectionManager>) -> Self {
        Self {
            registry,
            connections,
        }
    }

    /// Forward `payload` unchanged to every current member of the room
    /// except the sender, tagged with the sender's identity and a server
    /// timestamp. Written over "all other members" so 2-party rooms get
    /// unicast and larger rooms get fan-out from the same path. A room
    /// that disappeared or a recipient that disconnected is not an error;
    /// the message is simply dropped.
    pub async fn relay(
        &self,
        room_id: &str,
        sender: Participant,
        message_type: MessageType,
        payload: serde_json::Value,
    ) -> Result<(), AppError> {
        let members = match self.registry.participants(room_id).await? {
            Some(members) => members,
            None => {
                debug!(room_id = %room_id, "Relay target room no longer exists, dropping");
                return Ok(());
            }
        };

        let recipients: Vec<Participant> = members
            .into_iter()
            .filter(|p| p.connection_id != sender.connection_id)
            .collect();

        if recipients.is_empty() {
            debug!(room_id = %room_id, "No other members to relay to");
            return Ok(());
        }

        let envelope = SignalEnvelope::relayed(message_type, sender, payload);
        MessageBroadcaster::send_to_participants(&self.connections, &recipients, &envelope).await?;

        debug!(
            room_id = %room_id,
            message_type = ?message_type,
            recipients = recipients.len(),
            "Payload relayed"
        );

        Ok(())
    }
}
