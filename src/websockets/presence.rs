use std::sync::Arc;
use tracing::{debug, info};

use super::{
    broadcast::MessageBroadcaster, connection_manager::ConnectionManager,
    messages::SignalEnvelope,
};
use crate::room::models::{Participant, Profile};
use crate::room::registry::RoomRegistry;
use crate::shared::AppError;

/// Reacts to join/leave/disconnect and profile changes: keeps the registry's
/// profile copy current and broadcasts presence events to the affected room.
pub struct PresenceHandler {
    registry: Arc<dyn RoomRegistry>,
    connections: Arc<dyn ConnectionManager>,
}

impl PresenceHandler {
    pub fn new(registry: Arc<dyn RoomRegistry>, connections: Arc<dyn ConnectionManager>) -> Self {
        Self {
            registry,
            connections,
        }
    }

    /// Announce a successful join to the members that were already present.
    /// The joiner itself receives the roster via `room-joined`, not this.
    pub async fn notify_join(
        &self,
        room_id: &str,
        joiner: &Participant,
        existing: &[Participant],
    ) -> Result<(), AppError> {
        if existing.is_empty() {
            return Ok(());
        }

        let envelope = SignalEnvelope::peer_joined(room_id.to_string(), joiner.clone());
        MessageBroadcaster::send_to_participants(&self.connections, existing, &envelope).await?;

        debug!(
            room_id = %room_id,
            connection_id = %joiner.connection_id,
            notified = existing.len(),
            "Peer joined notification sent"
        );

        Ok(())
    }

    /// Announce a departure to whoever is still in the room. When the room
    /// emptied there is nobody left to tell and the registry has already
    /// deleted it.
    pub async fn notify_leave(
        &self,
        room_id: &str,
        leaver_id: &str,
        remaining: &[Participant],
    ) -> Result<(), AppError> {
        if remaining.is_empty() {
            debug!(room_id = %room_id, "Room emptied, no leave notifications needed");
            return Ok(());
        }

        let envelope = SignalEnvelope::peer_left(room_id.to_string(), leaver_id.to_string());
        MessageBroadcaster::send_to_participants(&self.connections, remaining, &envelope).await?;

        debug!(
            room_id = %room_id,
            connection_id = %leaver_id,
            notified = remaining.len(),
            "Peer left notification sent"
        );

        Ok(())
    }

    /// Tell exactly the rejected joiner that the room was full.
    pub async fn notify_room_full(
        &self,
        connection_id: &str,
        room_id: &str,
    ) -> Result<(), AppError> {
        let envelope = SignalEnvelope::room_full(room_id.to_string());
        MessageBroadcaster::send_to_connection(&self.connections, connection_id, &envelope).await?;

        info!(
            room_id = %room_id,
            connection_id = %connection_id,
            "Join rejected, room full"
        );

        Ok(())
    }

    /// Store the new profile on the connection's room membership and tell
    /// the other members. A connection that is in no room only updates its
    /// gateway-held profile; there is nobody to notify.
    pub async fn profile_updated(
        &self,
        connection_id: &str,
        profile: Profile,
    ) -> Result<(), AppError> {
        let updated = self
            .registry
            .update_profile(connection_id, profile.clone())
            .await?;

        let (room_id, others) = match updated {
            Some(pair) => pair,
            None => return Ok(()),
        };

        if others.is_empty() {
            return Ok(());
        }

        let envelope = SignalEnvelope::profile_updated(
            room_id.clone(),
            Participant {
                connection_id: connection_id.to_string(),
                profile,
            },
        );
        MessageBroadcaster::send_to_participants(&self.connections, &others, &envelope).await?;

        debug!(
            room_id = %room_id,
            connection_id = %connection_id,
            notified = others.len(),
            "Profile update broadcast"
        );

        Ok(())
    }
}
