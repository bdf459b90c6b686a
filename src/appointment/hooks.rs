use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};

use super::summary::{AppointmentSummary, SummarySink};
use crate::room::models::Participant;
use crate::room::registry::RoomRegistry;
use crate::shared::AppError;
use crate::websockets::{
    broadcast::MessageBroadcaster,
    connection_manager::ConnectionManager,
    messages::{MessageType, SignalEnvelope},
};

/// Behavior layered on rooms tagged as scheduled appointments: medical-note
/// relay and the authoritative end-of-call teardown.
pub struct AppointmentHooks {
    registry: Arc<dyn RoomRegistry>,
    connections: Arc<dyn ConnectionManager>,
    summary_sink: Arc<dyn SummarySink>,
}

impl AppointmentHooks {
    pub fn new(
        registry: Arc<dyn RoomRegistry>,
        connections: Arc<dyn ConnectionManager>,
        summary_sink: Arc<dyn SummarySink>,
    ) -> Self {
        Self {
            registry,
            connections,
            summary_sink,
        }
    }

    /// Relay a `start-medical-record` / `update-medical-record` payload to
    /// the other participant of an appointment room, timestamped by the
    /// server. Nothing is persisted here. Returns `Unauthorized` when the
    /// room is not an appointment; a room that no longer exists is treated
    /// as already cleaned up.
    pub async fn relay_record(
        &self,
        room_id: &str,
        sender: Participant,
        message_type: MessageType,
        payload: serde_json::Value,
    ) -> Result<(), AppError> {
        let metadata = match self.registry.get_metadata(room_id).await? {
            Some(metadata) => metadata,
            None => {
                debug!(room_id = %room_id, "Record relay to missing room, dropping");
                return Ok(());
            }
        };

        if metadata.kind != crate::room::models::RoomKind::Appointment {
            return Err(AppError::Unauthorized(
                "Medical records are only available in appointment rooms".to_string(),
            ));
        }

        let members = self
            .registry
            .participants(room_id)
            .await?
            .unwrap_or_default();
        let recipients: Vec<Participant> = members
            .into_iter()
            .filter(|p| p.connection_id != sender.connection_id)
            .collect();

        if recipients.is_empty() {
            return Ok(());
        }

        let envelope = SignalEnvelope::relayed(message_type, sender, payload);
        MessageBroadcaster::send_to_participants(&self.connections, &recipients, &envelope).await?;

        debug!(
            room_id = %room_id,
            recipients = recipients.len(),
            "Medical record payload relayed"
        );

        Ok(())
    }

    /// Authoritative, one-shot call termination. Every current member
    /// (the sender included) receives the closing notice, the summary is
    /// handed to the durable-store collaborator without blocking teardown,
    /// and the room is deleted. Retrying against an already-deleted room is
    /// a no-op. Non-appointment rooms get the plain `room-ended` notice
    /// with no summary hand-off.
    ///
    /// Returns the evicted participants so the gateway can clear its
    /// connection-to-room mapping for each of them.
    pub async fn end_appointment(
        &self,
        room_id: &str,
        summary: Option<String>,
        follow_up: Option<String>,
    ) -> Result<Vec<Participant>, AppError> {
        let metadata = self.registry.get_metadata(room_id).await?;
        let was_appointment = metadata
            .as_ref()
            .map(|m| m.kind == crate::room::models::RoomKind::Appointment)
            .unwrap_or(false);

        // force_end is atomic: of two racing end requests only one gets a
        // non-empty eviction list, so only one broadcast goes out.
        let evicted = self.registry.force_end(room_id).await?;
        if evicted.is_empty() {
            debug!(room_id = %room_id, "End requested for a room that is already gone");
            return Ok(evicted);
        }

        let ended_at = Utc::now();
        let envelope = if was_appointment {
            SignalEnvelope::appointment_ended(
                room_id.to_string(),
                summary.clone(),
                follow_up.clone(),
                ended_at,
            )
        } else {
            SignalEnvelope::room_ended(room_id.to_string())
        };
        MessageBroadcaster::send_to_participants(&self.connections, &evicted, &envelope).await?;

        if was_appointment {
            let record = AppointmentSummary {
                room_id: room_id.to_string(),
                appointment_id: metadata.and_then(|m| m.appointment_id),
                summary,
                follow_up,
                ended_at,
            };
            let sink = Arc::clone(&self.summary_sink);
            tokio::spawn(async move {
                sink.record_summary(record).await;
            });
        }

        info!(
            room_id = %room_id,
            notified = evicted.len(),
            was_appointment,
            "Room ended and deleted"
        );

        Ok(evicted)
    }
}
