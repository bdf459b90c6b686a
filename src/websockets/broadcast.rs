use std::sync::Arc;

use super::{connection_manager::ConnectionManager, messages::SignalEnvelope};
use crate::room::models::Participant;
use crate::shared::AppError;

pub struct MessageBroadcaster;

impl MessageBroadcaster {
    pub async fn send_to_participants(
        connections: &Arc<dyn ConnectionManager>,
        participants: &[Participant],
        envelope: &SignalEnvelope,
    ) -> Result<(), AppError> {
        let message_json = serde_json::to_string(envelope).map_err(|_| AppError::Internal)?;

        for participant in participants {
            connections
                .send_to_connection(&participant.connection_id, &message_json)
                .await;
        }

        Ok(())
    }

    pub async fn send_to_connection(
        connections: &Arc<dyn ConnectionManager>,
        connection_id: &str,
        envelope: &SignalEnvelope,
    ) -> Result<(), AppError> {
        let message_json = serde_json::to_string(envelope).map_err(|_| AppError::Internal)?;
        connections.send_to_connection(connection_id, &message_json).await;
        Ok(())
    }
}
