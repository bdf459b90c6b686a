use serde_json::json;
use tokio::time::{sleep, Duration};

use consult_signal::{websockets::MessageHandler, RoomKind, RoomMetadata};

use super::setup::TestSetup;

// ============================================================================
// Action Helpers
// ============================================================================

pub fn appointment_metadata(appointment_id: &str) -> RoomMetadata {
    RoomMetadata {
        kind: RoomKind::Appointment,
        doctor_id: Some("doc-1".to_string()),
        patient_id: Some("pat-1".to_string()),
        appointment_id: Some(appointment_id.to_string()),
        start_time: None,
        duration_minutes: Some(30),
    }
}

impl TestSetup {
    /// Feed one raw frame through the gateway and wait for processing
    pub async fn send_raw(&self, connection_id: &str, message: String) {
        self.gateway.handle_message(connection_id, message).await;
        sleep(Duration::from_millis(10)).await;
    }

    pub async fn send_event(&self, connection_id: &str, event: serde_json::Value) {
        self.send_raw(connection_id, event.to_string()).await;
    }

    /// Clear all recorded messages
    pub async fn clear_messages(&self) {
        self.mock_conn_manager.clear_messages().await;
    }

    // ============================================================================
    // Convenience Action Methods
    // ============================================================================

    /// Join (or create) a plain room
    pub async fn send_join(&self, connection_id: &str, room_id: &str) {
        self.send_event(
            connection_id,
            json!({ "type": "join-room", "payload": { "room_id": room_id } }),
        )
        .await;
    }

    /// Join (or create) a room tagged as a scheduled appointment
    pub async fn send_join_appointment(&self, connection_id: &str, room_id: &str) {
        let metadata = appointment_metadata(room_id);
        self.send_event(
            connection_id,
            json!({
                "type": "join-room",
                "payload": {
                    "room_id": room_id,
                    "metadata": serde_json::to_value(metadata).unwrap()
                }
            }),
        )
        .await;
    }

    pub async fn send_offer(&self, connection_id: &str, room_id: &str, sdp: &str) {
        self.send_event(
            connection_id,
            json!({ "type": "offer", "payload": { "room_id": room_id, "sdp": sdp } }),
        )
        .await;
    }

    pub async fn send_answer(&self, connection_id: &str, room_id: &str, sdp: &str) {
        self.send_event(
            connection_id,
            json!({ "type": "answer", "payload": { "room_id": room_id, "sdp": sdp } }),
        )
        .await;
    }

    pub async fn send_ice_candidate(&self, connection_id: &str, room_id: &str, candidate: &str) {
        self.send_event(
            connection_id,
            json!({
                "type": "ice-candidate",
                "payload": { "room_id": room_id, "candidate": candidate }
            }),
        )
        .await;
    }

    pub async fn send_chat(&self, connection_id: &str, room_id: &str, text: &str) {
        self.send_event(
            connection_id,
            json!({
                "type": "chat-message",
                "payload": { "room_id": room_id, "text": text }
            }),
        )
        .await;
    }

    pub async fn send_set_profile(&self, connection_id: &str, profile: serde_json::Value) {
        self.send_event(
            connection_id,
            json!({ "type": "set-profile", "payload": { "profile": profile } }),
        )
        .await;
    }

    pub async fn send_medical_record_update(
        &self,
        connection_id: &str,
        room_id: &str,
        appointment_id: &str,
        notes: &str,
    ) {
        self.send_event(
            connection_id,
            json!({
                "type": "update-medical-record",
                "payload": {
                    "room_id": room_id,
                    "appointment_id": appointment_id,
                    "notes": notes
                }
            }),
        )
        .await;
    }

    pub async fn send_end_appointment(
        &self,
        connection_id: &str,
        room_id: &str,
        summary: Option<&str>,
        follow_up: Option<&str>,
    ) {
        self.send_event(
            connection_id,
            json!({
                "type": "end-appointment",
                "payload": {
                    "room_id": room_id,
                    "summary": summary,
                    "follow_up": follow_up
                }
            }),
        )
        .await;
    }

    /// Simulate the transport dropping: gateway disconnect processing
    pub async fn disconnect(&self, connection_id: &str) {
        self.gateway.handle_disconnect(connection_id).await;
        sleep(Duration::from_millis(10)).await;
    }
}
