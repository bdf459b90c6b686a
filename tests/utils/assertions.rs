//! Test assertion helpers - fluent API for verifying test expectations
#![allow(dead_code)] // Test utilities may not all be used in every test

use consult_signal::{MessageType, SignalEnvelope};

use super::setup::TestSetup;

// ============================================================================
// Assertion Helpers
// ============================================================================

pub struct MessageAssertion<'a> {
    setup: &'a TestSetup,
    connections: Vec<&'a str>,
}

impl<'a> MessageAssertion<'a> {
    /// Create an assertion for all connections in the setup
    pub fn for_all_connections(setup: &'a TestSetup) -> Self {
        let connections = setup.connections.iter().map(|s| s.as_str()).collect();
        Self { setup, connections }
    }

    /// Create an assertion for specific connections
    pub fn for_connections(setup: &'a TestSetup, connections: Vec<&'a str>) -> Self {
        Self { setup, connections }
    }

    /// Assert that connections received a specific message type (consumes
    /// the message from the queue) and return its content for inspection
    pub async fn received_message_type(self, expected_type: MessageType) -> MessageContent {
        let mut messages = vec![];

        for connection_id in &self.connections {
            let message = self
                .setup
                .mock_conn_manager
                .consume_message_for(connection_id)
                .await;
            assert!(
                message.is_some(),
                "{} should have received a message",
                connection_id
            );

            let msg: SignalEnvelope = serde_json::from_str(&message.unwrap()).unwrap();
            assert_eq!(
                msg.message_type, expected_type,
                "{} received wrong message type",
                connection_id
            );
            messages.push(msg);
        }

        let first = messages.remove(0);
        MessageContent {
            payload: first.payload,
            meta_sender: first
                .meta
                .and_then(|m| m.sender)
                .map(|s| s.connection_id),
        }
    }

    /// Assert that connections received no messages
    pub async fn received_no_messages(self) {
        for connection_id in &self.connections {
            let messages = self
                .setup
                .mock_conn_manager
                .get_messages_for(connection_id)
                .await;
            assert!(
                messages.is_empty(),
                "{} should not have received any messages, got: {:?}",
                connection_id,
                messages
            );
        }
    }

    /// Count how many messages of a specific type a connection received
    /// (non-consuming)
    pub async fn count_message_type(&self, connection_id: &str, msg_type: MessageType) -> usize {
        let messages = self
            .setup
            .mock_conn_manager
            .get_messages_for(connection_id)
            .await;
        messages
            .iter()
            .filter_map(|msg_str| serde_json::from_str::<SignalEnvelope>(msg_str).ok())
            .filter(|msg| msg.message_type == msg_type)
            .count()
    }
}

// ============================================================================
// Message Content Assertions
// ============================================================================

pub struct MessageContent {
    payload: serde_json::Value,
    meta_sender: Option<String>,
}

impl MessageContent {
    /// Assert the envelope was relayed on behalf of a specific connection
    pub fn with_sender(self, expected_sender: &str) -> Self {
        assert_eq!(self.meta_sender.as_deref(), Some(expected_sender));
        self
    }

    /// Assert the payload names a specific room
    pub fn with_room(self, expected_room: &str) -> Self {
        assert_eq!(self.payload["room_id"], expected_room);
        self
    }

    /// Assert an arbitrary payload field
    pub fn with_field(self, field: &str, expected: &str) -> Self {
        assert_eq!(self.payload[field], expected);
        self
    }

    /// Assert the roster in a room-joined payload, in join order
    pub fn with_roster(self, expected_connection_ids: Vec<&str>) -> Self {
        let actual: Vec<String> = self.payload["participants"]
            .as_array()
            .expect("participants should be an array")
            .iter()
            .map(|p| p["connection_id"].as_str().unwrap().to_string())
            .collect();
        let expected: Vec<String> = expected_connection_ids
            .into_iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(actual, expected);
        self
    }

    pub fn payload(&self) -> &serde_json::Value {
        &self.payload
    }
}
