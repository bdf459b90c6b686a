use std::sync::Arc;

use consult_signal::{
    room::registry::InMemoryRoomRegistry, Profile, Role, RoomRegistry, SignalingGateway,
};

use super::mocks::{MockConnectionManager, MockSummarySink};

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub struct TestSetup {
    pub gateway: Arc<SignalingGateway>,
    pub registry: Arc<dyn RoomRegistry>,
    pub mock_conn_manager: Arc<MockConnectionManager>,
    pub summary_sink: Arc<MockSummarySink>,
    pub connections: Vec<String>,
}

pub struct TestSetupBuilder {
    connections: Vec<(String, Profile)>,
}

impl TestSetupBuilder {
    pub fn new() -> Self {
        Self {
            connections: vec![],
        }
    }

    pub fn with_connection(mut self, connection_id: &str, profile: Profile) -> Self {
        self.connections
            .push((connection_id.to_string(), profile));
        self
    }

    /// Two peers with upstream identities, the usual consultation pair
    pub fn with_doctor_and_patient(self) -> Self {
        self.with_connection(
            "conn-doc",
            Profile {
                id: "doc-1".to_string(),
                display_name: "Dr. Osei".to_string(),
                role: Role::Doctor,
                avatar_url: None,
            },
        )
        .with_connection(
            "conn-pat",
            Profile {
                id: "pat-1".to_string(),
                display_name: "P. Martin".to_string(),
                role: Role::Patient,
                avatar_url: None,
            },
        )
    }

    /// The pair plus a third connection that has no seat in an appointment
    pub fn with_doctor_patient_and_stranger(self) -> Self {
        self.with_doctor_and_patient()
            .with_connection("conn-x", Profile::default())
    }

    pub async fn build(self) -> TestSetup {
        let registry: Arc<dyn RoomRegistry> = Arc::new(InMemoryRoomRegistry::new());
        let mock_conn_manager = Arc::new(MockConnectionManager::new());
        let summary_sink = Arc::new(MockSummarySink::new());

        let gateway = Arc::new(SignalingGateway::new(
            registry.clone(),
            mock_conn_manager.clone(),
            summary_sink.clone(),
        ));

        let mut connections = Vec::new();
        for (connection_id, profile) in self.connections {
            mock_conn_manager.add_connected(&connection_id).await;
            gateway
                .register_connection(connection_id.clone(), profile)
                .await;
            connections.push(connection_id);
        }

        TestSetup {
            gateway,
            registry,
            mock_conn_manager,
            summary_sink,
            connections,
        }
    }
}
