use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::info;

/// Final record handed to the durable store after an appointment ends.
#[derive(Debug, Clone)]
pub struct AppointmentSummary {
    pub room_id: String,
    pub appointment_id: Option<String>,
    pub summary: Option<String>,
    pub follow_up: Option<String>,
    pub ended_at: DateTime<Utc>,
}

/// Boundary to the external record-keeping collaborator. Called
/// fire-and-forget; room teardown never waits on it.
#[async_trait]
pub trait SummarySink: Send + Sync {
    async fn record_summary(&self, record: AppointmentSummary);
}

/// Default sink that only logs. Deployments wire a real collaborator here.
pub struct LoggingSummarySink;

#[async_trait]
impl SummarySink for LoggingSummarySink {
    async fn record_summary(&self, record: AppointmentSummary) {
        info!(
            room_id = %record.room_id,
            appointment_id = ?record.appointment_id,
            ended_at = %record.ended_at,
            "Appointment summary recorded"
        );
    }
}
