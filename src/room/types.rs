use serde::{Deserialize, Serialize};

use super::models::{Room, RoomMetadata};

/// Response shape for the admin room listing
#[derive(Debug, Serialize, Deserialize)]
pub struct RoomSummary {
    pub id: String,
    pub participant_count: usize,
    pub capacity: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<RoomMetadata>,
}

impl From<&Room> for RoomSummary {
    fn from(room: &Room) -> Self {
        Self {
            id: room.id.clone(),
            participant_count: room.participant_count(),
            capacity: room.capacity(),
            metadata: room.metadata.clone(),
        }
    }
}
