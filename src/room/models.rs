use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default ceiling for consultation and ad-hoc rooms. Appointment rooms are
/// always capped at two participants (one doctor, one patient).
pub const DEFAULT_ROOM_CAPACITY: usize = 16;

/// What a room was created for. Frozen at creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoomKind {
    Appointment,
    Consultation,
    AdHoc,
}

/// Structured record attached by the creator on first join.
/// Join/leave operations never touch it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomMetadata {
    pub kind: RoomKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doctor_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appointment_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Doctor,
    Patient,
    #[default]
    Unspecified,
}

/// Per-connection identity supplied upstream, mutable via `set-profile`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// Partial profile sent by a `set-profile` event. Absent fields keep their
/// current value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfilePatch {
    pub id: Option<String>,
    pub display_name: Option<String>,
    pub role: Option<Role>,
    pub avatar_url: Option<String>,
}

impl Profile {
    /// Merge a patch into this profile, replacing only the supplied fields.
    pub fn apply(&mut self, patch: ProfilePatch) {
        if let Some(id) = patch.id {
            self.id = id;
        }
        if let Some(display_name) = patch.display_name {
            self.display_name = display_name;
        }
        if let Some(role) = patch.role {
            self.role = role;
        }
        if let Some(avatar_url) = patch.avatar_url {
            self.avatar_url = Some(avatar_url);
        }
    }
}

/// One live connection's membership in a room: the gateway-assigned
/// connection id plus the current profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub connection_id: String,
    pub profile: Profile,
}

/// In-memory model for an active room. Participants are kept in join order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub id: String,
    pub participants: Vec<Participant>,
    pub metadata: Option<RoomMetadata>,
}

impl Room {
    /// Creates a room with the supplied metadata and no participants yet.
    /// The registry adds the creator in the same critical section, so the
    /// zero-participant state never escapes it.
    pub fn new(id: String, metadata: Option<RoomMetadata>) -> Self {
        Self {
            id,
            participants: Vec::new(),
            metadata,
        }
    }

    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    /// Derived capacity: appointment rooms hold exactly the doctor/patient
    /// pair, everything else uses the configured ceiling.
    pub fn capacity(&self) -> usize {
        match self.metadata.as_ref().map(|m| m.kind) {
            Some(RoomKind::Appointment) => 2,
            _ => DEFAULT_ROOM_CAPACITY,
        }
    }

    pub fn is_full(&self) -> bool {
        self.participants.len() >= self.capacity()
    }

    pub fn is_appointment(&self) -> bool {
        matches!(
            self.metadata.as_ref().map(|m| m.kind),
            Some(RoomKind::Appointment)
        )
    }

    pub fn has_participant(&self, connection_id: &str) -> bool {
        self.participants
            .iter()
            .any(|p| p.connection_id == connection_id)
    }

    /// Append a participant, preserving join order. No-op for a connection
    /// that is already a member.
    pub fn add_participant(&mut self, participant: Participant) {
        if !self.has_participant(&participant.connection_id) {
            self.participants.push(participant);
        }
    }

    pub fn remove_participant(&mut self, connection_id: &str) {
        self.participants
            .retain(|p| p.connection_id != connection_id);
    }

    /// Everyone except the given connection, in join order.
    pub fn others(&self, connection_id: &str) -> Vec<Participant> {
        self.participants
            .iter()
            .filter(|p| p.connection_id != connection_id)
            .cloned()
            .collect()
    }
}
