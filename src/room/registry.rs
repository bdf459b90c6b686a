use async_trait::async_trait;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use super::models::{Participant, Profile, Room, RoomMetadata};
use crate::shared::AppError;

/// Result of attempting to join (or create) a room
#[derive(Debug, Clone)]
pub enum JoinOutcome {
    /// The room did not exist; it was created with the caller as sole member
    Created,
    /// Joined an existing room, returns the members present before the join
    Joined { existing: Vec<Participant> },
    /// The caller was already a member; returns the other members
    AlreadyJoined { existing: Vec<Participant> },
    /// Room is at capacity, caller was not added
    RoomFull,
}

/// Result of attempting to leave a room
#[derive(Debug, Clone)]
pub enum LeaveOutcome {
    /// Successfully left, returns the members still in the room
    Left { remaining: Vec<Participant> },
    /// The caller was the last member and the room was deleted
    RoomDeleted,
    /// The caller was not in the room
    NotInRoom,
    /// Room does not exist
    RoomNotFound,
}

/// The authoritative owner of room membership. Every mutation to who is in
/// which room goes through this trait; other components only read.
#[async_trait]
pub trait RoomRegistry: Send + Sync {
    /// Creates the room on first join (attaching the supplied metadata,
    /// which is frozen from then on) or appends the caller to an existing
    /// room. The capacity check and the append are atomic: two concurrent
    /// joins against one free slot produce exactly one success and one
    /// `RoomFull`.
    async fn create_or_join(
        &self,
        room_id: &str,
        connection_id: &str,
        profile: Profile,
        metadata_if_creating: Option<RoomMetadata>,
    ) -> Result<JoinOutcome, AppError>;

    /// Removes the connection from the room. Idempotent: leaving a room the
    /// caller is not in, or a room that no longer exists, is not an error.
    /// Deletes the room the instant it becomes empty.
    async fn leave(&self, room_id: &str, connection_id: &str) -> Result<LeaveOutcome, AppError>;

    async fn get_metadata(&self, room_id: &str) -> Result<Option<RoomMetadata>, AppError>;

    /// Current members of a room, in join order. `None` when the room does
    /// not exist.
    async fn participants(&self, room_id: &str) -> Result<Option<Vec<Participant>>, AppError>;

    /// Unconditional teardown. Returns the evicted members so the caller can
    /// notify them; an already-deleted room yields an empty list.
    async fn force_end(&self, room_id: &str) -> Result<Vec<Participant>, AppError>;

    /// Replaces the stored profile for the connection in whichever room
    /// holds it. Returns the room id and the *other* members for presence
    /// broadcast, or `None` when the connection is in no room.
    async fn update_profile(
        &self,
        connection_id: &str,
        profile: Profile,
    ) -> Result<Option<(String, Vec<Participant>)>, AppError>;

    /// Side-effect-free snapshot of all active rooms, for the admin surface.
    async fn list_rooms(&self) -> Result<Vec<Room>, AppError>;

    async fn get_room(&self, room_id: &str) -> Result<Option<Room>, AppError>;
}

/// In-memory implementation. A single mutex over the room map serializes
/// all membership mutations, which is strictly stronger than the required
/// per-room ordering.
pub struct InMemoryRoomRegistry {
    rooms: Mutex<HashMap<String, Room>>,
}

impl Default for InMemoryRoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRoomRegistry {
    pub fn new() -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl RoomRegistry for InMemoryRoomRegistry {
    #[instrument(skip(self, profile, metadata_if_creating))]
    async fn create_or_join(
        &self,
        room_id: &str,
        connection_id: &str,
        profile: Profile,
        metadata_if_creating: Option<RoomMetadata>,
    ) -> Result<JoinOutcome, AppError> {
        let mut rooms = self.rooms.lock().unwrap();

        let room = match rooms.entry(room_id.to_string()) {
            Entry::Vacant(entry) => {
                let mut room = Room::new(room_id.to_string(), metadata_if_creating);
                room.add_participant(Participant {
                    connection_id: connection_id.to_string(),
                    profile,
                });
                entry.insert(room);

                info!(room_id = %room_id, connection_id = %connection_id, "Room created with first participant");
                return Ok(JoinOutcome::Created);
            }
            Entry::Occupied(entry) => entry.into_mut(),
        };

        if room.has_participant(connection_id) {
            debug!(room_id = %room_id, connection_id = %connection_id, "Connection already in room");
            return Ok(JoinOutcome::AlreadyJoined {
                existing: room.others(connection_id),
            });
        }

        if room.is_full() {
            debug!(
                room_id = %room_id,
                current_count = room.participant_count(),
                capacity = room.capacity(),
                "Room is full"
            );
            return Ok(JoinOutcome::RoomFull);
        }

        let existing = room.participants.clone();
        room.add_participant(Participant {
            connection_id: connection_id.to_string(),
            profile,
        });

        info!(
            room_id = %room_id,
            connection_id = %connection_id,
            new_count = room.participant_count(),
            "Connection joined room"
        );

        Ok(JoinOutcome::Joined { existing })
    }

    #[instrument(skip(self))]
    async fn leave(&self, room_id: &str, connection_id: &str) -> Result<LeaveOutcome, AppError> {
        let mut rooms = self.rooms.lock().unwrap();

        let room = match rooms.get_mut(room_id) {
            Some(room) => room,
            None => {
                debug!(room_id = %room_id, "Room not found on leave, treating as already cleaned up");
                return Ok(LeaveOutcome::RoomNotFound);
            }
        };

        if !room.has_participant(connection_id) {
            debug!(room_id = %room_id, connection_id = %connection_id, "Connection not in room");
            return Ok(LeaveOutcome::NotInRoom);
        }

        room.remove_participant(connection_id);

        if room.participants.is_empty() {
            info!(room_id = %room_id, "Room is now empty, deleting");
            rooms.remove(room_id);
            return Ok(LeaveOutcome::RoomDeleted);
        }

        let remaining = room.participants.clone();
        info!(
            room_id = %room_id,
            connection_id = %connection_id,
            remaining = remaining.len(),
            "Connection left room"
        );

        Ok(LeaveOutcome::Left { remaining })
    }

    #[instrument(skip(self))]
    async fn get_metadata(&self, room_id: &str) -> Result<Option<RoomMetadata>, AppError> {
        let rooms = self.rooms.lock().unwrap();
        Ok(rooms.get(room_id).and_then(|r| r.metadata.clone()))
    }

    #[instrument(skip(self))]
    async fn participants(&self, room_id: &str) -> Result<Option<Vec<Participant>>, AppError> {
        let rooms = self.rooms.lock().unwrap();
        Ok(rooms.get(room_id).map(|r| r.participants.clone()))
    }

    #[instrument(skip(self))]
    async fn force_end(&self, room_id: &str) -> Result<Vec<Participant>, AppError> {
        let mut rooms = self.rooms.lock().unwrap();

        match rooms.remove(room_id) {
            Some(room) => {
                info!(
                    room_id = %room_id,
                    evicted = room.participants.len(),
                    "Room forcibly ended"
                );
                Ok(room.participants)
            }
            None => {
                debug!(room_id = %room_id, "Force end on unknown room, nothing to do");
                Ok(Vec::new())
            }
        }
    }

    #[instrument(skip(self, profile))]
    async fn update_profile(
        &self,
        connection_id: &str,
        profile: Profile,
    ) -> Result<Option<(String, Vec<Participant>)>, AppError> {
        let mut rooms = self.rooms.lock().unwrap();

        for room in rooms.values_mut() {
            if let Some(member) = room
                .participants
                .iter_mut()
                .find(|p| p.connection_id == connection_id)
            {
                member.profile = profile;
                let others = room.others(connection_id);
                debug!(
                    room_id = %room.id,
                    connection_id = %connection_id,
                    "Profile updated in room"
                );
                return Ok(Some((room.id.clone(), others)));
            }
        }

        debug!(connection_id = %connection_id, "Profile update for connection in no room");
        Ok(None)
    }

    #[instrument(skip(self))]
    async fn list_rooms(&self) -> Result<Vec<Room>, AppError> {
        let rooms = self.rooms.lock().unwrap();
        Ok(rooms.values().cloned().collect())
    }

    #[instrument(skip(self))]
    async fn get_room(&self, room_id: &str) -> Result<Option<Room>, AppError> {
        let rooms = self.rooms.lock().unwrap();
        let room = rooms.get(room_id).cloned();
        if room.is_none() {
            warn!(room_id = %room_id, "Room not found");
        }
        Ok(room)
    }
}
