use crate::admin::{RoomDescription, RoomSummary};
use crate::room::Room;
use std::collections::HashMap;
use system::{ConnectionId, RoomId};

/// Result of a join: what the joiner should display, and how many are in the room now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Joined {
    pub snapshot: String,
    pub participants: usize,
    /// The connection was already a member.
    pub rejoined: bool,
}

/// Rooms keyed by id. Emptied rooms are kept along with their last snapshot.
pub struct RoomRegistry {
    initial_document: String,
    rooms: HashMap<RoomId, Room>,
}

impl RoomRegistry {
    pub fn new(initial_document: impl Into<String>) -> Self {
        Self {
            initial_document: initial_document.into(),
            rooms: HashMap::new(),
        }
    }

    pub fn join(&mut self, room_id: &RoomId, connection_id: ConnectionId) -> Joined {
        let room = self.room_mut(room_id);
        let rejoined = !room.add_member(connection_id);
        if rejoined {
            log::debug!("Connection {} is already in room {}", connection_id, room_id);
        } else {
            log::info!("Connection {} joined room {}", connection_id, room_id);
        }
        Joined {
            snapshot: room.document().to_owned(),
            participants: room.participant_count(),
            rejoined,
        }
    }

    pub fn leave(&mut self, room_id: &RoomId, connection_id: &ConnectionId) -> usize {
        match self.rooms.get_mut(room_id) {
            Some(room) => {
                if room.remove_member(connection_id) {
                    log::info!("Connection {} left room {}", connection_id, room_id);
                }
                room.participant_count()
            }
            None => 0,
        }
    }

    pub fn set_document(&mut self, room_id: &RoomId, text: String) {
        self.room_mut(room_id).set_document(text);
    }

    pub fn document(&self, room_id: &RoomId) -> Option<&str> {
        self.rooms.get(room_id).map(|room| room.document())
    }

    pub fn members_of(&self, room_id: &RoomId) -> Vec<ConnectionId> {
        self.rooms
            .get(room_id)
            .map(|room| room.members().cloned().collect())
            .unwrap_or_default()
    }

    pub fn is_member(&self, room_id: &RoomId, connection_id: &ConnectionId) -> bool {
        self.rooms
            .get(room_id)
            .map_or(false, |room| room.has_member(connection_id))
    }

    pub fn participant_count(&self, room_id: &RoomId) -> usize {
        self.rooms
            .get(room_id)
            .map_or(0, |room| room.participant_count())
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn summaries(&self) -> Vec<RoomSummary> {
        let mut result = self
            .rooms
            .iter()
            .map(|(room_id, room)| room.summary(room_id))
            .collect::<Vec<_>>();
        result.sort_by(|a, b| a.room_id.cmp(&b.room_id));
        result
    }

    pub fn describe(&self, room_id: &RoomId) -> Option<RoomDescription> {
        self.rooms.get(room_id).map(|room| room.description(room_id))
    }

    fn room_mut(&mut self, room_id: &RoomId) -> &mut Room {
        let initial_document = &self.initial_document;
        self.rooms.entry(room_id.clone()).or_insert_with(|| {
            log::info!("Room {} created", room_id);
            Room::new(initial_document.clone())
        })
    }
}
