use crate::admin::{RoomDescription, RoomSummary};
use std::collections::HashSet;
use system::{ConnectionId, RoomId};

pub struct Room {
    document: String,
    members: HashSet<ConnectionId>,
}

impl Room {
    pub fn new(document: String) -> Self {
        Self {
            document,
            members: HashSet::new(),
        }
    }

    pub fn document(&self) -> &str {
        &self.document
    }

    /// Last writer wins: no version check, no merge.
    pub fn set_document(&mut self, text: String) {
        self.document = text;
    }

    pub fn add_member(&mut self, connection_id: ConnectionId) -> bool {
        self.members.insert(connection_id)
    }

    pub fn remove_member(&mut self, connection_id: &ConnectionId) -> bool {
        self.members.remove(connection_id)
    }

    pub fn has_member(&self, connection_id: &ConnectionId) -> bool {
        self.members.contains(connection_id)
    }

    pub fn members(&self) -> impl Iterator<Item = &ConnectionId> {
        self.members.iter()
    }

    pub fn participant_count(&self) -> usize {
        self.members.len()
    }

    pub fn summary(&self, room_id: &RoomId) -> RoomSummary {
        RoomSummary {
            room_id: room_id.clone(),
            users: self.participant_count(),
        }
    }

    pub fn description(&self, room_id: &RoomId) -> RoomDescription {
        RoomDescription {
            room_id: room_id.clone(),
            users: self.participant_count(),
            document: self.document.clone(),
        }
    }
}
