use system::RoomId;

/// Per-connection state kept by the relay.
#[derive(Debug, Default)]
pub struct ConnectionSession {
    current_room: Option<RoomId>,
}

impl ConnectionSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_room(&self) -> Option<&RoomId> {
        self.current_room.as_ref()
    }

    pub fn is_in(&self, room_id: &RoomId) -> bool {
        self.current_room.as_ref() == Some(room_id)
    }

    pub fn enter(&mut self, room_id: RoomId) {
        self.current_room = Some(room_id);
    }

    pub fn exit(&mut self) -> Option<RoomId> {
        self.current_room.take()
    }
}
