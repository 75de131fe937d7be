use std::collections::HashMap;

use system::{ClientMessage, ConnectionId, RoomId, RoomMetrics, ServerMessage, TextChange};

use crate::admin::AdminCommand;
use crate::connection::ConnectionCommand;
use crate::connection_tx_storage::{ConnectionTx, ConnectionTxStorage};
use crate::error::RelayError;
use crate::room_registry::RoomRegistry;
use crate::server::ServerCommand;
use crate::session::ConnectionSession;

/// Routes join/change/disconnect events between connections and the room registry.
///
/// Owned by a single task, so every room sees its events in arrival order.
pub struct Relay {
    registry: RoomRegistry,
    sessions: HashMap<ConnectionId, ConnectionSession>,
    connections: ConnectionTxStorage,
    lagging: Vec<ConnectionId>,
}

impl Relay {
    pub fn new(registry: RoomRegistry) -> Self {
        Self {
            registry,
            sessions: HashMap::new(),
            connections: ConnectionTxStorage::new(),
            lagging: Vec::new(),
        }
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    pub fn connection_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn handle_command(&mut self, command: ServerCommand) {
        match command {
            ServerCommand::Connection(command) => self.handle_connection_command(command),
            ServerCommand::Admin(command) => self.handle_admin_command(command),
        }
        self.evict_lagging();
    }

    fn handle_connection_command(&mut self, command: ConnectionCommand) {
        match command {
            ConnectionCommand::Connect { connection_id, tx } => self.connect(connection_id, tx),
            ConnectionCommand::Disconnect { from } => self.disconnect(&from),
            ConnectionCommand::Message { from, message } => {
                if let Err(err) = self.handle_client_message(&from, message) {
                    log::warn!("Dropped event: {}", err);
                }
            }
        }
    }

    fn handle_client_message(
        &mut self,
        from: &ConnectionId,
        message: ClientMessage,
    ) -> Result<(), RelayError> {
        match message {
            ClientMessage::JoinRoom(room_id) => self.join_room(from, room_id),
            ClientMessage::TextChange(change) => self.change_text(from, change),
        }
    }

    fn handle_admin_command(&mut self, command: AdminCommand) {
        let answered = match command {
            AdminCommand::ListRooms { tx } => tx.send(self.registry.summaries()).is_ok(),
            AdminCommand::DescribeRoom { room_id, tx } => {
                tx.send(self.registry.describe(&room_id)).is_ok()
            }
        };
        if !answered {
            log::debug!("Admin requester went away before the answer");
        }
    }

    fn connect(&mut self, connection_id: ConnectionId, tx: ConnectionTx) {
        log::info!("Connection {} opened", connection_id);
        self.connections.insert(connection_id, tx);
        self.sessions.insert(connection_id, ConnectionSession::new());
    }

    fn disconnect(&mut self, connection_id: &ConnectionId) {
        if self.sessions.contains_key(connection_id) {
            self.leave_room(connection_id);
            self.sessions.remove(connection_id);
            log::info!("Connection {} closed", connection_id);
        }
        self.connections.remove(connection_id);
    }

    fn join_room(&mut self, from: &ConnectionId, room_id: RoomId) -> Result<(), RelayError> {
        let session = self
            .sessions
            .get(from)
            .ok_or(RelayError::UnknownConnection(*from))?;
        if !session.is_in(&room_id) && session.current_room().is_some() {
            self.leave_room(from);
        }

        let joined = self.registry.join(&room_id, *from);
        if let Some(session) = self.sessions.get_mut(from) {
            session.enter(room_id.clone());
        }
        if joined.rejoined {
            log::debug!("Resync of room {} for {}", room_id, from);
        }
        self.send(from, ServerMessage::TextUpdate(joined.snapshot));
        self.broadcast_metrics(&room_id);
        Ok(())
    }

    fn change_text(&mut self, from: &ConnectionId, change: TextChange) -> Result<(), RelayError> {
        let session = self
            .sessions
            .get(from)
            .ok_or(RelayError::UnknownConnection(*from))?;
        if !session.is_in(&change.room_id) {
            return Err(RelayError::NotInRoom {
                connection_id: *from,
                room_id: change.room_id,
            });
        }

        let TextChange { room_id, text } = change;
        log::debug!("Room {} changed by {} ({} bytes)", room_id, from, text.len());
        self.registry.set_document(&room_id, text.clone());
        self.broadcast(&room_id, ServerMessage::TextUpdate(text), Some(from));
        Ok(())
    }

    /// Clears the connection's membership and tells the rest of the room.
    fn leave_room(&mut self, connection_id: &ConnectionId) -> Option<RoomId> {
        let room_id = self.sessions.get_mut(connection_id)?.exit()?;
        self.registry.leave(&room_id, connection_id);
        self.broadcast_metrics(&room_id);
        Some(room_id)
    }

    fn broadcast_metrics(&mut self, room_id: &RoomId) {
        let users = self.registry.participant_count(room_id);
        self.broadcast(
            room_id,
            ServerMessage::RoomMetrics(RoomMetrics { users }),
            None,
        );
    }

    fn broadcast(&mut self, room_id: &RoomId, message: ServerMessage, without: Option<&ConnectionId>) {
        for connection_id in self.registry.members_of(room_id) {
            if without.map_or(true, |c| *c != connection_id) {
                self.send(&connection_id, message.clone());
            }
        }
    }

    fn send(&mut self, to: &ConnectionId, message: ServerMessage) {
        if let Err(err) = self.connections.send(to, message) {
            log::warn!("{}", err);
            if !self.lagging.contains(to) {
                self.lagging.push(*to);
            }
        }
    }

    /// Drops connections whose queue could not take a message. Their rooms
    /// are notified, which may in turn reveal more laggards.
    fn evict_lagging(&mut self) {
        while let Some(connection_id) = self.lagging.pop() {
            if self.sessions.contains_key(&connection_id) {
                log::warn!("Evicting connection {} that cannot keep up", connection_id);
            }
            self.disconnect(&connection_id);
        }
    }
}
