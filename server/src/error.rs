use system::{ConnectionId, RoomId};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RelayError {
    #[error("unknown connection {0}")]
    UnknownConnection(ConnectionId),
    #[error("connection {connection_id} is not in room {room_id}")]
    NotInRoom {
        connection_id: ConnectionId,
        room_id: RoomId,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("outbound queue of {0} is full")]
    Lagging(ConnectionId),
    #[error("connection {0} is closed")]
    Closed(ConnectionId),
    #[error("no outbound queue for {0}")]
    Unknown(ConnectionId),
}
