pub extern crate serde;
pub extern crate serde_json;
pub extern crate uuid;

mod editor_buffer;
mod message;
mod sync_client;
mod traits;
mod types;

pub use editor_buffer::EditorBuffer;
pub use message::{ClientMessage, MessageError, RoomMetrics, ServerMessage, TextChange};
pub use sync_client::{
    ConnectionStatus, EchoState, LocalChange, OutgoingEdit, RemoteApply, SyncClient, SyncTicket,
    SYNC_INDICATOR_DELAY,
};
pub use traits::DocumentView;
pub use types::{ConnectionId, RoomId, RoomIdError, LOBBY};
