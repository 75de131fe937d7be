use serde::Serialize;
use system::RoomId;
use tokio::sync::oneshot::Sender;

#[derive(Debug)]
pub enum AdminCommand {
    ListRooms {
        tx: Sender<Vec<RoomSummary>>,
    },
    DescribeRoom {
        room_id: RoomId,
        tx: Sender<Option<RoomDescription>>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    pub room_id: RoomId,
    pub users: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomDescription {
    pub room_id: RoomId,
    pub users: usize,
    pub document: String,
}
