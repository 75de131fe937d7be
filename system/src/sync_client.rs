use crate::message::{ClientMessage, RoomMetrics, ServerMessage, TextChange};
use crate::traits::DocumentView;
use crate::types::{RoomId, RoomIdError};
use std::time::Duration;

/// How long the host keeps the "syncing" indicator up after a local edit.
pub const SYNC_INDICATOR_DELAY: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EchoState {
    Idle,
    /// A remote snapshot was written into the view; the next local-change
    /// notification is its echo.
    AwaitingSelfEcho,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Offline,
    Live,
}

/// Handed out per forwarded edit. Only the latest ticket clears the indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncTicket(u32);

impl SyncTicket {
    pub fn value(&self) -> u32 {
        self.0
    }

    pub fn from_value(value: u32) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingEdit {
    pub message: ClientMessage,
    pub ticket: SyncTicket,
}

/// What the host does with a change notification of its view.
#[derive(Debug, Clone, PartialEq)]
pub enum LocalChange {
    /// A genuine edit, to be sent.
    Forward(OutgoingEdit),
    /// The echo of a remote snapshot. Nothing to send.
    Echo,
    /// The echo arrived while a newer remote snapshot was held back. The host
    /// writes this text into the view; the notification that follows is
    /// suppressed in turn.
    Apply(String),
}

impl LocalChange {
    pub fn into_edit(self) -> Option<OutgoingEdit> {
        match self {
            LocalChange::Forward(edit) => Some(edit),
            LocalChange::Echo | LocalChange::Apply(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteApply {
    Applied,
    Unchanged,
    /// No view was mounted.
    Discarded,
    /// The previous snapshot's echo is still outstanding; this one is handed
    /// back through [`LocalChange::Apply`] once it is observed.
    Deferred,
}

/// Keeps one local document view converged with its room.
#[derive(Debug)]
pub struct SyncClient {
    room_id: RoomId,
    echo: EchoState,
    status: ConnectionStatus,
    participant_count: usize,
    sync_generation: u32,
    syncing: bool,
    /// Newest remote snapshot received while awaiting an echo.
    deferred: Option<String>,
}

impl SyncClient {
    pub fn new(room_id: RoomId) -> Self {
        Self {
            room_id,
            echo: EchoState::Idle,
            status: ConnectionStatus::Offline,
            participant_count: 1,
            sync_generation: 0,
            syncing: false,
            deferred: None,
        }
    }

    pub fn from_path(path: &str) -> Result<Self, RoomIdError> {
        RoomId::from_path(path).map(Self::new)
    }

    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    pub fn echo_state(&self) -> EchoState {
        self.echo
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn participant_count(&self) -> usize {
        self.participant_count
    }

    pub fn is_syncing(&self) -> bool {
        self.syncing
    }

    /// Every (re)connect is a new session: membership has to be registered again.
    pub fn on_connected(&mut self) -> ClientMessage {
        log::info!("Connected, joining room {}", self.room_id);
        self.status = ConnectionStatus::Live;
        self.echo = EchoState::Idle;
        self.deferred = None;
        self.join_message()
    }

    pub fn on_disconnected(&mut self) {
        log::warn!("Connection lost, room {} is offline", self.room_id);
        self.status = ConnectionStatus::Offline;
    }

    /// Moves to another room. The returned join makes the server drop the
    /// previous membership.
    pub fn switch_room(&mut self, path: &str) -> Result<ClientMessage, RoomIdError> {
        let room_id = RoomId::from_path(path)?;
        log::info!("Switching room {} -> {}", self.room_id, room_id);
        self.room_id = room_id;
        self.echo = EchoState::Idle;
        self.deferred = None;
        self.participant_count = 1;
        Ok(self.join_message())
    }

    /// Called for every change notification of the widget, whatever caused it.
    pub fn on_local_change(&mut self, text: &str) -> LocalChange {
        match self.echo {
            EchoState::AwaitingSelfEcho => match self.deferred.take() {
                Some(next) if next != text => {
                    log::trace!("Echo observed, releasing deferred snapshot");
                    LocalChange::Apply(next)
                }
                _ => {
                    log::trace!("Suppressed echo of a remote snapshot");
                    self.echo = EchoState::Idle;
                    LocalChange::Echo
                }
            },
            EchoState::Idle => {
                self.sync_generation = self.sync_generation.wrapping_add(1);
                self.syncing = true;
                LocalChange::Forward(OutgoingEdit {
                    message: ClientMessage::TextChange(TextChange {
                        room_id: self.room_id.clone(),
                        text: text.to_owned(),
                    }),
                    ticket: SyncTicket(self.sync_generation),
                })
            }
        }
    }

    /// Clears the indicator unless a newer edit was forwarded since `ticket`.
    pub fn finish_sync(&mut self, ticket: SyncTicket) {
        if ticket.0 == self.sync_generation {
            self.syncing = false;
        }
    }

    pub fn on_text_update(&mut self, view: Option<&mut dyn DocumentView>, text: &str) -> RemoteApply {
        let view = match view {
            Some(view) => view,
            None => {
                log::debug!("No document view mounted, dropping remote snapshot");
                return RemoteApply::Discarded;
            }
        };
        if self.echo == EchoState::AwaitingSelfEcho {
            log::debug!("Previous echo outstanding, deferring remote snapshot");
            self.deferred = Some(text.to_owned());
            return RemoteApply::Deferred;
        }
        if view.text() == text {
            return RemoteApply::Unchanged;
        }
        self.echo = EchoState::AwaitingSelfEcho;
        view.replace_text(text);
        RemoteApply::Applied
    }

    pub fn on_room_metrics(&mut self, metrics: RoomMetrics) {
        self.participant_count = metrics.users;
    }

    /// Returns the outcome of a `text-update`; `None` for other events.
    pub fn handle_server_message(
        &mut self,
        message: ServerMessage,
        view: Option<&mut dyn DocumentView>,
    ) -> Option<RemoteApply> {
        match message {
            ServerMessage::TextUpdate(text) => Some(self.on_text_update(view, &text)),
            ServerMessage::RoomMetrics(metrics) => {
                self.on_room_metrics(metrics);
                None
            }
        }
    }

    fn join_message(&self) -> ClientMessage {
        ClientMessage::JoinRoom(self.room_id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EditorBuffer;

    fn client() -> SyncClient {
        let mut client = SyncClient::from_path("/abc").unwrap();
        client.on_connected();
        client
    }

    fn sent_text(change: LocalChange) -> Option<String> {
        change.into_edit().map(|edit| match edit.message {
            ClientMessage::TextChange(change) => change.text,
            other => panic!("unexpected message {:?}", other),
        })
    }

    #[test]
    fn it_joins_its_room_on_every_connect() {
        let mut client = SyncClient::from_path("/abc").unwrap();
        assert_eq!(client.status(), ConnectionStatus::Offline);

        let join = client.on_connected();
        assert_eq!(join, ClientMessage::JoinRoom("abc".parse().unwrap()));
        assert_eq!(client.status(), ConnectionStatus::Live);

        client.on_disconnected();
        assert_eq!(client.status(), ConnectionStatus::Offline);
        assert_eq!(client.on_connected(), join);
    }

    #[test]
    fn it_forwards_genuine_edits() {
        let mut client = client();
        let mut view = EditorBuffer::new("");
        let text = view.edit("hello").to_owned();
        assert_eq!(sent_text(client.on_local_change(&text)), Some("hello".into()));
        assert!(client.is_syncing());
    }

    #[test]
    fn it_suppresses_exactly_one_echo() {
        let mut client = client();
        let mut view = EditorBuffer::new("");

        let outcome = client.on_text_update(Some(&mut view), "remote");
        assert_eq!(outcome, RemoteApply::Applied);
        assert_eq!(view.text(), "remote");
        assert_eq!(client.echo_state(), EchoState::AwaitingSelfEcho);

        // the widget reports the swap it just performed
        assert_eq!(client.on_local_change("remote"), LocalChange::Echo);
        assert_eq!(client.echo_state(), EchoState::Idle);

        let text = view.edit("remote!").to_owned();
        assert_eq!(sent_text(client.on_local_change(&text)), Some("remote!".into()));
        let text = view.edit("remote!!").to_owned();
        assert_eq!(sent_text(client.on_local_change(&text)), Some("remote!!".into()));
    }

    #[test]
    fn it_ignores_identical_snapshots() {
        let mut client = client();
        let mut view = EditorBuffer::new("same");

        let outcome = client.on_text_update(Some(&mut view), "same");
        assert_eq!(outcome, RemoteApply::Unchanged);
        assert_eq!(view.replacements(), 0);
        assert_eq!(client.echo_state(), EchoState::Idle);

        // the next notification is a real edit
        assert!(sent_text(client.on_local_change("same.")).is_some());
    }

    #[test]
    fn it_discards_updates_without_a_view() {
        let mut client = client();
        assert_eq!(client.on_text_update(None, "lost"), RemoteApply::Discarded);
        assert_eq!(client.echo_state(), EchoState::Idle);
        assert!(sent_text(client.on_local_change("typed")).is_some());
    }

    #[test]
    fn it_defers_snapshots_until_the_echo_is_observed() {
        let mut client = client();
        let mut view = EditorBuffer::new("");
        assert_eq!(client.on_text_update(Some(&mut view), "one"), RemoteApply::Applied);
        assert_eq!(client.on_text_update(Some(&mut view), "two"), RemoteApply::Deferred);
        assert_eq!(client.on_text_update(Some(&mut view), "three"), RemoteApply::Deferred);
        assert_eq!(view.text(), "one");

        // echo of "one" releases only the newest held snapshot
        assert_eq!(
            client.on_local_change("one"),
            LocalChange::Apply("three".into())
        );
        assert_eq!(client.echo_state(), EchoState::AwaitingSelfEcho);
        view.replace_text("three");

        // echo of "three" is not sent back
        assert_eq!(client.on_local_change("three"), LocalChange::Echo);
        assert_eq!(client.echo_state(), EchoState::Idle);
        assert_eq!(sent_text(client.on_local_change("three!")), Some("three!".into()));
    }

    #[test]
    fn it_drops_deferred_snapshots_equal_to_the_echo() {
        let mut client = client();
        let mut view = EditorBuffer::new("");
        client.on_text_update(Some(&mut view), "one");
        client.on_text_update(Some(&mut view), "one");
        assert_eq!(client.on_local_change("one"), LocalChange::Echo);
        assert!(sent_text(client.on_local_change("one!")).is_some());
    }

    #[test]
    fn it_forgets_deferred_snapshots_on_reconnect() {
        let mut client = client();
        let mut view = EditorBuffer::new("");
        client.on_text_update(Some(&mut view), "one");
        client.on_text_update(Some(&mut view), "stale");
        client.on_disconnected();
        client.on_connected();
        assert_eq!(client.on_text_update(Some(&mut view), "fresh"), RemoteApply::Applied);
        assert_eq!(client.on_local_change("fresh"), LocalChange::Echo);
    }

    #[test]
    fn it_keeps_syncing_until_the_latest_ticket_finishes() {
        let mut client = client();
        let first = client.on_local_change("a").into_edit().unwrap().ticket;
        let second = client.on_local_change("ab").into_edit().unwrap().ticket;
        assert_ne!(first, second);

        client.finish_sync(first);
        assert!(client.is_syncing());
        client.finish_sync(second);
        assert!(!client.is_syncing());
    }

    #[test]
    fn it_tracks_participants() {
        let mut client = client();
        assert_eq!(client.participant_count(), 1);
        let outcome =
            client.handle_server_message(ServerMessage::RoomMetrics(RoomMetrics { users: 4 }), None);
        assert_eq!(outcome, None);
        assert_eq!(client.participant_count(), 4);
    }

    #[test]
    fn it_leaves_the_document_alone_on_disconnect() {
        let mut client = client();
        let mut view = EditorBuffer::new("");
        client.on_text_update(Some(&mut view), "kept");
        client.on_local_change("kept");
        client.on_disconnected();
        assert_eq!(view.text(), "kept");
        assert_eq!(view.replacements(), 1);
    }

    #[test]
    fn it_switches_rooms() {
        let mut client = client();
        let mut view = EditorBuffer::new("");
        client.on_room_metrics(RoomMetrics { users: 3 });
        client.on_text_update(Some(&mut view), "abc doc");

        let join = client.switch_room("/xyz").unwrap();
        assert_eq!(join, ClientMessage::JoinRoom("xyz".parse().unwrap()));
        assert_eq!(client.room_id().as_str(), "xyz");
        assert_eq!(client.echo_state(), EchoState::Idle);
        assert_eq!(client.participant_count(), 1);

        match client.on_local_change("typed").into_edit().unwrap().message {
            ClientMessage::TextChange(change) => assert_eq!(change.room_id.as_str(), "xyz"),
            other => panic!("unexpected message {:?}", other),
        }
        assert!(client.switch_room("nope").is_err());
    }
}
