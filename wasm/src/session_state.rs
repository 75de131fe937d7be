use system::{
    ConnectionStatus, EditorBuffer, LocalChange, MessageError, RemoteApply, RoomIdError,
    ServerMessage, SyncClient, SyncTicket,
};

/// JSON-in, JSON-out wrapper around [`SyncClient`] for the browser host.
pub struct SessionState {
    client: SyncClient,
}

/// A `text-change` ready for the socket, and the ticket that ends its indicator.
#[derive(Debug, PartialEq)]
pub struct PendingEdit {
    pub json: String,
    pub ticket: u32,
}

/// Answer to a change notification of the editor.
#[derive(Debug, PartialEq)]
pub enum LocalOutcome {
    Send(PendingEdit),
    Nothing,
    /// Put this text into the editor.
    Replace(String),
}

impl SessionState {
    pub fn new(pathname: &str) -> Result<Self, RoomIdError> {
        SyncClient::from_path(pathname).map(|client| Self { client })
    }

    pub fn room_id(&self) -> &str {
        self.client.room_id().as_str()
    }

    pub fn is_live(&self) -> bool {
        self.client.status() == ConnectionStatus::Live
    }

    pub fn participant_count(&self) -> usize {
        self.client.participant_count()
    }

    pub fn is_syncing(&self) -> bool {
        self.client.is_syncing()
    }

    pub fn connected(&mut self) -> Result<String, MessageError> {
        self.client.on_connected().to_json()
    }

    pub fn disconnected(&mut self) {
        self.client.on_disconnected();
    }

    pub fn switch_room(&mut self, pathname: &str) -> Result<String, String> {
        let join = self.client.switch_room(pathname).map_err(|e| e.to_string())?;
        join.to_json().map_err(|e| e.to_string())
    }

    pub fn local_change(&mut self, text: &str) -> Result<LocalOutcome, MessageError> {
        match self.client.on_local_change(text) {
            LocalChange::Forward(edit) => Ok(LocalOutcome::Send(PendingEdit {
                json: edit.message.to_json()?,
                ticket: edit.ticket.value(),
            })),
            LocalChange::Echo => Ok(LocalOutcome::Nothing),
            LocalChange::Apply(text) => Ok(LocalOutcome::Replace(text)),
        }
    }

    pub fn finish_sync(&mut self, ticket: u32) {
        self.client.finish_sync(SyncTicket::from_value(ticket));
    }

    /// Returns the text the editor must be set to, if any. `current_text` is
    /// `None` while the editor is not mounted.
    pub fn server_message(
        &mut self,
        json: &str,
        current_text: Option<String>,
    ) -> Result<Option<String>, MessageError> {
        let message = ServerMessage::from_json(json)?;
        let mut editor = current_text.map(EditorBuffer::new);
        let outcome = self.client.handle_server_message(
            message,
            editor.as_mut().map(|e| e as &mut dyn system::DocumentView),
        );
        match (outcome, editor) {
            (Some(RemoteApply::Applied), Some(editor)) => Ok(Some(editor.into_text())),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_hands_replacements_back_to_the_host() {
        let mut state = SessionState::new("/abc").unwrap();
        assert_eq!(
            state.connected().unwrap(),
            r#"{"event":"join-room","data":"abc"}"#
        );

        let replacement = state
            .server_message(r#"{"event":"text-update","data":"remote"}"#, Some("".into()))
            .unwrap();
        assert_eq!(replacement, Some("remote".into()));

        // the editor's change event for that replacement
        assert_eq!(state.local_change("remote").unwrap(), LocalOutcome::Nothing);

        let edit = match state.local_change("remote!").unwrap() {
            LocalOutcome::Send(edit) => edit,
            other => panic!("unexpected outcome {:?}", other),
        };
        assert_eq!(
            edit.json,
            r#"{"event":"text-change","data":{"roomId":"abc","text":"remote!"}}"#
        );
        assert!(state.is_syncing());
        state.finish_sync(edit.ticket);
        assert!(!state.is_syncing());
    }

    #[test]
    fn it_skips_unmounted_and_identical_editors() {
        let mut state = SessionState::new("/").unwrap();
        assert_eq!(state.room_id(), "lobby");
        let update = r#"{"event":"text-update","data":"same"}"#;
        assert_eq!(state.server_message(update, None).unwrap(), None);
        assert_eq!(state.server_message(update, Some("same".into())).unwrap(), None);
        assert!(matches!(
            state.local_change("typed").unwrap(),
            LocalOutcome::Send(_)
        ));
    }

    #[test]
    fn it_reads_metrics_and_rejects_garbage() {
        let mut state = SessionState::new("/abc").unwrap();
        state
            .server_message(r#"{"event":"room-metrics","data":{"users":5}}"#, None)
            .unwrap();
        assert_eq!(state.participant_count(), 5);
        assert!(state.server_message("{}", None).is_err());
    }

    #[test]
    fn it_holds_back_a_second_update_until_the_editor_reports_the_first() {
        let mut state = SessionState::new("/abc").unwrap();
        state.connected().unwrap();

        let first = state
            .server_message(r#"{"event":"text-update","data":"one"}"#, Some("".into()))
            .unwrap();
        assert_eq!(first, Some("one".into()));
        let second = state
            .server_message(r#"{"event":"text-update","data":"two"}"#, Some("one".into()))
            .unwrap();
        assert_eq!(second, None);

        assert_eq!(
            state.local_change("one").unwrap(),
            LocalOutcome::Replace("two".into())
        );
        assert_eq!(state.local_change("two").unwrap(), LocalOutcome::Nothing);
    }
}
