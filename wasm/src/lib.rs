mod session_state;
mod utils;

use session_state::{LocalOutcome, SessionState};
use wasm_bindgen::prelude::*;

/// Browser-facing sync client. Messages cross the boundary as JSON strings.
#[wasm_bindgen]
pub struct SyncSystem {
    state: SessionState,
}

/// Result of `local_change`: a `message` to send with its `ticket`, or a
/// `replacement` for the editor, or neither.
#[wasm_bindgen(getter_with_clone)]
pub struct LocalChangeResult {
    pub message: Option<String>,
    pub ticket: u32,
    pub replacement: Option<String>,
}

#[wasm_bindgen]
impl SyncSystem {
    #[wasm_bindgen(constructor)]
    pub fn new(pathname: String) -> Result<SyncSystem, JsValue> {
        utils::set_panic_hook();
        utils::init_logging();

        SessionState::new(&pathname)
            .map(|state| SyncSystem { state })
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    #[wasm_bindgen(getter)]
    pub fn room_id(&self) -> String {
        self.state.room_id().to_owned()
    }

    #[wasm_bindgen(getter)]
    pub fn live(&self) -> bool {
        self.state.is_live()
    }

    #[wasm_bindgen(getter)]
    pub fn participant_count(&self) -> u32 {
        self.state.participant_count() as u32
    }

    #[wasm_bindgen(getter)]
    pub fn syncing(&self) -> bool {
        self.state.is_syncing()
    }

    /// Milliseconds the host should wait before calling `finish_sync`.
    pub fn sync_indicator_delay() -> u32 {
        system::SYNC_INDICATOR_DELAY.as_millis() as u32
    }

    /// Returns the `join-room` to send.
    pub fn connected(&mut self) -> Result<String, JsValue> {
        self.state.connected().map_err(to_js_error)
    }

    pub fn disconnected(&mut self) {
        self.state.disconnected();
    }

    pub fn switch_room(&mut self, pathname: String) -> Result<String, JsValue> {
        self.state
            .switch_room(&pathname)
            .map_err(|e| JsValue::from_str(&e))
    }

    /// Call from the editor's change handler. A `replacement` must be written
    /// into the editor synchronously, like a `server_message` result.
    pub fn local_change(&mut self, text: String) -> Result<LocalChangeResult, JsValue> {
        let outcome = self.state.local_change(&text).map_err(to_js_error)?;
        let result = match outcome {
            LocalOutcome::Send(edit) => LocalChangeResult {
                message: Some(edit.json),
                ticket: edit.ticket,
                replacement: None,
            },
            LocalOutcome::Nothing => LocalChangeResult {
                message: None,
                ticket: 0,
                replacement: None,
            },
            LocalOutcome::Replace(text) => LocalChangeResult {
                message: None,
                ticket: 0,
                replacement: Some(text),
            },
        };
        Ok(result)
    }

    pub fn finish_sync(&mut self, ticket: u32) {
        self.state.finish_sync(ticket);
    }

    /// Returns the full text to put into the editor, if it has to change.
    /// Apply it synchronously: the editor's change event must reach
    /// `local_change` before the next server message.
    pub fn server_message(
        &mut self,
        json: String,
        current_text: Option<String>,
    ) -> Option<String> {
        match self.state.server_message(&json, current_text) {
            Ok(replacement) => replacement,
            Err(err) => {
                log::warn!("Dropped server event: {}", err);
                None
            }
        }
    }
}

fn to_js_error(err: system::MessageError) -> JsValue {
    JsValue::from_str(&err.to_string())
}
