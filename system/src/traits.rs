/// The text widget a [`SyncClient`](crate::SyncClient) reconciles.
///
/// Replacing the text is expected to make the widget fire its usual change
/// notification, which the host then reports through
/// [`SyncClient::on_local_change`](crate::SyncClient::on_local_change).
pub trait DocumentView {
    fn text(&self) -> &str;

    /// Swaps the whole buffer in one operation.
    fn replace_text(&mut self, text: &str);
}
