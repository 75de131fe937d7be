use crate::error::DeliveryError;
use std::collections::HashMap;
use system::{ConnectionId, ServerMessage};
use tokio::sync::mpsc::error::TrySendError;

/// Bounded per-connection outbound queue.
pub type ConnectionTx = tokio::sync::mpsc::Sender<ServerMessage>;

pub struct ConnectionTxStorage {
    connection_txs: HashMap<ConnectionId, ConnectionTx>,
}

impl ConnectionTxStorage {
    pub fn new() -> Self {
        Self {
            connection_txs: HashMap::new(),
        }
    }

    pub fn insert(&mut self, connection_id: ConnectionId, tx: ConnectionTx) {
        self.connection_txs.insert(connection_id, tx);
    }

    /// Never waits: a queue that cannot take the message is reported, not awaited.
    pub fn send(&self, to: &ConnectionId, message: ServerMessage) -> Result<(), DeliveryError> {
        let tx = self
            .connection_txs
            .get(to)
            .ok_or(DeliveryError::Unknown(*to))?;
        tx.try_send(message).map_err(|err| match err {
            TrySendError::Full(_) => DeliveryError::Lagging(*to),
            TrySendError::Closed(_) => DeliveryError::Closed(*to),
        })
    }

    /// Dropping the sender closes the connection's socket.
    pub fn remove(&mut self, connection_id: &ConnectionId) -> Option<ConnectionTx> {
        self.connection_txs.remove(connection_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use system::uuid::Uuid;
    use tokio::sync::mpsc::channel;

    #[test]
    fn it_reports_full_and_closed_queues() {
        let mut storage = ConnectionTxStorage::new();
        let id = Uuid::new_v4();
        let (tx, mut rx) = channel(1);
        storage.insert(id, tx);

        let message = ServerMessage::TextUpdate("x".into());
        assert_eq!(storage.send(&id, message.clone()), Ok(()));
        assert_eq!(
            storage.send(&id, message.clone()),
            Err(DeliveryError::Lagging(id))
        );
        assert_eq!(rx.try_recv().ok(), Some(message.clone()));

        drop(rx);
        assert_eq!(storage.send(&id, message.clone()), Err(DeliveryError::Closed(id)));

        let stranger = Uuid::new_v4();
        assert_eq!(
            storage.send(&stranger, message),
            Err(DeliveryError::Unknown(stranger))
        );
    }
}
