use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};

use crate::admin::AdminCommand;
use crate::connection::ConnectionCommand;
use crate::relay::Relay;

/// Ingress of the relay task. Unbounded so that joins and disconnects are never lost.
pub type ServerTx = UnboundedSender<ServerCommand>;

#[derive(Debug)]
pub enum ServerCommand {
    Connection(ConnectionCommand),
    Admin(AdminCommand),
}

/// Moves the relay onto its own task and returns the handle connections talk to.
pub fn spawn_server(mut relay: Relay) -> ServerTx {
    let (srv_tx, mut srv_rx) = unbounded_channel::<ServerCommand>();

    tokio::spawn(async move {
        log::info!("relay task - started");
        while let Some(command) = srv_rx.recv().await {
            relay.handle_command(command);
        }
        log::info!("relay task - terminated");
    });

    srv_tx
}
