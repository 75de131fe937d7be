use std::time::Instant;

use actix::{Actor, ActorContext, AsyncContext, Handler, Message, Running, StreamHandler};
use actix_http::ws::Item;
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use actix_web_actors::ws::{CloseCode, CloseReason};

use system::uuid::Uuid;
use system::{ClientMessage, ConnectionId, ServerMessage};

use crate::config::ConnectionSettings;
use crate::connection_tx_storage::ConnectionTx;
use crate::server::{ServerCommand, ServerTx};

#[derive(Debug)]
pub enum ConnectionCommand {
    Connect {
        connection_id: ConnectionId,
        tx: ConnectionTx,
    },
    Disconnect {
        from: ConnectionId,
    },
    Message {
        from: ConnectionId,
        message: ClientMessage,
    },
}

#[derive(Message)]
#[rtype(result = "()")]
enum ConnectionActorMessage {
    Outgoing(ServerMessage),
    /// The relay dropped this connection's queue.
    Closed,
}

/// A message arriving in continuation frames.
enum Fragments {
    Text(Vec<u8>),
    /// Binary or oversized; the rest of it is dropped.
    Skipped,
}

struct ConnectionActor {
    connection_id: ConnectionId,
    srv_tx: ServerTx,
    settings: ConnectionSettings,
    last_heartbeat: Instant,
    fragments: Option<Fragments>,
}

impl ConnectionActor {
    fn new(srv_tx: ServerTx, settings: ConnectionSettings) -> Self {
        Self {
            connection_id: Uuid::new_v4(),
            srv_tx,
            settings,
            last_heartbeat: Instant::now(),
            fragments: None,
        }
    }

    fn handle_text(&mut self, text: &str, ctx: &mut ws::WebsocketContext<Self>) {
        match ClientMessage::from_json(text) {
            Ok(message) => {
                log::debug!("Ingress {:?}", message);
                self.send_to_server(
                    ConnectionCommand::Message {
                        from: self.connection_id,
                        message,
                    },
                    ctx,
                );
            }
            Err(err) => {
                log::warn!("Dropped event from {}: {}", self.connection_id, err);
            }
        }
    }

    fn handle_fragment(&mut self, item: Item, ctx: &mut ws::WebsocketContext<Self>) {
        let (data, last) = match item {
            Item::FirstText(data) => {
                self.fragments = Some(Fragments::Text(Vec::with_capacity(data.len())));
                (data, false)
            }
            Item::FirstBinary(_) => {
                log::warn!("Dropped fragmented binary frame from {}", self.connection_id);
                self.fragments = Some(Fragments::Skipped);
                return;
            }
            Item::Continue(data) => (data, false),
            Item::Last(data) => (data, true),
        };

        let max_frame_bytes = self.settings.max_frame_bytes;
        match self.fragments.as_mut() {
            Some(Fragments::Text(buffer)) => {
                if buffer.len() + data.len() > max_frame_bytes {
                    log::warn!(
                        "Dropped event from {}: larger than {} bytes",
                        self.connection_id,
                        max_frame_bytes
                    );
                    self.fragments = Some(Fragments::Skipped);
                } else {
                    buffer.extend_from_slice(&data);
                }
            }
            Some(Fragments::Skipped) => (),
            None => {
                log::warn!("Continuation frame without a start from {}", self.connection_id);
                return;
            }
        }

        if !last {
            return;
        }
        if let Some(Fragments::Text(buffer)) = self.fragments.take() {
            match String::from_utf8(buffer) {
                Ok(text) => self.handle_text(&text, ctx),
                Err(err) => log::warn!("Dropped event from {}: {}", self.connection_id, err),
            }
        }
    }

    fn send_to_server(&self, command: ConnectionCommand, ctx: &mut ws::WebsocketContext<Self>) {
        if self.srv_tx.send(ServerCommand::Connection(command)).is_err() {
            log::error!("Relay is gone, closing connection {}", self.connection_id);
            ctx.stop();
        }
    }

    fn heartbeat(&self, ctx: &mut ws::WebsocketContext<Self>) {
        let client_timeout = self.settings.client_timeout;
        ctx.run_interval(self.settings.heartbeat_interval, move |act, ctx| {
            if Instant::now().duration_since(act.last_heartbeat) > client_timeout {
                log::info!("Connection {} timed out", act.connection_id);
                ctx.stop();
                return;
            }
            ctx.ping(b"");
        });
    }
}

impl Actor for ConnectionActor {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        self.heartbeat(ctx);

        let (tx, mut rx) = tokio::sync::mpsc::channel::<ServerMessage>(self.settings.outbound_queue);
        self.send_to_server(
            ConnectionCommand::Connect {
                connection_id: self.connection_id,
                tx,
            },
            ctx,
        );

        let addr = ctx.address().recipient();
        let connection_id = self.connection_id;

        tokio::spawn(async move {
            log::debug!("connection {} pump - started", connection_id);
            while let Some(msg) = rx.recv().await {
                addr.do_send(ConnectionActorMessage::Outgoing(msg));
            }
            addr.do_send(ConnectionActorMessage::Closed);
            log::debug!("connection {} pump - terminated", connection_id);
        });
    }

    fn stopping(&mut self, _: &mut Self::Context) -> Running {
        // the relay ignores a second disconnect for the same id
        let _ = self
            .srv_tx
            .send(ServerCommand::Connection(ConnectionCommand::Disconnect {
                from: self.connection_id,
            }));
        Running::Stop
    }
}

/// Ingress
impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for ConnectionActor {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        let msg = match msg {
            Ok(msg) => msg,
            Err(err) => {
                log::warn!("Protocol error on {}: {}", self.connection_id, err);
                ctx.stop();
                return;
            }
        };
        match msg {
            ws::Message::Ping(msg) => {
                self.last_heartbeat = Instant::now();
                ctx.pong(&msg);
            }
            ws::Message::Pong(_) => {
                self.last_heartbeat = Instant::now();
            }
            ws::Message::Text(text) => {
                self.last_heartbeat = Instant::now();
                self.handle_text(&text, ctx);
            }
            ws::Message::Continuation(item) => {
                self.last_heartbeat = Instant::now();
                self.handle_fragment(item, ctx);
            }
            ws::Message::Binary(bin) => {
                log::warn!(
                    "Dropped binary frame from {} ({} bytes)",
                    self.connection_id,
                    bin.len()
                );
            }
            ws::Message::Close(reason) => {
                ctx.close(reason);
                ctx.stop();
            }
            ws::Message::Nop => (),
        }
    }
}

/// Egress
impl Handler<ConnectionActorMessage> for ConnectionActor {
    type Result = ();

    fn handle(
        &mut self,
        msg: ConnectionActorMessage,
        ctx: &mut ws::WebsocketContext<Self>,
    ) -> Self::Result {
        match msg {
            ConnectionActorMessage::Outgoing(message) => match message.to_json() {
                Ok(json) => {
                    log::debug!("Egress {}", json);
                    ctx.text(json);
                }
                Err(err) => log::error!("Cannot encode {:?}: {}", message, err),
            },
            ConnectionActorMessage::Closed => {
                ctx.close(Some(CloseReason {
                    code: CloseCode::Away,
                    description: Some("dropped by relay".into()),
                }));
                ctx.stop();
            }
        }
    }
}

pub async fn ws_index(
    req: HttpRequest,
    stream: web::Payload,
    srv_tx: web::Data<ServerTx>,
    settings: web::Data<ConnectionSettings>,
) -> Result<HttpResponse, Error> {
    let settings = *settings.get_ref();
    ws::WsResponseBuilder::new(
        ConnectionActor::new(srv_tx.get_ref().clone(), settings),
        &req,
        stream,
    )
    .frame_size(settings.max_frame_bytes)
    .start()
}
