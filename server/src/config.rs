use actix_cors::Cors;
use clap::Parser;
use std::time::Duration;

pub const DEFAULT_MAX_FRAME_BYTES: usize = 16 * 1024 * 1024;

#[derive(Debug, Clone, Parser)]
#[command(name = "deepdrop-server", about = "Room relay for shared plain-text documents")]
pub struct Config {
    /// Address the HTTP/WebSocket server binds to.
    #[arg(long, env = "DEEPDROP_BIND", default_value = "127.0.0.1:5000")]
    pub bind: String,

    /// Messages buffered per connection before it is dropped as too slow.
    #[arg(long, env = "DEEPDROP_OUTBOUND_QUEUE", default_value_t = 64)]
    pub outbound_queue: usize,

    /// Document a room starts with on its first join.
    #[arg(long, env = "DEEPDROP_INITIAL_DOCUMENT", default_value_t = String::new())]
    pub initial_document: String,

    #[arg(long, env = "DEEPDROP_HEARTBEAT_SECS", default_value_t = 5)]
    pub heartbeat_secs: u64,

    /// Sockets silent for longer than this are closed.
    #[arg(long, env = "DEEPDROP_CLIENT_TIMEOUT_SECS", default_value_t = 15)]
    pub client_timeout_secs: u64,

    /// Largest inbound event, whether sent in one frame or in fragments.
    /// Every edit carries the whole document, so this bounds document size.
    #[arg(long, env = "DEEPDROP_MAX_FRAME_BYTES", default_value_t = DEFAULT_MAX_FRAME_BYTES)]
    pub max_frame_bytes: usize,

    /// Origins allowed by CORS. Any origin is accepted when empty.
    #[arg(long, env = "DEEPDROP_ALLOWED_ORIGINS", value_delimiter = ',')]
    pub allowed_origins: Vec<String>,
}

impl Config {
    pub fn connection_settings(&self) -> ConnectionSettings {
        ConnectionSettings {
            outbound_queue: self.outbound_queue.max(1),
            heartbeat_interval: Duration::from_secs(self.heartbeat_secs.max(1)),
            client_timeout: Duration::from_secs(self.client_timeout_secs.max(1)),
            max_frame_bytes: self.max_frame_bytes.max(1024),
        }
    }

    pub fn cors(&self) -> Cors {
        if self.allowed_origins.is_empty() {
            return Cors::permissive();
        }
        self.allowed_origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
            .allow_any_method()
            .allow_any_header()
    }
}

/// What every WebSocket connection needs to know.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionSettings {
    pub outbound_queue: usize,
    pub heartbeat_interval: Duration,
    pub client_timeout: Duration,
    pub max_frame_bytes: usize,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            outbound_queue: 64,
            heartbeat_interval: Duration::from_secs(5),
            client_timeout: Duration::from_secs(15),
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
        }
    }
}
