pub extern crate actix_web;

mod admin;
pub mod config;
pub mod connection;
mod connection_tx_storage;
pub mod error;
pub mod handlers;
pub mod relay;
mod room;
pub mod room_registry;
pub mod server;
mod session;

pub use admin::{AdminCommand, RoomDescription, RoomSummary};
