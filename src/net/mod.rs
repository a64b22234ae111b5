//! Networking: relay server and client session.

pub mod client;
mod conn;
pub mod server;

pub use client::{ClientConfig, Session, SessionState};
pub use server::{run_server, ServerConfig};
