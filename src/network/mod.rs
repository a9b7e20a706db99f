//! Network Module
//!
//! Socket ownership and the blocking RPC client.
//!
//! ## Architecture
//! - `Transport` owns one TCP socket and its timeouts
//! - `ProtocolClient` frames calls through the codec over that socket
//! - Calls run on the caller's thread; nothing here spawns threads

mod transport;
mod client;

pub use transport::{NetScope, Transport};
pub use client::ProtocolClient;
