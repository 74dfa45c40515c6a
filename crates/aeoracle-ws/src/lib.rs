//! aeoracle-ws — WebSocket channel to an æternity node.
//!
//! # Features
//! - One background task owns the socket
//! - Per-frame send acknowledgement
//! - Open/close notifications delivered in order with inbound frames

pub mod client;

pub use client::{WsChannel, WsClientConfig};
