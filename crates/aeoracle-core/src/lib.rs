//! aeoracle-core — foundation types and traits for aeoracle.
//!
//! # Overview
//!
//! aeoracle keeps a persistent WebSocket channel to an æternity node and
//! turns its JSON oracle protocol into typed events. The core crate defines:
//!
//! - [`Envelope`] — outbound wire envelopes and their builders
//! - [`InboundEvent`] / [`decode`] — typed view of messages pushed by the node
//! - [`OracleEvent`] / [`EventKind`] — events emitted to subscribers
//! - [`ChannelTransport`] / [`HeightSource`] — the two I/O seams
//! - [`error`] module — structured error types

pub mod envelope;
pub mod error;
pub mod event;
pub mod inbound;
pub mod transport;

pub use envelope::{
    Envelope, Payload, QueryTx, RegisterTx, ResponseTx, Target, Ttl, TX_VERSION,
};
pub use error::{CodecError, ConnectionError, DecodeError, TransportError};
pub use event::{EventKind, Oracle, OracleEvent, OracleStatus};
pub use inbound::{decode, InboundEvent};
pub use transport::{ChannelEvent, ChannelTransport, HeightSource};
