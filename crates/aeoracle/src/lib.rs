//! aeoracle — a persistent connection to an æternity node for oracle
//! operators and clients.
//!
//! Commands (register, query, respond, subscribe) go out as JSON envelopes
//! over a WebSocket; node pushes come back as typed [`OracleEvent`]s. Oracle
//! registration is confirmed by whichever comes first: a `mined_block` push
//! or chain height advancing past the height seen at registration time,
//! polled over HTTP.
//!
//! ```rust,no_run
//! use aeoracle::{Connection, ConnectionConfig, EventKind, OracleEvent};
//!
//! # async fn run() -> Result<(), aeoracle::ConnectionError> {
//! let builder = Connection::builder(ConnectionConfig::new("localhost", "ak_operator"));
//! let mut events = builder.events();
//! let conn = builder
//!     .on(EventKind::RegisteredOracle, |e| println!("confirmed: {e:?}"))
//!     .connect()
//!     .await?;
//!
//! while let Some(event) = events.recv().await {
//!     match event {
//!         OracleEvent::Open => {
//!             conn.register("queryFormat", "responseFormat", 4, 500, 5).await?;
//!         }
//!         OracleEvent::RegisteredOracle(id) => {
//!             conn.subscribe(&id).await?;
//!         }
//!         OracleEvent::NewQuery(q) => {
//!             if let Some(id) = q["query_id"].as_str() {
//!                 conn.respond(id, 4, "42").await?;
//!             }
//!         }
//!         OracleEvent::Close => break,
//!         _ => {}
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod bus;
pub mod config;
pub mod connection;
pub mod lifecycle;
pub mod poller;

#[cfg(test)]
mod testing;

pub use aeoracle_core::{
    decode, ChannelEvent, ChannelTransport, CodecError, ConnectionError, DecodeError, Envelope,
    EventKind, HeightSource, InboundEvent, Oracle, OracleEvent, OracleStatus, Payload,
    TransportError,
};
pub use bus::EventBus;
pub use config::ConnectionConfig;
pub use connection::{Connection, ConnectionBuilder};
pub use lifecycle::{LifecycleState, OracleLifecycle};
pub use poller::{HeightAdvanced, HeightPoller, PollGeneration, PollSignal, MIN_POLL_INTERVAL};
