//! Public connection surface.
//!
//! A [`Connection`] owns the channel transport and a background driver task.
//! The driver owns the [`OracleLifecycle`] and handles one input at a time:
//! channel events in arrival order, height fetch results in completion
//! order. Outbound commands are encoded here and written straight to the
//! transport.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use aeoracle_core::envelope::Envelope;
use aeoracle_core::error::ConnectionError;
use aeoracle_core::event::{EventKind, Oracle, OracleEvent};
use aeoracle_core::inbound::decode;
use aeoracle_core::transport::{ChannelEvent, ChannelTransport, HeightSource};
use aeoracle_http::HttpHeightClient;
use aeoracle_ws::WsChannel;

use crate::bus::EventBus;
use crate::config::ConnectionConfig;
use crate::lifecycle::OracleLifecycle;
use crate::poller::{HeightPoller, PollSignal};

/// Collects subscribers before any I/O starts, so no event is missed.
pub struct ConnectionBuilder {
    config: ConnectionConfig,
    bus: EventBus,
}

impl ConnectionBuilder {
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            config,
            bus: EventBus::new(),
        }
    }

    /// Call `handler` for every event of `kind`. See [`EventBus::on`].
    pub fn on<F>(self, kind: EventKind, handler: F) -> Self
    where
        F: Fn(&OracleEvent) + Send + Sync + 'static,
    {
        self.bus.on(kind, handler);
        self
    }

    /// Receive every event, starting with `Open`.
    pub fn events(&self) -> mpsc::UnboundedReceiver<OracleEvent> {
        self.bus.events()
    }

    /// Open the WebSocket channel and HTTP height client described by the config.
    pub async fn connect(self) -> Result<Connection, ConnectionError> {
        let heights = HttpHeightClient::new(self.config.http_url(), self.config.http.clone())?;
        let (channel, inbound) =
            WsChannel::connect(self.config.ws_url(), self.config.ws.clone()).await?;
        Ok(self.connect_with(Arc::new(channel), inbound, Arc::new(heights)))
    }

    /// Run over a caller-supplied transport and height source.
    ///
    /// `inbound` must yield the transport's channel events.
    pub fn connect_with(
        self,
        transport: Arc<dyn ChannelTransport>,
        inbound: mpsc::UnboundedReceiver<ChannelEvent>,
        heights: Arc<dyn HeightSource>,
    ) -> Connection {
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        let (oracle_tx, oracle_rx) = watch::channel(None);
        let poller = HeightPoller::new(heights.clone(), self.config.poll_interval, signal_tx);
        let lifecycle = OracleLifecycle::new(poller, oracle_tx);

        tracing::info!(
            channel = %transport.url(),
            heights = %heights.url(),
            account = %self.config.account,
            "starting oracle connection"
        );
        let driver = tokio::spawn(drive(lifecycle, inbound, signal_rx, self.bus.clone()));

        Connection {
            inner: Arc::new(Inner {
                config: self.config,
                transport,
                heights,
                bus: self.bus,
                oracle: oracle_rx,
                driver,
            }),
        }
    }
}

struct Inner {
    config: ConnectionConfig,
    transport: Arc<dyn ChannelTransport>,
    heights: Arc<dyn HeightSource>,
    bus: EventBus,
    oracle: watch::Receiver<Option<Oracle>>,
    driver: JoinHandle<()>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.transport.close();
    }
}

/// A live connection to a node. Cheap to clone; the channel closes when the
/// last clone is dropped.
#[derive(Clone)]
pub struct Connection {
    inner: Arc<Inner>,
}

impl Connection {
    pub fn builder(config: ConnectionConfig) -> ConnectionBuilder {
        ConnectionBuilder::new(config)
    }

    /// Connect without registering subscribers first.
    pub async fn connect(config: ConnectionConfig) -> Result<Self, ConnectionError> {
        Self::builder(config).connect().await
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.inner.config
    }

    /// Register the configured account as an oracle.
    pub async fn register(
        &self,
        query_format: &str,
        response_format: &str,
        query_fee: u64,
        ttl: u64,
        fee: u64,
    ) -> Result<Envelope, ConnectionError> {
        let envelope = Envelope::register(
            &self.inner.config.account,
            query_format,
            response_format,
            query_fee,
            ttl,
            fee,
        )?;
        self.send(envelope).await
    }

    /// Subscribe to queries posted to `oracle_id`.
    pub async fn subscribe(&self, oracle_id: &str) -> Result<Envelope, ConnectionError> {
        self.send(Envelope::subscribe_oracle(oracle_id)?).await
    }

    /// Post a query to an oracle.
    pub async fn query(
        &self,
        oracle_id: &str,
        query_fee: u64,
        query_ttl: u64,
        response_ttl: u64,
        fee: u64,
        query: &str,
    ) -> Result<Envelope, ConnectionError> {
        let envelope = Envelope::query(oracle_id, query_fee, query_ttl, response_ttl, fee, query)?;
        self.send(envelope).await
    }

    /// Subscribe to the response for `query_id`.
    pub async fn subscribe_query(&self, query_id: &str) -> Result<Envelope, ConnectionError> {
        self.send(Envelope::subscribe_query(query_id)?).await
    }

    /// Answer a query.
    pub async fn respond(
        &self,
        query_id: &str,
        fee: u64,
        response: &str,
    ) -> Result<Envelope, ConnectionError> {
        self.send(Envelope::respond(query_id, fee, response)?).await
    }

    /// Current chain height, read over HTTP.
    pub async fn block_height(&self) -> Result<u64, ConnectionError> {
        Ok(self.inner.heights.block_height().await?)
    }

    /// Call `handler` for every later event of `kind`. See [`EventBus::on`].
    pub fn on<F>(&self, kind: EventKind, handler: F)
    where
        F: Fn(&OracleEvent) + Send + Sync + 'static,
    {
        self.inner.bus.on(kind, handler);
    }

    /// Receive every later event.
    pub fn events(&self) -> mpsc::UnboundedReceiver<OracleEvent> {
        self.inner.bus.events()
    }

    /// Snapshot of the live oracle.
    pub fn oracle(&self) -> Option<Oracle> {
        self.inner.oracle.borrow().clone()
    }

    /// Ask the transport to close. A `Close` event follows.
    pub fn close(&self) {
        self.inner.transport.close();
    }

    /// `true` once the channel has closed and the driver has finished.
    pub fn is_closed(&self) -> bool {
        self.inner.driver.is_finished()
    }

    async fn send(&self, envelope: Envelope) -> Result<Envelope, ConnectionError> {
        let text = envelope.to_json()?;
        match self.inner.transport.send(text).await {
            Ok(()) => {
                tracing::debug!(action = envelope.action(), "command sent");
                Ok(envelope)
            }
            Err(e) => {
                tracing::warn!(action = envelope.action(), error = %e, "command send failed");
                Err(e.into())
            }
        }
    }
}

/// Driver task: the single consumer of channel events and poll signals.
async fn drive(
    mut lifecycle: OracleLifecycle,
    mut inbound: mpsc::UnboundedReceiver<ChannelEvent>,
    mut signals: mpsc::UnboundedReceiver<PollSignal>,
    bus: EventBus,
) {
    loop {
        tokio::select! {
            event = inbound.recv() => match event {
                Some(ChannelEvent::Opened) => bus.emit(&OracleEvent::Open),
                Some(ChannelEvent::Message(raw)) => match decode(&raw) {
                    Ok(decoded) => {
                        tracing::debug!(event = decoded.name(), "inbound message");
                        bus.emit(&OracleEvent::Message(raw));
                        for event in lifecycle.handle_inbound(decoded) {
                            bus.emit(&event);
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, data = %raw, "dropping undecodable message");
                    }
                },
                Some(ChannelEvent::Closed) | None => break,
            },
            Some(signal) = signals.recv() => {
                for event in lifecycle.handle_signal(signal) {
                    bus.emit(&event);
                }
            }
        }
    }

    lifecycle.shutdown();
    tracing::info!("oracle connection closed");
    bus.emit(&OracleEvent::Close);
}
