//! The I/O seams: a bidirectional channel and a chain height source.

use async_trait::async_trait;

use crate::error::TransportError;

/// Notifications produced by a [`ChannelTransport`], in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// The channel is established.
    Opened,
    /// A text frame arrived.
    Message(String),
    /// The channel is gone. No further events follow.
    Closed,
}

/// Outbound half of the node channel.
///
/// The inbound half is an `mpsc` receiver of [`ChannelEvent`] handed out by
/// the transport's constructor.
///
/// # Object Safety
/// The trait is object-safe and can be stored as `Arc<dyn ChannelTransport>`.
#[async_trait]
pub trait ChannelTransport: Send + Sync + 'static {
    /// Send one text frame. Resolves once the frame was written (or failed).
    async fn send(&self, text: String) -> Result<(), TransportError>;

    /// Ask the transport to close the channel. A `Closed` event follows.
    fn close(&self);

    /// The transport's endpoint.
    fn url(&self) -> &str;
}

/// Something that can report the current chain height.
#[async_trait]
pub trait HeightSource: Send + Sync + 'static {
    async fn block_height(&self) -> Result<u64, TransportError>;

    fn url(&self) -> &str;
}
