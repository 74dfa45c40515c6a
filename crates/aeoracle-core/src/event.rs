//! Events emitted to connection subscribers, and the oracle record they
//! describe.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Registration status of the live oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OracleStatus {
    /// Registration acknowledged, not yet on chain.
    Pending,
    /// Registration confirmed by a new block.
    Approved,
}

impl std::fmt::Display for OracleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Approved => write!(f, "approved"),
        }
    }
}

/// The oracle registered through a connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Oracle {
    pub id: String,
    pub status: OracleStatus,
}

impl Oracle {
    pub fn pending(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: OracleStatus::Pending,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == OracleStatus::Pending
    }
}

/// The fixed set of event kinds a subscriber can listen for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Open,
    Close,
    Message,
    NewBlock,
    RegisteredOracle,
    Query,
    Subscribed,
    NewQuery,
    Response,
}

impl EventKind {
    pub const ALL: [EventKind; 9] = [
        Self::Open,
        Self::Close,
        Self::Message,
        Self::NewBlock,
        Self::RegisteredOracle,
        Self::Query,
        Self::Subscribed,
        Self::NewQuery,
        Self::Response,
    ];

    /// Protocol-level event name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Close => "close",
            Self::Message => "message",
            Self::NewBlock => "newBlock",
            Self::RegisteredOracle => "registeredOracle",
            Self::Query => "query",
            Self::Subscribed => "subscribed",
            Self::NewQuery => "newQuery",
            Self::Response => "response",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// An event delivered to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum OracleEvent {
    /// The channel is open.
    Open,
    /// The channel closed.
    Close,
    /// Raw text of every inbound message that decoded.
    Message(String),
    /// Chain height advanced past the last accepted height.
    NewBlock(u64),
    /// Oracle registration confirmed. Carries the oracle id.
    RegisteredOracle(String),
    /// A query we posted was accepted. Carries the query id.
    Query(String),
    /// A subscription was acknowledged.
    Subscribed(Value),
    /// A query arrived for our oracle.
    NewQuery(Value),
    /// A response arrived for a query we subscribed to.
    Response(Value),
}

impl OracleEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Open => EventKind::Open,
            Self::Close => EventKind::Close,
            Self::Message(_) => EventKind::Message,
            Self::NewBlock(_) => EventKind::NewBlock,
            Self::RegisteredOracle(_) => EventKind::RegisteredOracle,
            Self::Query(_) => EventKind::Query,
            Self::Subscribed(_) => EventKind::Subscribed,
            Self::NewQuery(_) => EventKind::NewQuery,
            Self::Response(_) => EventKind::Response,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_names_match_protocol() {
        let names: Vec<_> = EventKind::ALL.iter().map(EventKind::name).collect();
        assert_eq!(
            names,
            [
                "open",
                "close",
                "message",
                "newBlock",
                "registeredOracle",
                "query",
                "subscribed",
                "newQuery",
                "response"
            ]
        );
    }

    #[test]
    fn event_kind_mapping() {
        assert_eq!(OracleEvent::NewBlock(3).kind(), EventKind::NewBlock);
        assert_eq!(
            OracleEvent::RegisteredOracle("ok_1".into()).kind(),
            EventKind::RegisteredOracle
        );
        assert_eq!(OracleEvent::Close.kind().to_string(), "close");
    }
}
