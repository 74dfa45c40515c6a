//! Outbound wire envelopes.
//!
//! Every command sent to the node is a JSON object of the form
//! `{"target": "oracle", "action": <action>, "payload": {...}}`. The payload
//! carries a `type` discriminator which, together with `action`, identifies
//! the command. [`Envelope`] is immutable once built; the builders return the
//! exact value that goes on the wire.

use serde::{Deserialize, Serialize};

use crate::error::{CodecError, DecodeError};

/// Transaction object version understood by the node.
pub const TX_VERSION: u8 = 1;

/// Envelope target. The node currently only routes oracle traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    Oracle,
}

/// Relative time-to-live, in blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Ttl {
    Delta(u64),
}

impl Ttl {
    /// Number of blocks.
    pub fn blocks(&self) -> u64 {
        match self {
            Self::Delta(n) => *n,
        }
    }
}

/// `OracleRegisterTxObject` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterTx {
    pub vsn: u8,
    pub account: String,
    pub query_format: String,
    pub response_format: String,
    pub query_fee: u64,
    pub ttl: Ttl,
    pub fee: u64,
}

/// `OracleQueryTxObject` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryTx {
    pub vsn: u8,
    pub oracle_pubkey: String,
    pub query_fee: u64,
    pub query_ttl: Ttl,
    pub response_ttl: Ttl,
    pub fee: u64,
    pub query: String,
}

/// `OracleResponseTxObject` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseTx {
    pub vsn: u8,
    pub query_id: String,
    pub fee: u64,
    pub response: String,
}

/// Envelope payload, discriminated by its `type` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Payload {
    #[serde(rename = "OracleRegisterTxObject")]
    Register(RegisterTx),
    #[serde(rename = "OracleQueryTxObject")]
    Query(QueryTx),
    #[serde(rename = "OracleResponseTxObject")]
    Response(ResponseTx),
    /// Subscribe to queries addressed to an oracle.
    #[serde(rename = "query")]
    SubscribeQueries { oracle_id: String },
    /// Subscribe to the response of a single query.
    #[serde(rename = "response")]
    SubscribeResponse { query_id: String },
}

impl Payload {
    /// The envelope `action` this payload travels under.
    pub fn action(&self) -> &'static str {
        match self {
            Self::Register(_) => "register",
            Self::Query(_) => "query",
            Self::Response(_) => "response",
            Self::SubscribeQueries { .. } | Self::SubscribeResponse { .. } => "subscribe",
        }
    }

    /// Transaction object version, for payloads that carry one.
    pub fn vsn(&self) -> Option<u8> {
        match self {
            Self::Register(tx) => Some(tx.vsn),
            Self::Query(tx) => Some(tx.vsn),
            Self::Response(tx) => Some(tx.vsn),
            Self::SubscribeQueries { .. } | Self::SubscribeResponse { .. } => None,
        }
    }

    /// The payload `type` discriminator.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Register(_) => "OracleRegisterTxObject",
            Self::Query(_) => "OracleQueryTxObject",
            Self::Response(_) => "OracleResponseTxObject",
            Self::SubscribeQueries { .. } => "query",
            Self::SubscribeResponse { .. } => "response",
        }
    }
}

#[derive(Serialize)]
struct WireEnvelope<'a> {
    target: Target,
    action: &'a str,
    payload: &'a Payload,
}

#[derive(Deserialize)]
struct OwnedWireEnvelope {
    target: Target,
    action: String,
    payload: Payload,
}

/// A complete outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    target: Target,
    payload: Payload,
}

impl Serialize for Envelope {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        WireEnvelope {
            target: self.target,
            action: self.payload.action(),
            payload: &self.payload,
        }
        .serialize(serializer)
    }
}

fn require(value: &str, field: &'static str) -> Result<String, CodecError> {
    if value.trim().is_empty() {
        return Err(CodecError::MissingField(field));
    }
    Ok(value.to_owned())
}

impl Envelope {
    fn oracle(payload: Payload) -> Self {
        Self {
            target: Target::Oracle,
            payload,
        }
    }

    /// Register `account` as an oracle.
    pub fn register(
        account: &str,
        query_format: &str,
        response_format: &str,
        query_fee: u64,
        ttl: u64,
        fee: u64,
    ) -> Result<Self, CodecError> {
        Ok(Self::oracle(Payload::Register(RegisterTx {
            vsn: TX_VERSION,
            account: require(account, "account")?,
            query_format: query_format.to_owned(),
            response_format: response_format.to_owned(),
            query_fee,
            ttl: Ttl::Delta(ttl),
            fee,
        })))
    }

    /// Post `query` to the oracle identified by `oracle_id`.
    pub fn query(
        oracle_id: &str,
        query_fee: u64,
        query_ttl: u64,
        response_ttl: u64,
        fee: u64,
        query: &str,
    ) -> Result<Self, CodecError> {
        Ok(Self::oracle(Payload::Query(QueryTx {
            vsn: TX_VERSION,
            oracle_pubkey: require(oracle_id, "oracle_id")?,
            query_fee,
            query_ttl: Ttl::Delta(query_ttl),
            response_ttl: Ttl::Delta(response_ttl),
            fee,
            query: query.to_owned(),
        })))
    }

    /// Answer the query identified by `query_id`.
    pub fn respond(query_id: &str, fee: u64, response: &str) -> Result<Self, CodecError> {
        Ok(Self::oracle(Payload::Response(ResponseTx {
            vsn: TX_VERSION,
            query_id: require(query_id, "query_id")?,
            fee,
            response: response.to_owned(),
        })))
    }

    /// Subscribe to queries posted to `oracle_id`.
    pub fn subscribe_oracle(oracle_id: &str) -> Result<Self, CodecError> {
        Ok(Self::oracle(Payload::SubscribeQueries {
            oracle_id: require(oracle_id, "oracle_id")?,
        }))
    }

    /// Subscribe to the response for `query_id`.
    pub fn subscribe_query(query_id: &str) -> Result<Self, CodecError> {
        Ok(Self::oracle(Payload::SubscribeResponse {
            query_id: require(query_id, "query_id")?,
        }))
    }

    pub fn target(&self) -> Target {
        self.target
    }

    pub fn action(&self) -> &'static str {
        self.payload.action()
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Serialize to the JSON text sent over the channel.
    pub fn to_json(&self) -> Result<String, CodecError> {
        serde_json::to_string(self).map_err(|e| CodecError::Serialize(e.to_string()))
    }

    /// Parse an outbound envelope back into its typed form.
    pub fn from_json(raw: &str) -> Result<Self, DecodeError> {
        let wire: OwnedWireEnvelope = serde_json::from_str(raw)?;
        if wire.action != wire.payload.action() {
            return Err(DecodeError::ActionMismatch {
                action: wire.action,
                payload: wire.payload.type_name().to_owned(),
            });
        }
        if let Some(found) = wire.payload.vsn().filter(|v| *v != TX_VERSION) {
            return Err(DecodeError::UnsupportedVersion {
                found,
                expected: TX_VERSION,
            });
        }
        Ok(Self {
            target: wire.target,
            payload: wire.payload,
        })
    }
}
