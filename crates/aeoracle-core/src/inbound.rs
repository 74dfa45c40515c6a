//! Decoding of messages pushed by the node.
//!
//! Inbound frames carry `origin` and `action` keys. Known combinations map to
//! an [`InboundEvent`] variant; anything else is passed through as
//! [`InboundEvent::RawMessage`] so newer node versions do not break clients.

use serde_json::{Map, Value};

use crate::error::DecodeError;

/// A typed inbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    /// The node accepted an oracle registration.
    RegisterAck { oracle_id: String },
    /// The node accepted a query we posted.
    QueryNotice { query_id: String },
    /// A subscription was acknowledged.
    SubscribedNotice { subscribed_to: Value },
    /// A query was posted to an oracle we subscribed to.
    NewQuery { payload: Value },
    /// A query we subscribed to received its response.
    NewResponse { response: Value },
    /// The node mined a block.
    MinedBlock,
    /// Unrecognised message, forwarded untouched.
    RawMessage { raw: String },
}

impl InboundEvent {
    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::RegisterAck { .. } => "register_ack",
            Self::QueryNotice { .. } => "query_notice",
            Self::SubscribedNotice { .. } => "subscribed_notice",
            Self::NewQuery { .. } => "new_query",
            Self::NewResponse { .. } => "new_response",
            Self::MinedBlock => "mined_block",
            Self::RawMessage { .. } => "raw_message",
        }
    }
}

fn payload_field<'a>(
    obj: &'a Map<String, Value>,
    key: &'static str,
) -> Result<&'a Value, DecodeError> {
    obj.get("payload")
        .and_then(|p| p.get(key))
        .ok_or(DecodeError::MissingField(key))
}

fn payload_str(obj: &Map<String, Value>, key: &'static str) -> Result<String, DecodeError> {
    payload_field(obj, key)?
        .as_str()
        .map(str::to_owned)
        .ok_or(DecodeError::MissingField(key))
}

/// Decode one raw inbound frame.
pub fn decode(raw: &str) -> Result<InboundEvent, DecodeError> {
    let value: Value = serde_json::from_str(raw)?;
    let obj = value.as_object().ok_or(DecodeError::NotAnObject)?;
    let action = obj
        .get("action")
        .and_then(Value::as_str)
        .ok_or(DecodeError::MissingField("action"))?;
    let origin = obj.get("origin").and_then(Value::as_str);

    let event = match (origin, action) {
        (_, "mined_block") => InboundEvent::MinedBlock,
        (Some("oracle"), "register") => InboundEvent::RegisterAck {
            oracle_id: payload_str(obj, "oracle_id")?,
        },
        (Some("oracle"), "query") => InboundEvent::QueryNotice {
            query_id: payload_str(obj, "query_id")?,
        },
        (Some("oracle"), "subscribe") => InboundEvent::SubscribedNotice {
            subscribed_to: payload_field(obj, "subscribed_to")?.clone(),
        },
        (Some("node"), "new_oracle_query") => InboundEvent::NewQuery {
            payload: obj
                .get("payload")
                .cloned()
                .ok_or(DecodeError::MissingField("payload"))?,
        },
        (Some("node"), "new_oracle_response") => InboundEvent::NewResponse {
            response: payload_field(obj, "response")?.clone(),
        },
        _ => InboundEvent::RawMessage {
            raw: raw.to_owned(),
        },
    };
    Ok(event)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn register_ack() {
        let raw = json!({
            "origin": "oracle",
            "action": "register",
            "payload": {"result": "ok", "oracle_id": "ok_2a1j2Mk9"}
        })
        .to_string();
        assert_eq!(
            decode(&raw).unwrap(),
            InboundEvent::RegisterAck {
                oracle_id: "ok_2a1j2Mk9".into()
            }
        );
    }

    #[test]
    fn oracle_notices() {
        let query = json!({"origin": "oracle", "action": "query", "payload": {"query_id": "oq_1"}});
        assert_eq!(
            decode(&query.to_string()).unwrap(),
            InboundEvent::QueryNotice { query_id: "oq_1".into() }
        );

        let sub = json!({
            "origin": "oracle",
            "action": "subscribe",
            "payload": {"result": "ok", "subscribed_to": {"type": "query", "oracle_id": "ok_1"}}
        });
        assert_eq!(
            decode(&sub.to_string()).unwrap(),
            InboundEvent::SubscribedNotice {
                subscribed_to: json!({"type": "query", "oracle_id": "ok_1"})
            }
        );
    }

    #[test]
    fn node_pushes() {
        let payload = json!({"query_id": "oq_7", "query": "statement-3", "sender": "ak_x"});
        let q = json!({"origin": "node", "action": "new_oracle_query", "payload": payload.clone()});
        assert_eq!(
            decode(&q.to_string()).unwrap(),
            InboundEvent::NewQuery { payload }
        );

        let r = json!({
            "origin": "node",
            "action": "new_oracle_response",
            "payload": {"query_id": "oq_7", "response": "{\"yes\":1}"}
        });
        assert_eq!(
            decode(&r.to_string()).unwrap(),
            InboundEvent::NewResponse { response: json!("{\"yes\":1}") }
        );
    }

    #[test]
    fn mined_block_from_any_origin() {
        for origin in [json!("chain"), json!("node"), Value::Null] {
            let raw = json!({"origin": origin, "action": "mined_block", "payload": {"height": 9}});
            assert_eq!(decode(&raw.to_string()).unwrap(), InboundEvent::MinedBlock);
        }
        assert_eq!(
            decode(r#"{"action":"mined_block"}"#).unwrap(),
            InboundEvent::MinedBlock
        );
    }

    #[test]
    fn unknown_messages_pass_through() {
        let raw = r#"{"origin":"chain","action":"new_tx","payload":{}}"#;
        assert_eq!(
            decode(raw).unwrap(),
            InboundEvent::RawMessage { raw: raw.into() }
        );
        // Known action under an unexpected origin is not interpreted.
        let raw = r#"{"origin":"node","action":"register","payload":{"oracle_id":"ok_1"}}"#;
        assert!(matches!(decode(raw).unwrap(), InboundEvent::RawMessage { .. }));
    }

    #[test]
    fn malformed_messages_are_errors() {
        assert!(matches!(decode("not json"), Err(DecodeError::Json(_))));
        assert_eq!(decode("[1,2]"), Err(DecodeError::NotAnObject));
        assert_eq!(
            decode(r#"{"origin":"oracle"}"#),
            Err(DecodeError::MissingField("action"))
        );
        assert_eq!(
            decode(r#"{"origin":"oracle","action":"register","payload":{}}"#),
            Err(DecodeError::MissingField("oracle_id"))
        );
        assert_eq!(
            decode(r#"{"origin":"oracle","action":"query","payload":{"query_id":5}}"#),
            Err(DecodeError::MissingField("query_id"))
        );
        assert_eq!(
            decode(r#"{"origin":"node","action":"new_oracle_query"}"#),
            Err(DecodeError::MissingField("payload"))
        );
        assert_eq!(
            decode(r#"{"origin":"node","action":"new_oracle_response","payload":{}}"#),
            Err(DecodeError::MissingField("response"))
        );
    }
}
