//! Frame codec: outbound subscription frames and inbound envelopes.
//!
//! Both directions are stateless. Outbound frames wrap a list of
//! [`SubscriptionIntent`]s with an action marker:
//!
//! ```json
//! {"action": "subscribe", "subscriptions": [{"topic": "activity", "type": "trades"}]}
//! ```
//!
//! Inbound data frames look like
//! `{"topic": ..., "type": ..., "timestamp": ..., "payload": {...}}`.
//! Frames without a `payload` key are control frames and carry no data.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::{Action, SubscriptionIntent};
use crate::error::ClientError;

/// Outbound subscribe/unsubscribe frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionFrame {
    /// Whether the streams are being added or removed.
    pub action: Action,
    /// Streams the action applies to.
    pub subscriptions: Vec<SubscriptionIntent>,
}

/// Generic inbound data frame before payload resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFrame {
    /// Topic, or empty if absent.
    pub topic: String,
    /// Type, or empty if absent.
    pub msg_type: String,
    /// Timestamp, or zero if absent.
    pub timestamp: i64,
    /// Undecoded payload object.
    pub payload: Map<String, Value>,
}

/// Encodes a subscription frame for `intents` as JSON text.
///
/// # Errors
///
/// Returns [`ClientError::Encode`] if serialization fails.
pub fn encode_subscription(
    action: Action,
    intents: &[SubscriptionIntent],
) -> Result<String, ClientError> {
    let frame = SubscriptionFrame {
        action,
        subscriptions: intents.to_vec(),
    };
    serde_json::to_string(&frame).map_err(|e| ClientError::Encode(e.to_string()))
}

/// Decodes one inbound text frame.
///
/// Returns `Ok(None)` for well-formed frames that carry no data (anything
/// that is not a JSON object with a `payload` key). Missing or mistyped
/// `topic`, `type` and `timestamp` fields are defaulted. A `timestamp`
/// may also arrive as a numeric string; integers beyond `i64` saturate.
///
/// # Errors
///
/// Returns [`ClientError::Decode`] if the text is not JSON, and
/// [`ClientError::MalformedFrame`] if `payload` is present but is not a
/// JSON object.
pub fn decode_frame(text: &str) -> Result<Option<RawFrame>, ClientError> {
    let Value::Object(mut outer) = serde_json::from_str::<Value>(text)? else {
        return Ok(None);
    };
    let Some(payload) = outer.remove("payload") else {
        return Ok(None);
    };
    let Value::Object(payload) = payload else {
        return Err(ClientError::MalformedFrame(format!(
            "payload must be an object, got {}",
            json_type_name(&payload)
        )));
    };

    Ok(Some(RawFrame {
        topic: string_field(&outer, "topic"),
        msg_type: string_field(&outer, "type"),
        timestamp: timestamp_field(&outer),
        payload,
    }))
}

fn string_field(outer: &Map<String, Value>, key: &str) -> String {
    outer
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn timestamp_field(outer: &Map<String, Value>) -> i64 {
    match outer.get("timestamp") {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_u64().map(|u| i64::try_from(u).unwrap_or(i64::MAX)))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

const fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{ClobAuth, GammaAuth};
    use crate::error::ErrorKind;

    #[test]
    fn subscription_frame_round_trips() {
        let intents = vec![
            SubscriptionIntent::new("activity", "trades"),
            SubscriptionIntent::new("comments", "comment_created")
                .with_filters(r#"{"parentEntityID":100}"#)
                .with_gamma_auth(GammaAuth {
                    address: "0xabc".to_string(),
                }),
            SubscriptionIntent::new("clob_user", "*").with_clob_auth(ClobAuth {
                key: "k".to_string(),
                secret: "s".to_string(),
                passphrase: "p".to_string(),
            }),
        ];
        let Ok(text) = encode_subscription(Action::Subscribe, &intents) else {
            panic!("encoding failed");
        };
        let Ok(frame) = serde_json::from_str::<SubscriptionFrame>(&text) else {
            panic!("decoding failed: {text}");
        };
        assert_eq!(frame.action, Action::Subscribe);
        assert_eq!(frame.subscriptions, intents);
    }

    #[test]
    fn unsubscribe_marker_on_the_wire() {
        let intents = [SubscriptionIntent::new("activity", "trades")];
        let Ok(text) = encode_subscription(Action::Unsubscribe, &intents) else {
            panic!("encoding failed");
        };
        let Ok(value) = serde_json::from_str::<Value>(&text) else {
            panic!("not json");
        };
        assert_eq!(value.get("action"), Some(&Value::from("unsubscribe")));
        assert_eq!(
            value.pointer("/subscriptions/0/type"),
            Some(&Value::from("trades"))
        );
    }

    #[test]
    fn decodes_data_frame() {
        let text = r#"{"topic":"activity","type":"trades","timestamp":1700000000,"payload":{"a":1}}"#;
        let Ok(Some(frame)) = decode_frame(text) else {
            panic!("expected a data frame");
        };
        assert_eq!(frame.topic, "activity");
        assert_eq!(frame.msg_type, "trades");
        assert_eq!(frame.timestamp, 1_700_000_000);
        assert_eq!(frame.payload.get("a"), Some(&Value::from(1)));
    }

    #[test]
    fn missing_envelope_fields_are_defaulted() {
        let Ok(Some(frame)) = decode_frame(r#"{"payload":{}}"#) else {
            panic!("expected a data frame");
        };
        assert_eq!(frame.topic, "");
        assert_eq!(frame.msg_type, "");
        assert_eq!(frame.timestamp, 0);
    }

    #[test]
    fn numeric_string_timestamps_are_coerced() {
        let Ok(Some(frame)) = decode_frame(r#"{"timestamp":"1700000000","payload":{}}"#) else {
            panic!("expected a data frame");
        };
        assert_eq!(frame.timestamp, 1_700_000_000);

        let Ok(Some(frame)) = decode_frame(r#"{"timestamp":"soon","payload":{}}"#) else {
            panic!("expected a data frame");
        };
        assert_eq!(frame.timestamp, 0);
    }

    #[test]
    fn oversized_timestamps_saturate() {
        let Ok(Some(frame)) = decode_frame(r#"{"timestamp":18446744073709551615,"payload":{}}"#)
        else {
            panic!("expected a data frame");
        };
        assert_eq!(frame.timestamp, i64::MAX);
    }

    #[test]
    fn frames_without_payload_are_control_frames() {
        assert!(matches!(decode_frame(r#"{"status":"ok"}"#), Ok(None)));
        assert!(matches!(decode_frame("[1,2,3]"), Ok(None)));
        assert!(matches!(decode_frame("\"pong\""), Ok(None)));
    }

    #[test]
    fn invalid_json_is_a_decode_error() {
        let Err(err) = decode_frame("{\"topic\": ") else {
            panic!("expected failure");
        };
        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[test]
    fn non_object_payload_is_malformed() {
        let Err(err) = decode_frame(r#"{"topic":"t","payload":[1]}"#) else {
            panic!("expected failure");
        };
        assert!(matches!(err, ClientError::MalformedFrame(_)));
        assert_eq!(err.kind(), ErrorKind::Decode);
    }
}
