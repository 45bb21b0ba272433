//! Payload resolution keyed by `(topic, type)`.
//!
//! A static table selects the structured shape for a frame. A decode
//! failure for a recognized pair never drops the message: the payload
//! falls back to the raw map and the mismatch is returned alongside it
//! for reporting.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::domain::{Comment, Payload, Reaction, Trade};
use crate::error::ClientError;

/// Structured shapes known to the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadShape {
    /// [`Trade`].
    Trade,
    /// [`Comment`].
    Comment,
    /// [`Reaction`].
    Reaction,
}

impl PayloadShape {
    /// Looks up the shape for a `(topic, type)` pair.
    #[must_use]
    pub fn lookup(topic: &str, msg_type: &str) -> Option<Self> {
        match (topic, msg_type) {
            ("activity", "trades") => Some(Self::Trade),
            ("comments", "comment_created" | "comment_removed") => Some(Self::Comment),
            ("comments", "reaction_created" | "reaction_removed") => Some(Self::Reaction),
            _ => None,
        }
    }

    /// Shape name used in reports.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Trade => "Trade",
            Self::Comment => "Comment",
            Self::Reaction => "Reaction",
        }
    }
}

/// Outcome of resolving one payload.
#[derive(Debug)]
pub struct Resolved {
    /// The payload to deliver. Always present.
    pub payload: Payload,
    /// Set when a recognized pair fell back to the raw map.
    pub mismatch: Option<ClientError>,
}

/// Resolves `payload` into a structured shape when the pair is recognized.
#[must_use]
pub fn resolve(topic: &str, msg_type: &str, payload: Map<String, Value>) -> Resolved {
    let Some(shape) = PayloadShape::lookup(topic, msg_type) else {
        return Resolved {
            payload: Payload::Raw(payload),
            mismatch: None,
        };
    };

    let decoded = match shape {
        PayloadShape::Trade => decode::<Trade>(&payload).map(|t| Payload::Trade(Box::new(t))),
        PayloadShape::Comment => {
            decode::<Comment>(&payload).map(|c| Payload::Comment(Box::new(c)))
        }
        PayloadShape::Reaction => decode::<Reaction>(&payload).map(Payload::Reaction),
    };

    match decoded {
        Ok(payload) => Resolved {
            payload,
            mismatch: None,
        },
        Err(source) => Resolved {
            payload: Payload::Raw(payload),
            mismatch: Some(ClientError::SchemaMismatch {
                topic: topic.to_string(),
                msg_type: msg_type.to_string(),
                shape: shape.name(),
                source,
            }),
        },
    }
}

fn decode<T: DeserializeOwned>(payload: &Map<String, Value>) -> Result<T, serde_json::Error> {
    serde_json::from_value(Value::Object(payload.clone()))
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::Side;
    use crate::error::ErrorKind;
    use serde_json::json;

    fn trade_payload() -> Map<String, Value> {
        let value = json!({
            "asset": "0x1",
            "bio": "",
            "conditionId": "0xcond",
            "eventSlug": "election",
            "icon": "https://example.com/i.png",
            "name": "alice",
            "outcome": "Yes",
            "outcomeIndex": 0,
            "price": 0.5,
            "profileImage": "",
            "proxyWallet": "0xwallet",
            "pseudonym": "Brave-Fox",
            "side": "BUY",
            "size": 10,
            "slug": "will-it-happen",
            "timestamp": 1_700_000_000,
            "title": "Will it happen?",
            "transactionHash": "0xhash"
        });
        let Value::Object(map) = value else {
            panic!("fixture must be an object");
        };
        map
    }

    #[test]
    fn lookup_table() {
        assert_eq!(PayloadShape::lookup("activity", "trades"), Some(PayloadShape::Trade));
        assert_eq!(
            PayloadShape::lookup("comments", "comment_removed"),
            Some(PayloadShape::Comment)
        );
        assert_eq!(
            PayloadShape::lookup("comments", "reaction_created"),
            Some(PayloadShape::Reaction)
        );
        assert_eq!(PayloadShape::lookup("activity", "orders_matched"), None);
        assert_eq!(PayloadShape::lookup("comments", "trades"), None);
    }

    #[test]
    fn recognized_trade_decodes() {
        let resolved = resolve("activity", "trades", trade_payload());
        assert!(resolved.mismatch.is_none());
        let Some(trade) = resolved.payload.as_trade() else {
            panic!("expected a trade, got {:?}", resolved.payload);
        };
        assert_eq!(trade.side, Side::Buy);
        assert_eq!(trade.size, 10);
    }

    #[test]
    fn missing_required_field_falls_back_to_raw() {
        let mut payload = trade_payload();
        payload.remove("asset");
        let resolved = resolve("activity", "trades", payload);

        let Some(raw) = resolved.payload.as_raw() else {
            panic!("expected raw fallback");
        };
        assert!(!raw.contains_key("asset"));
        assert_eq!(raw.get("side"), Some(&Value::from("BUY")));
        assert_eq!(raw.len(), 17);

        let Some(warning) = resolved.mismatch else {
            panic!("expected a mismatch report");
        };
        assert_eq!(warning.kind(), ErrorKind::SchemaMismatch);
        assert!(warning.to_string().contains("asset"));
    }

    #[test]
    fn unknown_pair_is_raw_without_warning() {
        let mut payload = Map::new();
        payload.insert("symbol".to_string(), Value::from("BTCUSDT"));
        let resolved = resolve("crypto_prices", "update", payload);
        assert!(resolved.mismatch.is_none());
        assert!(resolved.payload.as_raw().is_some());
    }

    #[test]
    fn reaction_with_wrong_field_type_falls_back() {
        let Value::Object(payload) = json!({
            "id": "r", "commentID": "not-a-number", "reactionType": "HEART",
            "icon": "h", "userAddress": "0x", "createdAt": "now"
        }) else {
            panic!("fixture must be an object");
        };
        let resolved = resolve("comments", "reaction_removed", payload);
        assert!(resolved.payload.as_raw().is_some());
        assert!(resolved.mismatch.is_some());
    }
}
