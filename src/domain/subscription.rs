//! Subscription intents and their credential bundles.
//!
//! A [`SubscriptionIntent`] names a `(topic, type)` stream with an optional
//! filter string and at most one credential bundle. The two credential
//! shapes are mutually exclusive, which [`Credentials`] enforces by
//! construction; on the wire they appear as `clob_auth` or `gamma_auth`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Outer action marker of a subscription frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Start receiving the listed streams.
    Subscribe,
    /// Stop receiving the listed streams.
    Unsubscribe,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Subscribe => f.write_str("subscribe"),
            Self::Unsubscribe => f.write_str("unsubscribe"),
        }
    }
}

/// CLOB API key credentials.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClobAuth {
    /// API key.
    pub key: String,
    /// API secret.
    pub secret: String,
    /// API passphrase.
    pub passphrase: String,
}

impl fmt::Debug for ClobAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClobAuth")
            .field("key", &self.key)
            .field("secret", &"<redacted>")
            .field("passphrase", &"<redacted>")
            .finish()
    }
}

/// Gamma address authentication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GammaAuth {
    /// Wallet address.
    pub address: String,
}

/// Credential bundle attached to a subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Key/secret/passphrase triple.
    Clob(ClobAuth),
    /// Single address.
    Gamma(GammaAuth),
}

/// A request to start or stop receiving one `(topic, type)` stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "SubscriptionWire", try_from = "SubscriptionWire")]
pub struct SubscriptionIntent {
    /// Topic name (e.g. `activity`).
    pub topic: String,
    /// Message type within the topic (e.g. `trades`).
    pub msg_type: String,
    /// Opaque filter string forwarded to the server.
    pub filters: Option<String>,
    /// Optional credentials.
    pub credentials: Option<Credentials>,
}

impl SubscriptionIntent {
    /// Creates an intent without filters or credentials.
    #[must_use]
    pub fn new(topic: impl Into<String>, msg_type: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            msg_type: msg_type.into(),
            filters: None,
            credentials: None,
        }
    }

    /// Attaches an opaque filter string.
    #[must_use]
    pub fn with_filters(mut self, filters: impl Into<String>) -> Self {
        self.filters = Some(filters.into());
        self
    }

    /// Attaches CLOB credentials, replacing any previous credentials.
    #[must_use]
    pub fn with_clob_auth(mut self, auth: ClobAuth) -> Self {
        self.credentials = Some(Credentials::Clob(auth));
        self
    }

    /// Attaches Gamma credentials, replacing any previous credentials.
    #[must_use]
    pub fn with_gamma_auth(mut self, auth: GammaAuth) -> Self {
        self.credentials = Some(Credentials::Gamma(auth));
        self
    }
}

/// Wire shape of one subscription entry.
#[derive(Serialize, Deserialize)]
struct SubscriptionWire {
    topic: String,
    #[serde(rename = "type")]
    msg_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    filters: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    clob_auth: Option<ClobAuth>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    gamma_auth: Option<GammaAuth>,
}

impl From<SubscriptionIntent> for SubscriptionWire {
    fn from(intent: SubscriptionIntent) -> Self {
        let (clob_auth, gamma_auth) = match intent.credentials {
            Some(Credentials::Clob(auth)) => (Some(auth), None),
            Some(Credentials::Gamma(auth)) => (None, Some(auth)),
            None => (None, None),
        };
        Self {
            topic: intent.topic,
            msg_type: intent.msg_type,
            filters: intent.filters,
            clob_auth,
            gamma_auth,
        }
    }
}

impl TryFrom<SubscriptionWire> for SubscriptionIntent {
    type Error = String;

    fn try_from(wire: SubscriptionWire) -> Result<Self, Self::Error> {
        let credentials = match (wire.clob_auth, wire.gamma_auth) {
            (Some(_), Some(_)) => {
                return Err("clob_auth and gamma_auth are mutually exclusive".to_string());
            }
            (Some(auth), None) => Some(Credentials::Clob(auth)),
            (None, Some(auth)) => Some(Credentials::Gamma(auth)),
            (None, None) => None,
        };
        Ok(Self {
            topic: wire.topic,
            msg_type: wire.msg_type,
            filters: wire.filters,
            credentials,
        })
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bare_intent_omits_optional_keys() {
        let intent = SubscriptionIntent::new("activity", "trades");
        let Ok(value) = serde_json::to_value(&intent) else {
            panic!("serialization failed");
        };
        assert_eq!(value, json!({"topic": "activity", "type": "trades"}));
    }

    #[test]
    fn clob_credentials_serialize_under_clob_auth() {
        let intent = SubscriptionIntent::new("clob_user", "*").with_clob_auth(ClobAuth {
            key: "k".to_string(),
            secret: "s".to_string(),
            passphrase: "p".to_string(),
        });
        let Ok(value) = serde_json::to_value(&intent) else {
            panic!("serialization failed");
        };
        assert_eq!(
            value.get("clob_auth"),
            Some(&json!({"key": "k", "secret": "s", "passphrase": "p"}))
        );
        assert!(value.get("gamma_auth").is_none());
    }

    #[test]
    fn later_credentials_replace_earlier_ones() {
        let intent = SubscriptionIntent::new("comments", "comment_created")
            .with_clob_auth(ClobAuth {
                key: "k".to_string(),
                secret: "s".to_string(),
                passphrase: "p".to_string(),
            })
            .with_gamma_auth(GammaAuth {
                address: "0xabc".to_string(),
            });
        assert_eq!(
            intent.credentials,
            Some(Credentials::Gamma(GammaAuth {
                address: "0xabc".to_string()
            }))
        );
    }

    #[test]
    fn both_credentials_on_the_wire_are_rejected() {
        let value = json!({
            "topic": "t", "type": "x",
            "clob_auth": {"key": "k", "secret": "s", "passphrase": "p"},
            "gamma_auth": {"address": "0x1"}
        });
        assert!(serde_json::from_value::<SubscriptionIntent>(value).is_err());
    }

    #[test]
    fn debug_redacts_secrets() {
        let auth = ClobAuth {
            key: "visible".to_string(),
            secret: "hidden-secret".to_string(),
            passphrase: "hidden-pass".to_string(),
        };
        let rendered = format!("{auth:?}");
        assert!(rendered.contains("visible"));
        assert!(!rendered.contains("hidden"));
    }
}
