//! Decoded inbound data messages.
//!
//! Every data frame becomes an [`Envelope`]. Topic, type and timestamp are
//! always present; the [`Payload`] is either one of the structured shapes
//! or the raw key/value map the frame carried.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use super::{Comment, Reaction, Trade};

/// Payload of a data frame.
///
/// Structured variants are attempted first for recognized `(topic, type)`
/// pairs; anything else, including recognized pairs whose fields do not
/// match, is kept as [`Payload::Raw`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    /// `activity` / `trades`.
    Trade(Box<Trade>),
    /// `comments` / `comment_created` or `comment_removed`.
    Comment(Box<Comment>),
    /// `comments` / `reaction_created` or `reaction_removed`.
    Reaction(Reaction),
    /// Unrecognized pair or structured decode failure.
    Raw(Map<String, Value>),
}

impl Payload {
    /// Returns the trade, if this payload is one.
    #[must_use]
    pub fn as_trade(&self) -> Option<&Trade> {
        match self {
            Self::Trade(trade) => Some(trade.as_ref()),
            _ => None,
        }
    }

    /// Returns the comment, if this payload is one.
    #[must_use]
    pub fn as_comment(&self) -> Option<&Comment> {
        match self {
            Self::Comment(comment) => Some(comment.as_ref()),
            _ => None,
        }
    }

    /// Returns the reaction, if this payload is one.
    #[must_use]
    pub const fn as_reaction(&self) -> Option<&Reaction> {
        match self {
            Self::Reaction(reaction) => Some(reaction),
            _ => None,
        }
    }

    /// Returns the raw map, if the payload was not decoded into a shape.
    #[must_use]
    pub const fn as_raw(&self) -> Option<&Map<String, Value>> {
        match self {
            Self::Raw(map) => Some(map),
            _ => None,
        }
    }

    /// Returns `true` for structured (non-raw) payloads.
    #[must_use]
    pub const fn is_structured(&self) -> bool {
        !matches!(self, Self::Raw(_))
    }
}

/// A decoded data message handed to [`crate::FeedHandler::on_message`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope {
    /// Topic the message was published on (empty if absent).
    pub topic: String,
    /// Message type within the topic (empty if absent).
    #[serde(rename = "type")]
    pub msg_type: String,
    /// Server-assigned timestamp in milliseconds (zero if absent).
    pub timestamp: i64,
    /// Resolved payload.
    pub payload: Payload,
}

impl Envelope {
    /// Returns the server timestamp as a UTC date-time.
    ///
    /// Returns `None` when the timestamp is out of range.
    #[must_use]
    pub fn timestamp_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }
}
