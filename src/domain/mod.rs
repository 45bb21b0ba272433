//! Domain layer: payload records, envelopes and subscription intents.
//!
//! These are plain data types with serde mappings to the feed's wire
//! format. They carry field validation only; all connection behaviour
//! lives in [`crate::ws`].

pub mod comment;
pub mod envelope;
pub mod subscription;
pub mod trade;

pub use comment::{Comment, ParentEntityType, Reaction};
pub use envelope::{Envelope, Payload};
pub use subscription::{Action, ClobAuth, Credentials, GammaAuth, SubscriptionIntent};
pub use trade::{Side, Trade};
