//! Trade activity payload (`activity` / `trades`).

use serde::{Deserialize, Serialize};

/// Side of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    /// Outcome tokens were bought.
    Buy,
    /// Outcome tokens were sold.
    Sell,
}

/// A trade executed on a market.
///
/// Field names follow the feed's camelCase keys. Unknown keys are ignored
/// so that additive server changes do not force a raw fallback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    /// ERC1155 token ID of the conditional token being traded.
    pub asset: String,
    /// Bio of the trading user.
    pub bio: String,
    /// Market ID, which is also the CTF condition ID.
    pub condition_id: String,
    /// Slug of the event.
    pub event_slug: String,
    /// URL of the market icon.
    pub icon: String,
    /// Name of the trading user.
    pub name: String,
    /// Human readable outcome of the market.
    pub outcome: String,
    /// Index of the outcome.
    pub outcome_index: i64,
    /// Execution price.
    pub price: f64,
    /// URL of the user's profile image.
    pub profile_image: String,
    /// Optimized profile image URL, when available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image_optimized: Option<String>,
    /// Address of the user's proxy wallet.
    pub proxy_wallet: String,
    /// Pseudonym of the user.
    pub pseudonym: String,
    /// Buy or sell.
    pub side: Side,
    /// Trade size.
    pub size: i64,
    /// Slug of the market.
    pub slug: String,
    /// Trade timestamp as reported by the server.
    pub timestamp: i64,
    /// Title of the event.
    pub title: String,
    /// Hash of the settlement transaction.
    pub transaction_hash: String,
}
