//! polymarket-ws-client demo entry point.
//!
//! Connects to the feed, subscribes to trade activity on every
//! (re)connection and logs each trade until Ctrl-C.

use polymarket_ws_client::{
    ClientConfig, ClientError, ClientHandle, Envelope, FeedClient, FeedHandler, Payload,
    SubscriptionIntent,
};
use tracing_subscriber::EnvFilter;

/// Logs trades and any other payload it receives.
struct TradeLogger;

impl FeedHandler for TradeLogger {
    async fn on_connect(&self, client: ClientHandle) {
        let intents = [SubscriptionIntent::new("activity", "trades")];
        if let Err(err) = client.subscribe(&intents).await {
            tracing::error!(error = %err, "subscribe failed");
        }
    }

    async fn on_message(&self, _client: ClientHandle, envelope: Envelope) {
        let received_at = envelope
            .timestamp_utc()
            .map(|ts| ts.to_rfc3339())
            .unwrap_or_default();

        match &envelope.payload {
            Payload::Trade(trade) => tracing::info!(
                %received_at,
                asset = %trade.asset,
                side = ?trade.side,
                price = trade.price,
                size = trade.size,
                tx = %trade.transaction_hash,
                "trade"
            ),
            other => tracing::info!(
                %received_at,
                topic = %envelope.topic,
                msg_type = %envelope.msg_type,
                payload = %serde_json::to_string(other).unwrap_or_default(),
                "message"
            ),
        }
    }

    fn on_error(&self, _client: &ClientHandle, error: &ClientError) {
        tracing::debug!(kind = %error.kind(), "reported error");
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json")) {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    // Load configuration
    let config = ClientConfig::from_env()?;
    tracing::info!(host = %config.host, "starting polymarket-ws-client");

    let client = FeedClient::new(config, TradeLogger)?;
    let runner = client.clone();
    let mut run = tokio::spawn(async move { runner.run().await });

    tokio::select! {
        result = &mut run => {
            result??;
            return Ok(());
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutting down");
        }
    }

    client.stop().await;
    run.await??;

    Ok(())
}
