//! Keepalive task.
//!
//! Sends a protocol-level ping at the configured interval while the
//! connection is up. A failed ping is reported and ends the task; it does
//! not close the transport. Detecting the dead connection is left to the
//! receive loop.

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::client::FeedClient;
use crate::ws::dispatcher::FeedHandler;

/// Spawns the keepalive task for one connection.
///
/// The task ends when `lost` is cancelled or a ping fails.
pub(crate) fn spawn<H: FeedHandler>(client: FeedClient<H>, lost: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(run(client, lost).in_current_span())
}

async fn run<H: FeedHandler>(client: FeedClient<H>, lost: CancellationToken) {
    let period = client.handle.config().ping_interval;
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            () = lost.cancelled() => break,
            _ = ticker.tick() => {}
        }

        if let Err(err) = client.handle.send_ping().await {
            if !lost.is_cancelled() {
                client.report(&err);
            }
            break;
        }
        tracing::trace!("keepalive ping sent");
    }

    tracing::debug!("keepalive stopped");
}
