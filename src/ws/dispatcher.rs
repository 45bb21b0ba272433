//! Caller hooks and their execution-context handoff.
//!
//! Hooks never run inline on the receive loop. Each invocation is handed to
//! the blocking pool and driven there through the runtime handle, then
//! awaited. A panic in user code is contained, and a hook that blocks the
//! thread does not stall keepalive, even on a current-thread runtime.
//! Dispatch order within a connection equals arrival order, and there is
//! no queue: a slow hook gates throughput for that connection.

use std::any::Any;
use std::future::Future;
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::task::JoinError;

use crate::client::ClientHandle;
use crate::domain::Envelope;
use crate::error::ClientError;

/// Hooks invoked by the connection manager.
///
/// Only [`FeedHandler::on_message`] is required.
pub trait FeedHandler: Send + Sync + 'static {
    /// Called once per established connection, before any message of that
    /// connection is dispatched. Subscriptions belong here, since nothing
    /// is re-subscribed automatically after a reconnect.
    fn on_connect(&self, client: ClientHandle) -> impl Future<Output = ()> + Send {
        let _ = client;
        async {}
    }

    /// Called once per successfully parsed data frame.
    fn on_message(
        &self,
        client: ClientHandle,
        envelope: Envelope,
    ) -> impl Future<Output = ()> + Send;

    /// Called for every reported error (transport loss, malformed frames,
    /// schema fallbacks, keepalive failures, hook panics).
    ///
    /// Runs inline on the reporting task and must not block.
    fn on_error(&self, client: &ClientHandle, error: &ClientError) {
        let _ = (client, error);
    }
}

/// Runs the connect hook on a separate task and waits for it.
pub(crate) async fn dispatch_connect<H: FeedHandler>(
    handler: &Arc<H>,
    client: ClientHandle,
) -> Result<(), ClientError> {
    let handler = Arc::clone(handler);
    run_hook(async move { handler.on_connect(client).await })
        .await
        .map_err(|err| hook_failure("on_connect", err))
}

/// Runs the message hook on a separate task and waits for it.
pub(crate) async fn dispatch_message<H: FeedHandler>(
    handler: &Arc<H>,
    client: ClientHandle,
    envelope: Envelope,
) -> Result<(), ClientError> {
    let handler = Arc::clone(handler);
    run_hook(async move { handler.on_message(client, envelope).await })
        .await
        .map_err(|err| hook_failure("on_message", err))
}

/// Drives `hook` to completion on a blocking-pool thread.
async fn run_hook<F>(hook: F) -> Result<(), JoinError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let runtime = Handle::current();
    tokio::task::spawn_blocking(move || runtime.block_on(hook)).await
}

fn hook_failure(hook: &str, err: JoinError) -> ClientError {
    if err.is_panic() {
        let reason = panic_reason(err.into_panic());
        ClientError::Handler(format!("{hook} panicked: {reason}"))
    } else {
        ClientError::Handler(format!("{hook} was cancelled"))
    }
}

fn panic_reason(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::client::FeedClient;
    use crate::config::ClientConfig;
    use crate::domain::Payload;
    use crate::error::ErrorKind;

    #[derive(Default)]
    struct Counting {
        connects: AtomicUsize,
        messages: AtomicUsize,
    }

    impl FeedHandler for Counting {
        async fn on_connect(&self, _client: ClientHandle) {
            self.connects.fetch_add(1, Ordering::SeqCst);
        }

        async fn on_message(&self, _client: ClientHandle, envelope: Envelope) {
            match envelope.topic.as_str() {
                "boom" => panic!("handler exploded"),
                "stall" => std::thread::sleep(std::time::Duration::from_millis(200)),
                _ => {}
            }
            self.messages.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn envelope(topic: &str) -> Envelope {
        Envelope {
            topic: topic.to_string(),
            msg_type: "t".to_string(),
            timestamp: 0,
            payload: Payload::Raw(serde_json::Map::new()),
        }
    }

    fn client() -> FeedClient<Counting> {
        let Ok(client) = FeedClient::new(ClientConfig::default(), Counting::default()) else {
            panic!("client construction failed");
        };
        client
    }

    #[tokio::test]
    async fn hooks_run_and_complete_before_returning() {
        let client = client();
        let handle = client.handle().clone();

        let connected = dispatch_connect(&client.handler, handle.clone()).await;
        assert!(connected.is_ok());
        assert_eq!(client.handler().connects.load(Ordering::SeqCst), 1);

        for _ in 0..3 {
            let delivered = dispatch_message(&client.handler, handle.clone(), envelope("x")).await;
            assert!(delivered.is_ok());
        }
        assert_eq!(client.handler().messages.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn panicking_hook_is_contained() {
        let client = client();
        let handle = client.handle().clone();

        let Err(err) = dispatch_message(&client.handler, handle.clone(), envelope("boom")).await
        else {
            panic!("expected handler failure");
        };
        assert_eq!(err.kind(), ErrorKind::Handler);
        assert!(err.to_string().contains("handler exploded"));

        let delivered = dispatch_message(&client.handler, handle, envelope("x")).await;
        assert!(delivered.is_ok());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn blocking_hook_leaves_the_runtime_free() {
        let client = client();
        let handle = client.handle().clone();

        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);
        let ticker = tokio::spawn(async move {
            loop {
                tokio::time::sleep(std::time::Duration::from_millis(10)).await;
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        let delivered = dispatch_message(&client.handler, handle, envelope("stall")).await;
        ticker.abort();

        assert!(delivered.is_ok());
        assert!(
            ticks.load(Ordering::SeqCst) >= 5,
            "runtime starved while the hook blocked"
        );
    }
}
