//! MongoDB driver for the connection manager.

use std::future::IntoFuture;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use mongodb::bson::doc;
use mongodb::event::sdam::SdamEvent;
use mongodb::event::EventHandler;
use mongodb::options::ClientOptions;
use mongodb::Client;
use tracing::debug;

use super::event::{ConnectionEvent, EventSink};
use super::manager::StoreDriver;
use super::StoreError;

/// How long shutdown may wait for in-flight operations.
const CLOSE_TIMEOUT_SECS: u64 = 10;

/// Tracks server health across heartbeats and turns the edges into
/// `Disconnected` / `Reconnected` events.
struct HeartbeatTracker {
    healthy: AtomicBool,
    sink: EventSink,
}

impl HeartbeatTracker {
    fn new(sink: EventSink) -> Self {
        Self {
            healthy: AtomicBool::new(true),
            sink,
        }
    }

    fn failed(&self, message: String) {
        self.sink.emit(ConnectionEvent::Error { message });
        if self.healthy.swap(false, Ordering::AcqRel) {
            self.sink.emit(ConnectionEvent::Disconnected);
        }
    }

    fn succeeded(&self) {
        if !self.healthy.swap(true, Ordering::AcqRel) {
            self.sink.emit(ConnectionEvent::Reconnected);
        }
    }
}

/// `StoreDriver` backed by the official MongoDB driver.
///
/// The driver reconnects on its own; heartbeats are only observed.
#[derive(Debug, Clone, Default)]
pub struct MongoDriver {
    app_name: Option<String>,
}

impl MongoDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name reported to the server in the connection handshake
    pub fn with_app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = Some(app_name.into());
        self
    }
}

#[async_trait]
impl StoreDriver for MongoDriver {
    type Handle = Client;

    async fn connect(&self, uri: &str, events: EventSink) -> Result<(String, Client), StoreError> {
        let mut options = ClientOptions::parse(uri)
            .await
            .map_err(|e| StoreError::ConnectFailed(e.to_string()))?;

        if self.app_name.is_some() {
            options.app_name = self.app_name.clone();
        }

        let host = options
            .hosts
            .first()
            .map(|h| h.to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let tracker = HeartbeatTracker::new(events);
        options.sdam_event_handler = Some(EventHandler::callback(move |event: SdamEvent| match event {
            SdamEvent::ServerHeartbeatFailed(ev) => {
                tracker.failed(format!("{}: {}", ev.server_address, ev.failure))
            }
            SdamEvent::ServerHeartbeatSucceeded(_) => tracker.succeeded(),
            _ => {}
        }));

        let client = Client::with_options(options).map_err(|e| StoreError::ConnectFailed(e.to_string()))?;

        // Client creation is lazy; ping so an unreachable server fails here
        client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| StoreError::ConnectFailed(e.to_string()))?;

        debug!(%host, "MongoDB ping succeeded");
        Ok((host, client))
    }

    async fn close(&self, client: Client) -> Result<(), StoreError> {
        shutdown_within(Duration::from_secs(CLOSE_TIMEOUT_SECS), client.shutdown()).await
    }
}

/// Await `shutdown`, reporting `CloseFailed` if it outlasts `limit`.
async fn shutdown_within<F>(limit: Duration, shutdown: F) -> Result<(), StoreError>
where
    F: IntoFuture<Output = ()>,
{
    tokio::time::timeout(limit, shutdown.into_future())
        .await
        .map_err(|_| StoreError::CloseFailed(format!("shutdown did not finish within {:?}", limit)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::event::Signal;

    fn drain(rx: &mut tokio::sync::mpsc::UnboundedReceiver<Signal>) -> Vec<ConnectionEvent> {
        let mut events = Vec::new();
        while let Ok(Signal::Event(event)) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[test]
    fn test_heartbeat_edges() {
        let (sink, mut rx) = EventSink::channel();
        sink.arm();
        let tracker = HeartbeatTracker::new(sink);

        tracker.succeeded();
        assert!(drain(&mut rx).is_empty());

        tracker.failed("timeout".to_string());
        tracker.failed("timeout".to_string());
        assert_eq!(
            drain(&mut rx),
            vec![
                ConnectionEvent::Error { message: "timeout".to_string() },
                ConnectionEvent::Disconnected,
                ConnectionEvent::Error { message: "timeout".to_string() },
            ]
        );

        tracker.succeeded();
        tracker.succeeded();
        assert_eq!(drain(&mut rx), vec![ConnectionEvent::Reconnected]);
    }

    #[tokio::test]
    async fn test_malformed_uri_fails_connect() {
        let (sink, _rx) = EventSink::channel();
        let err = MongoDriver::new().connect("not-a-mongo-uri", sink).await.unwrap_err();
        assert!(matches!(err, StoreError::ConnectFailed(_)));
    }

    #[tokio::test]
    async fn test_shutdown_within_limit() {
        shutdown_within(Duration::from_secs(1), async {}).await.unwrap();
    }

    #[tokio::test]
    async fn test_stalled_shutdown_is_close_failure() {
        let err = shutdown_within(Duration::from_millis(20), std::future::pending())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::CloseFailed(msg) if msg.contains("20ms")));
    }
}
