//! Typed lifecycle events for the data-store link and the listener
//! interface that observes them.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Something that happened to the data-store connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    Connected { host: String },
    Error { message: String },
    /// Link lost; the driver is reconnecting on its own.
    Disconnected,
    Reconnected,
    Closed,
}

/// Process-wide state of the data-store link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    Connecting,
    Connected,
    Error,
    Disconnected,
    Reconnected,
    Closing,
    Terminated,
}

impl ConnectionEvent {
    /// State the link is in once this event has been observed
    pub fn state(&self) -> ConnectionState {
        match self {
            ConnectionEvent::Connected { .. } => ConnectionState::Connected,
            ConnectionEvent::Error { .. } => ConnectionState::Error,
            ConnectionEvent::Disconnected => ConnectionState::Disconnected,
            ConnectionEvent::Reconnected => ConnectionState::Reconnected,
            ConnectionEvent::Closed => ConnectionState::Terminated,
        }
    }
}

/// Items flowing to the dispatch task: driver events, or state changes the
/// manager makes itself.
#[derive(Debug)]
pub(crate) enum Signal {
    Event(ConnectionEvent),
    Transition(ConnectionState),
}

/// Handed to a driver so it can report lifecycle events.
///
/// Events are dropped until the manager arms the sink (after the initial
/// connect succeeds) and again once shutdown begins.
#[derive(Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<Signal>,
    armed: Arc<AtomicBool>,
}

impl EventSink {
    pub(crate) fn channel() -> (Self, mpsc::UnboundedReceiver<Signal>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let sink = Self {
            tx,
            armed: Arc::new(AtomicBool::new(false)),
        };
        (sink, rx)
    }

    /// Report an event from the driver
    pub fn emit(&self, event: ConnectionEvent) {
        if self.armed.load(Ordering::Acquire) {
            let _ = self.tx.send(Signal::Event(event));
        }
    }

    pub(crate) fn send(&self, signal: Signal) {
        let _ = self.tx.send(signal);
    }

    pub(crate) fn arm(&self) {
        self.armed.store(true, Ordering::Release);
    }

    pub(crate) fn disarm(&self) {
        self.armed.store(false, Ordering::Release);
    }
}

/// Observer of connection lifecycle events.
pub trait ConnectionListener: Send + Sync {
    fn on_event(&self, event: &ConnectionEvent);
}

/// Logs every lifecycle event. Registered by default.
pub struct LoggingListener;

impl ConnectionListener for LoggingListener {
    fn on_event(&self, event: &ConnectionEvent) {
        match event {
            ConnectionEvent::Connected { host } => info!(%host, "Data store connected"),
            ConnectionEvent::Error { message } => error!(error = %message, "Data-store connection error"),
            ConnectionEvent::Disconnected => warn!("Data store disconnected, attempting to reconnect"),
            ConnectionEvent::Reconnected => info!("Data store reconnected"),
            ConnectionEvent::Closed => info!("Data-store connection closed through app termination"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_states() {
        assert_eq!(
            ConnectionEvent::Connected { host: "db".into() }.state(),
            ConnectionState::Connected
        );
        assert_eq!(
            ConnectionEvent::Error { message: "boom".into() }.state(),
            ConnectionState::Error
        );
        assert_eq!(ConnectionEvent::Disconnected.state(), ConnectionState::Disconnected);
        assert_eq!(ConnectionEvent::Reconnected.state(), ConnectionState::Reconnected);
        assert_eq!(ConnectionEvent::Closed.state(), ConnectionState::Terminated);
    }

    #[test]
    fn test_sink_drops_events_until_armed() {
        let (sink, mut rx) = EventSink::channel();
        sink.emit(ConnectionEvent::Disconnected);
        assert!(rx.try_recv().is_err());

        sink.arm();
        sink.emit(ConnectionEvent::Reconnected);
        assert!(matches!(
            rx.try_recv(),
            Ok(Signal::Event(ConnectionEvent::Reconnected))
        ));

        sink.disarm();
        sink.emit(ConnectionEvent::Disconnected);
        assert!(rx.try_recv().is_err());
    }
}
