//! Data-store connection manager.
//!
//! Connects once at startup, forwards driver lifecycle events to the
//! registered listeners, and closes the link on shutdown. Reconnection is
//! left to the driver.

use std::future::Future;
use std::process::ExitCode;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::event::{ConnectionEvent, ConnectionListener, ConnectionState, EventSink, LoggingListener, Signal};
use super::StoreError;

/// Backend able to open and close the data-store link.
#[async_trait]
pub trait StoreDriver: Send + Sync {
    /// Shared handle consumers use to talk to the store
    type Handle: Clone + Send + Sync + 'static;

    /// Open the link, returning the connected host and the handle.
    /// Lifecycle events after the initial connect go to `events`.
    async fn connect(&self, uri: &str, events: EventSink) -> Result<(String, Self::Handle), StoreError>;

    async fn close(&self, handle: Self::Handle) -> Result<(), StoreError>;
}

/// An open data-store link.
#[derive(Debug, Clone)]
pub struct Connection<H> {
    host: String,
    handle: H,
}

impl<H> Connection<H> {
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn handle(&self) -> &H {
        &self.handle
    }
}

/// Process exit status after the manager is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    Failure,
}

impl ExitStatus {
    pub fn code(self) -> u8 {
        match self {
            ExitStatus::Success => 0,
            ExitStatus::Failure => 1,
        }
    }
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        ExitCode::from(status.code())
    }
}

type Listeners = Arc<RwLock<Vec<Arc<dyn ConnectionListener>>>>;

/// Sink and dispatch task of a live connection
struct Active {
    sink: EventSink,
    dispatcher: JoinHandle<()>,
}

pub struct ConnectionManager<D: StoreDriver> {
    driver: D,
    listeners: Listeners,
    state: Arc<watch::Sender<ConnectionState>>,
    active: Option<Active>,
}

impl<D: StoreDriver> ConnectionManager<D> {
    /// New manager with the logging listener already registered
    pub fn new(driver: D) -> Self {
        let manager = Self::without_listeners(driver);
        manager.subscribe(Arc::new(LoggingListener));
        manager
    }

    pub fn without_listeners(driver: D) -> Self {
        let (state, _) = watch::channel(ConnectionState::Idle);
        Self {
            driver,
            listeners: Arc::new(RwLock::new(Vec::new())),
            state: Arc::new(state),
            active: None,
        }
    }

    /// Register a lifecycle listener
    pub fn subscribe(&self, listener: Arc<dyn ConnectionListener>) {
        self.listeners
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .push(listener);
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Watch state transitions
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    /// Open the single data-store connection.
    ///
    /// May only be called once per manager. A failure here is fatal for the
    /// server; the manager moves straight to `Terminated`.
    pub async fn connect(&mut self, uri: &str) -> Result<Connection<D::Handle>, StoreError> {
        if self.state() != ConnectionState::Idle {
            return Err(StoreError::AlreadyConnected);
        }
        self.state.send_replace(ConnectionState::Connecting);

        let (sink, rx) = EventSink::channel();

        let (host, handle) = match self.driver.connect(uri, sink.clone()).await {
            Ok(connected) => connected,
            Err(e) => {
                error!(error = %e, "Error connecting to data store");
                self.state.send_replace(ConnectionState::Terminated);
                return Err(e);
            }
        };

        let dispatcher = tokio::spawn(dispatch(rx, self.listeners.clone(), self.state.clone()));

        // Connected goes out before any driver event can
        sink.send(Signal::Event(ConnectionEvent::Connected { host: host.clone() }));
        sink.arm();

        self.active = Some(Active { sink, dispatcher });
        Ok(Connection { host, handle })
    }

    /// Close the connection. `Success` if the close went through,
    /// `Failure` otherwise.
    pub async fn shutdown(&mut self, connection: Connection<D::Handle>) -> ExitStatus {
        let Some(Active { sink, dispatcher }) = self.active.take() else {
            warn!("Shutdown requested without an open connection");
            return ExitStatus::Failure;
        };

        sink.disarm();
        sink.send(Signal::Transition(ConnectionState::Closing));

        let status = match self.driver.close(connection.handle).await {
            Ok(()) => {
                sink.send(Signal::Event(ConnectionEvent::Closed));
                ExitStatus::Success
            }
            Err(e) => {
                error!(error = %e, "Error closing data-store connection");
                sink.send(Signal::Transition(ConnectionState::Terminated));
                ExitStatus::Failure
            }
        };

        if let Err(e) = dispatcher.await {
            warn!(error = %e, "Lifecycle dispatcher ended abnormally");
        }
        status
    }
}

/// Apply signals in order: update state, then notify listeners.
async fn dispatch(
    mut rx: mpsc::UnboundedReceiver<Signal>,
    listeners: Listeners,
    state: Arc<watch::Sender<ConnectionState>>,
) {
    while let Some(signal) = rx.recv().await {
        let next = match signal {
            Signal::Transition(next) => {
                state.send_replace(next);
                next
            }
            Signal::Event(event) => {
                let next = event.state();
                state.send_replace(next);
                let listeners = listeners.read().unwrap_or_else(|p| p.into_inner()).clone();
                for listener in &listeners {
                    listener.on_event(&event);
                }
                next
            }
        };

        if next == ConnectionState::Terminated {
            break;
        }
    }
}

/// Connect, wait for `interrupt`, then shut down.
///
/// Returns `Failure` without waiting if the initial connect fails.
pub async fn run<D, F>(mut manager: ConnectionManager<D>, uri: &str, interrupt: F) -> ExitStatus
where
    D: StoreDriver,
    F: Future<Output = ()>,
{
    let connection = match manager.connect(uri).await {
        Ok(connection) => connection,
        Err(_) => return ExitStatus::Failure,
    };

    interrupt.await;
    info!("Interrupt received, closing data-store connection");

    manager.shutdown(connection).await
}

// ============================================================================
// Tests
// ============================================================================
