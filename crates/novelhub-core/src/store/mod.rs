//! Data-store connection lifecycle.
//!
//! This module provides:
//! - `ConnectionManager`: connect once, observe, shut down gracefully
//! - `StoreDriver`: the backend seam, with `MongoDriver` as the real one
//! - `ConnectionListener` / `ConnectionEvent`: typed lifecycle observation
//!
//! A failed initial connect is fatal; errors and disconnects afterwards are
//! logged and left to the driver to recover from.

pub mod error;
pub mod event;
pub mod manager;
pub mod mongo;

pub use error::StoreError;
pub use event::{ConnectionEvent, ConnectionListener, ConnectionState, EventSink, LoggingListener};
pub use manager::{run, Connection, ConnectionManager, ExitStatus, StoreDriver};
pub use mongo::MongoDriver;
