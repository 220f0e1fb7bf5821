use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Initial connection failed; the server must not start.
    #[error("Error connecting to data store: {0}")]
    ConnectFailed(String),

    #[error("Error closing data-store connection: {0}")]
    CloseFailed(String),

    #[error("Data-store connection already initialised")]
    AlreadyConnected,
}
