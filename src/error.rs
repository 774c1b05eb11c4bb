//! Error types shared by the store, the transport and the client session.

use thiserror::Error;

/// Rejections raised by the history store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("empty message")]
    EmptyMessage,
}

/// Failures of the connection itself, as opposed to errors the server replied with.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid frame: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("connection closed by peer")]
    Closed,

    #[error("response id mismatch: expected {expected}, got {got}")]
    Mismatch { expected: u64, got: u64 },
}

/// Outcome of a failed remote call.
#[derive(Debug, Error)]
pub enum CallError {
    /// The server handled the call and returned an application error.
    #[error("{0}")]
    Remote(String),

    /// The server answered but its result could not be decoded. The call may
    /// already have taken effect.
    #[error("undecodable reply: {0}")]
    Protocol(#[source] serde_json::Error),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl CallError {
    pub fn is_transport(&self) -> bool {
        matches!(self, CallError::Transport(_))
    }
}

/// Errors that end an interactive session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("error connecting to server {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: TransportError,
    },

    #[error("reconnect failed: {source} (send error was: {cause})")]
    Reconnect {
        cause: CallError,
        #[source]
        source: TransportError,
    },

    #[error("send failed after reconnect: {0}")]
    RetryFailed(#[source] CallError),

    #[error("input error: {0}")]
    Input(#[from] std::io::Error),
}
