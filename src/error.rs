//! Error types.
//!
//! Transport failures are not represented here: they are folded into the
//! retry loop as stream events and never surface to the caller.

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while configuring or hosting the log tail.
#[derive(Debug, Error)]
pub enum LogTailError {
    /// The page origin could not be mapped to a stream endpoint.
    #[error("invalid page origin `{origin}`: {reason}")]
    InvalidOrigin {
        /// The origin as given.
        origin: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// The stream URL could not be assembled.
    #[error("failed to build stream URL: {0}")]
    Url(#[from] url::ParseError),

    /// Terminal or output I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A worker thread could not be started.
    #[error("failed to spawn {name} thread: {source}")]
    Spawn {
        /// Thread name.
        name: String,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, LogTailError>;

/// Why a connection attempt or an open stream failed.
///
/// These never leave the connection thread as errors; their text is
/// forwarded as a stream event and the retry loop takes over.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The endpoint host could not be resolved.
    #[error("cannot resolve host: {0}")]
    Resolve(#[source] io::Error),

    /// No resolved address accepted the TCP connection.
    #[error("connect failed: {0}")]
    Connect(#[source] io::Error),

    /// The socket could not be configured.
    #[error("socket setup failed: {0}")]
    Socket(#[source] io::Error),

    /// The WebSocket (or TLS) handshake failed.
    #[error("handshake failed: {0}")]
    Handshake(#[source] Box<tungstenite::Error>),

    /// The server accepted the connection but did not finish the handshake in time.
    #[error("handshake timed out after {0:?}")]
    HandshakeTimeout(Duration),

    /// Shutdown was requested before the handshake completed.
    #[error("connection attempt cancelled")]
    Cancelled,
}
