//! Message types for actor communication.
//!
//! These enums define the protocol between the connection and input
//! threads and the control loop.

use crate::surface::ScrollAction;
use std::fmt;

/// Identifies one connection attempt.
///
/// Each reconnect gets a fresh id, so events still in flight from a
/// superseded connection can be told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How a connection ended.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CloseInfo {
    /// Close code sent by the server, if it sent a close frame.
    pub code: Option<u16>,
    /// Close reason sent by the server.
    pub reason: String,
}

impl CloseInfo {
    /// Whether the server performed a closing handshake.
    pub const fn is_clean(&self) -> bool {
        self.code.is_some()
    }
}

/// What happened on a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEventKind {
    /// The handshake completed.
    Opened,
    /// A frame arrived, as text.
    Frame(String),
    /// The transport failed. A `Closed` always follows.
    Error(String),
    /// The connection is gone. Always the last event of a connection.
    Closed(CloseInfo),
}

/// Events from a connection thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamEvent {
    /// The connection that produced the event.
    pub connection: ConnectionId,
    /// The event itself.
    pub kind: StreamEventKind,
}

/// Events from the input thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    /// The user scrolled the log pane.
    Scroll(ScrollAction),

    /// Terminal was resized.
    Resize {
        /// New width in columns.
        width: u16,
        /// New height in rows.
        height: u16,
    },

    /// The user asked to quit.
    Quit,

    /// Input thread encountered an error.
    Error(String),
}
