//! Actor Model: Message-passing concurrency for the log tail.
//!
//! This module implements a simple actor system using crossbeam channels:
//! - **Connection Actor**: One thread per WebSocket connection, forwards frames
//! - **Input Actor**: Polls terminal events, forwards scroll/quit/resize
//! - **Runner**: The single control loop that owns the widget and reacts
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐    StreamEvent      ┌──────────────┐
//! │  Connection  │ ─────────────────▶  │              │
//! └──────────────┘                     │    Runner    │ ──▶ Renderer
//! ┌──────────────┐      UiEvent        │              │
//! │ Input Thread │ ─────────────────▶  │              │
//! └──────────────┘                     └──────────────┘
//!                                        ▲        ▲
//!                           retry timer ─┘        └─ CancelToken
//! ```

mod connection;
mod input;
mod messages;
mod runner;

pub use connection::{ConnectionActor, TransportConfig};
pub use input::{convert_event, InputActor};
pub use messages::{CloseInfo, ConnectionId, StreamEvent, StreamEventKind, UiEvent};
pub use runner::{CancelToken, NullRenderer, Pump, Renderer, TailRunner};
