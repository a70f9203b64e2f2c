//! # Logtail
//!
//! Live log tailing for sandbox sessions.
//!
//! A sandbox manager serves each sandbox's log as a WebSocket stream at
//! `/ws/sandboxes/<id>/logs`. This crate follows that stream: every frame
//! is appended verbatim to a display surface, the view follows new output
//! unless the user has scrolled away, and dropped connections are retried
//! forever with capped exponential backoff.
//!
//! ## Core Concepts
//!
//! - **Widget as state machine**: [`LogStreamWidget`] owns no socket or timer;
//!   transitions return an [`Effect`] for the host to perform
//! - **Surfaces as traits**: [`DisplaySurface`] and [`StatusIndicator`] decouple
//!   the widget from the terminal, a pipe or a test double
//! - **Actor model**: one thread per connection, one for terminal input, and a
//!   single control loop ([`actor::TailRunner`]) that owns all widget state
//!
//! ## Example
//!
//! ```rust,ignore
//! use logtail::actor::{NullRenderer, TailRunner, TransportConfig};
//! use logtail::surface::{MemoryStatus, MemorySurface};
//! use logtail::{LogStreamWidget, PageOrigin, WidgetConfig};
//!
//! let origin = PageOrigin::parse("https://manager.example")?;
//! let surface = MemorySurface::new(Some("abc123"));
//! let widget = LogStreamWidget::init(surface, Some(MemoryStatus::new()), &origin, &WidgetConfig::default())
//!     .expect("surface carries a sandbox id");
//!
//! let mut runner = TailRunner::new(widget, NullRenderer, TransportConfig::default());
//! let cancel = runner.cancel_token();
//! runner.run()?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod actor;
pub mod backoff;
pub mod config;
pub mod error;
pub mod layout;
pub mod surface;
pub mod target;
pub mod terminal;
pub mod widget;

// Re-exports for convenience
pub use backoff::RetryBackoff;
pub use error::{LogTailError, TransportError};
pub use surface::{DisplaySurface, ScrollAction, StatusIndicator, StatusTone};
pub use target::{log_stream_url, PageOrigin, SessionTarget};
pub use widget::{ConnectionState, Effect, LogStreamWidget, WidgetConfig};
