//! Terminal front end: a log pane above a status line.
//!
//! [`LogView`] and [`StatusLine`] are the terminal's display surface and
//! status indicator; [`Screen`] draws them and [`TerminalGuard`] owns the
//! raw-mode session.

mod log_view;
mod output;
mod screen;
mod status_line;

pub use log_view::{LogView, LogViewConfig};
pub use output::{OutputBuffer, Rgb};
pub use screen::{Screen, TerminalConfig, TerminalGuard};
pub use status_line::{StatusLine, StatusLineConfig};
