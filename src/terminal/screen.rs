//! Screen: terminal setup and frame rendering.
//!
//! [`TerminalGuard`] switches the terminal into raw mode on the alternate
//! screen and restores it on drop. [`Screen`] draws the log pane and the
//! status line, accumulating each frame in an [`OutputBuffer`] and writing
//! it in one go.

use super::log_view::LogView;
use super::output::OutputBuffer;
use super::status_line::StatusLine;
use crate::actor::Renderer;
use crate::layout::Layout;
use crate::surface::DisplaySurface;
use crate::widget::LogStreamWidget;
use crossterm::{
    cursor,
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use std::io::{self, Write};

/// Configuration for terminal setup.
#[derive(Debug, Clone)]
pub struct TerminalConfig {
    /// Whether to capture the mouse (wheel scrolling).
    pub enable_mouse: bool,
    /// Whether to use alternate screen buffer.
    pub alternate_screen: bool,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            enable_mouse: true,
            alternate_screen: true,
        }
    }
}

/// Raw-mode terminal session, restored on drop.
pub struct TerminalGuard {
    config: TerminalConfig,
}

impl TerminalGuard {
    /// Enter raw mode and, per `config`, the alternate screen and mouse capture.
    pub fn enter(config: TerminalConfig) -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        // From here on, Drop undoes whatever was set up.
        let guard = Self { config };

        let mut stdout = io::stdout();
        if guard.config.alternate_screen {
            execute!(stdout, EnterAlternateScreen)?;
        }
        if guard.config.enable_mouse {
            execute!(stdout, EnableMouseCapture)?;
        }
        execute!(stdout, cursor::Hide)?;
        Ok(guard)
    }

    /// Current terminal size as (columns, rows).
    pub fn size() -> io::Result<(u16, u16)> {
        terminal::size()
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let mut stdout = io::stdout();
        let _ = execute!(stdout, cursor::Show);
        if self.config.enable_mouse {
            let _ = execute!(stdout, DisableMouseCapture);
        }
        if self.config.alternate_screen {
            let _ = execute!(stdout, LeaveAlternateScreen);
        }
        let _ = terminal::disable_raw_mode();
    }
}

/// Draws a [`LogStreamWidget`] backed by a [`LogView`] and a [`StatusLine`].
pub struct Screen<W: Write> {
    writer: W,
    layout: Layout,
    output: OutputBuffer,
}

impl<W: Write> Screen<W> {
    /// Create a screen of the given size writing to `writer`.
    pub fn new(writer: W, width: u16, height: u16) -> Self {
        Self {
            writer,
            layout: Layout::for_size(width, height),
            output: OutputBuffer::with_capacity(16 * 1024),
        }
    }

    /// Current pane layout.
    pub const fn layout(&self) -> Layout {
        self.layout
    }

    /// The underlying writer.
    pub const fn writer(&self) -> &W {
        &self.writer
    }
}

impl<W: Write> Renderer<LogView, StatusLine> for Screen<W> {
    fn resize(&mut self, width: u16, height: u16, widget: &mut LogStreamWidget<LogView, StatusLine>) {
        self.layout = Layout::for_size(width, height);
        let log = self.layout.log;
        widget.relayout(|view| view.set_viewport(log.width, log.height));
    }

    fn render(&mut self, widget: &LogStreamWidget<LogView, StatusLine>) -> io::Result<()> {
        self.output.clear();
        let view = widget.display();
        view.render(self.layout.log, &mut self.output);

        if let Some(status) = widget.status() {
            let follow = if widget.auto_scroll() {
                "FOLLOW".to_string()
            } else {
                let below = view
                    .scroll_height()
                    .saturating_sub(view.scroll_top() + view.client_height());
                format!("PAUSED +{below}")
            };
            let hint = format!("{}  {follow}  q quit", widget.target());
            status.render(self.layout.status, &hint, &mut self.output);
        }

        self.output.flush_to(&mut self.writer)
    }
}
