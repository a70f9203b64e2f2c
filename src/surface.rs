//! Display surfaces and status indicators.
//!
//! The widget never talks to a concrete UI. It appends text to a
//! [`DisplaySurface`], reads and writes its scroll position, and reports
//! connection state through a [`StatusIndicator`]. The terminal front end
//! implements both in [`crate::terminal`]; this module provides headless
//! implementations for pipes, embedding and tests.

use std::io::Write;
use tracing::{info, warn};

/// Auto-scroll tolerance: how close to the bottom still counts as "at the bottom".
pub const DEFAULT_SCROLL_TOLERANCE: u32 = 50;

/// A scrollable, append-only text element.
///
/// Metrics follow the usual scrolling-element model: `scroll_height` is the
/// full content height, `client_height` the visible height and `scroll_top`
/// the offset of the first visible unit. Units are up to the surface.
pub trait DisplaySurface {
    /// Append text to the end of the content, verbatim.
    fn append_text(&mut self, text: &str);

    /// Total content height.
    fn scroll_height(&self) -> u32;

    /// Visible height.
    fn client_height(&self) -> u32;

    /// Current scroll offset.
    fn scroll_top(&self) -> u32;

    /// Set the scroll offset. Implementations clamp to
    /// `scroll_height - client_height`.
    fn set_scroll_top(&mut self, top: u32);

    /// Identifier of the sandbox this surface shows logs for.
    fn target_id(&self) -> Option<&str>;

    /// Units moved by a single-line scroll gesture.
    fn line_step(&self) -> u32 {
        1
    }
}

/// Colour cue for a status message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusTone {
    /// Work in progress ("connecting...").
    Caution,
    /// Healthy ("connected").
    Success,
    /// Inactive ("disconnected").
    Muted,
}

/// Where connection status is reported.
pub trait StatusIndicator {
    /// Replace the status text and tone.
    fn set_status(&mut self, text: &str, tone: StatusTone);
}

/// A scroll gesture requested by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollAction {
    /// Move by whole lines (negative is up).
    Lines(i32),
    /// Move by visible pages (negative is up).
    Pages(i32),
    /// Jump to the start.
    Top,
    /// Jump to the end.
    Bottom,
}

/// Whether the view counts as pinned to the bottom.
///
/// True iff `scroll_height - scroll_top - client_height < tolerance`.
pub fn is_near_bottom(scroll_height: u32, scroll_top: u32, client_height: u32, tolerance: u32) -> bool {
    i64::from(scroll_height) - i64::from(scroll_top) - i64::from(client_height) < i64::from(tolerance)
}

/// Highest valid scroll offset for the given metrics.
pub const fn max_scroll_top(scroll_height: u32, client_height: u32) -> u32 {
    scroll_height.saturating_sub(client_height)
}

/// In-memory surface measured in lines.
#[derive(Debug, Clone, Default)]
pub struct MemorySurface {
    text: String,
    target: Option<String>,
    client_height: u32,
    line_height: u32,
    scroll_top: u32,
    content_height: Option<u32>,
}

impl MemorySurface {
    /// Create an empty surface bound to `target`.
    pub fn new(target: Option<&str>) -> Self {
        Self {
            target: target.map(str::to_string),
            line_height: 1,
            ..Self::default()
        }
    }

    /// Set the visible height.
    #[must_use]
    pub fn with_client_height(mut self, height: u32) -> Self {
        self.client_height = height;
        self
    }

    /// Set how many units one line occupies.
    #[must_use]
    pub fn with_line_height(mut self, height: u32) -> Self {
        self.line_height = height;
        self
    }

    /// Pin the content height instead of deriving it from the text.
    pub const fn set_content_height(&mut self, height: u32) {
        self.content_height = Some(height);
    }

    /// Move the scroll offset without clamping, as a user gesture might
    /// on a surface whose metrics were pinned.
    pub const fn scroll_raw(&mut self, top: u32) {
        self.scroll_top = top;
    }

    /// Everything appended so far.
    pub fn text(&self) -> &str {
        &self.text
    }

    fn line_count(&self) -> u32 {
        let lines = self.text.split_terminator('\n').count().max(1);
        u32::try_from(lines).unwrap_or(u32::MAX)
    }
}

impl DisplaySurface for MemorySurface {
    fn append_text(&mut self, text: &str) {
        self.text.push_str(text);
    }

    fn scroll_height(&self) -> u32 {
        let derived = self.line_count().saturating_mul(self.line_height);
        self.content_height.unwrap_or(derived).max(self.client_height)
    }

    fn client_height(&self) -> u32 {
        self.client_height
    }

    fn scroll_top(&self) -> u32 {
        self.scroll_top
    }

    fn set_scroll_top(&mut self, top: u32) {
        self.scroll_top = top.min(max_scroll_top(self.scroll_height(), self.client_height));
    }

    fn target_id(&self) -> Option<&str> {
        self.target.as_deref()
    }

    fn line_step(&self) -> u32 {
        self.line_height.max(1)
    }
}

/// Records every status change.
#[derive(Debug, Clone, Default)]
pub struct MemoryStatus {
    history: Vec<(String, StatusTone)>,
}

impl MemoryStatus {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// The latest status text, if any was set.
    pub fn text(&self) -> Option<&str> {
        self.history.last().map(|(text, _)| text.as_str())
    }

    /// The latest tone, if any was set.
    pub fn tone(&self) -> Option<StatusTone> {
        self.history.last().map(|(_, tone)| *tone)
    }

    /// All status changes in order.
    pub fn history(&self) -> &[(String, StatusTone)] {
        &self.history
    }
}

impl StatusIndicator for MemoryStatus {
    fn set_status(&mut self, text: &str, tone: StatusTone) {
        self.history.push((text.to_string(), tone));
    }
}

/// Pipe-mode surface: writes each frame straight to a writer.
///
/// There is nothing to scroll, so the surface always reports itself as at
/// the bottom.
pub struct WriterSurface<W: Write> {
    writer: W,
    target: String,
    failed: bool,
}

impl<W: Write> WriterSurface<W> {
    /// Create a surface for `target` writing to `writer`.
    pub fn new(writer: W, target: impl Into<String>) -> Self {
        Self {
            writer,
            target: target.into(),
            failed: false,
        }
    }

    /// Whether a write has failed and output is being discarded.
    pub const fn has_failed(&self) -> bool {
        self.failed
    }

    /// Consume the surface, returning the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> DisplaySurface for WriterSurface<W> {
    fn append_text(&mut self, text: &str) {
        if self.failed {
            return;
        }
        let result = self
            .writer
            .write_all(text.as_bytes())
            .and_then(|()| self.writer.flush());
        if let Err(e) = result {
            warn!(error = %e, "log output failed, discarding further frames");
            self.failed = true;
        }
    }

    fn scroll_height(&self) -> u32 {
        0
    }

    fn client_height(&self) -> u32 {
        0
    }

    fn scroll_top(&self) -> u32 {
        0
    }

    fn set_scroll_top(&mut self, _top: u32) {}

    fn target_id(&self) -> Option<&str> {
        Some(&self.target)
    }
}

/// Reports status changes as tracing events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingStatus;

impl StatusIndicator for TracingStatus {
    fn set_status(&mut self, text: &str, tone: StatusTone) {
        info!(target: "logtail::status", ?tone, "{text}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_near_bottom_boundaries() {
        // H - T - C = 50
        assert!(!is_near_bottom(1000, 350, 600, 50));
        // H - T - C = 49
        assert!(is_near_bottom(1000, 351, 600, 50));
        assert!(is_near_bottom(1000, 400, 600, 50));
    }

    #[test]
    fn test_near_bottom_when_content_shorter_than_view() {
        assert!(is_near_bottom(100, 0, 600, 50));
        assert!(is_near_bottom(0, 0, 0, 50));
    }

    #[test]
    fn test_memory_surface_clamps_scroll() {
        let mut surface = MemorySurface::new(Some("x")).with_client_height(3);
        surface.append_text("1\n2\n3\n4\n5\n");
        assert_eq!(surface.scroll_height(), 5);
        surface.set_scroll_top(100);
        assert_eq!(surface.scroll_top(), 2);
    }

    #[test]
    fn test_memory_surface_line_height() {
        let mut surface = MemorySurface::new(None)
            .with_client_height(40)
            .with_line_height(20);
        surface.append_text("a\nb\nc\nd\n");
        assert_eq!(surface.scroll_height(), 80);
        assert_eq!(surface.line_step(), 20);
        assert_eq!(surface.target_id(), None);
    }

    #[test]
    fn test_memory_status_history() {
        let mut status = MemoryStatus::new();
        assert_eq!(status.text(), None);
        status.set_status("connecting...", StatusTone::Caution);
        status.set_status("connected", StatusTone::Success);
        assert_eq!(status.text(), Some("connected"));
        assert_eq!(status.tone(), Some(StatusTone::Success));
        assert_eq!(status.history().len(), 2);
    }

    #[test]
    fn test_writer_surface_passes_frames_through() {
        let mut surface = WriterSurface::new(Vec::new(), "abc");
        surface.append_text("line1\n");
        surface.append_text("partial");
        assert_eq!(surface.target_id(), Some("abc"));
        assert!(!surface.has_failed());
        assert_eq!(surface.into_inner(), b"line1\npartial");
    }

    struct Broken;

    impl Write for Broken {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_writer_surface_stops_after_failure() {
        let mut surface = WriterSurface::new(Broken, "abc");
        surface.append_text("x");
        assert!(surface.has_failed());
        surface.append_text("y");
        assert!(surface.has_failed());
    }
}
