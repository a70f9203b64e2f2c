//! Log view: the scrolling log pane.
//!
//! Keeps the received text verbatim and a wrapped copy split into screen
//! rows. Scroll metrics are measured in rows, so a `LogView` can serve as
//! the widget's [`DisplaySurface`] directly.

use super::output::{OutputBuffer, Rgb};
use crate::layout::Rect;
use crate::surface::{max_scroll_top, DisplaySurface};
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// Configuration for the log view.
#[derive(Debug, Clone)]
pub struct LogViewConfig {
    /// Text color.
    pub fg: Rgb,
    /// Columns per tab stop.
    pub tab_width: usize,
}

impl Default for LogViewConfig {
    fn default() -> Self {
        Self {
            fg: Rgb::new(220, 220, 220),
            tab_width: 4,
        }
    }
}

/// One screen row of wrapped text.
#[derive(Debug, Clone, Default)]
struct Row {
    text: String,
    /// Display width in columns.
    cols: usize,
}

/// Scrolling, append-only log pane.
#[derive(Debug)]
pub struct LogView {
    target: Option<String>,
    /// Everything received, as received.
    text: String,
    /// Wrapped rows. Never empty; the last row receives appends.
    rows: Vec<Row>,
    /// Wrap width in columns.
    width: u16,
    /// Visible rows.
    height: u16,
    scroll_top: u32,
    config: LogViewConfig,
}

impl LogView {
    /// Create an empty view for `target`.
    pub fn new(target: Option<&str>) -> Self {
        Self::with_config(target, LogViewConfig::default())
    }

    /// Create an empty view with custom configuration.
    pub fn with_config(target: Option<&str>, config: LogViewConfig) -> Self {
        Self {
            target: target.map(str::to_string),
            text: String::new(),
            rows: vec![Row::default()],
            width: 0,
            height: 0,
            scroll_top: 0,
            config,
        }
    }

    /// Set the pane size, rewrapping the content if the width changed.
    pub fn set_viewport(&mut self, width: u16, height: u16) {
        self.height = height;
        if width != self.width {
            self.width = width;
            self.rewrap();
        }
        self.scroll_top = self.scroll_top.min(self.max_top());
    }

    /// Builder form of [`set_viewport`](Self::set_viewport).
    #[must_use]
    pub fn with_viewport(mut self, width: u16, height: u16) -> Self {
        self.set_viewport(width, height);
        self
    }

    /// Everything received so far.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The rows currently on screen, top to bottom.
    pub fn visible_rows(&self) -> impl Iterator<Item = &str> {
        let start = self.scroll_top as usize;
        let end = (self.content_rows() as usize).min(start + usize::from(self.height));
        self.rows[start.min(end)..end].iter().map(|row| row.text.as_str())
    }

    /// Draw the visible rows into `area`.
    pub fn render(&self, area: Rect, out: &mut OutputBuffer) {
        let mut rows = self.visible_rows();
        for dy in 0..area.height {
            out.cursor_move(area.x, area.y + dy);
            if let Some(text) = rows.next() {
                out.set_fg(self.config.fg);
                out.write_str(text);
                out.reset_attrs();
            }
            out.clear_line_right();
        }
    }

    /// Rows holding content; a trailing empty row left by a final newline
    /// does not count.
    fn content_rows(&self) -> u32 {
        let mut rows = self.rows.len();
        if rows > 1 && self.rows[rows - 1].text.is_empty() {
            rows -= 1;
        }
        u32::try_from(rows).unwrap_or(u32::MAX)
    }

    fn max_top(&self) -> u32 {
        max_scroll_top(self.content_rows(), u32::from(self.height))
    }

    fn wrap_width(&self) -> usize {
        usize::from(self.width.max(1))
    }

    fn rewrap(&mut self) {
        let text = std::mem::take(&mut self.text);
        self.rows = vec![Row::default()];
        self.layout_text(&text);
        self.text = text;
    }

    fn layout_text(&mut self, text: &str) {
        for grapheme in text.graphemes(true) {
            match grapheme {
                "\n" | "\r\n" => self.rows.push(Row::default()),
                "\t" => {
                    let tab = self.config.tab_width.max(1);
                    let cols = self.current_row().cols;
                    for _ in 0..tab - cols % tab {
                        self.push_grapheme(" ", 1);
                    }
                }
                g if g.chars().any(char::is_control) => {}
                g => self.push_grapheme(g, UnicodeWidthStr::width(g)),
            }
        }
    }

    fn push_grapheme(&mut self, grapheme: &str, width: usize) {
        let wrap = self.wrap_width();
        let row = self.current_row();
        if row.cols > 0 && row.cols + width > wrap {
            self.rows.push(Row::default());
        }
        let row = self.current_row_mut();
        row.text.push_str(grapheme);
        row.cols += width;
    }

    fn current_row(&self) -> &Row {
        &self.rows[self.rows.len() - 1]
    }

    fn current_row_mut(&mut self) -> &mut Row {
        let last = self.rows.len() - 1;
        &mut self.rows[last]
    }
}

impl DisplaySurface for LogView {
    fn append_text(&mut self, text: &str) {
        self.text.push_str(text);
        self.layout_text(text);
    }

    fn scroll_height(&self) -> u32 {
        self.content_rows()
    }

    fn client_height(&self) -> u32 {
        u32::from(self.height)
    }

    fn scroll_top(&self) -> u32 {
        self.scroll_top
    }

    fn set_scroll_top(&mut self, top: u32) {
        self.scroll_top = top.min(self.max_top());
    }

    fn target_id(&self) -> Option<&str> {
        self.target.as_deref()
    }
}
