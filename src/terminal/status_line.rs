//! Status line: connection status on the bottom row.

use super::output::{OutputBuffer, Rgb};
use crate::layout::Rect;
use crate::surface::{StatusIndicator, StatusTone};
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// Configuration for the status line.
#[derive(Debug, Clone)]
pub struct StatusLineConfig {
    /// Background color.
    pub bg: Rgb,
    /// Color for [`StatusTone::Caution`].
    pub caution: Rgb,
    /// Color for [`StatusTone::Success`].
    pub success: Rgb,
    /// Color for [`StatusTone::Muted`].
    pub muted: Rgb,
    /// Color of the right-hand hint.
    pub hint: Rgb,
}

impl Default for StatusLineConfig {
    fn default() -> Self {
        Self {
            bg: Rgb::new(40, 40, 40),
            caution: Rgb::new(229, 192, 123),
            success: Rgb::new(152, 195, 121),
            muted: Rgb::new(128, 128, 128),
            hint: Rgb::new(150, 150, 150),
        }
    }
}

/// Single-row connection status.
#[derive(Debug)]
pub struct StatusLine {
    text: String,
    tone: StatusTone,
    config: StatusLineConfig,
}

impl StatusLine {
    /// Create an empty status line.
    pub fn new() -> Self {
        Self::with_config(StatusLineConfig::default())
    }

    /// Create an empty status line with custom colors.
    pub const fn with_config(config: StatusLineConfig) -> Self {
        Self {
            text: String::new(),
            tone: StatusTone::Muted,
            config,
        }
    }

    /// Current status text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Current tone.
    pub const fn tone(&self) -> StatusTone {
        self.tone
    }

    /// Color used for the current tone.
    pub const fn color(&self) -> Rgb {
        match self.tone {
            StatusTone::Caution => self.config.caution,
            StatusTone::Success => self.config.success,
            StatusTone::Muted => self.config.muted,
        }
    }

    /// Draw the status on the left and `hint` right-aligned.
    ///
    /// The status text wins when the row is too narrow for both.
    pub fn render(&self, area: Rect, hint: &str, out: &mut OutputBuffer) {
        if area.is_empty() {
            return;
        }
        let width = usize::from(area.width);

        out.cursor_move(area.x, area.y);
        out.set_bg(self.config.bg);
        out.set_fg(self.color());
        let (left, used) = fit(&format!(" {}", self.text), width);
        out.write_str(&left);

        let room = width - used;
        let hint_cols = UnicodeWidthStr::width(hint) + 1;
        if hint_cols <= room {
            out.pad(room - hint_cols);
            out.set_fg(self.config.hint);
            out.write_str(hint);
            out.pad(1);
        } else {
            out.pad(room);
        }
        out.reset_attrs();
    }
}

impl Default for StatusLine {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusIndicator for StatusLine {
    fn set_status(&mut self, text: &str, tone: StatusTone) {
        text.clone_into(&mut self.text);
        self.tone = tone;
    }
}

/// Truncate `text` to at most `max_cols` display columns.
fn fit(text: &str, max_cols: usize) -> (String, usize) {
    let mut fitted = String::new();
    let mut cols = 0;
    for grapheme in text.graphemes(true) {
        let width = UnicodeWidthStr::width(grapheme);
        if cols + width > max_cols {
            break;
        }
        fitted.push_str(grapheme);
        cols += width;
    }
    (fitted, cols)
}
