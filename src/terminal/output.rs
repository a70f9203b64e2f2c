//! Frame assembly for the terminal view.

use std::io::Write;

/// A 24-bit colour.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb {
    /// Red channel (0-255)
    pub r: u8,
    /// Green channel (0-255)
    pub g: u8,
    /// Blue channel (0-255)
    pub b: u8,
}

impl Rgb {
    /// Create a new RGB color.
    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl std::fmt::Debug for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// One frame of the log view and status line, as raw ANSI bytes.
///
/// [`Screen`](super::Screen) clears it, lets each pane draw into it, and
/// hands the whole frame to the terminal with one write so a half-drawn
/// log pane is never visible.
#[derive(Debug, Default)]
pub struct OutputBuffer {
    data: Vec<u8>,
}

impl OutputBuffer {
    /// Create a buffer sized for a typical frame.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
        }
    }

    /// Start a new frame.
    #[inline]
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// The frame so far.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Whether nothing has been drawn since the last clear.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Append already-sanitized text (log rows never carry control bytes).
    #[inline]
    pub fn write_str(&mut self, s: &str) {
        self.data.extend_from_slice(s.as_bytes());
    }

    /// Position the cursor at zero-based column `x`, row `y`.
    #[inline]
    pub fn cursor_move(&mut self, x: u16, y: u16) {
        let _ = write!(self.data, "\x1b[{};{}H", u32::from(y) + 1, u32::from(x) + 1);
    }

    /// Text colour for the following cells.
    #[inline]
    pub fn set_fg(&mut self, color: Rgb) {
        self.sgr_color(38, color);
    }

    /// Background colour for the following cells (the status row).
    #[inline]
    pub fn set_bg(&mut self, color: Rgb) {
        self.sgr_color(48, color);
    }

    /// Drop colours so they do not bleed into the next row.
    #[inline]
    pub fn reset_attrs(&mut self) {
        self.data.extend_from_slice(b"\x1b[0m");
    }

    /// Blank the rest of the row, e.g. after a short log line.
    #[inline]
    pub fn clear_line_right(&mut self) {
        self.data.extend_from_slice(b"\x1b[K");
    }

    /// Write `count` spaces.
    pub fn pad(&mut self, count: usize) {
        self.data.resize(self.data.len() + count, b' ');
    }

    /// Write the frame to `writer` and flush it.
    pub fn flush_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_all(&self.data)?;
        writer.flush()
    }

    fn sgr_color(&mut self, selector: u8, Rgb { r, g, b }: Rgb) {
        let _ = write!(self.data, "\x1b[{selector};2;{r};{g};{b}m");
    }
}
