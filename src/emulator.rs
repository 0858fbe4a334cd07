//! The emulator facade
//!
//! [`Vt100`] owns one parser and one screen and exposes the whole public
//! surface: feed bytes in, query cells, cursor, and dimensions out. Feeding
//! and querying may interleave freely between `feed` calls; the type is
//! single-threaded by design and holds no locks or external resources.

use crate::dispatch::Response;
use crate::error::Result;
use crate::parser::VtParser;
use crate::screen::{validate_dimensions, Cell, Screen};

/// A headless VT100 terminal.
#[derive(Debug)]
pub struct Vt100 {
    screen: Screen,
    parser: VtParser,
}

impl Vt100 {
    /// Create a blank terminal of the given size.
    ///
    /// Fails with [`Error::InvalidDimensions`](crate::Error::InvalidDimensions)
    /// on a zero axis and
    /// [`Error::DimensionsTooLarge`](crate::Error::DimensionsTooLarge) past
    /// [`MAX_DIMENSION`](crate::MAX_DIMENSION).
    pub fn new(rows: u16, cols: u16) -> Result<Self> {
        validate_dimensions(rows, cols)?;
        Ok(Self {
            screen: Screen::new(rows, cols),
            parser: VtParser::new(),
        })
    }

    /// Process a chunk of bytes from the terminal's host.
    ///
    /// Chunk boundaries carry no meaning: escape sequences and multibyte
    /// characters split across calls resume where they left off. Returns
    /// the answers to any report sequences (DSR, DA) in the chunk; drop
    /// them if there is no host to answer.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<Response> {
        let mut responses = Vec::new();
        for &byte in bytes {
            if let Some(response) = self.parser.feed(byte, &mut self.screen) {
                responses.push(response);
            }
        }
        responses
    }

    /// Return to the exact state of a freshly constructed terminal of the
    /// same dimensions: blank grid, home cursor, default attributes, full
    /// scroll region, default tab stops, parser in Ground.
    pub fn reset(&mut self) {
        let (rows, cols) = self.screen.size();
        self.screen = Screen::new(rows, cols);
        self.parser.reset();
    }

    /// Resize the grid, preserving the overlapping top-left content and
    /// blank-filling new area. All-or-nothing: a rejected size leaves the
    /// terminal untouched. Parser state is unaffected.
    pub fn resize(&mut self, rows: u16, cols: u16) -> Result<()> {
        self.screen.resize(rows, cols)
    }

    /// Dimensions as `(rows, cols)`.
    pub fn size(&self) -> (u16, u16) {
        self.screen.size()
    }

    /// Cursor position and visibility as `(row, col, visible)`, 0-indexed.
    pub fn cursor(&self) -> (u16, u16, bool) {
        self.screen.cursor()
    }

    /// A single cell; out-of-range coordinates are an error, never clamped.
    pub fn cell(&self, row: u16, col: u16) -> Result<&Cell> {
        self.screen.cell(row, col)
    }

    /// One full line of cells.
    pub fn line(&self, row: u16) -> Result<&[Cell]> {
        self.screen.line(row)
    }

    /// One line flattened to text, blank cells as spaces.
    pub fn line_text(&self, row: u16) -> Result<String> {
        self.screen.line_text(row)
    }

    /// The whole grid as newline-joined text.
    pub fn screen_text(&self) -> String {
        self.screen.screen_text()
    }

    /// Window title set via OSC 0/1/2, empty until one arrives.
    pub fn title(&self) -> &str {
        self.screen.title()
    }

    /// Read access to the full screen model.
    pub fn screen(&self) -> &Screen {
        &self.screen
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::screen::MAX_DIMENSION;

    #[test]
    fn test_new_validates_dimensions() {
        assert!(Vt100::new(24, 80).is_ok());
        assert_eq!(
            Vt100::new(0, 80).unwrap_err(),
            Error::InvalidDimensions { rows: 0, cols: 80 }
        );
        assert!(matches!(
            Vt100::new(MAX_DIMENSION + 1, 80),
            Err(Error::DimensionsTooLarge { .. })
        ));
    }

    #[test]
    fn test_reset_matches_fresh_terminal() {
        let mut term = Vt100::new(10, 20).unwrap();
        term.feed(b"\x1b[31;1mhello\x1b[3;7r\x1b[?6h\tworld\x1b]0;t\x07\x1b[5");
        term.reset();

        let fresh = Vt100::new(10, 20).unwrap();
        assert_eq!(term.screen(), fresh.screen());

        // Parser is back in Ground: the dangling CSI above is gone
        term.feed(b"A");
        assert_eq!(term.cell(0, 0).unwrap().c(), 'A');
    }

    #[test]
    fn test_feed_empty_chunk() {
        let mut term = Vt100::new(4, 4).unwrap();
        assert!(term.feed(b"").is_empty());
        assert_eq!(term.cursor(), (0, 0, true));
    }

    #[test]
    fn test_interleaved_query_and_feed() {
        let mut term = Vt100::new(4, 10).unwrap();
        term.feed(b"ab");
        assert_eq!(term.cursor(), (0, 2, true));
        // Query mid-escape-sequence is fine; the sequence resumes after
        term.feed(b"\x1b[");
        assert_eq!(term.cursor(), (0, 2, true));
        term.feed(b"2;2H");
        assert_eq!(term.cursor(), (1, 1, true));
    }

    #[test]
    fn test_resize_keeps_parser_state() {
        let mut term = Vt100::new(4, 10).unwrap();
        term.feed(b"\x1b[2;");
        term.resize(8, 20).unwrap();
        term.feed(b"3H");
        assert_eq!(term.cursor(), (1, 2, true));
    }

    #[test]
    fn test_screen_text_and_title() {
        let mut term = Vt100::new(2, 5).unwrap();
        term.feed(b"hi\r\nyo\x1b]2;demo\x07");
        assert_eq!(term.screen_text(), "hi   \nyo   ");
        assert_eq!(term.title(), "demo");
    }
}
