//! Terminal screen model
//!
//! This module defines the screen's cell grid, cursor, attributes, scroll
//! region, and tab stops. Mutation primitives are driven by the sequence
//! dispatcher and clamp internally; they never fail. Bounds-checked read
//! accessors serve the query side.

use std::collections::BTreeSet;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use tracing::trace;
use unicode_width::UnicodeWidthChar;

use crate::error::{Error, Result};

/// Largest supported dimension on either axis. Resize requests past this are
/// rejected before any allocation happens.
pub const MAX_DIMENSION: u16 = 4096;

/// Columns between default tab stops.
const TAB_INTERVAL: u16 = 8;

/// Check dimensions before constructing or reallocating a grid.
pub(crate) fn validate_dimensions(rows: u16, cols: u16) -> Result<()> {
    if rows == 0 || cols == 0 {
        return Err(Error::InvalidDimensions { rows, cols });
    }
    if rows > MAX_DIMENSION || cols > MAX_DIMENSION {
        return Err(Error::DimensionsTooLarge { rows, cols });
    }
    Ok(())
}

/// Screen state holding the cell grid and everything the escape sequences
/// mutate: cursor, attributes, scroll region, tab stops, modes, title.
#[derive(Clone, Debug, PartialEq)]
pub struct Screen {
    pub(crate) rows: u16,
    pub(crate) cols: u16,
    pub(crate) grid: Vec<Row>,
    pub(crate) cursor: CursorState,
    pub(crate) current_attrs: CellAttrs,
    pub(crate) modes: TerminalModes,
    /// Scroll region (top, bottom) - 0-indexed, inclusive
    pub(crate) scroll_region: (u16, u16),
    pub(crate) tab_stops: BTreeSet<u16>,
    pub(crate) title: String,
}

impl Screen {
    /// Build a blank screen. Dimensions must already be validated.
    pub(crate) fn new(rows: u16, cols: u16) -> Self {
        Self {
            rows,
            cols,
            grid: (0..rows).map(|_| Row::new(cols)).collect(),
            cursor: CursorState::default(),
            current_attrs: CellAttrs::default(),
            modes: TerminalModes::default(),
            scroll_region: (0, rows.saturating_sub(1)),
            tab_stops: default_tab_stops(cols),
            title: String::new(),
        }
    }

    // --- read accessors ---

    pub fn size(&self) -> (u16, u16) {
        (self.rows, self.cols)
    }

    pub fn rows(&self) -> u16 {
        self.rows
    }

    pub fn cols(&self) -> u16 {
        self.cols
    }

    /// Cursor position and visibility as `(row, col, visible)`.
    pub fn cursor(&self) -> (u16, u16, bool) {
        (self.cursor.row, self.cursor.col, self.cursor.visible)
    }

    pub fn cell(&self, row: u16, col: u16) -> Result<&Cell> {
        if row >= self.rows || col >= self.cols {
            return Err(Error::CellOutOfRange {
                row,
                col,
                rows: self.rows,
                cols: self.cols,
            });
        }
        Ok(&self.grid[row as usize].cells[col as usize])
    }

    pub fn line(&self, row: u16) -> Result<&[Cell]> {
        if row >= self.rows {
            return Err(Error::LineOutOfRange {
                row,
                rows: self.rows,
            });
        }
        Ok(&self.grid[row as usize].cells)
    }

    /// One line flattened to text, blank cells as spaces.
    pub fn line_text(&self, row: u16) -> Result<String> {
        if row >= self.rows {
            return Err(Error::LineOutOfRange {
                row,
                rows: self.rows,
            });
        }
        Ok(self.grid[row as usize].text())
    }

    /// The whole grid as newline-joined text.
    pub fn screen_text(&self) -> String {
        let mut out = String::with_capacity((self.cols as usize + 1) * self.rows as usize);
        for (i, row) in self.grid.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.push_str(&row.text());
        }
        out
    }

    /// Title set via OSC 0/1/2, empty until one arrives.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Attributes applied to subsequent writes and erases.
    pub fn attrs(&self) -> &CellAttrs {
        &self.current_attrs
    }

    /// Scroll region as `(top, bottom)`, 0-indexed inclusive.
    pub fn scroll_region(&self) -> (u16, u16) {
        self.scroll_region
    }

    // --- mutation primitives (dispatcher-facing) ---

    /// Resize the grid, preserving the top-left overlap and blank-filling
    /// new area. Validation happens before any mutation, so a rejected
    /// resize leaves the screen untouched.
    pub(crate) fn resize(&mut self, rows: u16, cols: u16) -> Result<()> {
        validate_dimensions(rows, cols)?;
        trace!(rows, cols, "resizing screen");

        while self.grid.len() < rows as usize {
            self.grid.push(Row::new(cols));
        }
        self.grid.truncate(rows as usize);
        for row in &mut self.grid {
            row.resize(cols);
        }

        self.rows = rows;
        self.cols = cols;
        self.scroll_region = (0, rows - 1);
        self.tab_stops = default_tab_stops(cols);
        self.cursor.row = self.cursor.row.min(rows - 1);
        self.cursor.col = self.cursor.col.min(cols - 1);
        self.cursor.pending_wrap = false;
        Ok(())
    }

    /// Put a character at the cursor position, honoring deferred wrap,
    /// insert mode, and wide/combining characters.
    pub(crate) fn put_char(&mut self, ch: char) {
        let width = ch.width().unwrap_or(0) as u16;

        if width == 0 {
            // Combining character - append to the cell written last
            self.append_to_previous_cell(ch);
            return;
        }
        if width > self.cols {
            return;
        }

        if self.cursor.pending_wrap {
            self.cursor.pending_wrap = false;
            if self.modes.auto_wrap {
                self.cursor.col = 0;
                self.linefeed();
            }
        }

        // A wide character that no longer fits on this line wraps early
        if self.cursor.col + width > self.cols {
            if self.modes.auto_wrap {
                self.cursor.col = 0;
                self.linefeed();
            } else {
                self.cursor.col = self.cols - width;
            }
        }

        let row = self.cursor.row as usize;
        let col = self.cursor.col as usize;

        self.handle_wide_char_overwrite(row, col);

        let attrs = self.current_attrs.clone();

        if self.modes.insert_mode {
            let cells = &mut self.grid[row].cells;
            for _ in 0..width {
                cells.pop();
                cells.insert(col, Cell::blank(&attrs));
            }
        }

        self.grid[row].cells[col] = Cell {
            grapheme: ch.to_string(),
            width: width as u8,
            attrs: attrs.clone(),
        };
        if width == 2 {
            self.grid[row].cells[col + 1] = Cell::continuation(&attrs);
        }

        // The wrap itself waits for the next printable character
        if self.cursor.col + width >= self.cols {
            self.cursor.col = self.cols - 1;
            self.cursor.pending_wrap = true;
        } else {
            self.cursor.col += width;
        }
    }

    fn append_to_previous_cell(&mut self, ch: char) {
        let row = self.cursor.row as usize;
        let col = self.cursor.col as usize;
        let mut target = if self.cursor.pending_wrap {
            col
        } else if col > 0 {
            col - 1
        } else {
            return;
        };
        // A wide character leaves a continuation cell here; the combining
        // mark belongs on its lead cell
        while target > 0 && self.grid[row].cells[target].is_continuation() {
            target -= 1;
        }
        self.grid[row].cells[target].grapheme.push(ch);
    }

    fn handle_wide_char_overwrite(&mut self, row: usize, col: usize) {
        let attrs = self.current_attrs.clone();
        let cols = self.cols as usize;
        let cells = &mut self.grid[row].cells;

        // Overwriting the right half of a wide char blanks the left half
        if col > 0 && cells[col].is_continuation() {
            cells[col - 1] = Cell::blank(&attrs);
        }

        // Overwriting the left half blanks the orphaned right half
        if cells[col].width == 2 && col + 1 < cols {
            cells[col + 1] = Cell::blank(&attrs);
        }
    }

    /// Carriage return - move cursor to column 0
    pub(crate) fn carriage_return(&mut self) {
        self.cursor.col = 0;
        self.cursor.pending_wrap = false;
    }

    /// Line feed - move cursor down, scrolling at the region bottom
    pub(crate) fn linefeed(&mut self) {
        if self.cursor.row == self.scroll_region.1 {
            self.scroll_up(1);
        } else if self.cursor.row < self.rows - 1 {
            self.cursor.row += 1;
        }
        if self.modes.linefeed_newline {
            self.cursor.col = 0;
        }
        self.cursor.pending_wrap = false;
    }

    /// Backspace - move cursor left
    pub(crate) fn backspace(&mut self) {
        if self.cursor.col > 0 {
            self.cursor.col -= 1;
        }
        self.cursor.pending_wrap = false;
    }

    /// Horizontal tab - advance to the next tab stop
    pub(crate) fn horizontal_tab(&mut self) {
        let next = self
            .tab_stops
            .range(self.cursor.col + 1..)
            .next()
            .copied()
            .unwrap_or(self.cols - 1);
        self.cursor.col = next.min(self.cols - 1);
        self.cursor.pending_wrap = false;
    }

    /// CHT - advance n tab stops
    pub(crate) fn forward_tab(&mut self, n: u16) {
        for _ in 0..n {
            self.horizontal_tab();
        }
    }

    /// CBT - move back n tab stops
    pub(crate) fn backward_tab(&mut self, n: u16) {
        for _ in 0..n {
            let prev = self
                .tab_stops
                .range(..self.cursor.col)
                .next_back()
                .copied()
                .unwrap_or(0);
            self.cursor.col = prev;
        }
        self.cursor.pending_wrap = false;
    }

    /// HTS - set a tab stop at the cursor column
    pub(crate) fn set_tab_stop(&mut self) {
        self.tab_stops.insert(self.cursor.col);
    }

    /// TBC - clear the current tab stop (0) or all stops (3)
    pub(crate) fn clear_tab_stop(&mut self, mode: u16) {
        match mode {
            0 => {
                self.tab_stops.remove(&self.cursor.col);
            }
            3 => self.tab_stops.clear(),
            _ => {}
        }
    }

    /// Scroll the region up by n lines, dropping rows off the top
    pub(crate) fn scroll_up(&mut self, n: u16) {
        let (top, bottom) = self.scroll_region;
        let attrs = self.current_attrs.clone();
        let cols = self.cols;

        for _ in 0..n.min(bottom - top + 1) {
            self.grid.remove(top as usize);
            self.grid.insert(bottom as usize, Row::blank(cols, &attrs));
        }
    }

    /// Scroll the region down by n lines, dropping rows off the bottom
    pub(crate) fn scroll_down(&mut self, n: u16) {
        let (top, bottom) = self.scroll_region;
        let attrs = self.current_attrs.clone();
        let cols = self.cols;

        for _ in 0..n.min(bottom - top + 1) {
            self.grid.remove(bottom as usize);
            self.grid.insert(top as usize, Row::blank(cols, &attrs));
        }
    }

    /// Cursor up, stopping at the scroll region top when inside the region
    pub(crate) fn cursor_up(&mut self, n: u16) {
        let top = if self.cursor.row >= self.scroll_region.0 {
            self.scroll_region.0
        } else {
            0
        };
        self.cursor.row = self.cursor.row.saturating_sub(n).max(top);
        self.cursor.pending_wrap = false;
    }

    /// Cursor down, stopping at the scroll region bottom when inside it
    pub(crate) fn cursor_down(&mut self, n: u16) {
        let bottom = if self.cursor.row <= self.scroll_region.1 {
            self.scroll_region.1
        } else {
            self.rows - 1
        };
        self.cursor.row = self.cursor.row.saturating_add(n).min(bottom);
        self.cursor.pending_wrap = false;
    }

    /// Cursor forward (right)
    pub(crate) fn cursor_forward(&mut self, n: u16) {
        self.cursor.col = self.cursor.col.saturating_add(n).min(self.cols - 1);
        self.cursor.pending_wrap = false;
    }

    /// Cursor backward (left)
    pub(crate) fn cursor_backward(&mut self, n: u16) {
        self.cursor.col = self.cursor.col.saturating_sub(n);
        self.cursor.pending_wrap = false;
    }

    /// Set cursor position from 1-indexed parameters. In origin mode the
    /// row is relative to the scroll region top and confined to the region.
    pub(crate) fn cursor_position(&mut self, row: u16, col: u16) {
        let (top, bottom) = if self.modes.origin_mode {
            self.scroll_region
        } else {
            (0, self.rows - 1)
        };
        self.cursor.row = top.saturating_add(row.saturating_sub(1)).min(bottom);
        self.cursor.col = col.saturating_sub(1).min(self.cols - 1);
        self.cursor.pending_wrap = false;
    }

    /// VPA - absolute row, origin-mode aware
    pub(crate) fn cursor_to_row(&mut self, row: u16) {
        let (top, bottom) = if self.modes.origin_mode {
            self.scroll_region
        } else {
            (0, self.rows - 1)
        };
        self.cursor.row = top.saturating_add(row.saturating_sub(1)).min(bottom);
        self.cursor.pending_wrap = false;
    }

    /// CHA - absolute column
    pub(crate) fn cursor_to_col(&mut self, col: u16) {
        self.cursor.col = col.saturating_sub(1).min(self.cols - 1);
        self.cursor.pending_wrap = false;
    }

    /// Erase in display, blank cells taking the current attributes
    pub(crate) fn erase_in_display(&mut self, mode: u16) {
        let attrs = self.current_attrs.clone();
        let cursor_row = self.cursor.row as usize;
        match mode {
            0 => {
                // From cursor to end
                self.erase_in_line(0);
                for r in (cursor_row + 1)..self.rows as usize {
                    self.grid[r].clear(&attrs);
                }
            }
            1 => {
                // From start to cursor
                for r in 0..cursor_row {
                    self.grid[r].clear(&attrs);
                }
                self.erase_in_line(1);
            }
            2 | 3 => {
                // Entire screen
                for r in 0..self.rows as usize {
                    self.grid[r].clear(&attrs);
                }
            }
            _ => {}
        }
    }

    /// Erase in line, blank cells taking the current attributes
    pub(crate) fn erase_in_line(&mut self, mode: u16) {
        let attrs = self.current_attrs.clone();
        let row = self.cursor.row as usize;
        let col = self.cursor.col as usize;
        let cells = &mut self.grid[row].cells;

        match mode {
            0 => {
                for cell in &mut cells[col..] {
                    cell.clear(&attrs);
                }
            }
            1 => {
                for cell in &mut cells[..=col] {
                    cell.clear(&attrs);
                }
            }
            2 => self.grid[row].clear(&attrs),
            _ => {}
        }
    }

    /// IL - insert blank lines at the cursor, pushing rows off the region
    /// bottom. No-op when the cursor is outside the scroll region.
    pub(crate) fn insert_lines(&mut self, n: u16) {
        let (top, bottom) = self.scroll_region;
        let row = self.cursor.row;
        if row < top || row > bottom {
            return;
        }
        let attrs = self.current_attrs.clone();
        let cols = self.cols;

        for _ in 0..n.min(bottom - row + 1) {
            self.grid.remove(bottom as usize);
            self.grid.insert(row as usize, Row::blank(cols, &attrs));
        }
    }

    /// DL - delete lines at the cursor, blank lines entering at the region
    /// bottom. No-op when the cursor is outside the scroll region.
    pub(crate) fn delete_lines(&mut self, n: u16) {
        let (top, bottom) = self.scroll_region;
        let row = self.cursor.row;
        if row < top || row > bottom {
            return;
        }
        let attrs = self.current_attrs.clone();
        let cols = self.cols;

        for _ in 0..n.min(bottom - row + 1) {
            self.grid.remove(row as usize);
            self.grid.insert(bottom as usize, Row::blank(cols, &attrs));
        }
    }

    /// ICH - insert blank cells at the cursor, shifting the tail right
    pub(crate) fn insert_chars(&mut self, n: u16) {
        let attrs = self.current_attrs.clone();
        let row = self.cursor.row as usize;
        let col = self.cursor.col as usize;
        let cells = &mut self.grid[row].cells;

        for _ in 0..n.min(self.cols) {
            cells.pop();
            cells.insert(col, Cell::blank(&attrs));
        }
    }

    /// DCH - delete cells at the cursor, blanks entering from the right
    pub(crate) fn delete_chars(&mut self, n: u16) {
        let attrs = self.current_attrs.clone();
        let row = self.cursor.row as usize;
        let col = self.cursor.col as usize;
        let cells = &mut self.grid[row].cells;

        for _ in 0..n.min(self.cols) {
            if col < cells.len() {
                cells.remove(col);
                cells.push(Cell::blank(&attrs));
            }
        }
    }

    /// ECH - blank n cells from the cursor without shifting
    pub(crate) fn erase_chars(&mut self, n: u16) {
        let attrs = self.current_attrs.clone();
        let row = self.cursor.row as usize;
        let col = self.cursor.col as usize;
        let end = (col + n as usize).min(self.cols as usize);

        for cell in &mut self.grid[row].cells[col..end] {
            cell.clear(&attrs);
        }
    }

    /// DECSTBM - set scroll region from 1-indexed parameters. Returns
    /// whether the region was accepted; a degenerate region (top >= bottom)
    /// leaves everything untouched.
    pub(crate) fn set_scroll_region(&mut self, top: u16, bottom: u16) -> bool {
        let top = top.saturating_sub(1).min(self.rows - 1);
        let bottom = bottom.saturating_sub(1).min(self.rows - 1);
        if top < bottom {
            self.scroll_region = (top, bottom);
            true
        } else {
            false
        }
    }

    /// DECSC - save cursor position and attributes
    pub(crate) fn save_cursor(&mut self) {
        self.cursor.saved = Some(SavedCursor {
            row: self.cursor.row,
            col: self.cursor.col,
            attrs: self.current_attrs.clone(),
            origin_mode: self.modes.origin_mode,
        });
    }

    /// DECRC - restore the saved cursor, or home if nothing was saved
    pub(crate) fn restore_cursor(&mut self) {
        match self.cursor.saved.take() {
            Some(saved) => {
                self.cursor.row = saved.row.min(self.rows - 1);
                self.cursor.col = saved.col.min(self.cols - 1);
                self.current_attrs = saved.attrs.clone();
                self.modes.origin_mode = saved.origin_mode;
                self.cursor.saved = Some(saved);
            }
            None => {
                self.cursor.row = 0;
                self.cursor.col = 0;
            }
        }
        self.cursor.pending_wrap = false;
    }

    /// SM/RM - ANSI modes
    pub(crate) fn set_mode(&mut self, mode: u16, enable: bool) {
        match mode {
            4 => self.modes.insert_mode = enable,
            20 => self.modes.linefeed_newline = enable,
            _ => trace!(mode, enable, "ignoring unknown ANSI mode"),
        }
    }

    /// DECSET/DECRST - DEC private modes
    pub(crate) fn set_private_mode(&mut self, mode: u16, enable: bool) {
        match mode {
            1 => self.modes.application_cursor = enable,
            6 => {
                self.modes.origin_mode = enable;
                self.cursor_position(1, 1);
            }
            7 => self.modes.auto_wrap = enable,
            25 => self.cursor.visible = enable,
            2004 => self.modes.bracketed_paste = enable,
            _ => trace!(mode, enable, "ignoring unknown private mode"),
        }
    }

    /// RI - cursor up, scrolling down at the region top
    pub(crate) fn reverse_index(&mut self) {
        if self.cursor.row == self.scroll_region.0 {
            self.scroll_down(1);
        } else if self.cursor.row > 0 {
            self.cursor.row -= 1;
        }
        self.cursor.pending_wrap = false;
    }

    /// IND - cursor down, scrolling up at the region bottom
    pub(crate) fn index(&mut self) {
        if self.cursor.row == self.scroll_region.1 {
            self.scroll_up(1);
        } else if self.cursor.row < self.rows - 1 {
            self.cursor.row += 1;
        }
        self.cursor.pending_wrap = false;
    }

    /// DECALN - fill the screen with 'E', reset margins, home the cursor
    pub(crate) fn align_test(&mut self) {
        for row in &mut self.grid {
            for cell in &mut row.cells {
                *cell = Cell {
                    grapheme: "E".to_string(),
                    width: 1,
                    attrs: CellAttrs::default(),
                };
            }
        }
        self.scroll_region = (0, self.rows - 1);
        self.cursor.row = 0;
        self.cursor.col = 0;
        self.cursor.pending_wrap = false;
    }
}

fn default_tab_stops(cols: u16) -> BTreeSet<u16> {
    (0..cols).step_by(TAB_INTERVAL as usize).collect()
}

/// A single row
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Row {
    pub(crate) cells: Vec<Cell>,
}

impl Row {
    pub(crate) fn new(cols: u16) -> Self {
        Self {
            cells: vec![Cell::default(); cols as usize],
        }
    }

    pub(crate) fn blank(cols: u16, attrs: &CellAttrs) -> Self {
        let mut cell = Cell::default();
        cell.attrs = attrs.clone();
        Self {
            cells: vec![cell; cols as usize],
        }
    }

    pub(crate) fn resize(&mut self, new_cols: u16) {
        self.cells.resize(new_cols as usize, Cell::default());
    }

    pub(crate) fn clear(&mut self, attrs: &CellAttrs) {
        for cell in &mut self.cells {
            cell.clear(attrs);
        }
    }

    pub(crate) fn text(&self) -> String {
        let mut out = String::with_capacity(self.cells.len());
        for cell in &self.cells {
            if !cell.is_continuation() {
                out.push_str(cell.display_str());
            }
        }
        out
    }
}

/// A single cell
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub grapheme: String,
    pub width: u8,
    pub attrs: CellAttrs,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            grapheme: String::new(),
            width: 1,
            attrs: CellAttrs::default(),
        }
    }
}

impl Cell {
    pub fn clear(&mut self, attrs: &CellAttrs) {
        self.grapheme.clear();
        self.width = 1;
        self.attrs = attrs.clone();
    }

    pub(crate) fn blank(attrs: &CellAttrs) -> Self {
        Self {
            grapheme: String::new(),
            width: 1,
            attrs: attrs.clone(),
        }
    }

    pub(crate) fn continuation(attrs: &CellAttrs) -> Self {
        Self {
            grapheme: String::new(),
            width: 0,
            attrs: attrs.clone(),
        }
    }

    /// Right half of a wide character
    pub fn is_continuation(&self) -> bool {
        self.width == 0
    }

    /// First character of the grapheme (or space if blank)
    pub fn c(&self) -> char {
        self.grapheme.chars().next().unwrap_or(' ')
    }

    /// Display text (space if blank)
    pub fn display_str(&self) -> &str {
        if self.grapheme.is_empty() {
            " "
        } else {
            &self.grapheme
        }
    }
}

/// Cell attributes
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CellAttrs {
    pub fg: Color,
    pub bg: Color,
    pub flags: AttrFlags,
}

impl CellAttrs {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Color definition
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Color {
    #[default]
    Default,
    Indexed(u8),
    Rgb(u8, u8, u8),
}

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct AttrFlags: u16 {
        const BOLD          = 0b0000_0000_0001;
        const DIM           = 0b0000_0000_0010;
        const ITALIC        = 0b0000_0000_0100;
        const UNDERLINE     = 0b0000_0000_1000;
        const BLINK         = 0b0000_0001_0000;
        const INVERSE       = 0b0000_0010_0000;
        const HIDDEN        = 0b0000_0100_0000;
        const STRIKETHROUGH = 0b0000_1000_0000;
    }
}

/// Cursor state
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct CursorState {
    pub(crate) row: u16,
    pub(crate) col: u16,
    pub(crate) visible: bool,
    /// Set after writing in the last column; the wrap happens on the next
    /// printable character, matching real auto-margin timing.
    pub(crate) pending_wrap: bool,
    pub(crate) saved: Option<SavedCursor>,
}

impl Default for CursorState {
    fn default() -> Self {
        Self {
            row: 0,
            col: 0,
            visible: true,
            pending_wrap: false,
            saved: None,
        }
    }
}

/// Saved cursor slot for DECSC/DECRC
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct SavedCursor {
    pub(crate) row: u16,
    pub(crate) col: u16,
    pub(crate) attrs: CellAttrs,
    pub(crate) origin_mode: bool,
}

/// Terminal modes
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct TerminalModes {
    pub(crate) application_cursor: bool,
    pub(crate) application_keypad: bool,
    pub(crate) auto_wrap: bool,
    pub(crate) origin_mode: bool,
    pub(crate) insert_mode: bool,
    pub(crate) linefeed_newline: bool,
    pub(crate) bracketed_paste: bool,
}

impl Default for TerminalModes {
    fn default() -> Self {
        Self {
            application_cursor: false,
            application_keypad: false,
            auto_wrap: true, // Usually enabled by default
            origin_mode: false,
            insert_mode: false,
            linefeed_newline: false,
            bracketed_paste: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_char_advances_cursor() {
        let mut screen = Screen::new(24, 80);
        screen.put_char('A');

        assert_eq!(screen.cell(0, 0).unwrap().c(), 'A');
        assert_eq!(screen.cursor(), (0, 1, true));
        assert_eq!(screen.cell(0, 0).unwrap().attrs, CellAttrs::default());
    }

    #[test]
    fn test_pending_wrap_defers_line_break() {
        let mut screen = Screen::new(24, 10);
        for _ in 0..10 {
            screen.put_char('x');
        }
        // Cursor parks in the last column instead of wrapping immediately
        assert_eq!(screen.cursor.col, 9);
        assert!(screen.cursor.pending_wrap);

        screen.put_char('y');
        assert_eq!(screen.cursor(), (1, 1, true));
        assert_eq!(screen.cell(1, 0).unwrap().c(), 'y');
    }

    #[test]
    fn test_wrap_at_region_bottom_scrolls() {
        let mut screen = Screen::new(3, 4);
        for _ in 0..3 {
            screen.put_char('a');
            screen.carriage_return();
            screen.linefeed();
        }
        // Cursor now sits on the region bottom; filling the line wraps
        // and pushes the top row off
        for _ in 0..5 {
            screen.put_char('b');
        }
        assert_eq!(screen.line_text(0).unwrap(), "a   ");
        assert_eq!(screen.line_text(1).unwrap(), "bbbb");
        assert_eq!(screen.line_text(2).unwrap(), "b   ");
    }

    #[test]
    fn test_erase_uses_current_attrs() {
        let mut screen = Screen::new(4, 4);
        screen.current_attrs.bg = Color::Indexed(1);
        screen.erase_in_line(2);
        assert_eq!(screen.cell(0, 3).unwrap().attrs.bg, Color::Indexed(1));
        assert_eq!(screen.cell(0, 3).unwrap().c(), ' ');
    }

    #[test]
    fn test_scroll_region_scrolling() {
        let mut screen = Screen::new(5, 3);
        for r in 0..5 {
            screen.cursor_position(r + 1, 1);
            screen.put_char(char::from(b'0' + r as u8));
        }
        screen.set_scroll_region(2, 4);
        screen.cursor_position(4, 1); // region bottom (origin mode off)
        screen.linefeed();

        // Rows outside the region are untouched, row 1 scrolled away
        assert_eq!(screen.line_text(0).unwrap(), "0  ");
        assert_eq!(screen.line_text(1).unwrap(), "2  ");
        assert_eq!(screen.line_text(2).unwrap(), "3  ");
        assert_eq!(screen.line_text(3).unwrap(), "   ");
        assert_eq!(screen.line_text(4).unwrap(), "4  ");
    }

    #[test]
    fn test_origin_mode_confines_cursor() {
        let mut screen = Screen::new(10, 10);
        screen.set_scroll_region(3, 6);
        screen.set_private_mode(6, true);
        // Homed to the region top on mode change
        assert_eq!(screen.cursor.row, 2);

        screen.cursor_position(1, 1);
        assert_eq!(screen.cursor.row, 2);
        screen.cursor_position(99, 1);
        assert_eq!(screen.cursor.row, 5);
    }

    #[test]
    fn test_tab_stops() {
        let mut screen = Screen::new(4, 40);
        screen.horizontal_tab();
        assert_eq!(screen.cursor.col, 8);
        screen.horizontal_tab();
        assert_eq!(screen.cursor.col, 16);

        screen.clear_tab_stop(3);
        screen.cursor_position(1, 1);
        screen.horizontal_tab();
        assert_eq!(screen.cursor.col, 39);

        screen.cursor_position(1, 5);
        screen.set_tab_stop();
        screen.cursor_position(1, 1);
        screen.horizontal_tab();
        assert_eq!(screen.cursor.col, 4);
    }

    #[test]
    fn test_resize_preserves_top_left() {
        let mut screen = Screen::new(4, 4);
        screen.put_char('A');
        screen.cursor_position(4, 4);
        screen.put_char('Z');

        screen.resize(2, 2).unwrap();
        assert_eq!(screen.cell(0, 0).unwrap().c(), 'A');
        assert_eq!(screen.size(), (2, 2));
        // Cursor clamped into the new bounds
        assert!(screen.cursor.row < 2 && screen.cursor.col < 2);

        screen.resize(6, 6).unwrap();
        assert_eq!(screen.cell(0, 0).unwrap().c(), 'A');
        assert_eq!(screen.cell(5, 5).unwrap().c(), ' ');
    }

    #[test]
    fn test_resize_rejects_bad_dimensions() {
        let mut screen = Screen::new(4, 4);
        screen.put_char('A');

        assert_eq!(
            screen.resize(0, 10),
            Err(Error::InvalidDimensions { rows: 0, cols: 10 })
        );
        assert_eq!(
            screen.resize(10, MAX_DIMENSION + 1),
            Err(Error::DimensionsTooLarge {
                rows: 10,
                cols: MAX_DIMENSION + 1
            })
        );
        // Rejected resize leaves the screen untouched
        assert_eq!(screen.size(), (4, 4));
        assert_eq!(screen.cell(0, 0).unwrap().c(), 'A');
    }

    #[test]
    fn test_query_out_of_range() {
        let screen = Screen::new(4, 4);
        assert!(matches!(
            screen.cell(4, 0),
            Err(Error::CellOutOfRange { .. })
        ));
        assert!(matches!(screen.line(9), Err(Error::LineOutOfRange { .. })));
    }

    #[test]
    fn test_wide_char_occupies_two_cells() {
        let mut screen = Screen::new(4, 10);
        screen.put_char('漢');
        assert_eq!(screen.cell(0, 0).unwrap().c(), '漢');
        assert!(screen.cell(0, 1).unwrap().is_continuation());
        assert_eq!(screen.cursor.col, 2);

        // Overwriting the right half blanks the left half
        screen.cursor_position(1, 2);
        screen.put_char('x');
        assert_eq!(screen.cell(0, 0).unwrap().c(), ' ');
        assert_eq!(screen.cell(0, 1).unwrap().c(), 'x');
    }

    #[test]
    fn test_combining_mark_joins_wide_lead_cell() {
        let mut screen = Screen::new(4, 10);
        screen.put_char('漢');
        // U+3099 combining voiced sound mark attaches to the lead cell,
        // not the continuation half
        screen.put_char('\u{3099}');
        assert_eq!(screen.cell(0, 0).unwrap().grapheme, "漢\u{3099}");
        assert!(screen.cell(0, 1).unwrap().is_continuation());
        assert_eq!(screen.cursor.col, 2);
    }

    #[test]
    fn test_save_restore_cursor() {
        let mut screen = Screen::new(10, 10);
        screen.cursor_position(5, 5);
        screen.current_attrs.flags |= AttrFlags::BOLD;
        screen.save_cursor();

        screen.cursor_position(1, 1);
        screen.current_attrs.reset();
        screen.restore_cursor();

        assert_eq!(screen.cursor.row, 4);
        assert_eq!(screen.cursor.col, 4);
        assert!(screen.current_attrs.flags.contains(AttrFlags::BOLD));
    }

    #[test]
    fn test_insert_delete_lines_respect_region() {
        let mut screen = Screen::new(5, 2);
        for r in 0..5 {
            screen.cursor_position(r + 1, 1);
            screen.put_char(char::from(b'a' + r as u8));
        }
        screen.set_scroll_region(2, 4);
        screen.cursor_position(2, 1);
        screen.insert_lines(1);
        assert_eq!(screen.line_text(1).unwrap(), "  ");
        assert_eq!(screen.line_text(2).unwrap(), "b ");
        assert_eq!(screen.line_text(4).unwrap(), "e ");

        screen.delete_lines(1);
        assert_eq!(screen.line_text(1).unwrap(), "b ");
        assert_eq!(screen.line_text(3).unwrap(), "  ");
        assert_eq!(screen.line_text(4).unwrap(), "e ");

        // Outside the region both are no-ops
        screen.cursor_position(5, 1);
        let before = screen.clone();
        screen.insert_lines(2);
        screen.delete_lines(2);
        assert_eq!(screen, before);
    }
}
