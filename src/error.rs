//! Error types for the query and resize paths.
//!
//! Feeding bytes never fails: malformed escape sequences are absorbed by the
//! parser the way a real terminal absorbs them. Errors only come from caller
//! mistakes (out-of-range queries) or rejected resize requests.

use thiserror::Error;

use crate::screen::MAX_DIMENSION;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    #[error("Cell ({row}, {col}) is outside the {rows}x{cols} screen")]
    CellOutOfRange {
        row: u16,
        col: u16,
        rows: u16,
        cols: u16,
    },

    #[error("Line {row} is outside the {rows}-line screen")]
    LineOutOfRange { row: u16, rows: u16 },

    #[error("Invalid screen dimensions: {rows}x{cols}")]
    InvalidDimensions { rows: u16, cols: u16 },

    #[error("Screen dimensions {rows}x{cols} exceed the limit of {MAX_DIMENSION} per axis")]
    DimensionsTooLarge { rows: u16, cols: u16 },
}

pub type Result<T> = std::result::Result<T, Error>;
