//! vt100-headless - a VT100 terminal emulator without a display.
//!
//! Feed it the byte stream a pseudo-terminal produces and it maintains the
//! in-memory model of what a real terminal would show: a character grid
//! with per-cell attributes, a cursor, a scroll region, and tab stops.
//! Query the model at any point to build rendering, logging, or scripted
//! interaction tooling on top.
//!
//! # Architecture
//!
//! ```text
//! Vt100
//! ├── VtParser (escape sequence state machine)
//! │     └── dispatch (CSI/ESC/SGR/OSC semantics)
//! └── Screen (cell grid + cursor + attributes)
//! ```
//!
//! Bytes flow through the parser one at a time; completed sequences are
//! dispatched as screen mutations. Partial sequences survive across `feed`
//! calls, so chunk boundaries never matter. Malformed input is absorbed
//! the way real terminals absorb it - feeding never fails.
//!
//! # Quick Start
//!
//! ```
//! use vt100_headless::Vt100;
//!
//! let mut term = Vt100::new(24, 80)?;
//! term.feed(b"plain \x1b[1;31mbold red\x1b[0m\r\nsecond line");
//!
//! assert_eq!(term.line_text(0)?.trim_end(), "plain bold red");
//! assert_eq!(term.line_text(1)?.trim_end(), "second line");
//! let (row, col, visible) = term.cursor();
//! assert_eq!((row, visible), (1, true));
//! # assert_eq!(col, 11);
//! # Ok::<(), vt100_headless::Error>(())
//! ```

mod dispatch;
mod emulator;
mod error;
mod parser;
mod screen;

pub use dispatch::Response;
pub use emulator::Vt100;
pub use error::{Error, Result};
pub use screen::{AttrFlags, Cell, CellAttrs, Color, Screen, MAX_DIMENSION};
