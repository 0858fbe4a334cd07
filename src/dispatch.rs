//! Sequence semantics
//!
//! Maps completed parser tokens (C0 controls, ESC finals, CSI finals with
//! parameters, OSC payloads) to screen mutations. Unrecognized tokens are
//! logged and absorbed; nothing here can fail. Report sequences (DSR, DA)
//! produce a [`Response`] the host should write back to the byte source.

use tracing::debug;

use crate::screen::{AttrFlags, Color, Screen};

/// Answer to a report sequence, to be written back to the terminal's host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Cursor position report: ESC [ row ; col R (1-indexed)
    CursorPosition(u16, u16),
    /// Terminal status report: ESC [ 0 n
    StatusOk,
    /// Device attributes response
    DeviceAttributes,
    /// Secondary device attributes response
    SecondaryDeviceAttributes,
}

impl Response {
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Response::CursorPosition(row, col) => format!("\x1b[{};{}R", row, col).into_bytes(),
            Response::StatusOk => b"\x1b[0n".to_vec(),
            // VT100 with advanced video option
            Response::DeviceAttributes => b"\x1b[?1;2c".to_vec(),
            Response::SecondaryDeviceAttributes => b"\x1b[>0;10;0c".to_vec(),
        }
    }
}

/// C0 controls outside escape sequences (and, except for ESC/CAN/SUB,
/// inside them too).
pub(crate) fn execute_control(byte: u8, screen: &mut Screen) {
    match byte {
        0x07 => {} // BEL - nothing to ring headlessly
        0x08 => screen.backspace(),
        0x09 => screen.horizontal_tab(),
        0x0A | 0x0B | 0x0C => screen.linefeed(),
        0x0D => screen.carriage_return(),
        _ => {}
    }
}

/// Two-byte ESC sequences and intermediate forms (charset designation,
/// DEC `#` tests).
pub(crate) fn execute_esc(final_byte: u8, intermediates: &[u8], screen: &mut Screen) {
    if intermediates.contains(&b'#') {
        match final_byte {
            b'8' => screen.align_test(), // DECALN
            _ => debug!("Unknown ESC # sequence: final={:?}", final_byte as char),
        }
        return;
    }
    if intermediates.iter().any(|&b| b == b'(' || b == b')') {
        // Charset designation (SCS) - consumed, G0/G1 substitution is not
        // modeled
        return;
    }
    if !intermediates.is_empty() {
        debug!(
            "Unknown ESC sequence: intermediates={:?}, final={:?}",
            intermediates, final_byte as char
        );
        return;
    }

    match final_byte {
        b'7' => screen.save_cursor(),    // DECSC
        b'8' => screen.restore_cursor(), // DECRC
        b'D' => screen.index(),          // IND
        b'E' => {
            // NEL - Next line
            screen.carriage_return();
            screen.linefeed();
        }
        b'H' => screen.set_tab_stop(),   // HTS
        b'M' => screen.reverse_index(),  // RI
        b'c' => {
            // RIS - Full reset
            let (rows, cols) = screen.size();
            *screen = Screen::new(rows, cols);
        }
        b'=' => screen.modes.application_keypad = true,  // DECKPAM
        b'>' => screen.modes.application_keypad = false, // DECKPNM
        _ => debug!("Unknown ESC sequence: final={:?}", final_byte as char),
    }
}

/// Completed CSI token: final byte selects the operation, parameters and
/// the `?`/`>` prefix qualify it.
pub(crate) fn execute_csi(
    final_byte: u8,
    params: &[u16],
    intermediates: &[u8],
    screen: &mut Screen,
) -> Option<Response> {
    let is_private = intermediates.contains(&b'?');
    let is_gt = intermediates.contains(&b'>');

    match (is_private, is_gt, final_byte) {
        // Cursor movement
        (false, false, b'A') => {
            screen.cursor_up(params.first().copied().unwrap_or(1).max(1));
        }
        (false, false, b'B') => {
            screen.cursor_down(params.first().copied().unwrap_or(1).max(1));
        }
        (false, false, b'C') => {
            screen.cursor_forward(params.first().copied().unwrap_or(1).max(1));
        }
        (false, false, b'D') => {
            screen.cursor_backward(params.first().copied().unwrap_or(1).max(1));
        }
        (false, false, b'E') => {
            // CNL - Cursor Next Line
            screen.cursor_down(params.first().copied().unwrap_or(1).max(1));
            screen.carriage_return();
        }
        (false, false, b'F') => {
            // CPL - Cursor Previous Line
            screen.cursor_up(params.first().copied().unwrap_or(1).max(1));
            screen.carriage_return();
        }
        (false, false, b'G') => {
            // CHA - Cursor Character Absolute
            screen.cursor_to_col(params.first().copied().unwrap_or(1).max(1));
        }
        (false, false, b'H') | (false, false, b'f') => {
            // CUP / HVP - Cursor Position
            let row = params.first().copied().unwrap_or(1).max(1);
            let col = params.get(1).copied().unwrap_or(1).max(1);
            screen.cursor_position(row, col);
        }
        (false, false, b'd') => {
            // VPA - Line Position Absolute
            screen.cursor_to_row(params.first().copied().unwrap_or(1).max(1));
        }
        (false, false, b'I') => {
            // CHT - Cursor Horizontal Tab
            screen.forward_tab(params.first().copied().unwrap_or(1).max(1));
        }
        (false, false, b'Z') => {
            // CBT - Cursor Backward Tab
            screen.backward_tab(params.first().copied().unwrap_or(1).max(1));
        }

        // Erase
        (false, false, b'J') => {
            screen.erase_in_display(params.first().copied().unwrap_or(0));
        }
        (false, false, b'K') => {
            screen.erase_in_line(params.first().copied().unwrap_or(0));
        }

        // Line operations
        (false, false, b'L') => {
            screen.insert_lines(params.first().copied().unwrap_or(1).max(1));
        }
        (false, false, b'M') => {
            screen.delete_lines(params.first().copied().unwrap_or(1).max(1));
        }

        // Character operations
        (false, false, b'@') => {
            // ICH - Insert Characters
            screen.insert_chars(params.first().copied().unwrap_or(1).max(1));
        }
        (false, false, b'P') => {
            // DCH - Delete Characters
            screen.delete_chars(params.first().copied().unwrap_or(1).max(1));
        }
        (false, false, b'X') => {
            // ECH - Erase Characters
            screen.erase_chars(params.first().copied().unwrap_or(1).max(1));
        }

        // Scroll
        (false, false, b'S') => {
            screen.scroll_up(params.first().copied().unwrap_or(1).max(1));
        }
        (false, false, b'T') => {
            screen.scroll_down(params.first().copied().unwrap_or(1).max(1));
        }

        // Scroll region
        (false, false, b'r') => {
            // DECSTBM - homes the cursor, but only when the region is valid
            let top = params.first().copied().unwrap_or(1).max(1);
            let bottom = params.get(1).copied().unwrap_or(screen.rows());
            if screen.set_scroll_region(top, bottom) {
                screen.cursor_position(1, 1);
            }
        }

        // SGR - Select Graphic Rendition
        (false, false, b'm') => execute_sgr(params, screen),

        // Tab stop management
        (false, false, b'g') => {
            // TBC - Tabulation Clear
            screen.clear_tab_stop(params.first().copied().unwrap_or(0));
        }

        // Save/restore cursor
        (false, false, b's') => screen.save_cursor(),
        (false, false, b'u') => screen.restore_cursor(),

        // Device Status Report
        (false, false, b'n') => match params.first().copied() {
            Some(5) => return Some(Response::StatusOk),
            Some(6) => {
                let (row, col, _) = screen.cursor();
                // With origin mode set the report is relative to the
                // scroll-region top
                let row = if screen.modes.origin_mode {
                    row - screen.scroll_region().0
                } else {
                    row
                };
                return Some(Response::CursorPosition(row + 1, col + 1));
            }
            _ => {}
        },

        // Device Attributes
        (false, false, b'c') => return Some(Response::DeviceAttributes),
        (false, true, b'c') => return Some(Response::SecondaryDeviceAttributes),

        // Private modes (DEC)
        (true, false, b'h') => {
            for &p in params {
                screen.set_private_mode(p, true);
            }
        }
        (true, false, b'l') => {
            for &p in params {
                screen.set_private_mode(p, false);
            }
        }

        // Standard modes
        (false, false, b'h') => {
            for &p in params {
                screen.set_mode(p, true);
            }
        }
        (false, false, b'l') => {
            for &p in params {
                screen.set_mode(p, false);
            }
        }

        _ => {
            debug!(
                "Unknown CSI: intermediates={:?}, params={:?}, final={:?}",
                intermediates,
                params,
                final_byte as char
            );
        }
    }
    None
}

/// SGR parameter list applied in order; unknown codes skip individually.
fn execute_sgr(params: &[u16], screen: &mut Screen) {
    if params.is_empty() {
        screen.current_attrs.reset();
        return;
    }

    let mut iter = params.iter();

    while let Some(&param) = iter.next() {
        match param {
            0 => screen.current_attrs.reset(),
            1 => screen.current_attrs.flags |= AttrFlags::BOLD,
            2 => screen.current_attrs.flags |= AttrFlags::DIM,
            3 => screen.current_attrs.flags |= AttrFlags::ITALIC,
            4 => screen.current_attrs.flags |= AttrFlags::UNDERLINE,
            5 => screen.current_attrs.flags |= AttrFlags::BLINK,
            7 => screen.current_attrs.flags |= AttrFlags::INVERSE,
            8 => screen.current_attrs.flags |= AttrFlags::HIDDEN,
            9 => screen.current_attrs.flags |= AttrFlags::STRIKETHROUGH,

            22 => screen.current_attrs.flags &= !(AttrFlags::BOLD | AttrFlags::DIM),
            23 => screen.current_attrs.flags &= !AttrFlags::ITALIC,
            24 => screen.current_attrs.flags &= !AttrFlags::UNDERLINE,
            25 => screen.current_attrs.flags &= !AttrFlags::BLINK,
            27 => screen.current_attrs.flags &= !AttrFlags::INVERSE,
            28 => screen.current_attrs.flags &= !AttrFlags::HIDDEN,
            29 => screen.current_attrs.flags &= !AttrFlags::STRIKETHROUGH,

            // Foreground colors (standard)
            30..=37 => {
                screen.current_attrs.fg = Color::Indexed((param - 30) as u8);
            }
            38 => {
                // Extended foreground
                if let Some(color) = extended_color(&mut iter) {
                    screen.current_attrs.fg = color;
                }
            }
            39 => screen.current_attrs.fg = Color::Default,

            // Background colors (standard)
            40..=47 => {
                screen.current_attrs.bg = Color::Indexed((param - 40) as u8);
            }
            48 => {
                // Extended background
                if let Some(color) = extended_color(&mut iter) {
                    screen.current_attrs.bg = color;
                }
            }
            49 => screen.current_attrs.bg = Color::Default,

            // Bright foreground
            90..=97 => {
                screen.current_attrs.fg = Color::Indexed((param - 90 + 8) as u8);
            }
            // Bright background
            100..=107 => {
                screen.current_attrs.bg = Color::Indexed((param - 100 + 8) as u8);
            }

            _ => {}
        }
    }
}

/// 256-color (`5;n`) and RGB (`2;r;g;b`) forms behind SGR 38/48.
fn extended_color(iter: &mut std::slice::Iter<'_, u16>) -> Option<Color> {
    match iter.next().copied() {
        Some(5) => iter.next().map(|&n| Color::Indexed(n as u8)),
        Some(2) => {
            let r = iter.next().copied().unwrap_or(0) as u8;
            let g = iter.next().copied().unwrap_or(0) as u8;
            let b = iter.next().copied().unwrap_or(0) as u8;
            Some(Color::Rgb(r, g, b))
        }
        _ => None,
    }
}

/// OSC payload: "code;text". Codes 0/1/2 set the title.
pub(crate) fn execute_osc(payload: &[u8], screen: &mut Screen) {
    let payload = String::from_utf8_lossy(payload);
    if let Some((code, text)) = payload.split_once(';') {
        match code {
            "0" | "1" | "2" => screen.title = text.to_string(),
            _ => debug!("Unknown OSC code: {}", code),
        }
    }
}
