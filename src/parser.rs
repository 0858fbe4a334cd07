//! VT sequence parser
//!
//! A byte-driven state machine over C0 controls, ESC sequences, CSI
//! (parameterized) sequences, and OSC strings. All partial-sequence state
//! lives in the parser value, so sequences split across arbitrary chunk
//! boundaries resume correctly. Every byte has a defined transition in
//! every state; malformed input aborts to Ground without an error.

use crate::dispatch::{self, Response};
use crate::screen::Screen;

/// Parameters beyond this are dropped.
const MAX_PARAMS: usize = 16;

/// OSC payload bytes beyond this are dropped.
const MAX_OSC_LEN: usize = 1024;

/// Parser state machine
#[derive(Debug)]
pub(crate) struct VtParser {
    state: ParserState,
    params: Vec<u16>,
    intermediates: Vec<u8>,
    current_param: Option<u16>,
    osc_buf: Vec<u8>,
    utf8_buf: Vec<u8>,
    utf8_len: usize,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
enum ParserState {
    #[default]
    Ground,
    Escape,
    EscapeIntermediate,
    CsiEntry,
    CsiParam,
    CsiIntermediate,
    OscString,
    EscapeInOsc, // ESC received within OSC, waiting for backslash
}

impl Default for VtParser {
    fn default() -> Self {
        Self::new()
    }
}

impl VtParser {
    pub(crate) fn new() -> Self {
        Self {
            state: ParserState::Ground,
            params: Vec::with_capacity(MAX_PARAMS),
            intermediates: Vec::with_capacity(4),
            current_param: None,
            osc_buf: Vec::new(),
            utf8_buf: Vec::with_capacity(4),
            utf8_len: 0,
        }
    }

    /// Drop all in-progress sequence state and return to Ground.
    pub(crate) fn reset(&mut self) {
        *self = Self::new();
    }

    /// Feed a single byte to the parser
    pub(crate) fn feed(&mut self, byte: u8, screen: &mut Screen) -> Option<Response> {
        // Finish or abandon an in-progress UTF-8 sequence first
        if !self.utf8_buf.is_empty() {
            if byte & 0xC0 == 0x80 {
                self.utf8_buf.push(byte);
                if self.utf8_buf.len() == self.utf8_len {
                    let ch = std::str::from_utf8(&self.utf8_buf)
                        .ok()
                        .and_then(|s| s.chars().next())
                        .unwrap_or(char::REPLACEMENT_CHARACTER);
                    self.utf8_buf.clear();
                    screen.put_char(ch);
                }
                return None;
            }
            // Truncated sequence; stand in a replacement character and
            // process the current byte normally
            self.utf8_buf.clear();
            screen.put_char(char::REPLACEMENT_CHARACTER);
        }

        // C0 controls execute from within CSI/ESC accumulation without
        // disturbing the in-progress sequence, except ESC (restarts) and
        // CAN/SUB (cancel). OSC treats its own terminators below.
        if byte < 0x20
            && self.state != ParserState::OscString
            && self.state != ParserState::EscapeInOsc
        {
            match byte {
                0x1B => self.enter_escape(),
                0x18 | 0x1A => self.cancel(),
                _ => dispatch::execute_control(byte, screen),
            }
            return None;
        }

        match self.state {
            ParserState::Ground => self.ground(byte, screen),
            ParserState::Escape => self.escape(byte, screen),
            ParserState::EscapeIntermediate => self.escape_intermediate(byte, screen),
            ParserState::CsiEntry => self.csi_entry(byte, screen),
            ParserState::CsiParam => self.csi_param(byte, screen),
            ParserState::CsiIntermediate => self.csi_intermediate(byte, screen),
            ParserState::OscString => self.osc_string(byte, screen),
            ParserState::EscapeInOsc => self.escape_in_osc(byte, screen),
        }
    }

    fn enter_escape(&mut self) {
        self.state = ParserState::Escape;
        self.params.clear();
        self.intermediates.clear();
        self.current_param = None;
    }

    fn cancel(&mut self) {
        self.state = ParserState::Ground;
        self.params.clear();
        self.intermediates.clear();
        self.current_param = None;
        self.osc_buf.clear();
    }

    fn push_param(&mut self) {
        let param = self.current_param.take().unwrap_or(0);
        if self.params.len() < MAX_PARAMS {
            self.params.push(param);
        }
    }

    fn ground(&mut self, byte: u8, screen: &mut Screen) -> Option<Response> {
        match byte {
            0x20..=0x7E => screen.put_char(byte as char),
            0x7F => {} // DEL
            0xC0..=0xDF => {
                self.utf8_buf.push(byte);
                self.utf8_len = 2;
            }
            0xE0..=0xEF => {
                self.utf8_buf.push(byte);
                self.utf8_len = 3;
            }
            0xF0..=0xF7 => {
                self.utf8_buf.push(byte);
                self.utf8_len = 4;
            }
            // Stray continuation or invalid lead byte
            _ => screen.put_char(char::REPLACEMENT_CHARACTER),
        }
        None
    }

    fn escape(&mut self, byte: u8, screen: &mut Screen) -> Option<Response> {
        match byte {
            b'[' => {
                self.state = ParserState::CsiEntry;
                self.params.clear();
                self.intermediates.clear();
                self.current_param = None;
            }
            b']' => {
                self.state = ParserState::OscString;
                self.osc_buf.clear();
            }
            0x20..=0x2F => {
                // Intermediate bytes (charset designation, DEC # forms)
                self.intermediates.push(byte);
                self.state = ParserState::EscapeIntermediate;
            }
            0x30..=0x7E => {
                dispatch::execute_esc(byte, &self.intermediates, screen);
                self.state = ParserState::Ground;
            }
            _ => {
                self.state = ParserState::Ground;
            }
        }
        None
    }

    fn escape_intermediate(&mut self, byte: u8, screen: &mut Screen) -> Option<Response> {
        match byte {
            0x20..=0x2F => {
                self.intermediates.push(byte);
            }
            0x30..=0x7E => {
                dispatch::execute_esc(byte, &self.intermediates, screen);
                self.state = ParserState::Ground;
            }
            _ => {
                self.state = ParserState::Ground;
            }
        }
        None
    }

    fn csi_entry(&mut self, byte: u8, screen: &mut Screen) -> Option<Response> {
        match byte {
            b'0'..=b'9' => {
                self.current_param = Some((byte - b'0') as u16);
                self.state = ParserState::CsiParam;
            }
            b';' => {
                self.push_param();
                self.state = ParserState::CsiParam;
            }
            b'?' | b'>' | b'!' | b'=' => {
                self.intermediates.push(byte);
            }
            0x20..=0x2F => {
                self.intermediates.push(byte);
                self.state = ParserState::CsiIntermediate;
            }
            0x40..=0x7E => {
                return self.finish_csi(byte, screen);
            }
            _ => {
                self.state = ParserState::Ground;
            }
        }
        None
    }

    fn csi_param(&mut self, byte: u8, screen: &mut Screen) -> Option<Response> {
        match byte {
            b'0'..=b'9' => {
                let digit = (byte - b'0') as u16;
                self.current_param = Some(
                    self.current_param
                        .unwrap_or(0)
                        .saturating_mul(10)
                        .saturating_add(digit),
                );
            }
            // Subparameter separator ':' treated as a regular separator
            b';' | b':' => {
                self.push_param();
            }
            0x20..=0x2F => {
                if self.current_param.is_some() {
                    self.push_param();
                }
                self.intermediates.push(byte);
                self.state = ParserState::CsiIntermediate;
            }
            0x40..=0x7E => {
                return self.finish_csi(byte, screen);
            }
            _ => {
                self.state = ParserState::Ground;
            }
        }
        None
    }

    fn csi_intermediate(&mut self, byte: u8, screen: &mut Screen) -> Option<Response> {
        match byte {
            0x20..=0x2F => {
                self.intermediates.push(byte);
            }
            0x40..=0x7E => {
                return self.finish_csi(byte, screen);
            }
            _ => {
                self.state = ParserState::Ground;
            }
        }
        None
    }

    fn finish_csi(&mut self, final_byte: u8, screen: &mut Screen) -> Option<Response> {
        if self.current_param.is_some() {
            self.push_param();
        }
        let response = dispatch::execute_csi(final_byte, &self.params, &self.intermediates, screen);
        self.state = ParserState::Ground;
        response
    }

    fn osc_string(&mut self, byte: u8, screen: &mut Screen) -> Option<Response> {
        match byte {
            0x07 => {
                // BEL terminates OSC
                self.finish_osc(screen);
            }
            0x18 | 0x1A => {
                // CAN/SUB abort the string without dispatching it
                self.cancel();
            }
            0x1B => {
                // Could be ST (ESC \)
                self.state = ParserState::EscapeInOsc;
            }
            0x9C => {
                // ST (String Terminator)
                self.finish_osc(screen);
            }
            _ => {
                if self.osc_buf.len() < MAX_OSC_LEN {
                    self.osc_buf.push(byte);
                }
            }
        }
        None
    }

    fn escape_in_osc(&mut self, byte: u8, screen: &mut Screen) -> Option<Response> {
        if byte == b'\\' {
            // ST (ESC \) - String Terminator
            self.finish_osc(screen);
            None
        } else if byte == 0x18 || byte == 0x1A {
            // CAN/SUB abort both the pending string and the escape
            self.cancel();
            None
        } else {
            // Not ST; the OSC ends here and the byte belongs to a fresh
            // escape sequence
            self.finish_osc(screen);
            self.enter_escape();
            self.escape(byte, screen)
        }
    }

    fn finish_osc(&mut self, screen: &mut Screen) {
        dispatch::execute_osc(&self.osc_buf, screen);
        self.osc_buf.clear();
        self.state = ParserState::Ground;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screen::{AttrFlags, Color};

    fn feed(parser: &mut VtParser, screen: &mut Screen, bytes: &[u8]) -> Vec<Response> {
        bytes
            .iter()
            .filter_map(|&b| parser.feed(b, screen))
            .collect()
    }

    #[test]
    fn test_plain_text() {
        let mut screen = Screen::new(24, 80);
        let mut parser = VtParser::new();

        feed(&mut parser, &mut screen, b"A");
        assert_eq!(screen.cell(0, 0).unwrap().c(), 'A');
        assert_eq!(screen.cursor(), (0, 1, true));
    }

    #[test]
    fn test_cursor_position_sequence() {
        let mut screen = Screen::new(24, 80);
        let mut parser = VtParser::new();

        feed(&mut parser, &mut screen, b"\x1b[5;10H");
        assert_eq!(screen.cursor(), (4, 9, true));

        feed(&mut parser, &mut screen, b"\x1b[H");
        assert_eq!(screen.cursor(), (0, 0, true));
    }

    #[test]
    fn test_split_invariance() {
        let stream: &[u8] =
            b"hi\x1b[2;3H\xe6\xbc\xa2\x1b[1;31mred\x1b[0m\x1b]0;title\x07\x1b[5A\x1b[2Jx";

        let mut whole_screen = Screen::new(24, 80);
        let mut whole_parser = VtParser::new();
        feed(&mut whole_parser, &mut whole_screen, stream);

        // Byte-at-a-time feeding must land in the same state
        let mut split_screen = Screen::new(24, 80);
        let mut split_parser = VtParser::new();
        for &b in stream {
            split_parser.feed(b, &mut split_screen);
        }
        assert_eq!(whole_screen, split_screen);

        // So must every two-way partition
        for cut in 0..stream.len() {
            let mut screen = Screen::new(24, 80);
            let mut parser = VtParser::new();
            feed(&mut parser, &mut screen, &stream[..cut]);
            feed(&mut parser, &mut screen, &stream[cut..]);
            assert_eq!(whole_screen, screen, "differs when split at {}", cut);
        }
    }

    #[test]
    fn test_utf8_decoding() {
        let mut screen = Screen::new(24, 80);
        let mut parser = VtParser::new();

        feed(&mut parser, &mut screen, "héllo 漢".as_bytes());
        assert_eq!(screen.line_text(0).unwrap().trim_end(), "héllo 漢");
    }

    #[test]
    fn test_malformed_utf8_replaced() {
        let mut screen = Screen::new(24, 80);
        let mut parser = VtParser::new();

        // Truncated 3-byte sequence followed by ASCII
        feed(&mut parser, &mut screen, b"\xe6\xbcA");
        assert_eq!(screen.cell(0, 0).unwrap().c(), '\u{FFFD}');
        assert_eq!(screen.cell(0, 1).unwrap().c(), 'A');
    }

    #[test]
    fn test_unknown_csi_is_noop() {
        let mut screen = Screen::new(24, 80);
        let mut parser = VtParser::new();
        feed(&mut parser, &mut screen, b"ok");
        let before = screen.clone();

        feed(&mut parser, &mut screen, b"\x1b[5z");
        assert_eq!(screen, before);

        // Parser is back in Ground and keeps working
        feed(&mut parser, &mut screen, b"\x1b[2;1H!");
        assert_eq!(screen.cell(1, 0).unwrap().c(), '!');
    }

    #[test]
    fn test_can_aborts_sequence() {
        let mut screen = Screen::new(24, 80);
        let mut parser = VtParser::new();

        // CAN in the middle of a CSI drops it; the H prints as text
        feed(&mut parser, &mut screen, b"\x1b[5;6\x18H");
        assert_eq!(screen.cell(0, 0).unwrap().c(), 'H');
        assert_eq!(screen.cursor(), (0, 1, true));
    }

    #[test]
    fn test_control_inside_csi() {
        let mut screen = Screen::new(24, 80);
        let mut parser = VtParser::new();

        // A linefeed inside the sequence executes without killing it
        feed(&mut parser, &mut screen, b"\x1b[5\n;10H");
        assert_eq!(screen.cursor(), (4, 9, true));
    }

    #[test]
    fn test_can_aborts_osc() {
        let mut screen = Screen::new(24, 80);
        let mut parser = VtParser::new();

        // CAN inside the string drops it; the title stays empty, the
        // following bytes print as text, and the trailing BEL rings
        // harmlessly in Ground
        feed(&mut parser, &mut screen, b"\x1b]0;ab\x18cd\x07");
        assert_eq!(screen.title(), "");
        assert_eq!(screen.line_text(0).unwrap().trim_end(), "cd");

        // SUB right after the ESC of a would-be ST aborts too
        feed(&mut parser, &mut screen, b"\x1b]0;xy\x1b\x1a");
        assert_eq!(screen.title(), "");
    }

    #[test]
    fn test_osc_title_both_terminators() {
        let mut screen = Screen::new(24, 80);
        let mut parser = VtParser::new();

        feed(&mut parser, &mut screen, b"\x1b]0;bell title\x07");
        assert_eq!(screen.title(), "bell title");

        feed(&mut parser, &mut screen, b"\x1b]2;st title\x1b\\");
        assert_eq!(screen.title(), "st title");
    }

    #[test]
    fn test_missing_params_default() {
        let mut screen = Screen::new(24, 80);
        let mut parser = VtParser::new();

        feed(&mut parser, &mut screen, b"\x1b[;5H");
        assert_eq!(screen.cursor(), (0, 4, true));

        feed(&mut parser, &mut screen, b"\x1b[B");
        assert_eq!(screen.cursor(), (1, 4, true));
    }

    #[test]
    fn test_param_overflow_saturates() {
        let mut screen = Screen::new(24, 80);
        let mut parser = VtParser::new();

        // Pathologically large repeat count clamps instead of wrapping
        feed(&mut parser, &mut screen, b"\x1b[999999999999B");
        assert_eq!(screen.cursor().0, 23);
    }

    #[test]
    fn test_sgr_colors() {
        let mut screen = Screen::new(24, 80);
        let mut parser = VtParser::new();

        feed(&mut parser, &mut screen, b"\x1b[31m");
        assert_eq!(screen.attrs().fg, Color::Indexed(1));

        feed(&mut parser, &mut screen, b"\x1b[1;4m");
        assert!(screen.attrs().flags.contains(AttrFlags::BOLD));
        assert!(screen.attrs().flags.contains(AttrFlags::UNDERLINE));
    }

    #[test]
    fn test_esc_restarts_escape() {
        let mut screen = Screen::new(24, 80);
        let mut parser = VtParser::new();

        // The half-finished CSI is abandoned, the second sequence wins
        feed(&mut parser, &mut screen, b"\x1b[5;\x1b[3;3Hx");
        assert_eq!(screen.cell(2, 2).unwrap().c(), 'x');
    }
}
