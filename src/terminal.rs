//! Terminal
//!
//! One Terminal per client connection. It ties the input decoder to the
//! keyboard state and canvas geometry, and frames output: protocol bytes
//! queued with [`Terminal::write_bytes`] go out before the canvas diff.

use tracing::{debug, trace, warn, Span};

use crate::config::{Config, TerminalConfig};
use crate::core::{Canvas, Flushed};
use crate::escape;
use crate::input::{Directional, Keyboard};
use crate::parser::telnet::{Command, ECHO, NAWS, SUPPRESS_GO_AHEAD};
use crate::parser::{Decoder, Event};
use crate::session::SessionId;

/// A client connection's protocol state and screen
#[derive(Debug)]
pub struct Terminal {
    canvas: Canvas,
    decoder: Decoder,
    keyboard: Keyboard,
    config: TerminalConfig,
    /// Queued bytes; `outbound[flushed..]` has not been sent yet
    outbound: Vec<u8>,
    flushed: usize,
    /// The client agreed to send window size reports
    will_naws: bool,
    span: Span,
}

impl Terminal {
    /// Create a terminal owning `canvas`
    pub fn new(canvas: Canvas, config: &TerminalConfig) -> Self {
        let span = tracing::debug_span!("session", id = tracing::field::Empty);
        Self::with_span(canvas, config, span)
    }

    /// Create a terminal whose log records carry `id`
    pub fn with_session(canvas: Canvas, config: &TerminalConfig, id: SessionId) -> Self {
        let span = tracing::debug_span!("session", id = %id);
        Self::with_span(canvas, config, span)
    }

    /// Create a terminal and its canvas from a full configuration
    pub fn from_config(config: &Config, id: Option<SessionId>) -> Self {
        let canvas = Canvas::with_default_style(
            usize::from(config.canvas.columns),
            usize::from(config.canvas.rows),
            config.canvas.default_style(),
        );
        match id {
            Some(id) => Self::with_session(canvas, &config.terminal, id),
            None => Self::new(canvas, &config.terminal),
        }
    }

    fn with_span(canvas: Canvas, config: &TerminalConfig, span: Span) -> Self {
        let mut terminal = Self {
            canvas,
            decoder: Decoder::with_limit(config.max_subnegotiation),
            keyboard: Keyboard::new(),
            config: config.clone(),
            outbound: Vec::with_capacity(config.outbound_capacity),
            flushed: 0,
            will_naws: false,
            span,
        };
        if config.negotiate_on_create {
            terminal.negotiate();
        }
        terminal
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn canvas_mut(&mut self) -> &mut Canvas {
        &mut self.canvas
    }

    pub fn keyboard(&self) -> &Keyboard {
        &self.keyboard
    }

    /// Forget keys pressed so far
    pub fn clear_keyboard(&mut self) {
        self.keyboard.clear();
    }

    /// Directions pressed since the last clear, see [`Keyboard::directional`]
    pub fn directional_input(&self, wasd: bool) -> Directional {
        self.keyboard.directional(wasd)
    }

    /// Whether the client agreed to report its window size
    pub fn will_naws(&self) -> bool {
        self.will_naws
    }

    /// Bytes queued and not yet flushed
    pub fn queued(&self) -> usize {
        self.outbound.len() - self.flushed
    }

    pub fn config(&self) -> &TerminalConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Input
    // ------------------------------------------------------------------

    /// Decode bytes received from the client
    pub fn parse(&mut self, data: &[u8]) {
        let span = self.span.clone();
        let _enter = span.enter();
        trace!(len = data.len(), "parse");

        for event in self.decoder.parse(data) {
            self.apply_event(event);
        }
    }

    fn apply_event(&mut self, event: Event) {
        match event {
            Event::Key(key) => self.keyboard.press(key),
            Event::Negotiation { command, option } => {
                debug!(?command, option, "negotiation");
                if option == NAWS {
                    self.will_naws = command.is_positive();
                }
            }
            Event::WindowSize { width, height } => {
                let (columns, rows) = self.config.clamp_size(width, height);
                debug!(width, height, columns, rows, "window size");
                self.canvas.resize(usize::from(columns), usize::from(rows));
            }
            Event::Subnegotiation { option, payload } => {
                debug!(option, len = payload.len(), "ignoring sub-negotiation");
            }
            Event::Command(command) => {
                debug!(command, "ignoring command");
            }
        }
    }

    // ------------------------------------------------------------------
    // Output
    // ------------------------------------------------------------------

    /// Queue raw bytes ahead of the canvas output.
    ///
    /// Returns `false` and drops the bytes when they do not fit the
    /// outbound capacity.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> bool {
        if self.queued() + bytes.len() > self.config.outbound_capacity {
            let _enter = self.span.enter();
            warn!(
                len = bytes.len(),
                queued = self.queued(),
                capacity = self.config.outbound_capacity,
                "outbound queue full, dropping write"
            );
            return false;
        }
        if self.flushed > 0 {
            self.outbound.drain(..self.flushed);
            self.flushed = 0;
        }
        self.outbound.extend_from_slice(bytes);
        true
    }

    pub fn write(&mut self, text: &str) -> bool {
        self.write_bytes(text.as_bytes())
    }

    /// Queue the session-start option negotiation: we echo, the client
    /// does not, go-ahead is suppressed, and the client should report its
    /// window size
    pub fn negotiate(&mut self) -> bool {
        let mut bytes = [0u8; 12];
        bytes[0..3].copy_from_slice(&Command::Will.sequence(ECHO));
        bytes[3..6].copy_from_slice(&Command::Dont.sequence(ECHO));
        bytes[6..9].copy_from_slice(&Command::Will.sequence(SUPPRESS_GO_AHEAD));
        bytes[9..12].copy_from_slice(&Command::Do.sequence(NAWS));
        self.write_bytes(&bytes)
    }

    /// Queue an SGR reset
    pub fn reset(&mut self) -> bool {
        self.write_bytes(escape::RESET)
    }

    /// Queue a clear-screen and repaint the whole canvas after it
    pub fn clear(&mut self) -> bool {
        let queued = self.write_bytes(escape::CLEAR_SCREEN);
        if queued {
            self.canvas.force_next_flush_only();
        }
        queued
    }

    /// Queue a cursor move to column `x`, row `y` (0-indexed)
    pub fn move_cursor(&mut self, x: usize, y: usize) -> bool {
        let mut bytes = Vec::with_capacity(escape::MAX_CURSOR_POSITION_LEN);
        escape::cursor_position(&mut bytes, y, x);
        self.write_bytes(&bytes)
    }

    pub fn cursor_visible(&mut self, visible: bool) -> bool {
        let mut bytes = Vec::with_capacity(escape::CURSOR_SHOW.len());
        escape::cursor_visible(&mut bytes, visible);
        self.write_bytes(&bytes)
    }

    /// Fill `out` with pending output: queued bytes first, then the canvas
    /// diff. Call again while `pending` is set.
    pub fn flush(&mut self, out: &mut [u8]) -> Flushed {
        let _enter = self.span.enter();

        // A cell split by an earlier undersized buffer must be completed
        // before anything else is sent
        let split = self.canvas.finish_cell(out);
        if split.pending {
            return split;
        }
        let mut written = split.written;

        if self.queued() > 0 {
            let pending = &self.outbound[self.flushed..];
            let n = pending.len().min(out.len() - written);
            out[written..written + n].copy_from_slice(&pending[..n]);
            self.flushed += n;
            written += n;

            if self.queued() > 0 {
                trace!(written, queued = self.queued(), "flush");
                return Flushed {
                    written,
                    pending: true,
                };
            }
            self.outbound.clear();
            self.flushed = 0;
            // The queued bytes may have moved the cursor or changed the style
            self.canvas.invalidate_peer();
        }

        let canvas = self.canvas.flush_after(out, written);
        written += canvas.written;
        trace!(written, pending = canvas.pending, "flush");
        Flushed {
            written,
            pending: canvas.pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::telnet::{DO, DONT, IAC, SB, SE, WILL, WONT};

    fn terminal() -> Terminal {
        let mut terminal = Terminal::new(Canvas::new(80, 25), &TerminalConfig::default());
        drain(&mut terminal);
        terminal
    }

    fn drain(terminal: &mut Terminal) -> Vec<u8> {
        let mut buf = vec![0u8; 1 << 16];
        let mut out = Vec::new();
        loop {
            let f = terminal.flush(&mut buf);
            out.extend_from_slice(&buf[..f.written]);
            if !f.pending {
                return out;
            }
        }
    }

    #[test]
    fn test_negotiate_bytes() {
        let mut terminal = terminal();
        assert!(terminal.negotiate());
        assert_eq!(
            drain(&mut terminal),
            [IAC, WILL, ECHO, IAC, DONT, ECHO, IAC, WILL, SUPPRESS_GO_AHEAD, IAC, DO, NAWS]
        );
    }

    #[test]
    fn test_negotiate_on_create() {
        let config = TerminalConfig {
            negotiate_on_create: true,
            ..Default::default()
        };
        let terminal = Terminal::new(Canvas::new(1, 1), &config);
        assert_eq!(terminal.queued(), 12);
    }

    #[test]
    fn test_naws_flag() {
        let mut terminal = terminal();
        assert!(!terminal.will_naws());
        terminal.parse(&[IAC, WILL, NAWS]);
        assert!(terminal.will_naws());
        terminal.parse(&[IAC, WONT, NAWS]);
        assert!(!terminal.will_naws());
        terminal.parse(&[IAC, DO, NAWS]);
        assert!(terminal.will_naws());
        terminal.parse(&[IAC, WILL, ECHO]);
        assert!(terminal.will_naws());
    }

    #[test]
    fn test_naws_resizes_canvas() {
        let mut terminal = terminal();
        terminal.parse(&[IAC, SB, NAWS, 0, 132, 0, 43, IAC, SE]);
        assert_eq!(terminal.canvas().width(), 132);
        assert_eq!(terminal.canvas().height(), 43);

        terminal.parse(&[IAC, SB, NAWS, 0x03, 0xE8, 0x03, 0xE8, IAC, SE]);
        assert_eq!(terminal.canvas().width(), 200);
        assert_eq!(terminal.canvas().height(), 200);
    }

    #[test]
    fn test_keys_reach_keyboard() {
        let mut terminal = terminal();
        terminal.parse(b"x\x1b[A");
        assert!(terminal.keyboard().letter('x'));
        assert!(terminal.keyboard().up());
        terminal.clear_keyboard();
        assert!(terminal.keyboard().is_empty());
    }

    #[test]
    fn test_helpers_queue_escapes() {
        let mut terminal = terminal();
        assert!(terminal.reset());
        assert!(terminal.move_cursor(4, 2));
        assert!(terminal.cursor_visible(false));
        assert!(terminal.write("hi"));
        assert_eq!(drain(&mut terminal), b"\x1b[m\x1b[3;5H\x1b[?25lhi");
        assert_eq!(terminal.queued(), 0);
    }

    #[test]
    fn test_clear_repaints_canvas() {
        let mut terminal = Terminal::new(Canvas::new(2, 1), &TerminalConfig::default());
        drain(&mut terminal);
        assert!(terminal.clear());
        assert_eq!(drain(&mut terminal), b"\x1b[2J\x1b[1;1H\x1b[0;37;40m  ");
    }

    #[test]
    fn test_capacity_counts_unflushed_bytes() {
        let config = TerminalConfig {
            outbound_capacity: 4,
            ..Default::default()
        };
        let mut terminal = Terminal::new(Canvas::new(1, 1), &config);
        assert!(terminal.write("abc"));
        assert!(!terminal.write("de"));
        assert!(terminal.write("d"));

        let mut buf = [0u8; 2];
        let f = terminal.flush(&mut buf);
        assert_eq!(f, Flushed { written: 2, pending: true });
        assert_eq!(&buf, b"ab");

        // Flushed bytes free their space
        assert!(terminal.write("ef"));
        assert_eq!(terminal.queued(), 4);
    }

    #[test]
    fn test_queue_then_canvas_in_one_call() {
        let mut terminal = Terminal::new(Canvas::new(2, 1), &TerminalConfig::default());
        drain(&mut terminal);
        terminal.canvas_mut().put(1, 0, 'o');
        terminal.write("!");

        let mut buf = [0u8; 64];
        let f = terminal.flush(&mut buf);
        assert!(!f.pending);
        // The canvas resends its style after foreign bytes
        assert_eq!(&buf[..f.written], b"!\x1b[1;2H\x1b[0;37;40mo");
    }

    #[test]
    fn test_cell_behind_queued_bytes_is_never_truncated() {
        let mut terminal = Terminal::new(Canvas::new(2, 1), &TerminalConfig::default());
        assert!(terminal.negotiate());

        // The first cell needs 17 bytes; only 8 are left after the negotiation
        let mut buf = [0u8; 20];
        let f = terminal.flush(&mut buf);
        assert_eq!(f, Flushed { written: 12, pending: true });
        assert_eq!(
            &buf[..12],
            [IAC, WILL, ECHO, IAC, DONT, ECHO, IAC, WILL, SUPPRESS_GO_AHEAD, IAC, DO, NAWS]
        );

        let f = terminal.flush(&mut buf);
        assert_eq!(f, Flushed { written: 18, pending: false });
        assert_eq!(&buf[..18], b"\x1b[1;1H\x1b[0;37;40m  ");
    }
}
