//! End-to-end scenarios driving a full Terminal the way a server loop does:
//! bytes in from the client, drawing, bytes out through a socket-sized buffer.

use telnet_canvas::config::TerminalConfig;
use telnet_canvas::parser::telnet::{DO, IAC, NAWS, SB, SE, WILL};
use telnet_canvas::{Canvas, Color, Config, Directional, SessionIds, Snapshot, Terminal};

fn terminal() -> Terminal {
    Terminal::new(Canvas::new(80, 25), &TerminalConfig::default())
}

/// Flush everything pending through a buffer of `capacity` bytes
fn drain(terminal: &mut Terminal, capacity: usize) -> Vec<u8> {
    let mut buf = vec![0u8; capacity];
    let mut out = Vec::new();
    loop {
        let f = terminal.flush(&mut buf);
        out.extend_from_slice(&buf[..f.written]);
        if !f.pending {
            return out;
        }
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

#[test]
fn test_naws_clamps_to_minimum() {
    let mut terminal = terminal();
    terminal.parse(&[IAC, SB, NAWS, 0x00, 0x05, 0x00, 0x03, IAC, SE]);
    assert_eq!(terminal.canvas().width(), 80);
    assert_eq!(terminal.canvas().height(), 25);
}

#[test]
fn test_naws_doubled_iac_width() {
    let mut terminal = terminal();
    terminal.parse(&[IAC, SB, NAWS, 0x00, 0xFF, 0xFF, 0x00, 0x28, IAC, SE]);
    assert_eq!(terminal.canvas().width(), 200);

    let config = TerminalConfig {
        max_columns: 300,
        ..Default::default()
    };
    let mut terminal = Terminal::new(Canvas::new(80, 25), &config);
    terminal.parse(&[IAC, SB, NAWS, 0x00, 0xFF, 0xFF, 0x00, 0x28, IAC, SE]);
    assert_eq!(terminal.canvas().width(), 255);
    assert_eq!(terminal.canvas().height(), 40);
}

#[test]
fn test_naws_split_across_segments() {
    let mut terminal = terminal();
    terminal.parse(&[IAC, WILL, NAWS, IAC, SB]);
    terminal.parse(&[NAWS, 0x00, 100]);
    assert_eq!(terminal.canvas().width(), 80);
    terminal.parse(&[0x00, 30, IAC]);
    terminal.parse(&[SE]);

    assert!(terminal.will_naws());
    assert_eq!(terminal.canvas().width(), 100);
    assert_eq!(terminal.canvas().height(), 30);
}

#[test]
fn test_resize_keeps_drawing_and_repaints() {
    let mut terminal = terminal();
    terminal.canvas_mut().write(0, 0, "score 10");
    drain(&mut terminal, 4096);

    terminal.parse(&[IAC, SB, NAWS, 0x00, 120, 0x00, 40, IAC, SE]);
    let snapshot = Snapshot::from_canvas(terminal.canvas());
    assert!(snapshot.to_text().starts_with("score 10 "));

    // The whole 120x40 grid is sent again, every row starting with a move
    let out = drain(&mut terminal, 1024);
    for row in 1..=40 {
        let moved = format!("\x1b[{row};1H");
        assert!(contains(&out, moved.as_bytes()), "row {row} not repainted");
    }
    assert!(drain(&mut terminal, 1024).is_empty());
}

#[test]
fn test_session_start_then_frame() {
    let mut terminal = terminal();
    terminal.canvas_mut().set_foreground(Color::Yellow);
    terminal.canvas_mut().write(0, 0, "hi");
    assert!(terminal.negotiate());
    assert!(terminal.cursor_visible(false));

    let out = drain(&mut terminal, 7);
    let negotiation = [IAC, WILL, 0x01, IAC, 0xFE, 0x01, IAC, WILL, 0x03, IAC, DO, NAWS];
    assert_eq!(&out[..12], &negotiation);
    assert_eq!(&out[12..18], b"\x1b[?25l");
    assert_eq!(&out[18..36], b"\x1b[1;1H\x1b[0;33;40mhi");
}

#[test]
fn test_overflowing_write_is_dropped() {
    let config = TerminalConfig {
        outbound_capacity: 16,
        ..Default::default()
    };
    let mut terminal = Terminal::new(Canvas::new(1, 1), &config);
    assert!(terminal.write("0123456789"));
    assert!(!terminal.write("abcdefghij"));
    assert!(terminal.write("abcdef"));
    assert!(!terminal.write("!"));

    let out = drain(&mut terminal, 4096);
    assert!(out.starts_with(b"0123456789abcdef\x1b[1;1H"));
}

#[test]
fn test_directional_input() {
    let mut terminal = terminal();
    terminal.parse(b"wD\x1b[B");

    let arrows = terminal.directional_input(false);
    assert_eq!(
        arrows,
        Directional {
            down: true,
            ..Default::default()
        }
    );

    let wasd = terminal.directional_input(true);
    assert!(wasd.up && wasd.down && wasd.right && !wasd.left);
}

#[test]
fn test_keyboard_accumulates_until_cleared() {
    let mut terminal = terminal();
    terminal.parse(b"a");
    terminal.parse(b"b\r");
    terminal.parse(b"\x1b");
    terminal.parse(b"5");

    let keyboard = terminal.keyboard();
    assert!(keyboard.letter('a') && keyboard.letter('b'));
    assert!(keyboard.enter());
    assert!(keyboard.esc());
    assert!(keyboard.digit(5));

    terminal.clear_keyboard();
    assert!(terminal.keyboard().is_empty());
    terminal.parse(b"\x1b[");
    terminal.parse(b"A");
    assert!(terminal.keyboard().up());
    assert!(!terminal.keyboard().esc());
}

#[test]
fn test_sessions_from_config() {
    let mut ids = SessionIds::new();
    let config = Config::default();
    let mut first = Terminal::from_config(&config, Some(ids.next_id()));
    let second = Terminal::from_config(&config, Some(ids.next_id()));

    assert_eq!(first.canvas().width(), 80);
    assert_eq!(second.canvas().height(), 25);

    // Terminals are independent
    first.parse(b"x");
    assert!(first.keyboard().letter('x'));
    assert!(second.keyboard().is_empty());
}
