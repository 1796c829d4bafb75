//! Decoder State Machine
//!
//! Recognizes, in priority order: `ESC [ A|B|C|D` cursor keys, space,
//! letters (case folded), digits, CR, tab, backspace, a bare ESC, and Telnet
//! `IAC` commands. Everything else is dropped.
//!
//! States:
//! - Ground: plain key bytes
//! - Escape: after ESC, waiting to see whether a CSI follows
//! - Csi: after `ESC [`, waiting for A-D; anything else reports ESC and is
//!   read again as a plain key
//! - Iac: after IAC
//! - Negotiation: after `IAC WILL|WONT|DO|DONT`, waiting for the option
//! - SubnegotiationOption: after `IAC SB`, waiting for the option
//! - Subnegotiation/SubnegotiationIac: collecting the payload until `IAC SE`
//! - Discard/DiscardIac: skipping an oversized payload until `IAC SE`
//!
//! An ESC at the very end of a chunk is reported as the escape key right
//! away, since a client sends the whole arrow-key sequence in one segment.
//! `ESC [` at the end of a chunk is held for the next call.

use tracing::{debug, warn};

use super::actions::{Event, Key};
use super::telnet::{Command, IAC, NAWS, SB, SE};

/// Longest sub-negotiation payload kept by default
pub const DEFAULT_MAX_SUBNEGOTIATION: usize = 64;

const ESC: u8 = 0x1B;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Ground,
    Escape,
    Csi,
    Iac,
    Negotiation(Command),
    SubnegotiationOption,
    Subnegotiation,
    SubnegotiationIac,
    Discard,
    DiscardIac,
}

/// The client input decoder
#[derive(Debug)]
pub struct Decoder {
    state: State,
    /// Option of the sub-negotiation being collected
    option: u8,
    /// Unescaped sub-negotiation payload
    payload: Vec<u8>,
    max_subnegotiation: usize,
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder {
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_MAX_SUBNEGOTIATION)
    }

    /// Create a decoder keeping at most `max_subnegotiation` payload bytes
    pub fn with_limit(max_subnegotiation: usize) -> Self {
        Self {
            state: State::Ground,
            option: 0,
            payload: Vec::with_capacity(max_subnegotiation.min(DEFAULT_MAX_SUBNEGOTIATION)),
            max_subnegotiation,
        }
    }

    /// Drop any partial sequence
    pub fn reset(&mut self) {
        self.state = State::Ground;
        self.payload.clear();
    }

    /// Whether no partial sequence is pending
    pub fn is_idle(&self) -> bool {
        self.state == State::Ground
    }

    /// Decode a chunk of bytes, returning events in input order
    pub fn parse(&mut self, data: &[u8]) -> Vec<Event> {
        let mut events = Vec::new();

        for &byte in data {
            self.process_byte(byte, &mut events);
        }

        if self.state == State::Escape {
            events.push(Event::Key(Key::Escape));
            self.state = State::Ground;
        }

        events
    }

    fn process_byte(&mut self, byte: u8, events: &mut Vec<Event>) {
        match self.state {
            State::Ground => self.process_ground(byte, events),
            State::Escape => {
                if byte == b'[' {
                    self.state = State::Csi;
                } else {
                    events.push(Event::Key(Key::Escape));
                    self.state = State::Ground;
                    self.process_ground(byte, events);
                }
            }
            State::Csi => self.process_csi(byte, events),
            State::Iac => self.process_iac(byte, events),
            State::Negotiation(command) => {
                events.push(Event::Negotiation {
                    command,
                    option: byte,
                });
                self.state = State::Ground;
            }
            State::SubnegotiationOption => {
                self.option = byte;
                self.payload.clear();
                self.state = State::Subnegotiation;
            }
            State::Subnegotiation => {
                if byte == IAC {
                    self.state = State::SubnegotiationIac;
                } else {
                    self.push_payload(byte);
                }
            }
            State::SubnegotiationIac => match byte {
                IAC => {
                    self.state = State::Subnegotiation;
                    self.push_payload(IAC);
                }
                SE => {
                    self.state = State::Ground;
                    self.finish_subnegotiation(events);
                }
                _ => {
                    debug!(option = self.option, command = byte, "sub-negotiation aborted");
                    self.payload.clear();
                    self.process_iac(byte, events);
                }
            },
            State::Discard => {
                if byte == IAC {
                    self.state = State::DiscardIac;
                }
            }
            State::DiscardIac => match byte {
                SE => self.state = State::Ground,
                IAC => self.state = State::Discard,
                _ => self.process_iac(byte, events),
            },
        }
    }

    fn process_ground(&mut self, byte: u8, events: &mut Vec<Event>) {
        let key = match byte {
            ESC => {
                self.state = State::Escape;
                return;
            }
            IAC => {
                self.state = State::Iac;
                return;
            }
            b' ' => Key::Space,
            b'a'..=b'z' => Key::Letter(byte),
            b'A'..=b'Z' => Key::Letter(byte.to_ascii_lowercase()),
            b'0'..=b'9' => Key::Digit(byte - b'0'),
            b'\r' => Key::Enter,
            b'\t' => Key::Tab,
            0x7F | 0x08 => Key::Backspace,
            _ => return,
        };
        events.push(Event::Key(key));
    }

    fn process_csi(&mut self, byte: u8, events: &mut Vec<Event>) {
        self.state = State::Ground;
        let key = match byte {
            b'A' => Key::Up,
            b'B' => Key::Down,
            b'C' => Key::Right,
            b'D' => Key::Left,
            // Not an arrow: the ESC was a key press, `[` is dropped and the
            // byte is read as a key of its own
            _ => {
                events.push(Event::Key(Key::Escape));
                self.process_ground(byte, events);
                return;
            }
        };
        events.push(Event::Key(key));
    }

    fn process_iac(&mut self, byte: u8, events: &mut Vec<Event>) {
        self.state = State::Ground;
        match byte {
            // Escaped data byte, not a key
            IAC => {}
            SB => self.state = State::SubnegotiationOption,
            _ => match Command::from_byte(byte) {
                Some(command) => self.state = State::Negotiation(command),
                None => events.push(Event::Command(byte)),
            },
        }
    }

    fn push_payload(&mut self, byte: u8) {
        if self.payload.len() >= self.max_subnegotiation {
            warn!(
                option = self.option,
                limit = self.max_subnegotiation,
                "sub-negotiation too long, discarding"
            );
            self.payload.clear();
            self.state = State::Discard;
            return;
        }
        self.payload.push(byte);
    }

    fn finish_subnegotiation(&mut self, events: &mut Vec<Event>) {
        let payload = std::mem::take(&mut self.payload);
        if self.option != NAWS {
            events.push(Event::Subnegotiation {
                option: self.option,
                payload,
            });
            return;
        }

        match payload[..] {
            [w0, w1, h0, h1] => events.push(Event::WindowSize {
                width: u16::from_be_bytes([w0, w1]),
                height: u16::from_be_bytes([h0, h1]),
            }),
            _ => debug!(len = payload.len(), "malformed NAWS report"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::telnet::{AYT, DO, ECHO, NOP, WILL, WONT};

    fn keys(events: &[Event]) -> Vec<Key> {
        events
            .iter()
            .filter_map(|e| match e {
                Event::Key(k) => Some(*k),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_decoder_plain_keys() {
        let mut decoder = Decoder::new();
        let events = decoder.parse(b"aZ 7\r\t\x7f\x08\n\x00!");
        assert_eq!(
            keys(&events),
            vec![
                Key::Letter(b'a'),
                Key::Letter(b'z'),
                Key::Space,
                Key::Digit(7),
                Key::Enter,
                Key::Tab,
                Key::Backspace,
                Key::Backspace,
            ]
        );
        assert!(decoder.is_idle());
    }

    #[test]
    fn test_decoder_arrows() {
        let mut decoder = Decoder::new();
        let events = decoder.parse(b"\x1b[A\x1b[B\x1b[C\x1b[D");
        assert_eq!(keys(&events), vec![Key::Up, Key::Down, Key::Right, Key::Left]);
    }

    #[test]
    fn test_decoder_csi_other_byte_is_escape_then_key() {
        let mut decoder = Decoder::new();
        assert_eq!(
            keys(&decoder.parse(b"\x1b[q")),
            vec![Key::Escape, Key::Letter(b'q')]
        );
        assert!(decoder.is_idle());
    }

    #[test]
    fn test_decoder_csi_parameters_are_keys() {
        let mut decoder = Decoder::new();
        assert_eq!(
            keys(&decoder.parse(b"\x1b[12 34")),
            vec![
                Key::Escape,
                Key::Digit(1),
                Key::Digit(2),
                Key::Space,
                Key::Digit(3),
                Key::Digit(4),
            ]
        );
        assert!(decoder.is_idle());

        // Nothing is held back for the next read
        assert_eq!(
            keys(&decoder.parse(b"hello")),
            vec![
                Key::Letter(b'h'),
                Key::Letter(b'e'),
                Key::Letter(b'l'),
                Key::Letter(b'l'),
                Key::Letter(b'o'),
            ]
        );

        assert_eq!(
            keys(&decoder.parse(b"\x1b[1;5A")),
            vec![Key::Escape, Key::Digit(1), Key::Digit(5), Key::Letter(b'a')]
        );
    }

    #[test]
    fn test_decoder_bare_escape() {
        let mut decoder = Decoder::new();
        assert_eq!(keys(&decoder.parse(b"\x1b")), vec![Key::Escape]);
        assert!(decoder.is_idle());

        assert_eq!(
            keys(&decoder.parse(b"\x1bq\x1b\x1b")),
            vec![Key::Escape, Key::Letter(b'q'), Key::Escape, Key::Escape]
        );
    }

    #[test]
    fn test_decoder_csi_split_across_reads() {
        let mut decoder = Decoder::new();
        assert!(decoder.parse(b"\x1b[").is_empty());
        assert!(!decoder.is_idle());
        assert_eq!(keys(&decoder.parse(b"C")), vec![Key::Right]);
    }

    #[test]
    fn test_decoder_negotiation() {
        let mut decoder = Decoder::new();
        let events = decoder.parse(&[IAC, WILL, NAWS, IAC, WONT, ECHO]);
        assert_eq!(
            events,
            vec![
                Event::Negotiation {
                    command: Command::Will,
                    option: NAWS
                },
                Event::Negotiation {
                    command: Command::Wont,
                    option: ECHO
                },
            ]
        );
    }

    #[test]
    fn test_decoder_escaped_iac_is_not_a_key() {
        let mut decoder = Decoder::new();
        assert_eq!(decoder.parse(&[IAC, IAC, b'k']), vec![Event::Key(Key::Letter(b'k'))]);
    }

    #[test]
    fn test_decoder_naws() {
        let mut decoder = Decoder::new();
        let events = decoder.parse(&[IAC, SB, NAWS, 0, 120, 0, 40, IAC, SE]);
        assert_eq!(
            events,
            vec![Event::WindowSize {
                width: 120,
                height: 40
            }]
        );
    }

    #[test]
    fn test_decoder_naws_doubled_iac() {
        let mut decoder = Decoder::new();
        let events = decoder.parse(&[IAC, SB, NAWS, 0x00, IAC, IAC, 0x00, 0x30, IAC, SE]);
        assert_eq!(
            events,
            vec![Event::WindowSize {
                width: 255,
                height: 48
            }]
        );
    }

    #[test]
    fn test_decoder_naws_split_at_every_byte() {
        let bytes = [b'w', IAC, SB, NAWS, 0x00, IAC, IAC, 0x01, 0x00, IAC, SE, b's'];
        let mut decoder = Decoder::new();
        let mut events = Vec::new();
        for byte in bytes {
            events.extend(decoder.parse(&[byte]));
        }
        assert_eq!(
            events,
            vec![
                Event::Key(Key::Letter(b'w')),
                Event::WindowSize {
                    width: 255,
                    height: 256
                },
                Event::Key(Key::Letter(b's')),
            ]
        );
    }

    #[test]
    fn test_decoder_malformed_naws_ignored() {
        let mut decoder = Decoder::new();
        assert!(decoder.parse(&[IAC, SB, NAWS, 0, 80, 0, IAC, SE]).is_empty());
        assert!(decoder.is_idle());
    }

    #[test]
    fn test_decoder_other_subnegotiation() {
        let mut decoder = Decoder::new();
        let events = decoder.parse(&[IAC, SB, 0x18, 0x00, b'x', b't', IAC, SE]);
        assert_eq!(
            events,
            vec![Event::Subnegotiation {
                option: 0x18,
                payload: vec![0x00, b'x', b't']
            }]
        );
    }

    #[test]
    fn test_decoder_oversized_subnegotiation_discarded() {
        let mut decoder = Decoder::with_limit(4);
        let mut bytes = vec![IAC, SB, 0x18];
        bytes.extend_from_slice(b"far too long");
        bytes.extend_from_slice(&[IAC, IAC, b'z', IAC, SE, b'k']);
        assert_eq!(decoder.parse(&bytes), vec![Event::Key(Key::Letter(b'k'))]);
        assert!(decoder.is_idle());
    }

    #[test]
    fn test_decoder_aborted_subnegotiation() {
        let mut decoder = Decoder::new();
        let events = decoder.parse(&[IAC, SB, NAWS, 0, 80, IAC, DO, ECHO, b'a']);
        assert_eq!(
            events,
            vec![
                Event::Negotiation {
                    command: Command::Do,
                    option: ECHO
                },
                Event::Key(Key::Letter(b'a')),
            ]
        );
    }

    #[test]
    fn test_decoder_bare_commands() {
        let mut decoder = Decoder::new();
        let events = decoder.parse(&[IAC, NOP, IAC, AYT, IAC, SE]);
        assert_eq!(
            events,
            vec![Event::Command(NOP), Event::Command(AYT), Event::Command(SE)]
        );
    }

    #[test]
    fn test_decoder_escape_then_iac() {
        let mut decoder = Decoder::new();
        let events = decoder.parse(&[ESC, IAC, NOP]);
        assert_eq!(events, vec![Event::Key(Key::Escape), Event::Command(NOP)]);
    }

    #[test]
    fn test_decoder_reset() {
        let mut decoder = Decoder::new();
        decoder.parse(&[IAC, SB, NAWS, 0]);
        decoder.reset();
        assert!(decoder.is_idle());
        assert_eq!(decoder.parse(b"1"), vec![Event::Key(Key::Digit(1))]);
    }
}
