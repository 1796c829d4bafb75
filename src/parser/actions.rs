//! Events produced by the decoder
//!
//! These are the semantic meaning of the client's byte stream: key presses
//! and Telnet protocol traffic.

use serde::{Deserialize, Serialize};

use super::telnet::Command;

/// A recognized key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    /// `ESC [ A`
    Up,
    /// `ESC [ B`
    Down,
    /// `ESC [ D`
    Left,
    /// `ESC [ C`
    Right,
    Space,
    /// Carriage return
    Enter,
    /// A bare ESC
    Escape,
    Tab,
    /// DEL (0x7f) or BS (0x08)
    Backspace,
    /// Lowercase ASCII letter; uppercase input is folded
    Letter(u8),
    /// Digit value 0-9
    Digit(u8),
}

/// Events produced by the decoder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    /// A key press
    Key(Key),

    /// `IAC WILL|WONT|DO|DONT <option>`
    Negotiation { command: Command, option: u8 },

    /// A complete NAWS report, in columns and rows as sent by the client
    WindowSize { width: u16, height: u16 },

    /// Any other complete sub-negotiation, with `IAC IAC` unescaped
    Subnegotiation { option: u8, payload: Vec<u8> },

    /// A two-byte command such as `IAC NOP` or `IAC AYT`
    Command(u8),
}
