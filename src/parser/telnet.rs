//! Telnet protocol bytes (RFC 854, RFC 1073 for NAWS)

use serde::{Deserialize, Serialize};

/// Interpret As Command
pub const IAC: u8 = 0xFF;
pub const DONT: u8 = 0xFE;
pub const DO: u8 = 0xFD;
pub const WONT: u8 = 0xFC;
pub const WILL: u8 = 0xFB;
/// Sub-negotiation begin
pub const SB: u8 = 0xFA;
pub const GA: u8 = 0xF9;
/// Are You There
pub const AYT: u8 = 0xF6;
pub const NOP: u8 = 0xF1;
/// Sub-negotiation end
pub const SE: u8 = 0xF0;

pub const ECHO: u8 = 0x01;
pub const SUPPRESS_GO_AHEAD: u8 = 0x03;
/// Negotiate About Window Size
pub const NAWS: u8 = 0x1F;

/// Option negotiation verbs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Command {
    Will,
    Wont,
    Do,
    Dont,
}

impl Command {
    pub fn from_byte(byte: u8) -> Option<Command> {
        match byte {
            WILL => Some(Command::Will),
            WONT => Some(Command::Wont),
            DO => Some(Command::Do),
            DONT => Some(Command::Dont),
            _ => None,
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            Command::Will => WILL,
            Command::Wont => WONT,
            Command::Do => DO,
            Command::Dont => DONT,
        }
    }

    /// `IAC <command> <option>`
    pub fn sequence(self, option: u8) -> [u8; 3] {
        [IAC, self.to_byte(), option]
    }

    /// Whether the peer agrees to (or asks for) the option
    pub fn is_positive(self) -> bool {
        matches!(self, Command::Will | Command::Do)
    }
}
