//! Keyboard State Module
//!
//! Accumulates the keys decoded from a client until the consumer clears
//! them. Only "pressed since the last clear" is kept: no ordering, no
//! repeat counts.
//!
//! # Directional input
//!
//! Game logic typically only wants a direction. [`Keyboard::directional`]
//! projects the state onto up/down/left/right, optionally treating W, A, S
//! and D as arrow keys.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::parser::Key;

bitflags! {
    /// Single-bit keys
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct KeyFlags: u16 {
        const SPACE = 1 << 0;
        const ENTER = 1 << 1;
        const ESC = 1 << 2;
        const UP = 1 << 3;
        const DOWN = 1 << 4;
        const LEFT = 1 << 5;
        const RIGHT = 1 << 6;
        const TAB = 1 << 7;
        const BACKSPACE = 1 << 8;
    }
}

/// Directions pressed since the last clear
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Directional {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl Directional {
    pub fn any(&self) -> bool {
        self.up || self.down || self.left || self.right
    }

    /// Horizontal axis: -1 left, 1 right, 0 for neither or both
    pub fn dx(&self) -> i32 {
        i32::from(self.right) - i32::from(self.left)
    }

    /// Vertical axis: -1 up, 1 down, 0 for neither or both
    pub fn dy(&self) -> i32 {
        i32::from(self.down) - i32::from(self.up)
    }
}

/// Keys pressed since the last clear
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Keyboard {
    /// Bit `n` is letter `'a' + n`
    letters: u32,
    /// Bit `n` is digit `n`
    digits: u16,
    flags: KeyFlags,
}

impl Keyboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a key press
    pub fn press(&mut self, key: Key) {
        match key {
            Key::Up => self.flags |= KeyFlags::UP,
            Key::Down => self.flags |= KeyFlags::DOWN,
            Key::Left => self.flags |= KeyFlags::LEFT,
            Key::Right => self.flags |= KeyFlags::RIGHT,
            Key::Space => self.flags |= KeyFlags::SPACE,
            Key::Enter => self.flags |= KeyFlags::ENTER,
            Key::Escape => self.flags |= KeyFlags::ESC,
            Key::Tab => self.flags |= KeyFlags::TAB,
            Key::Backspace => self.flags |= KeyFlags::BACKSPACE,
            Key::Letter(c) => {
                if let Some(bit) = letter_bit(c) {
                    self.letters |= bit;
                }
            }
            Key::Digit(d) => {
                if d < 10 {
                    self.digits |= 1 << d;
                }
            }
        }
    }

    /// Forget every key
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_empty(&self) -> bool {
        self.letters == 0 && self.digits == 0 && self.flags.is_empty()
    }

    /// Whether the ASCII letter `c` was pressed, in either case
    pub fn letter(&self, c: char) -> bool {
        u8::try_from(c)
            .ok()
            .and_then(letter_bit)
            .is_some_and(|bit| self.letters & bit != 0)
    }

    /// Whether digit `d` (0-9) was pressed
    pub fn digit(&self, d: u8) -> bool {
        d < 10 && self.digits & (1 << d) != 0
    }

    /// The lowest digit pressed, if any
    pub fn first_digit(&self) -> Option<u8> {
        (self.digits != 0).then(|| self.digits.trailing_zeros() as u8)
    }

    pub fn flags(&self) -> KeyFlags {
        self.flags
    }

    pub fn space(&self) -> bool {
        self.flags.contains(KeyFlags::SPACE)
    }

    pub fn enter(&self) -> bool {
        self.flags.contains(KeyFlags::ENTER)
    }

    pub fn esc(&self) -> bool {
        self.flags.contains(KeyFlags::ESC)
    }

    pub fn tab(&self) -> bool {
        self.flags.contains(KeyFlags::TAB)
    }

    pub fn backspace(&self) -> bool {
        self.flags.contains(KeyFlags::BACKSPACE)
    }

    pub fn up(&self) -> bool {
        self.flags.contains(KeyFlags::UP)
    }

    pub fn down(&self) -> bool {
        self.flags.contains(KeyFlags::DOWN)
    }

    pub fn left(&self) -> bool {
        self.flags.contains(KeyFlags::LEFT)
    }

    pub fn right(&self) -> bool {
        self.flags.contains(KeyFlags::RIGHT)
    }

    /// Project onto four directions. With `wasd`, W/A/S/D count as
    /// up/left/down/right alongside the arrow keys.
    pub fn directional(&self, wasd: bool) -> Directional {
        Directional {
            up: self.up() || (wasd && self.letter('w')),
            down: self.down() || (wasd && self.letter('s')),
            left: self.left() || (wasd && self.letter('a')),
            right: self.right() || (wasd && self.letter('d')),
        }
    }
}

fn letter_bit(c: u8) -> Option<u32> {
    c.is_ascii_alphabetic()
        .then(|| 1 << (c.to_ascii_lowercase() - b'a'))
}
