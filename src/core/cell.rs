//! Canvas Cell
//!
//! A cell is a glyph plus its styling attributes packed into exactly 32 bits:
//!
//! ```text
//!  31  30   29-27  26-24  23     22         21      20-0
//! [ - |bold| bg  | fg   |blink|underline|italic| code point ]
//! ```
//!
//! Packing keeps cells `Copy`, makes equality a single integer compare and
//! fixes the 4-byte wire layout used by snapshots.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::utf8::CODE_POINT_MASK;

const ITALIC_BIT: u32 = 1 << 21;
const UNDERLINE_BIT: u32 = 1 << 22;
const BLINK_BIT: u32 = 1 << 23;
const FG_SHIFT: u32 = 24;
const BG_SHIFT: u32 = 27;
const COLOR_MASK: u32 = 0b111;
const BOLD_BIT: u32 = 1 << 30;

/// Bits holding everything except the code point
const STYLE_MASK: u32 = ITALIC_BIT
    | UNDERLINE_BIT
    | BLINK_BIT
    | (COLOR_MASK << FG_SHIFT)
    | (COLOR_MASK << BG_SHIFT)
    | BOLD_BIT;

/// Size of one packed cell on the wire
pub const CELL_BYTES: usize = 4;

const _: () = assert!(std::mem::size_of::<Cell>() == CELL_BYTES);
const _: () = assert!(STYLE_MASK & CODE_POINT_MASK == 0);

/// The eight standard ANSI colors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Color {
    #[default]
    Black = 0,
    Red = 1,
    Green = 2,
    Yellow = 3,
    Blue = 4,
    Magenta = 5,
    Cyan = 6,
    White = 7,
}

impl Color {
    pub const ALL: [Color; 8] = [
        Color::Black,
        Color::Red,
        Color::Green,
        Color::Yellow,
        Color::Blue,
        Color::Magenta,
        Color::Cyan,
        Color::White,
    ];

    /// Color from its 3-bit index; higher bits are ignored
    pub const fn from_index(index: u8) -> Color {
        Self::ALL[(index & 0b111) as usize]
    }

    pub const fn index(self) -> u8 {
        self as u8
    }
}

/// A single canvas cell
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Cell(u32);

impl Cell {
    /// White on black with no attributes and a zero code point
    pub const DEFAULT_STYLE: Cell = Cell::EMPTY
        .with_foreground(Color::White)
        .with_background(Color::Black);

    /// Black on black, no attributes, code point zero
    pub const EMPTY: Cell = Cell(0);

    /// A plain cell holding `code_point` with black-on-black style
    pub const fn new(code_point: u32) -> Self {
        Cell(code_point & CODE_POINT_MASK)
    }

    /// Reinterpret a packed value. Bit 31 is unused and cleared.
    pub const fn from_bits(bits: u32) -> Self {
        Cell(bits & (STYLE_MASK | CODE_POINT_MASK))
    }

    pub const fn to_bits(self) -> u32 {
        self.0
    }

    pub const fn to_le_bytes(self) -> [u8; CELL_BYTES] {
        self.0.to_le_bytes()
    }

    pub const fn from_le_bytes(bytes: [u8; CELL_BYTES]) -> Self {
        Self::from_bits(u32::from_le_bytes(bytes))
    }

    pub const fn code_point(self) -> u32 {
        self.0 & CODE_POINT_MASK
    }

    /// The code point as a `char`, if it is a valid scalar value
    pub fn as_char(self) -> Option<char> {
        char::from_u32(self.code_point())
    }

    pub const fn with_code_point(self, code_point: u32) -> Self {
        Cell((self.0 & STYLE_MASK) | (code_point & CODE_POINT_MASK))
    }

    pub const fn italic(self) -> bool {
        self.0 & ITALIC_BIT != 0
    }

    pub const fn underline(self) -> bool {
        self.0 & UNDERLINE_BIT != 0
    }

    pub const fn blink(self) -> bool {
        self.0 & BLINK_BIT != 0
    }

    pub const fn bold(self) -> bool {
        self.0 & BOLD_BIT != 0
    }

    pub const fn foreground(self) -> Color {
        Color::from_index(((self.0 >> FG_SHIFT) & COLOR_MASK) as u8)
    }

    pub const fn background(self) -> Color {
        Color::from_index(((self.0 >> BG_SHIFT) & COLOR_MASK) as u8)
    }

    pub const fn with_italic(self, on: bool) -> Self {
        self.with_flag(ITALIC_BIT, on)
    }

    pub const fn with_underline(self, on: bool) -> Self {
        self.with_flag(UNDERLINE_BIT, on)
    }

    pub const fn with_blink(self, on: bool) -> Self {
        self.with_flag(BLINK_BIT, on)
    }

    pub const fn with_bold(self, on: bool) -> Self {
        self.with_flag(BOLD_BIT, on)
    }

    pub const fn with_foreground(self, color: Color) -> Self {
        Cell((self.0 & !(COLOR_MASK << FG_SHIFT)) | ((color as u32) << FG_SHIFT))
    }

    pub const fn with_background(self, color: Color) -> Self {
        Cell((self.0 & !(COLOR_MASK << BG_SHIFT)) | ((color as u32) << BG_SHIFT))
    }

    const fn with_flag(self, bit: u32, on: bool) -> Self {
        if on {
            Cell(self.0 | bit)
        } else {
            Cell(self.0 & !bit)
        }
    }

    /// This cell with the code point cleared
    pub const fn style(self) -> Self {
        Cell(self.0 & STYLE_MASK)
    }

    /// Whether every field except the code point matches
    pub const fn style_eq(self, other: Cell) -> bool {
        self.0 & STYLE_MASK == other.0 & STYLE_MASK
    }

    /// Whether any of bold, italic, underline or blink is set
    pub const fn has_attributes(self) -> bool {
        self.0 & (ITALIC_BIT | UNDERLINE_BIT | BLINK_BIT | BOLD_BIT) != 0
    }

    /// Whether the attribute flags (ignoring colors) match
    pub const fn attributes_eq(self, other: Cell) -> bool {
        let mask = ITALIC_BIT | UNDERLINE_BIT | BLINK_BIT | BOLD_BIT;
        self.0 & mask == other.0 & mask
    }
}

impl fmt::Debug for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Cell");
        match self.as_char() {
            Some(c) => s.field("glyph", &c),
            None => s.field("code_point", &format_args!("{:#x}", self.code_point())),
        };
        s.field("fg", &self.foreground())
            .field("bg", &self.background())
            .field("bold", &self.bold())
            .field("italic", &self.italic())
            .field("underline", &self.underline())
            .field("blink", &self.blink())
            .finish()
    }
}
