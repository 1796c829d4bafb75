//! UTF-8 Codec
//!
//! Stateless encoding and decoding of 21-bit code points. Cells may hold any
//! 21-bit value, including surrogates and values past U+10FFFF, so this codec
//! deliberately does not go through `char`.
//!
//! The decoder is permissive: truncated or malformed sequences decode to
//! whatever was accumulated and never fail. It is meant for best-effort
//! terminal input and must not be used to validate untrusted text.

/// Mask of the bits a cell can store for a code point
pub const CODE_POINT_MASK: u32 = 0x1F_FFFF;

/// Largest number of continuation bytes folded into one code point
const MAX_CONTINUATION: u32 = 3;

/// A code point encoded as 1 to 4 UTF-8 bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Encoded {
    bytes: [u8; 4],
    len: u8,
}

impl Encoded {
    /// Number of encoded bytes
    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// All encoded bytes, most significant first
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }

    /// The bytes remaining after the first `offset` have already been sent.
    ///
    /// Offsets past the end yield an empty slice.
    pub fn suffix(&self, offset: usize) -> &[u8] {
        let bytes = self.as_bytes();
        &bytes[offset.min(bytes.len())..]
    }
}

/// Encode a code point. Bits above the 21-bit range are ignored.
pub fn encode(code_point: u32) -> Encoded {
    let cp = code_point & CODE_POINT_MASK;
    let mut bytes = [0u8; 4];
    let len = if cp < 0x80 {
        bytes[0] = cp as u8;
        1
    } else if cp < 0x800 {
        bytes[0] = 0xC0 | (cp >> 6) as u8;
        bytes[1] = continuation(cp);
        2
    } else if cp < 0x1_0000 {
        bytes[0] = 0xE0 | (cp >> 12) as u8;
        bytes[1] = continuation(cp >> 6);
        bytes[2] = continuation(cp);
        3
    } else {
        bytes[0] = 0xF0 | (cp >> 18) as u8;
        bytes[1] = continuation(cp >> 12);
        bytes[2] = continuation(cp >> 6);
        bytes[3] = continuation(cp);
        4
    };
    Encoded { bytes, len }
}

#[inline]
fn continuation(bits: u32) -> u8 {
    0x80 | (bits & 0x3F) as u8
}

/// Decode one code point from the start of `bytes`.
///
/// Returns the code point and the number of bytes consumed. Empty input
/// yields `(0, 0)`. Decoding stops early, without error, at the end of the
/// input or at the first byte that is not a continuation byte.
pub fn decode(bytes: &[u8]) -> (u32, usize) {
    let Some(&lead) = bytes.first() else {
        return (0, 0);
    };

    let leading_ones = (!lead).leading_zeros();
    if leading_ones == 0 {
        return (lead as u32, 1);
    }

    let mask = 0xFFu32.checked_shr(leading_ones + 1).unwrap_or(0);
    let mut value = lead as u32 & mask;
    let wanted = (leading_ones - 1).min(MAX_CONTINUATION) as usize;

    let mut consumed = 1;
    for &byte in bytes[1..].iter().take(wanted) {
        if byte & 0xC0 != 0x80 {
            break;
        }
        value = (value << 6) | (byte & 0x3F) as u32;
        consumed += 1;
    }

    (value & CODE_POINT_MASK, consumed)
}

/// Decode every code point in `bytes`
pub fn decode_all(mut bytes: &[u8]) -> Vec<u32> {
    let mut out = Vec::with_capacity(bytes.len());
    while !bytes.is_empty() {
        let (cp, consumed) = decode(bytes);
        out.push(cp);
        bytes = &bytes[consumed..];
    }
    out
}
