//! ANSI escape sequence generation
//!
//! Pure byte-generation helpers for the small vocabulary this crate emits.
//! No state is tracked here; the canvas decides *when* a sequence is needed.
//! Every helper appends to a `Vec<u8>` and cannot fail.
//!
//! | Sequence | Meaning |
//! |----------|---------|
//! | `ESC [ row ; col H` | Cursor position (1-indexed) |
//! | `ESC [ fg ; bg m` | SGR colors (30–37 / 40–47) |
//! | `ESC [ 0 ; attrs ; fg ; bg m` | SGR with bold/italic/underline/blink |
//! | `ESC [ m` | SGR reset |
//! | `ESC [ 2 J` | Clear screen |
//! | `ESC [ ? 25 h` / `ESC [ ? 25 l` | Show / hide cursor |

use crate::core::Cell;

/// SGR reset: `CSI m`
pub const RESET: &[u8] = b"\x1b[m";
/// Erase the whole display: `CSI 2 J`
pub const CLEAR_SCREEN: &[u8] = b"\x1b[2J";
/// `CSI ? 25 h`
pub const CURSOR_SHOW: &[u8] = b"\x1b[?25h";
/// `CSI ? 25 l`
pub const CURSOR_HIDE: &[u8] = b"\x1b[?25l";

/// Longest sequence [`cursor_position`] can produce
pub const MAX_CURSOR_POSITION_LEN: usize = b"\x1b[18446744073709551615;18446744073709551615H".len();
/// Longest sequence [`sgr`] can produce
pub const MAX_SGR_LEN: usize = b"\x1b[0;1;3;4;5;37;47m".len();

#[inline]
fn push_decimal(out: &mut Vec<u8>, mut n: usize) {
    let mut buf = [0u8; 20];
    let mut start = buf.len();
    loop {
        start -= 1;
        buf[start] = b'0' + (n % 10) as u8;
        n /= 10;
        if n == 0 {
            break;
        }
    }
    out.extend_from_slice(&buf[start..]);
}

/// Append a cursor position sequence for a 0-indexed `row` and `col`.
pub fn cursor_position(out: &mut Vec<u8>, row: usize, col: usize) {
    out.extend_from_slice(b"\x1b[");
    push_decimal(out, row.saturating_add(1));
    out.push(b';');
    push_decimal(out, col.saturating_add(1));
    out.push(b'H');
}

/// Append the SGR sequence that switches the peer to `cell`'s style.
///
/// `previous` is the style the peer is known to be in, if any. When only
/// colors change the short `CSI fg ; bg m` form is used. When attribute flags
/// change, or the peer's style is unknown, the sequence starts with `0` so
/// flags left on by anyone else are cleared too.
pub fn sgr(out: &mut Vec<u8>, previous: Option<Cell>, cell: Cell) {
    let fg = 30 + cell.foreground().index();
    let bg = 40 + cell.background().index();

    let full = !previous.is_some_and(|prev| prev.attributes_eq(cell));
    out.extend_from_slice(b"\x1b[");
    if full {
        out.push(b'0');
        for (on, code) in [
            (cell.bold(), b'1'),
            (cell.italic(), b'3'),
            (cell.underline(), b'4'),
            (cell.blink(), b'5'),
        ] {
            if on {
                out.extend_from_slice(&[b';', code]);
            }
        }
        out.push(b';');
    }
    push_decimal(out, usize::from(fg));
    out.push(b';');
    push_decimal(out, usize::from(bg));
    out.push(b'm');
}

/// Append the show or hide cursor sequence
pub fn cursor_visible(out: &mut Vec<u8>, visible: bool) {
    out.extend_from_slice(if visible { CURSOR_SHOW } else { CURSOR_HIDE });
}
