//! Double-buffered Canvas
//!
//! The canvas keeps two cell buffers of `width * height` cells:
//!
//! - the *front* buffer holds what the peer is believed to display,
//! - the *back* (target) buffer holds what it should display next.
//!
//! Drawing primitives only touch the back buffer. [`Canvas::flush`] scans the
//! buffers in row-major order and emits cursor moves, SGR changes and UTF-8
//! glyphs for the cells that differ, into a caller-provided byte buffer. A
//! flush never emits part of a cell's sequence when other bytes were already
//! produced in the same call; the cell is left for the next call instead. The
//! scan position is kept between calls, so output of any size can be drained
//! through buffers of any size.

use super::cell::{Cell, Color};
use super::utf8;
use crate::escape;

/// Result of a flush call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Flushed {
    /// Bytes written to the output buffer
    pub written: usize,
    /// The scan stopped early; call again to continue
    pub pending: bool,
}

impl Flushed {
    /// Whether nothing was produced and nothing is pending
    pub fn is_idle(&self) -> bool {
        self.written == 0 && !self.pending
    }
}

/// A grid of styled cells with diff-based output
#[derive(Debug, Clone)]
pub struct Canvas {
    width: usize,
    height: usize,
    /// Last state sent to the peer
    front: Vec<Cell>,
    /// Desired state
    back: Vec<Cell>,
    /// Style applied by drawing primitives (code point unused)
    style: Cell,
    /// Style restored by `reset_style`
    default_style: Cell,

    /// Next cell to examine
    flush_index: usize,
    /// Style the peer is in, if known
    flush_state: Option<Cell>,
    /// Index of the last cell emitted; the peer cursor sits right after it
    flush_last: Option<usize>,
    /// Resend every cell on every pass
    force_flush: bool,
    /// Resend every cell until the current pass completes
    force_next_flush_only: bool,

    /// Reusable buffer holding one cell's byte sequence
    scratch: Vec<u8>,
    /// Tail of a cell sequence that did not fit an undersized buffer
    carry: Vec<u8>,
    carry_offset: usize,
}

impl Canvas {
    /// Create a canvas using [`Cell::DEFAULT_STYLE`] (white on black)
    pub fn new(width: usize, height: usize) -> Self {
        Self::with_default_style(width, height, Cell::DEFAULT_STYLE)
    }

    /// Create a canvas whose blank cells and `reset_style` use `default_style`.
    ///
    /// The first flush of a new canvas repaints every cell.
    pub fn with_default_style(width: usize, height: usize, default_style: Cell) -> Self {
        let default_style = default_style.style();
        let blank = default_style.with_code_point(' ' as u32);
        Self {
            width,
            height,
            front: vec![blank; width * height],
            back: vec![blank; width * height],
            style: default_style,
            default_style,
            flush_index: 0,
            flush_state: None,
            flush_last: None,
            force_flush: false,
            force_next_flush_only: true,
            scratch: Vec::with_capacity(escape::MAX_CURSOR_POSITION_LEN + escape::MAX_SGR_LEN + 4),
            carry: Vec::new(),
            carry_offset: 0,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Target buffer in row-major order
    pub fn cells(&self) -> &[Cell] {
        &self.back
    }

    /// Target cell at (x, y)
    pub fn cell(&self, x: usize, y: usize) -> Cell {
        self.back[self.index(x, y)]
    }

    /// Target code point at (x, y)
    pub fn get(&self, x: usize, y: usize) -> u32 {
        self.cell(x, y).code_point()
    }

    /// Whether the peer is believed to show exactly the target buffer
    pub fn is_clean(&self) -> bool {
        self.front == self.back && self.carry_offset == self.carry.len()
    }

    /// Resize to `width` x `height`.
    ///
    /// The overlapping region of the target buffer is kept, new cells are
    /// blanks in the default style, and the next pass repaints everything.
    pub fn resize(&mut self, width: usize, height: usize) {
        if self.width == width && self.height == height {
            return;
        }

        let blank = self.default_style.with_code_point(' ' as u32);
        let mut back = vec![blank; width * height];
        let copy_w = self.width.min(width);
        for y in 0..self.height.min(height) {
            let src = y * self.width;
            let dst = y * width;
            back[dst..dst + copy_w].copy_from_slice(&self.back[src..src + copy_w]);
        }

        self.width = width;
        self.height = height;
        self.back = back;
        self.front = vec![blank; width * height];
        self.invalidate_peer();
        self.force_next_flush_only();
    }

    /// Reset the target buffer to spaces in the current style
    pub fn erase(&mut self) {
        let blank = self.style.with_code_point(' ' as u32);
        self.back.fill(blank);
    }

    // ------------------------------------------------------------------
    // Style
    // ------------------------------------------------------------------

    /// Current drawing style (code point is always zero)
    pub fn style(&self) -> Cell {
        self.style
    }

    pub fn default_style(&self) -> Cell {
        self.default_style
    }

    pub fn set_style(&mut self, style: Cell) {
        self.style = style.style();
    }

    /// Restore the default style
    pub fn reset_style(&mut self) {
        self.style = self.default_style;
    }

    pub fn set_bold(&mut self, on: bool) {
        self.style = self.style.with_bold(on);
    }

    pub fn set_italic(&mut self, on: bool) {
        self.style = self.style.with_italic(on);
    }

    pub fn set_underline(&mut self, on: bool) {
        self.style = self.style.with_underline(on);
    }

    pub fn set_blink(&mut self, on: bool) {
        self.style = self.style.with_blink(on);
    }

    pub fn set_foreground(&mut self, color: Color) {
        self.style = self.style.with_foreground(color);
    }

    pub fn set_background(&mut self, color: Color) {
        self.style = self.style.with_background(color);
    }

    // ------------------------------------------------------------------
    // Drawing
    // ------------------------------------------------------------------

    /// Put `c` at (x, y) in the current style
    pub fn put(&mut self, x: usize, y: usize, c: char) {
        self.put_code_point(x, y, c as u32);
    }

    /// Put a raw 21-bit code point at (x, y) in the current style
    pub fn put_code_point(&mut self, x: usize, y: usize, code_point: u32) {
        let index = self.index(x, y);
        self.set(index, code_point);
    }

    /// Write `text` on row `y` starting at column `x`, one char per cell
    pub fn write(&mut self, x: usize, y: usize, text: &str) {
        let len = text.chars().count();
        self.assert_region(x, y, len, 1);
        let start = x + y * self.width;
        for (i, c) in text.chars().enumerate() {
            self.set(start + i, c as u32);
        }
    }

    /// Write ASCII bytes into the `w` x `h` block at (x, y), row-major.
    ///
    /// Stops at the first NUL byte or when the block is full.
    pub fn write_block(&mut self, x: usize, y: usize, w: usize, h: usize, text: &[u8]) {
        self.assert_region(x, y, w, h);
        let glyphs = text
            .iter()
            .take_while(|&&b| b != 0)
            .map(|&b| b as u32);
        self.write_block_iter(x, y, w, h, glyphs);
    }

    /// Write code points into the `w` x `h` block at (x, y), row-major.
    ///
    /// Stops when either the slice or the block is exhausted.
    pub fn write_block_utf32(&mut self, x: usize, y: usize, w: usize, h: usize, code_points: &[u32]) {
        self.assert_region(x, y, w, h);
        self.write_block_iter(x, y, w, h, code_points.iter().copied());
    }

    fn write_block_iter(&mut self, x: usize, y: usize, w: usize, h: usize, glyphs: impl Iterator<Item = u32>) {
        if w == 0 {
            return;
        }
        for (i, cp) in glyphs.take(w * h).enumerate() {
            let index = (x + i % w) + (y + i / w) * self.width;
            self.set(index, cp);
        }
    }

    /// Copy fully styled cells into the `w` x `h` block at (x, y), row-major
    pub fn blit(&mut self, x: usize, y: usize, w: usize, h: usize, cells: &[Cell]) {
        self.assert_region(x, y, w, h);
        if w == 0 {
            return;
        }
        for (i, &cell) in cells.iter().take(w * h).enumerate() {
            let index = (x + i % w) + (y + i / w) * self.width;
            self.back[index] = cell;
        }
    }

    /// Fill the `w` x `h` block at (x, y) with `symbol`
    pub fn fill(&mut self, x: usize, y: usize, w: usize, h: usize, symbol: char) {
        self.assert_region(x, y, w, h);
        for row in y..y + h {
            let start = row * self.width;
            for col in x..x + w {
                self.set(start + col, symbol as u32);
            }
        }
    }

    /// Draw the border of the `w` x `h` block at (x, y) with `symbol`.
    ///
    /// The first and last rows are filled; rows in between only get their
    /// two edge columns.
    pub fn rect(&mut self, x: usize, y: usize, w: usize, h: usize, symbol: char) {
        self.assert_region(x, y, w, h);
        if w == 0 || h == 0 {
            return;
        }
        let last_row = y + h - 1;
        for row in y..y + h {
            let step = if row == y || row == last_row {
                1
            } else {
                (w - 1).max(1)
            };
            let mut col = x;
            while col < x + w {
                self.set(col + row * self.width, symbol as u32);
                col += step;
            }
        }
    }

    /// Draw a line from (x0, y0) to (x1, y1) inclusive with Bresenham's
    /// algorithm
    pub fn line(&mut self, x0: usize, y0: usize, x1: usize, y1: usize, symbol: char) {
        self.index(x0, y0);
        self.index(x1, y1);

        let (mut x, mut y) = (x0 as isize, y0 as isize);
        let (x1, y1) = (x1 as isize, y1 as isize);
        let dx = (x1 - x).abs();
        let dy = -(y1 - y).abs();
        let sx = if x < x1 { 1 } else { -1 };
        let sy = if y < y1 { 1 } else { -1 };
        let mut err = dx + dy;

        loop {
            self.set(x as usize + y as usize * self.width, symbol as u32);
            if x == x1 && y == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    #[inline]
    fn set(&mut self, index: usize, code_point: u32) {
        self.back[index] = self.style.with_code_point(code_point);
    }

    fn index(&self, x: usize, y: usize) -> usize {
        assert!(
            x < self.width && y < self.height,
            "cell ({x}, {y}) is outside the {}x{} canvas",
            self.width,
            self.height
        );
        x + y * self.width
    }

    fn assert_region(&self, x: usize, y: usize, w: usize, h: usize) {
        let fits_x = x.checked_add(w).is_some_and(|right| right <= self.width);
        let fits_y = y.checked_add(h).is_some_and(|bottom| bottom <= self.height);
        assert!(
            fits_x && fits_y,
            "block {w}x{h} at ({x}, {y}) does not fit the {}x{} canvas",
            self.width,
            self.height
        );
    }

    // ------------------------------------------------------------------
    // Flushing
    // ------------------------------------------------------------------

    /// Resend every cell on every pass while `on`
    pub fn set_force_flush(&mut self, on: bool) {
        self.force_flush = on;
    }

    /// Resend every cell during the next full pass, then go back to diffing.
    ///
    /// A pass already in progress is restarted from the first cell.
    pub fn force_next_flush_only(&mut self) {
        self.force_next_flush_only = true;
        self.flush_index = 0;
    }

    /// Forget where the peer's cursor is and which style it uses.
    ///
    /// Call this after bytes the canvas did not produce reach the peer. The
    /// next emitted cell gets an explicit cursor move and SGR sequence.
    pub fn invalidate_peer(&mut self) {
        self.flush_last = None;
        self.flush_state = None;
    }

    /// Emit the differences between the buffers into `out`.
    pub fn flush(&mut self, out: &mut [u8]) -> Flushed {
        self.flush_after(out, 0)
    }

    /// Emit the differences into `out[start..]`, where the caller already
    /// put `start` bytes of its own. `written` counts only canvas bytes.
    ///
    /// A cell is split across calls only when nothing at all was written to
    /// `out` in this call, so other output never lands inside a cell.
    pub fn flush_after(&mut self, out: &mut [u8], start: usize) -> Flushed {
        let mut written = start + self.drain_carry(&mut out[start..]);
        if self.carry_offset < self.carry.len() {
            return Flushed {
                written: written - start,
                pending: true,
            };
        }

        let forcing = self.force_flush || self.force_next_flush_only;
        while self.flush_index < self.back.len() {
            let index = self.flush_index;
            let next = self.back[index];
            if !forcing && self.front[index] == next {
                self.flush_index += 1;
                continue;
            }

            self.encode_cell(index, next);
            let len = self.scratch.len();
            let remaining = out.len() - written;

            if len <= remaining {
                out[written..written + len].copy_from_slice(&self.scratch);
                written += len;
                self.commit(index, next);
            } else if written == 0 && !out.is_empty() {
                // Not even one cell fits an empty buffer: send what fits and
                // keep the tail for the next call
                out.copy_from_slice(&self.scratch[..remaining]);
                self.carry.clear();
                self.carry.extend_from_slice(&self.scratch[remaining..]);
                self.carry_offset = 0;
                self.commit(index, next);
                return Flushed {
                    written: remaining,
                    pending: true,
                };
            } else {
                return Flushed {
                    written: written - start,
                    pending: true,
                };
            }
        }

        self.flush_index = 0;
        self.force_next_flush_only = false;
        // Cells drawn behind the scan during a multi-call pass still differ
        Flushed {
            written: written - start,
            pending: !self.is_clean(),
        }
    }

    /// Emit only the rest of a cell sequence that an undersized buffer split,
    /// so other bytes can follow without landing inside it
    pub fn finish_cell(&mut self, out: &mut [u8]) -> Flushed {
        let written = self.drain_carry(out);
        Flushed {
            written,
            pending: self.carry_offset < self.carry.len(),
        }
    }

    fn drain_carry(&mut self, out: &mut [u8]) -> usize {
        let rest = &self.carry[self.carry_offset..];
        let n = rest.len().min(out.len());
        out[..n].copy_from_slice(&rest[..n]);
        self.carry_offset += n;
        n
    }

    fn commit(&mut self, index: usize, next: Cell) {
        self.front[index] = next;
        self.flush_state = Some(next.style());
        self.flush_last = Some(index);
        self.flush_index = index + 1;
    }

    /// Build the full byte sequence for one cell in `scratch`
    fn encode_cell(&mut self, index: usize, next: Cell) {
        let out = &mut self.scratch;
        out.clear();

        let col = index % self.width;
        let contiguous = self.flush_last.is_some_and(|last| last + 1 == index);
        if !contiguous || col == 0 {
            escape::cursor_position(out, index / self.width, col);
        }
        if !self.flush_state.is_some_and(|state| state.style_eq(next)) {
            escape::sgr(out, self.flush_state, next);
        }
        out.extend_from_slice(utf8::encode(next.code_point()).as_bytes());
    }
}
