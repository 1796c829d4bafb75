//! Canvas snapshots
//!
//! A snapshot captures the target buffer of a canvas. It serializes either
//! as raw packed cells (4 little-endian bytes each, the same layout as
//! [`Cell::to_le_bytes`]) or as JSON for fixtures and debugging. Given the
//! same drawing calls, two canvases produce bit-identical snapshots.

use serde::{Deserialize, Serialize};

use super::canvas::Canvas;
use super::cell::{Cell, CELL_BYTES};

/// Errors from decoding a snapshot
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("expected {expected} bytes for the grid, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// The target buffer of a canvas
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub width: usize,
    pub height: usize,
    /// Row-major cells
    pub cells: Vec<Cell>,
}

impl Snapshot {
    /// Capture the target buffer of `canvas`
    pub fn from_canvas(canvas: &Canvas) -> Self {
        Self {
            width: canvas.width(),
            height: canvas.height(),
            cells: canvas.cells().to_vec(),
        }
    }

    /// Packed cells, 4 little-endian bytes each
    pub fn to_bytes(&self) -> Vec<u8> {
        self.cells.iter().flat_map(|cell| cell.to_le_bytes()).collect()
    }

    /// Decode packed cells for a `width` x `height` grid
    pub fn from_bytes(width: usize, height: usize, bytes: &[u8]) -> Result<Self, SnapshotError> {
        let expected = grid_bytes(width, height);
        if bytes.len() != expected {
            return Err(SnapshotError::LengthMismatch {
                expected,
                actual: bytes.len(),
            });
        }

        let cells = bytes
            .chunks_exact(CELL_BYTES)
            .map(|chunk| Cell::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect();
        Ok(Self {
            width,
            height,
            cells,
        })
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let snapshot: Snapshot = serde_json::from_str(json)?;
        let expected = grid_bytes(snapshot.width, snapshot.height);
        let actual = snapshot.cells.len().saturating_mul(CELL_BYTES);
        if actual != expected {
            return Err(SnapshotError::LengthMismatch { expected, actual });
        }
        Ok(snapshot)
    }

    /// Glyphs only, one line per row. Invalid code points render as U+FFFD.
    pub fn to_text(&self) -> String {
        let mut text = String::with_capacity((self.width + 1) * self.height);
        if self.width == 0 {
            return text;
        }
        for row in self.cells.chunks(self.width) {
            text.extend(row.iter().map(|c| c.as_char().unwrap_or('\u{FFFD}')));
            text.push('\n');
        }
        text
    }

    /// Resize `canvas` to the snapshot's dimensions and copy the cells into
    /// its target buffer
    pub fn restore(&self, canvas: &mut Canvas) {
        canvas.resize(self.width, self.height);
        canvas.blit(0, 0, self.width, self.height, &self.cells);
    }
}

/// Packed size of a grid; dimensions too large to address saturate
fn grid_bytes(width: usize, height: usize) -> usize {
    width
        .checked_mul(height)
        .and_then(|cells| cells.checked_mul(CELL_BYTES))
        .unwrap_or(usize::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Color;

    fn sample() -> Canvas {
        let mut canvas = Canvas::new(4, 2);
        canvas.set_foreground(Color::Green);
        canvas.write(0, 0, "ok");
        canvas.set_bold(true);
        canvas.put(3, 1, 'λ');
        canvas
    }

    #[test]
    fn test_bytes_are_four_per_cell() {
        let snapshot = Snapshot::from_canvas(&sample());
        let bytes = snapshot.to_bytes();
        assert_eq!(bytes.len(), 4 * 2 * CELL_BYTES);
        // 'o' in green on black
        assert_eq!(&bytes[..4], &[b'o', 0x00, 0x00, 0x02]);

        let decoded = Snapshot::from_bytes(4, 2, &bytes).unwrap();
        assert_eq!(decoded, snapshot);
    }

    #[test]
    fn test_from_bytes_length_mismatch() {
        let err = Snapshot::from_bytes(2, 2, &[0; 15]).unwrap_err();
        assert!(matches!(
            err,
            SnapshotError::LengthMismatch {
                expected: 16,
                actual: 15
            }
        ));
    }

    #[test]
    fn test_oversized_dimensions_are_rejected() {
        let err = Snapshot::from_bytes(usize::MAX, 2, &[]).unwrap_err();
        assert!(matches!(
            err,
            SnapshotError::LengthMismatch {
                expected: usize::MAX,
                actual: 0
            }
        ));

        let json = format!(r#"{{"width": {}, "height": 2, "cells": []}}"#, usize::MAX);
        let err = Snapshot::from_json(&json).unwrap_err();
        assert!(matches!(err, SnapshotError::LengthMismatch { actual: 0, .. }));
    }

    #[test]
    fn test_json_and_text() {
        let snapshot = Snapshot::from_canvas(&sample());
        let json = snapshot.to_json().unwrap();
        assert_eq!(Snapshot::from_json(&json).unwrap(), snapshot);
        assert_eq!(snapshot.to_text(), "ok  \n   λ\n");

        let truncated = r#"{"width": 2, "height": 2, "cells": [0]}"#;
        assert!(Snapshot::from_json(truncated).is_err());
    }

    #[test]
    fn test_restore_into_canvas() {
        let snapshot = Snapshot::from_canvas(&sample());
        let mut canvas = Canvas::new(1, 1);
        snapshot.restore(&mut canvas);
        assert_eq!(Snapshot::from_canvas(&canvas), snapshot);
        assert!(canvas.cell(3, 1).bold());
    }
}
