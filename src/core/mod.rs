//! Canvas Core Module
//!
//! Transport-independent screen state. This module contains:
//! - The UTF-8 codec for 21-bit code points
//! - Packed 32-bit cells and the 8-color palette
//! - The double-buffered canvas and its diff-based flush
//! - Snapshots of the target buffer in the packed wire layout
//!
//! Nothing here touches a socket: flushing fills caller-provided memory.

mod canvas;
mod cell;
mod snapshot;
pub mod utf8;

pub use canvas::{Canvas, Flushed};
pub use cell::{Cell, Color, CELL_BYTES};
pub use snapshot::{Snapshot, SnapshotError};
