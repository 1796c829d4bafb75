//! Telnet Canvas Library
//!
//! A styled character grid rendered to remote terminals over Telnet, built
//! without any terminal library. This crate provides:
//!
//! - `core`: UTF-8 codec, packed cells, the double-buffered canvas, snapshots
//! - `escape`: the ANSI sequences the canvas and terminal emit
//! - `parser`: Telnet/ANSI input decoder
//! - `input`: keyboard state accumulated from decoded keys
//! - `terminal`: per-connection decoder application and output framing
//! - `config`, `session`: settings and connection ids

pub mod config;
pub mod core;
pub mod escape;
pub mod input;
pub mod parser;
pub mod session;
pub mod terminal;

pub use crate::config::{Config, ConfigError};
pub use crate::core::{Canvas, Cell, Color, Flushed, Snapshot};
pub use crate::input::{Directional, Keyboard};
pub use crate::session::{SessionId, SessionIds};
pub use crate::terminal::Terminal;
