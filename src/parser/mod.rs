//! Client input decoder
//!
//! A stateful decoder that turns the bytes a Telnet client sends into key
//! presses and protocol events. Sequences may be split across reads at any
//! byte; the decoder resumes where the previous call stopped.

mod actions;
mod state;
pub mod telnet;

pub use actions::{Event, Key};
pub use state::{Decoder, DEFAULT_MAX_SUBNEGOTIATION};
pub use telnet::Command;
