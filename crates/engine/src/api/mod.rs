//! API layer - the stdin/stdout line protocol.
//!
//! Commands arrive one per line; every response is one JSON object per line.

pub mod commands;
pub mod dispatch;
pub mod payloads;

pub use commands::{Command, CommandError};
pub use dispatch::{emit, CommandDispatcher, Flow};
