//! TUI debugger for the LGP-30 emulator.
//!
//! Provides an interactive terminal-based debugger with:
//! - Register, head position and word-time counters
//! - Drum track view that follows the instruction counter
//! - Step/run/breakpoint controls
//! - Disassembly view

mod app;
mod ui;

pub use app::{DebuggerApp, run_debugger};
