//! CPU emulation for the LGP-30.
//!
//! This module implements the coupled drum/CPU timing model:
//! - 4096-word magnetic drum with a single rotating head
//! - 2 registers: A (accumulator) and C (instruction counter)
//! - 16-order instruction set with single-address orders

pub mod config;
pub mod drum;
pub mod registers;
pub mod decode;
pub mod execute;

pub use config::{CpuConfig, ConfigError};
pub use drum::{Address, Drum, DrumError, DRUM_SIZE, SECTORS_PER_TRACK, TRACKS};
pub use registers::Registers;
pub use decode::{Instruction, InstructionSet, Opcode};
pub use execute::{Cpu, CpuState, Diagnostic, StepReport, DIAGNOSTIC_CAPACITY};
