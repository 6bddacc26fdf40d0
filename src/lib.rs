//! # LGP-30 Emulator
//!
//! A timing-accurate emulator of the Librascope LGP-30 (1956) drum memory
//! computer.
//!
//! The LGP-30 kept all 4096 words of main storage on a rotating magnetic
//! drum. Every order fetch and every operand access waits for the right
//! sector to come round under the head, so this emulator tracks not only
//! what each register holds but how many word-times each order takes.

pub mod word;
pub mod cpu;
pub mod asm;

#[cfg(feature = "tui")]
pub mod tui;

// Re-export commonly used types
pub use word::Word;
pub use cpu::{
    Address, Cpu, CpuConfig, CpuState, Diagnostic, Drum, Instruction, InstructionSet, Opcode,
    Registers, StepReport,
};
pub use asm::{assemble, disassemble, AssemblerError, DrumImage, load_image, save_image};

#[cfg(feature = "tui")]
pub use tui::run_debugger;
