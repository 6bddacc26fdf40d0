//! Host-side program tooling for the LGP-30.
//!
//! This module provides:
//! - A simple two-pass assembler (text → drum image)
//! - A disassembler (drum words → readable text)
//! - The drum image file format used to load programs

pub mod assembler;
pub mod disasm;
pub mod image;

pub use assembler::{assemble, AssemblerError};
pub use disasm::{disassemble, disassemble_instruction};
pub use image::{DrumImage, ImageError, load_image, save_image};
