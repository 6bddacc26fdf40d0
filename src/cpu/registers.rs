//! LGP-30 registers.
//!
//! The machine has only two programmer-visible registers:
//! - A: 32-bit accumulator, the sole data register
//! - C: 12-bit instruction counter, the drum address of the next order

use crate::cpu::drum::Address;
use crate::word::Word;
use serde::{Serialize, Deserialize};

/// The LGP-30 register file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registers {
    /// A: accumulator
    pub accumulator: Word,

    /// C: instruction counter
    pub counter: Address,
}

impl Registers {
    /// Create a register file with both registers zeroed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start execution from `start` instead of address 0.
    pub fn starting_at(start: Address) -> Self {
        Self {
            accumulator: Word::ZERO,
            counter: start,
        }
    }

    /// Increment the counter by 1 modulo 4096.
    pub fn advance_counter(&mut self) {
        self.counter = self.counter.next();
    }

    /// Transfer control to an absolute address.
    pub fn jump(&mut self, addr: Address) {
        self.counter = addr;
    }
}
