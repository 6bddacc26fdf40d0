//! The 32-bit drum word.
//!
//! Every cell on the drum, the accumulator, and every instruction is one
//! of these. Arithmetic is two's complement and wraps at 32 bits.
//!
//! Instruction layout (bit 0 = least significant):
//! - Bits 16-19: command code (4 bits)
//! - Bits 2-15: operand address (12 bits)
//! - Everything else is ignored by the decoder

use std::fmt;
use serde::{Serialize, Deserialize};

/// A single drum word.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Word(i32);

impl Word {
    /// Number of bits in a word.
    pub const WIDTH: u32 = 32;

    /// The all-zero word.
    pub const ZERO: Word = Word(0);

    const COMMAND_SHIFT: u32 = 16;
    const COMMAND_MASK: u32 = 0x0F;
    const ADDRESS_SHIFT: u32 = 2;
    const ADDRESS_MASK: u32 = 0x0FFF;

    /// Create a word from a signed value.
    #[inline]
    pub const fn new(value: i32) -> Self {
        Self(value)
    }

    /// Create a word from its raw bit pattern.
    #[inline]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits as i32)
    }

    /// Signed value of the word.
    #[inline]
    pub const fn value(self) -> i32 {
        self.0
    }

    /// Raw bit pattern of the word.
    #[inline]
    pub const fn bits(self) -> u32 {
        self.0 as u32
    }

    #[inline]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// The 4-bit command field (bits 16-19).
    #[inline]
    pub const fn command_field(self) -> u8 {
        ((self.bits() >> Self::COMMAND_SHIFT) & Self::COMMAND_MASK) as u8
    }

    /// The 12-bit operand address field (bits 2-15).
    #[inline]
    pub const fn address_field(self) -> u16 {
        ((self.bits() >> Self::ADDRESS_SHIFT) & Self::ADDRESS_MASK) as u16
    }

    /// Replace the address field, leaving every other bit alone.
    pub const fn with_address_field(self, address: u16) -> Self {
        let mask = Self::ADDRESS_MASK << Self::ADDRESS_SHIFT;
        let field = ((address as u32) & Self::ADDRESS_MASK) << Self::ADDRESS_SHIFT;
        Self::from_bits((self.bits() & !mask) | field)
    }

    /// Assemble an instruction word from a command code and operand address.
    pub const fn instruction(command: u8, address: u16) -> Self {
        let command = ((command as u32) & Self::COMMAND_MASK) << Self::COMMAND_SHIFT;
        let address = ((address as u32) & Self::ADDRESS_MASK) << Self::ADDRESS_SHIFT;
        Self::from_bits(command | address)
    }

    #[inline]
    pub const fn wrapping_add(self, rhs: Word) -> Self {
        Self(self.0.wrapping_add(rhs.0))
    }

    #[inline]
    pub const fn wrapping_sub(self, rhs: Word) -> Self {
        Self(self.0.wrapping_sub(rhs.0))
    }

    /// Low 32 bits of the product.
    #[inline]
    pub const fn wrapping_mul(self, rhs: Word) -> Self {
        Self(self.0.wrapping_mul(rhs.0))
    }

    /// High 32 bits of the full 64-bit product.
    pub const fn mul_high(self, rhs: Word) -> Self {
        let product = (self.0 as i64) * (rhs.0 as i64);
        Self((product >> Self::WIDTH) as i32)
    }

    /// Truncating division. `None` on a zero divisor or `MIN / -1`.
    #[inline]
    pub const fn checked_div(self, rhs: Word) -> Option<Self> {
        match self.0.checked_div(rhs.0) {
            Some(q) => Some(Self(q)),
            None => None,
        }
    }

    /// Bitwise AND ("extract").
    #[inline]
    pub const fn extract(self, mask: Word) -> Self {
        Self(self.0 & mask.0)
    }
}

impl From<i32> for Word {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

impl From<Word> for i32 {
    fn from(word: Word) -> Self {
        word.0
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08X}", self.bits())
    }
}

impl fmt::Debug for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Word({:08X} = {})", self.bits(), self.0)
    }
}
