//! Instruction decoder for the LGP-30.
//!
//! Every word on the drum decodes to an instruction: the 4-bit command field
//! names one of 16 orders and the 12-bit address field names the operand.
//! Whether an order actually does anything depends on the configured
//! [`InstructionSet`].

use crate::cpu::drum::Address;
use crate::word::Word;
use serde::{Serialize, Deserialize};

/// The 16 command codes.
///
/// B, H and Z sit at their fixed codes; the remaining orders keep their
/// LGP-30 codes where free, with Add and Subtract moved onto the codes
/// vacated by Hold and Stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Opcode {
    /// S: A := A - [m]
    Subtract = 0x0,
    /// B: A := [m]
    Bring = 0x1,
    /// Y: address field of [m] := address field of A
    StoreAddress = 0x2,
    /// R: address field of [m] := C + 2
    ReturnAddress = 0x3,
    /// I: fill A from the input device
    Input = 0x4,
    /// D: A := A / [m]
    Divide = 0x5,
    /// N: A := low half of A * [m]
    MultiplyLow = 0x6,
    /// M: A := high half of A * [m]
    MultiplyHigh = 0x7,
    /// P: print character m
    Print = 0x8,
    /// E: A := A AND [m]
    Extract = 0x9,
    /// U: C := m
    Transfer = 0xA,
    /// T: if A < 0 then C := m
    Test = 0xB,
    /// A: A := A + [m]
    Add = 0xC,
    /// C: [m] := A, A := 0
    Clear = 0xD,
    /// H: [m] := A
    Hold = 0xE,
    /// Z: stop
    Stop = 0xF,
}

impl Opcode {
    /// All opcodes in command-code order.
    pub const ALL: [Opcode; 16] = [
        Opcode::Subtract,
        Opcode::Bring,
        Opcode::StoreAddress,
        Opcode::ReturnAddress,
        Opcode::Input,
        Opcode::Divide,
        Opcode::MultiplyLow,
        Opcode::MultiplyHigh,
        Opcode::Print,
        Opcode::Extract,
        Opcode::Transfer,
        Opcode::Test,
        Opcode::Add,
        Opcode::Clear,
        Opcode::Hold,
        Opcode::Stop,
    ];

    /// Decode a 4-bit command code. Only the low 4 bits are looked at.
    #[inline]
    pub fn from_code(code: u8) -> Self {
        Self::ALL[(code & 0x0F) as usize]
    }

    #[inline]
    pub fn code(self) -> u8 {
        self as u8
    }

    /// The one-letter order name used on the LGP-30 coding sheet.
    pub fn mnemonic(self) -> char {
        match self {
            Opcode::Subtract => 'S',
            Opcode::Bring => 'B',
            Opcode::StoreAddress => 'Y',
            Opcode::ReturnAddress => 'R',
            Opcode::Input => 'I',
            Opcode::Divide => 'D',
            Opcode::MultiplyLow => 'N',
            Opcode::MultiplyHigh => 'M',
            Opcode::Print => 'P',
            Opcode::Extract => 'E',
            Opcode::Transfer => 'U',
            Opcode::Test => 'T',
            Opcode::Add => 'A',
            Opcode::Clear => 'C',
            Opcode::Hold => 'H',
            Opcode::Stop => 'Z',
        }
    }

    /// Look up an opcode by its one-letter or spelled-out name.
    pub fn from_mnemonic(name: &str) -> Option<Self> {
        let op = match name.to_ascii_uppercase().as_str() {
            "S" | "SUB" | "SUBTRACT" => Opcode::Subtract,
            "B" | "BRING" => Opcode::Bring,
            "Y" | "STORE" => Opcode::StoreAddress,
            "R" | "RETURN" => Opcode::ReturnAddress,
            "I" | "INPUT" => Opcode::Input,
            "D" | "DIV" | "DIVIDE" => Opcode::Divide,
            "N" | "MULLO" => Opcode::MultiplyLow,
            "M" | "MULHI" | "MULTIPLY" => Opcode::MultiplyHigh,
            "P" | "PRINT" => Opcode::Print,
            "E" | "EXTRACT" | "AND" => Opcode::Extract,
            "U" | "JMP" | "TRANSFER" => Opcode::Transfer,
            "T" | "TEST" => Opcode::Test,
            "A" | "ADD" => Opcode::Add,
            "C" | "CLEAR" => Opcode::Clear,
            "H" | "HOLD" => Opcode::Hold,
            "Z" | "STOP" | "HLT" => Opcode::Stop,
            _ => return None,
        };
        Some(op)
    }

    /// Whether executing this order reads or writes the drum operand.
    pub fn touches_drum(self) -> bool {
        !matches!(
            self,
            Opcode::Input | Opcode::Print | Opcode::Transfer | Opcode::Test | Opcode::Stop
        )
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.mnemonic())
    }
}

/// Which orders the processing unit actually executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstructionSet {
    /// Bring, Hold and Stop only.
    #[default]
    Core,
    /// Every order except the I/O device orders (Input, Print).
    Extended,
}

impl InstructionSet {
    /// Whether `op` has defined behavior in this set.
    pub fn implements(self, op: Opcode) -> bool {
        match self {
            InstructionSet::Core => matches!(op, Opcode::Bring | Opcode::Hold | Opcode::Stop),
            InstructionSet::Extended => !matches!(op, Opcode::Input | Opcode::Print),
        }
    }
}

/// A decoded order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    pub opcode: Opcode,
    pub operand: Address,
}

impl Instruction {
    pub fn new(opcode: Opcode, operand: Address) -> Self {
        Self { opcode, operand }
    }
}

impl std::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.opcode, self.operand)
    }
}

/// Decode a drum word. Bits outside the command and address fields are ignored.
pub fn decode(word: Word) -> Instruction {
    Instruction {
        opcode: Opcode::from_code(word.command_field()),
        operand: Address::wrapping(word.address_field()),
    }
}

/// Encode an instruction as a drum word with all reserved bits clear.
pub fn encode(instr: &Instruction) -> Word {
    Word::instruction(instr.opcode.code(), instr.operand.value())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_bring() {
        let word = Word::from_bits((0x1 << 16) | (197 << 2));
        let instr = decode(word);
        assert_eq!(instr.opcode, Opcode::Bring);
        assert_eq!(instr.operand, Address::from_parts(3, 5).unwrap());
    }

    #[test]
    fn test_decode_ignores_reserved_bits() {
        let word = Word::from_bits(0xABC0_0003 | (0xF << 16));
        let instr = decode(word);
        assert_eq!(instr.opcode, Opcode::Stop);
        assert_eq!(instr.operand, Address::ZERO);
    }

    #[test]
    fn test_opcode_codes_match_table() {
        for (code, op) in Opcode::ALL.iter().enumerate() {
            assert_eq!(op.code() as usize, code);
            assert_eq!(Opcode::from_code(code as u8), *op);
        }
        assert_eq!(Opcode::Bring.code(), 0x1);
        assert_eq!(Opcode::Hold.code(), 0xE);
        assert_eq!(Opcode::Stop.code(), 0xF);
    }

    #[test]
    fn test_mnemonic_lookup() {
        for op in Opcode::ALL {
            let letter = op.mnemonic().to_string();
            assert_eq!(Opcode::from_mnemonic(&letter), Some(op));
        }
        assert_eq!(Opcode::from_mnemonic("hold"), Some(Opcode::Hold));
        assert_eq!(Opcode::from_mnemonic("XYZ"), None);
    }

    #[test]
    fn test_instruction_sets() {
        let core: Vec<_> = Opcode::ALL
            .into_iter()
            .filter(|op| InstructionSet::Core.implements(*op))
            .collect();
        assert_eq!(core, vec![Opcode::Bring, Opcode::Hold, Opcode::Stop]);

        assert!(InstructionSet::Extended.implements(Opcode::Add));
        assert!(!InstructionSet::Extended.implements(Opcode::Print));
        assert!(!InstructionSet::Extended.implements(Opcode::Input));
    }

    #[test]
    fn test_encode_clears_reserved_bits() {
        let instr = Instruction::new(Opcode::Hold, Address::new(64).unwrap());
        let word = encode(&instr);
        assert_eq!(word.bits(), (0xE << 16) | (64 << 2));
        assert_eq!(decode(word), instr);
    }
}
