//! Disassembler for LGP-30 drum words.
//!
//! Every word decodes to some order, so data words also print as orders;
//! the raw hex is shown alongside so the reader can tell.

use crate::asm::image::DrumImage;
use crate::cpu::decode::{decode, Instruction, Opcode};
use crate::word::Word;

/// Disassemble a single word to text.
pub fn disassemble_instruction(word: Word) -> String {
    format_instruction(&decode(word))
}

/// Disassemble every word of an image.
pub fn disassemble(image: &DrumImage) -> String {
    let mut output = String::new();
    output.push_str("; LGP-30 Disassembly\n");
    output.push_str("; -------------------\n\n");

    for (addr, word) in image.iter() {
        let line = disassemble_instruction(word);
        output.push_str(&format!("{}: {:<8}  ; {}\n", addr, line, word));
    }

    output
}

/// Format a decoded order as assembly text.
fn format_instruction(instr: &Instruction) -> String {
    match instr.opcode {
        Opcode::Stop => "Z".to_string(),
        op => format!("{} {}", op.mnemonic(), instr.operand),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::drum::Address;

    #[test]
    fn test_disassemble_bring() {
        let word = Word::instruction(0x1, 197);
        assert_eq!(disassemble_instruction(word), "B 03.05");
    }

    #[test]
    fn test_disassemble_stop() {
        assert_eq!(disassemble_instruction(Word::instruction(0xF, 0)), "Z");
    }

    #[test]
    fn test_disassemble_image() {
        let mut image = DrumImage::new();
        image.insert(Address::ZERO, Word::instruction(0xE, 64));
        let text = disassemble(&image);
        assert!(text.contains("00.00: H 01.00"));
        assert!(text.contains("000E0100"));
    }
}
