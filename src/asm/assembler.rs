//! Simple assembler for LGP-30 programs.
//!
//! Syntax:
//! ```text
//! ; Comment
//! START:  B VALUE      ; Bring VALUE into A
//!         H 03.05      ; Hold A at track 3, sector 5
//!         Z            ; Stop
//!
//!         ORG 01.00    ; Set origin address
//! VALUE:  DAT 0xABCD   ; Define a data word
//! ```
//!
//! Operands may be decimal addresses (0-4095), `0x` hex, `track.sector`,
//! or labels. Orders accept their one-letter names or a spelled-out alias
//! (`BRING`, `HOLD`, `STOP`, ...).

use crate::asm::image::DrumImage;
use crate::cpu::decode::{encode, Instruction, Opcode};
use crate::cpu::drum::{Address, SECTORS_PER_TRACK, TRACKS};
use crate::word::Word;
use std::collections::HashMap;
use thiserror::Error;

/// Assemble source code to a drum image.
pub fn assemble(source: &str) -> Result<DrumImage, AssemblerError> {
    let mut asm = Assembler::new();
    asm.assemble(source)
}

/// Which part of an emitted word a forward reference patches.
#[derive(Debug, Clone, Copy)]
enum Fixup {
    /// The order's address field.
    Operand,
    /// The whole data word.
    Data,
}

/// A label used before it was defined.
struct PendingRef {
    addr: Address,
    label: String,
    line: usize,
    fixup: Fixup,
}

/// The assembler state.
struct Assembler {
    /// Address the next word lands on. `None` once past the end of the drum.
    current_addr: Option<Address>,
    /// Symbol table (label -> address).
    symbols: HashMap<String, Address>,
    /// References resolved in pass 2.
    pending: Vec<PendingRef>,
    /// Output image.
    output: DrumImage,
}

impl Assembler {
    fn new() -> Self {
        Self {
            current_addr: Some(Address::ZERO),
            symbols: HashMap::new(),
            pending: Vec::new(),
            output: DrumImage::new(),
        }
    }

    fn assemble(&mut self, source: &str) -> Result<DrumImage, AssemblerError> {
        // Pass 1: collect labels and generate code
        for (line_num, line) in source.lines().enumerate() {
            self.process_line(line, line_num + 1)?;
        }

        // Pass 2: resolve forward references
        self.resolve_references()?;

        Ok(std::mem::take(&mut self.output))
    }

    fn process_line(&mut self, line: &str, line_num: usize) -> Result<(), AssemblerError> {
        let line = match line.find(';') {
            Some(idx) => &line[..idx],
            None => line,
        };
        let mut line = line.trim();

        if let Some(colon_idx) = line.find(':') {
            let label = line[..colon_idx].trim().to_uppercase();
            if label.is_empty() || label.contains(char::is_whitespace) {
                return Err(AssemblerError::SyntaxError {
                    line: line_num,
                    message: format!("invalid label '{}'", label),
                });
            }
            let here = self.here(line_num)?;
            if self.symbols.insert(label.clone(), here).is_some() {
                return Err(AssemblerError::DuplicateLabel { line: line_num, label });
            }
            line = line[colon_idx + 1..].trim();
        }

        if line.is_empty() {
            return Ok(());
        }

        self.process_statement(line, line_num)
    }

    fn process_statement(&mut self, line: &str, line_num: usize) -> Result<(), AssemblerError> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() > 2 {
            return Err(AssemblerError::SyntaxError {
                line: line_num,
                message: format!("unexpected '{}'", parts[2]),
            });
        }

        let mnemonic = parts[0].to_uppercase();
        let operand = parts.get(1).copied();

        match mnemonic.as_str() {
            "ORG" => {
                let text = operand.ok_or_else(|| AssemblerError::SyntaxError {
                    line: line_num,
                    message: "ORG requires address".into(),
                })?;
                let addr = self.parse_address(text, line_num)?.ok_or_else(|| {
                    AssemblerError::SyntaxError {
                        line: line_num,
                        message: "ORG cannot use a forward reference".into(),
                    }
                })?;
                self.current_addr = Some(addr);
            }

            "DAT" | "DATA" => {
                let text = operand.ok_or_else(|| AssemblerError::SyntaxError {
                    line: line_num,
                    message: "DAT requires value".into(),
                })?;
                let word = self.parse_data(text, line_num)?;
                self.emit(word, line_num)?;
            }

            _ => {
                let opcode = Opcode::from_mnemonic(&mnemonic).ok_or_else(|| {
                    AssemblerError::UnknownMnemonic {
                        line: line_num,
                        mnemonic: mnemonic.clone(),
                    }
                })?;
                let operand = match operand {
                    Some(text) => self.parse_operand(text, line_num)?,
                    None => Address::ZERO,
                };
                self.emit(encode(&Instruction::new(opcode, operand)), line_num)?;
            }
        }

        Ok(())
    }

    /// Parse an order operand, queueing a fixup for unknown labels.
    fn parse_operand(&mut self, text: &str, line_num: usize) -> Result<Address, AssemblerError> {
        match self.parse_address(text, line_num)? {
            Some(addr) => Ok(addr),
            None => {
                self.defer(text, line_num, Fixup::Operand)?;
                Ok(Address::ZERO)
            }
        }
    }

    /// Parse a `DAT` value: signed decimal, `0x` hex bits, or a label's address.
    fn parse_data(&mut self, text: &str, line_num: usize) -> Result<Word, AssemblerError> {
        if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
            return u32::from_str_radix(&hex.replace('_', ""), 16)
                .map(Word::from_bits)
                .map_err(|_| AssemblerError::SyntaxError {
                    line: line_num,
                    message: format!("invalid hex literal '{}'", text),
                });
        }

        if text.starts_with(|c: char| c == '-' || c == '+' || c.is_ascii_digit()) {
            return text.parse::<i32>().map(Word::new).map_err(|_| {
                AssemblerError::SyntaxError {
                    line: line_num,
                    message: format!("invalid number '{}'", text),
                }
            });
        }

        match self.symbols.get(&text.to_uppercase()) {
            Some(addr) => Ok(Word::new(addr.value() as i32)),
            None => {
                self.defer(text, line_num, Fixup::Data)?;
                Ok(Word::ZERO)
            }
        }
    }

    /// Parse an address literal or known label.
    ///
    /// Returns `Ok(None)` for a label that is not yet defined.
    fn parse_address(&self, text: &str, line_num: usize) -> Result<Option<Address>, AssemblerError> {
        let out_of_range = |value: u32| AssemblerError::ValueOutOfRange { line: line_num, value };
        let syntax = || AssemblerError::SyntaxError {
            line: line_num,
            message: format!("invalid address '{}'", text),
        };

        if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
            let value = u32::from_str_radix(hex, 16).map_err(|_| syntax())?;
            return Self::checked_address(value).map(Some).ok_or_else(|| out_of_range(value));
        }

        if let Some((track, sector)) = text.split_once('.') {
            let track: u32 = track.parse().map_err(|_| syntax())?;
            let sector: u32 = sector.parse().map_err(|_| syntax())?;
            if track as usize >= TRACKS {
                return Err(out_of_range(track));
            }
            if sector as usize >= SECTORS_PER_TRACK {
                return Err(out_of_range(sector));
            }
            return Ok(Address::from_parts(track as u8, sector as u8).ok());
        }

        if text.starts_with(|c: char| c.is_ascii_digit()) {
            let value: u32 = text.parse().map_err(|_| syntax())?;
            return Self::checked_address(value).map(Some).ok_or_else(|| out_of_range(value));
        }

        Ok(self.symbols.get(&text.to_uppercase()).copied())
    }

    fn checked_address(value: u32) -> Option<Address> {
        u16::try_from(value).ok().and_then(|v| Address::new(v).ok())
    }

    fn defer(&mut self, label: &str, line_num: usize, fixup: Fixup) -> Result<(), AssemblerError> {
        let addr = self.here(line_num)?;
        self.pending.push(PendingRef {
            addr,
            label: label.to_uppercase(),
            line: line_num,
            fixup,
        });
        Ok(())
    }

    fn here(&self, line_num: usize) -> Result<Address, AssemblerError> {
        self.current_addr.ok_or(AssemblerError::DrumFull { line: line_num })
    }

    fn emit(&mut self, word: Word, line_num: usize) -> Result<(), AssemblerError> {
        let addr = self.here(line_num)?;
        self.output.insert(addr, word);
        self.current_addr = (addr.value() < Address::MAX).then(|| addr.next());
        Ok(())
    }

    fn resolve_references(&mut self) -> Result<(), AssemblerError> {
        for pending in &self.pending {
            let target = self.symbols.get(&pending.label).ok_or_else(|| {
                AssemblerError::UndefinedLabel {
                    line: pending.line,
                    label: pending.label.clone(),
                }
            })?;

            let word = self.output.get(pending.addr).unwrap_or(Word::ZERO);
            let patched = match pending.fixup {
                Fixup::Operand => word.with_address_field(target.value()),
                Fixup::Data => Word::new(target.value() as i32),
            };
            self.output.insert(pending.addr, patched);
        }
        Ok(())
    }
}

/// Errors that can occur during assembly.
#[derive(Debug, Clone, Error)]
pub enum AssemblerError {
    #[error("syntax error on line {line}: {message}")]
    SyntaxError { line: usize, message: String },

    #[error("unknown mnemonic on line {line}: {mnemonic}")]
    UnknownMnemonic { line: usize, mnemonic: String },

    #[error("undefined label on line {line}: {label}")]
    UndefinedLabel { line: usize, label: String },

    #[error("duplicate label on line {line}: {label}")]
    DuplicateLabel { line: usize, label: String },

    #[error("value out of range on line {line}: {value}")]
    ValueOutOfRange { line: usize, value: u32 },

    #[error("program runs past the end of the drum on line {line}")]
    DrumFull { line: usize },
}
