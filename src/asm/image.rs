//! Drum image file format.
//!
//! A drum image is a simple sparse text format:
//! - One `AAA WWWWWWWW` pair per line: hex address (0-FFF), hex word
//! - Anything after `;` is a comment
//! - Blank lines are ignored
//!
//! Addresses not mentioned stay zero when the image is loaded.

use crate::cpu::drum::{Address, Drum};
use crate::word::Word;
use std::collections::BTreeMap;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use thiserror::Error;

/// A sparse set of drum words, ordered by address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrumImage {
    words: BTreeMap<Address, Word>,
}

impl DrumImage {
    /// Create an empty image.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a word, replacing anything already at `addr`.
    pub fn insert(&mut self, addr: Address, word: Word) -> Option<Word> {
        self.words.insert(addr, word)
    }

    pub fn get(&self, addr: Address) -> Option<Word> {
        self.words.get(&addr).copied()
    }

    /// Number of words in the image.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Words in address order.
    pub fn iter(&self) -> impl Iterator<Item = (Address, Word)> + '_ {
        self.words.iter().map(|(a, w)| (*a, *w))
    }

    /// Write every word onto a drum without consuming any word-times.
    pub fn load_into(&self, drum: &mut Drum) {
        for (addr, word) in self.iter() {
            drum.poke(addr.track(), addr.sector(), word);
        }
        tracing::debug!(words = self.len(), "drum image loaded");
    }

    /// Capture the non-zero words of a drum.
    pub fn from_drum(drum: &Drum) -> Self {
        Self {
            words: drum.dump().into_iter().collect(),
        }
    }

    /// Parse image text.
    pub fn parse(text: &str) -> Result<Self, ImageError> {
        let mut image = Self::new();
        for (line_num, line) in text.lines().enumerate() {
            image.parse_line(line, line_num + 1)?;
        }
        Ok(image)
    }

    fn parse_line(&mut self, line: &str, line_num: usize) -> Result<(), ImageError> {
        let line = match line.find(';') {
            Some(idx) => &line[..idx],
            None => line,
        };
        let mut fields = line.split_whitespace();

        let Some(addr_text) = fields.next() else {
            return Ok(());
        };
        let word_text = fields.next().ok_or_else(|| ImageError::ParseError {
            line: line_num,
            message: "expected address and word".into(),
        })?;
        if fields.next().is_some() {
            return Err(ImageError::ParseError {
                line: line_num,
                message: "trailing characters after word".into(),
            });
        }

        let addr = u16::from_str_radix(addr_text, 16)
            .ok()
            .and_then(|a| Address::new(a).ok())
            .ok_or_else(|| ImageError::ParseError {
                line: line_num,
                message: format!("invalid address '{}'", addr_text),
            })?;

        let word = u32::from_str_radix(&word_text.replace('_', ""), 16)
            .map(Word::from_bits)
            .map_err(|_| ImageError::ParseError {
                line: line_num,
                message: format!("invalid word '{}'", word_text),
            })?;

        self.insert(addr, word);
        Ok(())
    }

    /// Render the image as text.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        out.push_str("; LGP-30 drum image\n");
        out.push_str(&format!("; {} words\n\n", self.len()));
        for (addr, word) in self.iter() {
            out.push_str(&format!("{:03X} {} ; {}\n", addr.value(), word, addr));
        }
        out
    }
}

impl FromIterator<(Address, Word)> for DrumImage {
    fn from_iter<I: IntoIterator<Item = (Address, Word)>>(iter: I) -> Self {
        Self {
            words: iter.into_iter().collect(),
        }
    }
}

/// Load a drum image from disk.
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<DrumImage, ImageError> {
    let file = std::fs::File::open(path.as_ref())
        .map_err(|e| ImageError::IoError(e.to_string()))?;
    let reader = BufReader::new(file);

    let mut image = DrumImage::new();
    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result.map_err(|e| ImageError::IoError(e.to_string()))?;
        image.parse_line(&line, line_num + 1)?;
    }

    Ok(image)
}

/// Save a drum image to disk.
pub fn save_image<P: AsRef<Path>>(path: P, image: &DrumImage) -> Result<(), ImageError> {
    let mut file = std::fs::File::create(path.as_ref())
        .map_err(|e| ImageError::IoError(e.to_string()))?;
    file.write_all(image.to_text().as_bytes())
        .map_err(|e| ImageError::IoError(e.to_string()))
}

/// Errors that can occur reading or writing drum images.
#[derive(Debug, Clone, Error)]
pub enum ImageError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("parse error on line {line}: {message}")]
    ParseError { line: usize, message: String },
}
