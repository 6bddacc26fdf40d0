//! LGP-30 magnetic drum memory.
//!
//! 64 tracks of 64 sectors give 4096 words. One head position is shared by
//! every track: track selection is electronic, sector timing is mechanical,
//! so the only way to reach a sector is to wait for the drum to rotate.

use crate::word::Word;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of recording tracks.
pub const TRACKS: usize = 64;

/// Number of sectors (word positions) around each track.
pub const SECTORS_PER_TRACK: usize = 64;

/// Total number of words on the drum.
pub const DRUM_SIZE: usize = TRACKS * SECTORS_PER_TRACK;

/// Word-times for the head to travel from `current` to `target`.
///
/// Always in `0..SECTORS_PER_TRACK`; zero means the target is already under
/// the head.
#[inline]
pub const fn rotational_latency(current: u8, target: u8) -> u32 {
    if target >= current {
        (target - current) as u32
    } else {
        (SECTORS_PER_TRACK as u32) - current as u32 + target as u32
    }
}

/// A validated 12-bit drum address: track in the high 6 bits, sector in the low 6.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct Address(u16);

impl Address {
    /// Largest valid address.
    pub const MAX: u16 = (DRUM_SIZE - 1) as u16;

    /// Address 0 (track 0, sector 0).
    pub const ZERO: Address = Address(0);

    /// Validate a flat address.
    pub fn new(value: u16) -> Result<Self, DrumError> {
        if value > Self::MAX {
            return Err(DrumError::AddressOutOfRange(value as u32));
        }
        Ok(Self(value))
    }

    /// Build an address from the low 12 bits of `value`.
    #[inline]
    pub const fn wrapping(value: u16) -> Self {
        Self(value & Self::MAX)
    }

    /// Build an address from track and sector.
    pub fn from_parts(track: u8, sector: u8) -> Result<Self, DrumError> {
        if track as usize >= TRACKS || sector as usize >= SECTORS_PER_TRACK {
            return Err(DrumError::InvalidLocation { track, sector });
        }
        Ok(Self(((track as u16) << 6) | sector as u16))
    }

    #[inline]
    pub const fn value(self) -> u16 {
        self.0
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn track(self) -> u8 {
        ((self.0 >> 6) & 0x3F) as u8
    }

    #[inline]
    pub const fn sector(self) -> u8 {
        (self.0 & 0x3F) as u8
    }

    /// The following address, wrapping from 4095 back to 0.
    #[inline]
    pub const fn next(self) -> Self {
        Self::wrapping(self.0.wrapping_add(1))
    }
}

impl TryFrom<u16> for Address {
    type Error = DrumError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Address> for u16 {
    fn from(addr: Address) -> Self {
        addr.0
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}.{:02}", self.track(), self.sector())
    }
}

impl std::fmt::Debug for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Address({} = {})", self, self.0)
    }
}

/// The drum: 4096 words plus the sector currently under the head.
#[derive(Clone, Serialize)]
pub struct Drum {
    words: Vec<Word>,
    head: u8,
}

impl Drum {
    /// Create a drum with every word zeroed and sector 0 under the head.
    pub fn new() -> Self {
        Self {
            words: vec![Word::ZERO; DRUM_SIZE],
            head: 0,
        }
    }

    /// Sector currently under the head.
    #[inline]
    pub fn head(&self) -> u8 {
        self.head
    }

    /// Advance the drum by one word-time.
    #[inline]
    pub fn tick(&mut self) {
        self.head = ((self.head as usize + 1) % SECTORS_PER_TRACK) as u8;
    }

    /// Word-times until `target_sector` reaches the head.
    ///
    /// # Panics
    /// Panics if `target_sector` is not a valid sector.
    pub fn calculate_latency(&self, target_sector: u8) -> u32 {
        assert!(
            (target_sector as usize) < SECTORS_PER_TRACK,
            "Drum sector {} out of range (0-{})",
            target_sector, SECTORS_PER_TRACK - 1
        );
        rotational_latency(self.head, target_sector)
    }

    /// Read a word and report how long the head must travel to reach it.
    ///
    /// The head does not move; the caller owns the clock and must tick it
    /// by the returned latency.
    ///
    /// # Panics
    /// Panics if `track` or `sector` is out of range.
    pub fn read(&self, track: u8, sector: u8) -> (Word, u32) {
        let index = Self::checked_index(track, sector);
        (self.words[index], self.calculate_latency(sector))
    }

    /// Store a word and report the latency to reach its sector.
    ///
    /// # Panics
    /// Panics if `track` or `sector` is out of range.
    pub fn write(&mut self, track: u8, sector: u8, value: Word) -> u32 {
        let index = Self::checked_index(track, sector);
        self.words[index] = value;
        self.calculate_latency(sector)
    }

    /// Read by flat address.
    #[inline]
    pub fn read_at(&self, addr: Address) -> (Word, u32) {
        self.read(addr.track(), addr.sector())
    }

    /// Write by flat address.
    #[inline]
    pub fn write_at(&mut self, addr: Address, value: Word) -> u32 {
        self.write(addr.track(), addr.sector(), value)
    }

    /// Host-side store: no latency, no rotation.
    ///
    /// # Panics
    /// Panics if `track` or `sector` is out of range.
    pub fn poke(&mut self, track: u8, sector: u8, value: Word) {
        let index = Self::checked_index(track, sector);
        self.words[index] = value;
    }

    /// Host-side read: no latency, no rotation.
    #[inline]
    pub fn peek(&self, addr: Address) -> Word {
        self.words[addr.index()]
    }

    /// Every word on the drum, in address order.
    pub fn words(&self) -> &[Word] {
        &self.words
    }

    /// Copy a block of words starting at `start`.
    pub fn load(&mut self, start: Address, words: &[Word]) -> Result<(), DrumError> {
        let end = start.index() + words.len();
        if end > DRUM_SIZE {
            return Err(DrumError::ProgramTooLarge {
                size: words.len(),
                available: DRUM_SIZE - start.index(),
            });
        }
        self.words[start.index()..end].copy_from_slice(words);
        tracing::debug!(start = %start, len = words.len(), "loaded words onto drum");
        Ok(())
    }

    /// Non-zero words with their addresses.
    pub fn dump(&self) -> Vec<(Address, Word)> {
        self.words
            .iter()
            .enumerate()
            .filter(|(_, w)| !w.is_zero())
            .map(|(i, w)| (Address::wrapping(i as u16), *w))
            .collect()
    }

    fn checked_index(track: u8, sector: u8) -> usize {
        assert!(
            (track as usize) < TRACKS && (sector as usize) < SECTORS_PER_TRACK,
            "Drum location track {} sector {} out of range (0-{}, 0-{})",
            track, sector, TRACKS - 1, SECTORS_PER_TRACK - 1
        );
        (track as usize) * SECTORS_PER_TRACK + sector as usize
    }
}

impl Default for Drum {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Drum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let non_zero = self.words.iter().filter(|w| !w.is_zero()).count();

        f.debug_struct("Drum")
            .field("head", &self.head)
            .field("non_zero_words", &non_zero)
            .field("total_words", &DRUM_SIZE)
            .finish()
    }
}

/// Errors from host-supplied drum addresses.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DrumError {
    #[error("drum address {0} out of range (0-4095)")]
    AddressOutOfRange(u32),

    #[error("drum location track {track} sector {sector} out of range (0-63)")]
    InvalidLocation { track: u8, sector: u8 },

    #[error("program size {size} exceeds available space {available}")]
    ProgramTooLarge { size: usize, available: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latency_edges() {
        assert_eq!(rotational_latency(5, 5), 0);
        assert_eq!(rotational_latency(0, 63), 63);
        assert_eq!(rotational_latency(63, 0), 1);
        assert_eq!(rotational_latency(10, 4), 58);
    }

    #[test]
    fn test_read_does_not_rotate() {
        let mut drum = Drum::new();
        drum.poke(3, 5, Word::new(0xABCD));

        let (word, wait) = drum.read(3, 5);
        assert_eq!(word, Word::new(0xABCD));
        assert_eq!(wait, 5);
        assert_eq!(drum.head(), 0);
    }

    #[test]
    fn test_write_reports_latency_and_stores() {
        let mut drum = Drum::new();
        for _ in 0..10 {
            drum.tick();
        }
        let wait = drum.write(1, 2, Word::new(-9));
        assert_eq!(wait, 56);
        assert_eq!(drum.peek(Address::from_parts(1, 2).unwrap()), Word::new(-9));
        assert_eq!(drum.head(), 10);
    }

    #[test]
    fn test_head_shared_across_tracks() {
        let mut drum = Drum::new();
        drum.tick();
        drum.tick();
        assert_eq!(drum.read(0, 2).1, 0);
        assert_eq!(drum.read(63, 2).1, 0);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_read_out_of_range_panics() {
        let drum = Drum::new();
        let _ = drum.read(64, 0);
    }

    #[test]
    fn test_drum_serializes_words_and_head() {
        let mut drum = Drum::new();
        drum.tick();
        drum.poke(0, 0, Word::new(7));

        let json = serde_json::to_value(&drum).unwrap();
        assert_eq!(json["head"], 1);
        assert_eq!(json["words"].as_array().unwrap().len(), DRUM_SIZE);
        assert_eq!(json["words"][0], 7);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_write_out_of_range_panics() {
        let mut drum = Drum::new();
        let _ = drum.write(0, 64, Word::new(1));
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_poke_out_of_range_panics() {
        let mut drum = Drum::new();
        drum.poke(64, 0, Word::new(1));
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_latency_out_of_range_panics() {
        let drum = Drum::new();
        let _ = drum.calculate_latency(64);
    }

    #[test]
    fn test_address_parts() {
        let addr = Address::from_parts(3, 5).unwrap();
        assert_eq!(addr.value(), 197);
        assert_eq!(addr.track(), 3);
        assert_eq!(addr.sector(), 5);
        assert_eq!(format!("{}", addr), "03.05");
        assert!(Address::new(4096).is_err());
        assert!(Address::from_parts(0, 64).is_err());
        assert_eq!(Address::new(4095).unwrap().next(), Address::ZERO);
    }

    #[test]
    fn test_load_bounds() {
        let mut drum = Drum::new();
        let block = [Word::new(1), Word::new(2)];
        assert!(drum.load(Address::new(4094).unwrap(), &block).is_ok());
        assert_eq!(
            drum.load(Address::new(4095).unwrap(), &block),
            Err(DrumError::ProgramTooLarge { size: 2, available: 1 })
        );
        assert_eq!(drum.dump().len(), 2);
    }
}
