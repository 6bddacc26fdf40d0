//! Machine configuration.
//!
//! A configuration file is plain JSON:
//! ```json
//! { "instruction_set": "extended", "start": 64 }
//! ```
//! Missing fields take their defaults (core instruction set, start at 0).

use crate::cpu::decode::InstructionSet;
use crate::cpu::drum::Address;
use serde::{Serialize, Deserialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CpuConfig {
    /// Which orders are executed; the rest raise a diagnostic.
    pub instruction_set: InstructionSet,
    /// Initial instruction counter.
    pub start: Address,
}

impl CpuConfig {
    /// Parse a configuration from JSON text.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Load a configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        Self::from_json(&text)
    }
}

/// Errors that can occur loading a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),
}
