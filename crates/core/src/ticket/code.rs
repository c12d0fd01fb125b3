//! Displayed ticket codes (`P001`, `C042`).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::PriorityClass;

/// Highest sequence number a code can carry (three digits).
pub const MAX_SEQUENCE: u16 = 999;

/// Error parsing a ticket code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TicketCodeError {
    #[error("ticket code must be a class letter followed by 3 digits, got {0:?}")]
    Malformed(String),

    #[error("unknown ticket class prefix {0:?} (expected 'P' or 'C')")]
    UnknownPrefix(char),

    #[error("ticket sequence {0} is out of range (max 999)")]
    SequenceOutOfRange(u16),
}

/// A displayed ticket code: one class letter plus a zero-padded sequence.
///
/// The class letter is `P` for priority tickets and `C` for normal ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TicketCode {
    class: PriorityClass,
    sequence: u16,
}

impl TicketCode {
    /// Build a code from its parts.
    pub fn new(class: PriorityClass, sequence: u16) -> Result<Self, TicketCodeError> {
        if sequence > MAX_SEQUENCE {
            return Err(TicketCodeError::SequenceOutOfRange(sequence));
        }
        Ok(Self { class, sequence })
    }

    pub fn class(&self) -> PriorityClass {
        self.class
    }

    pub fn sequence(&self) -> u16 {
        self.sequence
    }
}

impl fmt::Display for TicketCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:03}", self.class.prefix(), self.sequence)
    }
}

impl FromStr for TicketCode {
    type Err = TicketCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let prefix = chars
            .next()
            .ok_or_else(|| TicketCodeError::Malformed(s.to_string()))?;
        let digits = chars.as_str();

        if digits.len() != 3 || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(TicketCodeError::Malformed(s.to_string()));
        }

        let class = PriorityClass::from_prefix(prefix.to_ascii_uppercase())
            .ok_or(TicketCodeError::UnknownPrefix(prefix))?;
        let sequence = digits
            .parse::<u16>()
            .map_err(|_| TicketCodeError::Malformed(s.to_string()))?;

        Self::new(class, sequence)
    }
}

impl TryFrom<String> for TicketCode {
    type Error = TicketCodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TicketCode> for String {
    fn from(code: TicketCode) -> Self {
        code.to_string()
    }
}
