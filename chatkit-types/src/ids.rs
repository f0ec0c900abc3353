//! Identifier types used throughout the chatkit core.
//!
//! Two identifiers exist for every persisted entity:
//! - [`RowId`] is the store's own sequential key, assigned on first insert.
//! - [`ExternalId`] is the string handle shared with the upstream server.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Number of random bits in a generated external identifier.
pub const EXTERNAL_ID_BITS: u32 = 130;

const RADIX32_DIGITS: &[u8; 32] = b"0123456789abcdefghijklmnopqrstuv";

/// Internal identifier of a stored row.
///
/// Assigned by the storage engine on first insert and never changed afterwards.
/// It is local to one database and must not cross a system boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowId(i64);

impl RowId {
    /// Wraps a raw rowid as returned by the store.
    #[must_use]
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Returns the raw rowid.
    #[must_use]
    pub const fn get(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for RowId {
    fn from(raw: i64) -> Self {
        Self(raw)
    }
}

/// External identifier of an entity.
///
/// Usually assigned by the server of record; [`ExternalId::generate`] mints a
/// local one when an entity originates on this device. Uniqueness is the
/// caller's concern, the core only uses it for lookups.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExternalId(String);

impl ExternalId {
    /// Wraps an identifier received from upstream.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh identifier from 130 random bits rendered in radix 32.
    #[must_use]
    pub fn generate() -> Self {
        let low = rand::random::<u128>();
        let high = rand::random::<u8>() & 0b11;
        Self::from_entropy(high, low)
    }

    /// Renders the given 130-bit value (`high` supplies bits 128 and 129).
    ///
    /// Digits are `0-9a-v` with no leading zeros, so the result is at most
    /// 26 characters long.
    #[must_use]
    pub fn from_entropy(high: u8, low: u128) -> Self {
        let mut digits = Vec::with_capacity(26);
        for group in 0..26u32 {
            let digit = if group == 25 {
                ((low >> 125) as u8) | ((high & 0b11) << 3)
            } else {
                ((low >> (5 * group)) & 0x1f) as u8
            };
            digits.push(RADIX32_DIGITS[digit as usize]);
        }
        while digits.len() > 1 && digits.last() == Some(&b'0') {
            digits.pop();
        }
        Self(digits.into_iter().rev().map(char::from).collect())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the identifier, returning the owned string.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ExternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ExternalId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ExternalId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for ExternalId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl FromStr for ExternalId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidExternalId(s.to_owned()));
        }
        Ok(Self(trimmed.to_owned()))
    }
}
