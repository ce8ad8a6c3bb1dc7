//! Identifier type for projects and records.
//!
//! This module defines [`Id`], a 128-bit identifier built on UUID version 7.
//! Version 7 identifiers start with a millisecond timestamp, so the natural
//! ordering of ids follows their generation order. Listing queries rely on
//! that: the id is the tie-break key of every keyset page.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::error::ValidationError;

/// A time-ordered unique identifier.
///
/// # Serialization
///
/// `Id` serializes as its 16 raw bytes (a JSON array of numbers). This is
/// the shape embedded in continuation tokens, so changing it would break
/// tokens already handed out to clients. Use [`Id::to_string`] for the
/// canonical hyphenated text form.
///
/// # Examples
///
/// ```
/// use auditum_persistence::types::Id;
///
/// let first = Id::new();
/// let second = Id::new();
/// assert_ne!(first, second);
///
/// let parsed = Id::parse(&first.to_string()).unwrap();
/// assert_eq!(parsed, first);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Id(Uuid);

impl Id {
    /// Generates a new identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Parses the canonical text form of an identifier.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| ValidationError::InvalidId {
                value: s.to_string(),
                message: e.to_string(),
            })
    }

    /// Returns the nil identifier (all zero bytes).
    pub const fn nil() -> Self {
        Self(Uuid::nil())
    }

    /// Builds an identifier from its big-endian integer value.
    pub const fn from_u128(value: u128) -> Self {
        Self(Uuid::from_u128(value))
    }

    /// Builds an identifier from raw bytes.
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }

    /// Returns `true` for the nil identifier.
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }

    /// Returns the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for Id {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<Id> for Uuid {
    fn from(id: Id) -> Self {
        id.0
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", self.0)
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0.hyphenated(), f)
    }
}

impl FromStr for Id {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Id {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.as_bytes().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        <[u8; 16]>::deserialize(deserializer).map(Self::from_bytes)
    }
}
