//! RDM record identifier type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, InvalidInputError};

/// A validated RDM record identifier.
///
/// RDM assigns every stored record an 11-character identifier. Requests
/// against a recid of the wrong length always 404, so the length is checked
/// when the value is constructed and record lookups fail fast.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Recid(String);

impl Recid {
    /// Expected identifier length.
    pub const LEN: usize = 11;

    /// Create a new recid from a string, validating the length.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not exactly 11 characters.
    pub fn new(s: impl AsRef<str>) -> Result<Self, Error> {
        let s = s.as_ref();
        if s.len() != Self::LEN {
            return Err(InvalidInputError::Recid {
                value: s.to_string(),
                reason: format!("must be {} characters, got {}", Self::LEN, s.len()),
            }
            .into());
        }
        Ok(Self(s.to_string()))
    }

    /// Returns the recid as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Recid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Recid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for Recid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for Recid {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Recid {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Recid::new(&s).map_err(serde::de::Error::custom)
    }
}
