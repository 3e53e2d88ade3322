//! Source record identity type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, InvalidInputError};

/// A validated Pure record identity.
///
/// Pure identifies every record by a stable 36-character uuid. The uuid is
/// the correlation key for versions and duplicates on the RDM side, so a
/// malformed one is rejected up front rather than silently producing empty
/// query results.
///
/// # Example
///
/// ```
/// use purerdm_core::RecordUuid;
///
/// let uuid = RecordUuid::new("2a9f57e3-1b2c-4d5e-8f90-a1b2c3d4e5f6").unwrap();
/// assert_eq!(uuid.as_str().len(), 36);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RecordUuid(String);

impl RecordUuid {
    /// Create a new record uuid from a string, validating the length.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not exactly 36 characters.
    pub fn new(s: impl AsRef<str>) -> Result<Self, Error> {
        let s = s.as_ref();
        if s.len() != 36 {
            return Err(InvalidInputError::RecordUuid {
                value: s.to_string(),
                reason: format!("must be 36 characters, got {}", s.len()),
            }
            .into());
        }
        if s.chars().any(char::is_whitespace) {
            return Err(InvalidInputError::RecordUuid {
                value: s.to_string(),
                reason: "must not contain whitespace".to_string(),
            }
            .into());
        }
        Ok(Self(s.to_string()))
    }

    /// Returns the uuid as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordUuid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for RecordUuid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for RecordUuid {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for RecordUuid {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        RecordUuid::new(&s).map_err(serde::de::Error::custom)
    }
}
