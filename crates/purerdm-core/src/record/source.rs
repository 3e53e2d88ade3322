//! The Pure source record.

use serde_json::Value;

use crate::error::{Error, InvalidInputError};
use crate::extract::{self, Seg};
use crate::types::RecordUuid;

/// One record as fetched from Pure.
///
/// The payload stays a raw [`serde_json::Value`]; Pure's schema varies too
/// much between record types to deserialize into anything firmer. All
/// access goes through the field-extractor helpers, so missing data never
/// panics. Immutable once fetched.
#[derive(Debug, Clone)]
pub struct SourceRecord {
    uuid: RecordUuid,
    value: Value,
}

impl SourceRecord {
    /// Wrap a fetched payload, validating that it carries a uuid.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload has no `uuid` field or the uuid is
    /// malformed.
    pub fn new(value: Value) -> Result<Self, Error> {
        let uuid = value
            .get("uuid")
            .and_then(Value::as_str)
            .ok_or_else(|| InvalidInputError::Other {
                message: "source record has no uuid".to_string(),
            })?;
        let uuid = RecordUuid::new(uuid)?;
        Ok(Self { uuid, value })
    }

    /// The record's stable identity.
    pub fn uuid(&self) -> &RecordUuid {
        &self.uuid
    }

    /// The raw payload.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Resolve a path, or `None` when any segment is missing.
    pub fn at(&self, path: &[Seg<'_>]) -> Option<&Value> {
        extract::get_path(&self.value, path)
    }

    /// Resolve a path, treating empty values as absent.
    pub fn non_empty(&self, path: &[Seg<'_>]) -> Option<&Value> {
        extract::non_empty(&self.value, path)
    }

    /// Resolve a path to a non-empty string.
    pub fn non_empty_str(&self, path: &[Seg<'_>]) -> Option<&str> {
        extract::non_empty_str(&self.value, path)
    }

    /// Resolve a path to a boolean, `false` when absent.
    pub fn bool_at(&self, path: &[Seg<'_>]) -> bool {
        extract::bool_at(&self.value, path)
    }
}
