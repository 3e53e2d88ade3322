//! Pure API trait.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;

use crate::Result;
use crate::record::SourceRecord;
use crate::types::RecordUuid;

/// Read-only access to the Pure research-information system.
#[async_trait]
pub trait PureApi: Send + Sync {
    /// Fetch one record by its identity.
    ///
    /// Returns `Ok(None)` when Pure does not know the uuid.
    async fn record_by_uuid(&self, uuid: &RecordUuid) -> Result<Option<SourceRecord>>;

    /// Fetch the detail payload for a person (used for ORCID lookup).
    async fn person(&self, person_uuid: &str) -> Result<Value>;

    /// Download a record file and stage it locally for upload to RDM.
    ///
    /// Returns the path of the staged copy.
    async fn download_file(&self, url: &str, file_name: &str) -> Result<PathBuf>;

    /// Identities of the records that changed on the given date.
    async fn changed_uuids(&self, date: NaiveDate) -> Result<Vec<RecordUuid>>;
}
