//! RDM API trait.

use std::path::Path;

use async_trait::async_trait;
use serde_json::Value;

use crate::Result;
use crate::types::Recid;

/// One hit from a record query.
#[derive(Debug, Clone)]
pub struct RecordHit {
    /// The assigned identifier of the stored record.
    pub recid: Recid,
    /// The stored record metadata.
    pub metadata: Value,
}

/// One page of query results.
///
/// Hits are ordered the way the RDM query API returns them; with
/// `sort=mostrecent` the first hit is the newest record. The duplicate
/// handling in the submitter relies on that ordering.
#[derive(Debug, Clone)]
pub struct RecordPage {
    /// Total number of matching records, across all pages.
    pub total: u64,
    /// The hits on this page, most recent first.
    pub hits: Vec<RecordHit>,
}

/// Read/write access to the RDM repository.
///
/// Implementations own request pacing and 429 backpressure: by the time a
/// call returns, any mandated delay has already been served.
#[async_trait]
pub trait RdmApi: Send + Sync {
    /// Free-text/identity query with pagination, newest first.
    async fn query_records(&self, query: &str, page: u32, size: u32) -> Result<RecordPage>;

    /// Fetch one stored record by its identifier.
    async fn get_record(&self, recid: &Recid) -> Result<Value>;

    /// Create a new record from the serialized target representation.
    async fn create_record(&self, record: &Value) -> Result<()>;

    /// Replace an existing record.
    async fn replace_record(&self, recid: &Recid, record: &Value) -> Result<()>;

    /// Delete a stored record.
    async fn delete_record(&self, recid: &Recid) -> Result<()>;

    /// Upload or replace one file on a stored record.
    async fn put_file(&self, recid: &Recid, file_name: &str, staged: &Path) -> Result<()>;

    /// Create a group-restriction entity, or fetch it if it already exists.
    ///
    /// Creating an existing group is a no-op, not an error.
    async fn ensure_group(&self, external_id: &str, name: Option<&str>) -> Result<()>;
}
