//! Persisted synchronization state trait.

use chrono::NaiveDate;

use crate::Result;
use crate::types::{Recid, RecordUuid};

/// Persisted local state shared between synchronization runs.
///
/// A narrow interface over the line-oriented state files: the retry queue,
/// the success log, the externalId-to-user mapping, the seen-records pair
/// log, and the synchronization history. Single-writer access per run is
/// assumed; concurrent runs against the same state are out of scope.
pub trait SyncStore: Send + Sync {
    /// Queue an identity for retry on the next run.
    ///
    /// Idempotent: queuing an already-queued identity leaves one entry.
    fn queue_retry(&self, uuid: &RecordUuid) -> Result<()>;

    /// Remove an identity from the retry queue.
    ///
    /// Removing an identity that is not queued is a no-op.
    fn remove_retry(&self, uuid: &RecordUuid) -> Result<()>;

    /// All identities currently queued for retry.
    fn pending_retries(&self) -> Result<Vec<RecordUuid>>;

    /// Append an identity to the successful-changes log.
    fn log_success(&self, uuid: &RecordUuid) -> Result<()>;

    /// All successfully synchronized identities, in log order.
    fn successes(&self) -> Result<Vec<RecordUuid>>;

    /// Look up the internal user id for a Pure person externalId.
    fn user_id_for(&self, external_id: &str) -> Result<Option<i64>>;

    /// Record an identity together with its assigned recid.
    fn record_seen(&self, uuid: &RecordUuid, recid: &Recid) -> Result<()>;

    /// All identity/recid pairs seen so far.
    fn seen_records(&self) -> Result<Vec<(RecordUuid, Recid)>>;

    /// Mark a calendar date as synchronized.
    fn add_synced_date(&self, date: NaiveDate) -> Result<()>;

    /// All dates synchronized so far, in log order.
    fn synced_dates(&self) -> Result<Vec<NaiveDate>>;
}
