//! Record submission to the repository.
//!
//! The submitter owns the write path for one record: metadata POST, a
//! short wait for the search index, recid resolution (with duplicate
//! cleanup when versioning is off), file uploads, and finally the retry
//! queue and success log bookkeeping. A record succeeds only when both
//! the metadata write and the file uploads came through; anything less
//! queues the identity for the next run.

use tracing::{debug, instrument, warn};

use purerdm_core::record::TargetRecord;
use purerdm_core::traits::{RdmApi, SyncStore};
use purerdm_core::types::{Recid, RecordUuid};
use purerdm_core::{Counters, Result};

use crate::config::SyncConfig;
use crate::transform::StagedFile;

/// Query page size when resolving a freshly created record.
const RESOLVE_PAGE_SIZE: u32 = 250;

/// What happened to one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// Metadata and files are in the repository.
    Completed { recid: Recid },
    /// Something went wrong; the identity is queued for the next run.
    QueuedForRetry,
    /// Pure no longer knows the identity; nothing to submit or retry.
    SourceMissing,
}

/// The submission state machine.
pub struct Submitter<'a, R: ?Sized, S: ?Sized> {
    rdm: &'a R,
    store: &'a S,
    counters: &'a Counters,
    config: &'a SyncConfig,
}

impl<'a, R, S> Submitter<'a, R, S>
where
    R: RdmApi + ?Sized,
    S: SyncStore + ?Sized,
{
    pub fn new(rdm: &'a R, store: &'a S, counters: &'a Counters, config: &'a SyncConfig) -> Self {
        Self {
            rdm,
            store,
            counters,
            config,
        }
    }

    /// Push one transformed record and its staged files.
    #[instrument(skip(self, record, staged), fields(uuid = %uuid))]
    pub async fn submit(
        &self,
        uuid: &RecordUuid,
        record: &TargetRecord,
        staged: &[StagedFile],
    ) -> Result<SubmissionOutcome> {
        let wire = record.to_wire();

        if let Err(e) = self.rdm.create_record(&wire).await {
            self.counters.metadata.error();
            warn!(error = %e, "Metadata write failed");
            return self.queue(uuid);
        }
        self.counters.metadata.success();

        // The repository's search index lags its write path; querying too
        // early finds nothing.
        tokio::time::sleep(self.config.index_delay).await;

        let Some(recid) = self.resolve_recid(uuid).await? else {
            warn!("Created record not found by identity query");
            return self.queue(uuid);
        };
        self.store.record_seen(uuid, &recid)?;

        let mut any_file_uploaded = false;
        for file in staged {
            match self.rdm.put_file(&recid, &file.name, &file.path).await {
                Ok(()) => {
                    self.counters.file.success();
                    any_file_uploaded = true;
                    // The staged copy has served its purpose.
                    if let Err(e) = tokio::fs::remove_file(&file.path).await {
                        debug!(file = %file.name, error = %e, "Staged copy not removed");
                    }
                }
                Err(e) => {
                    self.counters.file.error();
                    warn!(file = %file.name, error = %e, "File upload failed");
                }
            }
        }

        let files_ok = record.files.is_empty() || any_file_uploaded;
        if files_ok {
            self.store.remove_retry(uuid)?;
            self.store.log_success(uuid)?;
            debug!(recid = %recid, "Record synchronized");
            Ok(SubmissionOutcome::Completed { recid })
        } else {
            self.queue(uuid)
        }
    }

    /// Find the recid the repository assigned to the new record.
    ///
    /// The identity query returns newest-first; with versioning off, every
    /// older record under the same identity is a duplicate and is deleted.
    async fn resolve_recid(&self, uuid: &RecordUuid) -> Result<Option<Recid>> {
        let page = self
            .rdm
            .query_records(uuid.as_str(), 1, RESOLVE_PAGE_SIZE)
            .await?;
        let Some(newest) = page.hits.first() else {
            return Ok(None);
        };
        let newest = newest.recid.clone();

        if !self.config.versioning_enabled {
            for duplicate in &page.hits[1..] {
                match self.rdm.delete_record(&duplicate.recid).await {
                    Ok(()) => {
                        self.counters.delete.success();
                        debug!(recid = %duplicate.recid, "Deleted duplicate record");
                    }
                    Err(e) => {
                        self.counters.delete.error();
                        warn!(recid = %duplicate.recid, error = %e, "Duplicate delete failed");
                    }
                }
            }
        }
        Ok(Some(newest))
    }

    fn queue(&self, uuid: &RecordUuid) -> Result<SubmissionOutcome> {
        self.store.queue_retry(uuid)?;
        Ok(SubmissionOutcome::QueuedForRetry)
    }
}
