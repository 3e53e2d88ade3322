//! Version chains for records sharing a source identity.
//!
//! With versioning enabled, re-synchronizing an identity creates a new
//! record alongside the existing ones instead of replacing them. Each
//! record in the chain carries its own version tag plus the recids of its
//! siblings; after a successful submission the older siblings are
//! rewritten so their cross-references include the newcomer.

use tracing::{debug, warn};

use purerdm_core::record::VersionInfo;
use purerdm_core::traits::RdmApi;
use purerdm_core::types::RecordUuid;
use purerdm_core::Result;

/// Query page size when collecting a version chain.
const CHAIN_PAGE_SIZE: u32 = 250;

/// Version-chain operations against the repository.
pub struct Versioning<'a, R: RdmApi + ?Sized> {
    rdm: &'a R,
}

impl<'a, R: RdmApi + ?Sized> Versioning<'a, R> {
    pub fn new(rdm: &'a R) -> Self {
        Self { rdm }
    }

    /// Version metadata for a record about to be created.
    ///
    /// Queries the identity's existing records; the new record becomes
    /// version `total + 1` and lists every existing recid as a sibling.
    /// Returns `None` for a first-time identity.
    pub async fn version_info(&self, uuid: &RecordUuid) -> Result<Option<VersionInfo>> {
        let page = self
            .rdm
            .query_records(uuid.as_str(), 1, CHAIN_PAGE_SIZE)
            .await?;
        if page.total == 0 {
            return Ok(None);
        }

        let other_versions = page
            .hits
            .iter()
            .map(|hit| hit.recid.to_string())
            .collect();
        Ok(Some(VersionInfo {
            this_version: format!("v{}", page.total + 1),
            other_versions,
        }))
    }

    /// Rewrite the older records of a chain after a new version landed.
    ///
    /// Each sibling gets its version tag recomputed (newest first, so the
    /// newest record is the highest version) and its sibling list refreshed.
    /// A failure on one sibling is logged and does not stop the rest.
    pub async fn relink_chain(&self, uuid: &RecordUuid) -> Result<()> {
        let page = self
            .rdm
            .query_records(uuid.as_str(), 1, CHAIN_PAGE_SIZE)
            .await?;
        if page.hits.len() < 2 {
            return Ok(());
        }

        let recids: Vec<String> = page.hits.iter().map(|hit| hit.recid.to_string()).collect();
        let total = page.hits.len();

        // Skip the newest record: the submitter already wrote its version
        // metadata when it was created.
        for (index, hit) in page.hits.iter().enumerate().skip(1) {
            let version = format!("v{}", total - index);
            let siblings: Vec<String> = recids
                .iter()
                .filter(|recid| *recid != &hit.recid.to_string())
                .cloned()
                .collect();

            let mut metadata = hit.metadata.clone();
            if let Some(object) = metadata.as_object_mut() {
                object.insert("metadataVersion".to_string(), version.clone().into());
                object.insert(
                    "metadataOtherVersions".to_string(),
                    serde_json::to_value(&siblings).unwrap_or_default(),
                );
            }

            match self.rdm.replace_record(&hit.recid, &metadata).await {
                Ok(()) => debug!(recid = %hit.recid, version, "Relinked chain sibling"),
                Err(e) => warn!(recid = %hit.recid, error = %e, "Sibling relink failed"),
            }
        }
        Ok(())
    }
}
