//! File reconciliation against the repository.
//!
//! Before re-submitting a record, the files already stored under its
//! identity are fetched once and every incoming file is compared against
//! them by name and size. A match carries the stored copy's
//! internal-review verdict over so re-synchronization does not reset the
//! review workflow.

use serde_json::Value;
use tracing::{debug, warn};

use purerdm_core::error::Error;
use purerdm_core::extract::Seg::Key as K;
use purerdm_core::extract::{bool_at, get_path, non_empty};
use purerdm_core::record::StoredFile;
use purerdm_core::traits::RdmApi;
use purerdm_core::types::RecordUuid;
use purerdm_core::Result;

/// How one incoming file relates to the files already stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileMatch {
    /// No stored file shares the name.
    NotInTarget,
    /// Name matches but the sizes differ; the file changed at the source.
    SizeMismatch,
    /// Name and size match; `reviewed` is the stored copy's verdict.
    Matched { reviewed: bool },
}

impl FileMatch {
    /// Review flag to carry onto the outgoing file entry.
    pub fn carried_review(self) -> bool {
        match self {
            FileMatch::Matched { reviewed } => reviewed,
            _ => false,
        }
    }
}

/// Fetch the files stored under an identity, from its newest record.
///
/// A non-success API response downgrades to an empty list with a warning:
/// reconciliation is an enrichment step and must not fail the record.
/// Transport errors still propagate.
pub async fn fetch_stored_files<R: RdmApi + ?Sized>(
    rdm: &R,
    uuid: &RecordUuid,
) -> Result<Vec<StoredFile>> {
    let page = match rdm.query_records(uuid.as_str(), 1, 100).await {
        Ok(page) => page,
        Err(Error::Api(e)) => {
            warn!(uuid = %uuid, status = e.status, "Stored-file lookup failed");
            return Ok(Vec::new());
        }
        Err(e) => return Err(e),
    };

    let Some(newest) = page.hits.first() else {
        return Ok(Vec::new());
    };

    let mut stored = Vec::new();
    if let Some(files) = get_path(&newest.metadata, &[K("versionFiles")]).and_then(Value::as_array)
    {
        for file in files {
            let size = non_empty(file, &[K("size")]);
            let name = non_empty(file, &[K("name")]).and_then(Value::as_str);
            if let (Some(size), Some(name)) = (size, name) {
                stored.push(StoredFile {
                    size: stringify(size),
                    review: bool_at(file, &[K("internalReview")]),
                    name: name.to_string(),
                });
            }
        }
    }
    debug!(uuid = %uuid, stored = stored.len(), "Fetched stored files");
    Ok(stored)
}

/// Compare one incoming file against the stored set.
pub fn classify(stored: &[StoredFile], name: &str, size: &str) -> FileMatch {
    match stored.iter().find(|f| f.name == name) {
        None => FileMatch::NotInTarget,
        Some(file) if file.size == size => FileMatch::Matched {
            reviewed: file.review,
        },
        Some(_) => FileMatch::SizeMismatch,
    }
}

/// String form of a size value regardless of its JSON type.
///
/// The two systems disagree on whether sizes are numbers or strings, so
/// the match is defined over the string representation.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored() -> Vec<StoredFile> {
        vec![
            StoredFile {
                size: "100".to_string(),
                review: true,
                name: "a.pdf".to_string(),
            },
            StoredFile {
                size: "250".to_string(),
                review: false,
                name: "b.pdf".to_string(),
            },
        ]
    }

    #[test]
    fn matching_name_and_size_carries_review() {
        let class = classify(&stored(), "a.pdf", "100");
        assert_eq!(class, FileMatch::Matched { reviewed: true });
        assert!(class.carried_review());
    }

    #[test]
    fn size_mismatch_resets_review() {
        let class = classify(&stored(), "a.pdf", "50");
        assert_eq!(class, FileMatch::SizeMismatch);
        assert!(!class.carried_review());
    }

    #[test]
    fn unknown_name_is_not_in_target() {
        let class = classify(&stored(), "c.pdf", "100");
        assert_eq!(class, FileMatch::NotInTarget);
        assert!(!class.carried_review());
    }

    #[test]
    fn sizes_compare_as_strings() {
        assert_eq!(stringify(&serde_json::json!(100)), "100");
        assert_eq!(stringify(&serde_json::json!("100")), "100");
    }
}
