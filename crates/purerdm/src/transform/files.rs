//! File handling: reconciliation, per-file metadata, and staging.
//!
//! Electronic versions and additional files are treated the same way:
//! entries without a resolvable URL and name are skipped, everything else
//! is compared against the files already stored under the identity, then
//! downloaded into the staging directory for the submitter.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::{debug, warn};

use purerdm_core::extract::Seg::{self, Index as I, Key as K};
use purerdm_core::extract::{get_path, non_empty, non_empty_str};
use purerdm_core::record::{FileEntry, SourceRecord};
use purerdm_core::traits::{PureApi, RdmApi, SyncStore};
use purerdm_core::Result;

use super::{Draft, StagedFile, Transformer};
use crate::reconcile;
use crate::vocab;

/// Per-file extension key and the source path it is copied from.
const FILE_EXTENSION_FIELDS: &[(&str, &[Seg<'static>])] = &[
    ("pure:createdBy", &[K("creator")]),
    ("pure:createdDate", &[K("created")]),
    ("pure:versionType", &[K("versionTypes"), I(0), K("value")]),
    ("pure:licenseType", &[K("licenseTypes"), I(0), K("value")]),
    ("pure:digest", &[K("file"), K("digest")]),
    ("pure:digestAlgorithm", &[K("file"), K("digestAlgorithm")]),
];

pub(super) async fn apply<P, R, S>(
    t: &Transformer<'_, P, R, S>,
    source: &SourceRecord,
    mut draft: Draft,
) -> Result<Draft>
where
    P: PureApi + ?Sized,
    R: RdmApi + ?Sized,
    S: SyncStore + ?Sized,
{
    let mut entries: Vec<&Value> = Vec::new();
    for list in ["electronicVersions", "additionalFiles"] {
        if let Some(items) = source.at(&[K(list)]).and_then(Value::as_array) {
            entries.extend(items);
        }
    }
    if entries.is_empty() {
        return Ok(draft);
    }

    // One lookup per record, not per file.
    let stored = reconcile::fetch_stored_files(t.rdm, source.uuid()).await?;

    for entry in entries {
        let Some(url) = non_empty_str(entry, &[K("file"), K("fileURL")]) else {
            continue;
        };
        let Some(name) = non_empty_str(entry, &[K("file"), K("fileName")]) else {
            continue;
        };

        let size = get_path(entry, &[K("file"), K("size")])
            .map(reconcile::stringify)
            .unwrap_or_default();
        let verdict = reconcile::classify(&stored, name, &size);
        debug!(file = name, ?verdict, "Classified file");

        let access_type = non_empty_str(entry, &[K("accessTypes"), I(0), K("value")])
            .and_then(vocab::access_right);

        let mut extensions = BTreeMap::new();
        for (key, path) in FILE_EXTENSION_FIELDS {
            if let Some(value) = non_empty(entry, path) {
                extensions.insert((*key).to_string(), value.clone());
            }
        }

        match t.pure.download_file(url, name).await {
            Ok(path) => draft.staged.push(StagedFile {
                name: name.to_string(),
                path,
            }),
            // The entry is still listed; the file itself catches up on the
            // next run via the retry queue.
            Err(e) => warn!(file = name, error = %e, "File download failed"),
        }

        draft.record.files.push(FileEntry {
            name: name.to_string(),
            access_type,
            internal_review: verdict.carried_review(),
            extensions,
        });
    }
    Ok(draft)
}
