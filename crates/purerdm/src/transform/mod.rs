//! Source-to-target record transformation.
//!
//! One Pure record goes in, one submission-ready RDM record comes out.
//! The pipeline threads a [`Draft`] accumulator through a fixed sequence
//! of steps; each step reads the source through the safe field extractor
//! and fills in its slice of the target. Missing source fields are never
//! an error, only absent output. The steps that talk to the network
//! (version lookup, person enrichment, file handling, group creation)
//! degrade per-item: a failed side lookup costs the enrichment, not the
//! record.

mod creators;
mod extensions;
mod files;

use std::collections::BTreeSet;
use std::path::PathBuf;

use serde_json::Value;
use tracing::{debug, instrument, warn};

use purerdm_core::extract::non_empty_str;
use purerdm_core::extract::Seg::{Index as I, Key as K};
use purerdm_core::record::{
    AccessFlags, AccessRight, Description, ResourceTypeEntry, SourceRecord, TargetRecord, Title,
};
use purerdm_core::traits::{PureApi, RdmApi, SyncStore};
use purerdm_core::Result;

use crate::config::SyncConfig;
use crate::versioning::Versioning;
use crate::vocab::{self, LanguageTable};

/// Placeholder until a DOI minting policy exists.
// TODO: replace with minted DOIs once the DataCite integration lands.
const PLACEHOLDER_DOI: &str = "10.5281/rdm.9999992";

/// Placeholder version tag for records outside a version chain.
const PLACEHOLDER_VERSION: &str = "v0.0.2";

/// A downloaded file waiting to be pushed to the repository.
#[derive(Debug, Clone)]
pub struct StagedFile {
    pub name: String,
    pub path: PathBuf,
}

/// Result of transforming one record.
#[derive(Debug)]
pub struct TransformOutput {
    pub record: TargetRecord,
    pub staged: Vec<StagedFile>,
}

/// Accumulator threaded through the pipeline steps.
///
/// Owners collect into a set so duplicates between the source's own list
/// and the creator-derived user ids collapse; the set becomes the sorted
/// owner list when the draft is finished.
#[derive(Debug, Default)]
pub(crate) struct Draft {
    pub(crate) record: TargetRecord,
    pub(crate) owners: BTreeSet<i64>,
    pub(crate) staged: Vec<StagedFile>,
}

impl Draft {
    fn finish(self) -> TransformOutput {
        let mut record = self.record;
        record.owners = self.owners.into_iter().collect();
        TransformOutput {
            record,
            staged: self.staged,
        }
    }
}

/// The transformation pipeline.
pub struct Transformer<'a, P: ?Sized, R: ?Sized, S: ?Sized> {
    pub(crate) pure: &'a P,
    pub(crate) rdm: &'a R,
    pub(crate) store: &'a S,
    pub(crate) languages: &'a LanguageTable,
    pub(crate) config: &'a SyncConfig,
}

impl<'a, P, R, S> Transformer<'a, P, R, S>
where
    P: PureApi + ?Sized,
    R: RdmApi + ?Sized,
    S: SyncStore + ?Sized,
{
    pub fn new(
        pure: &'a P,
        rdm: &'a R,
        store: &'a S,
        languages: &'a LanguageTable,
        config: &'a SyncConfig,
    ) -> Self {
        Self {
            pure,
            rdm,
            store,
            languages,
            config,
        }
    }

    /// Run the full pipeline over one source record.
    #[instrument(skip(self, source), fields(uuid = %source.uuid()))]
    pub async fn transform(&self, source: &SourceRecord) -> Result<TransformOutput> {
        let draft = Draft::default();
        let draft = self.versions(source, draft).await?;
        let draft = self.owners(source, draft);
        let draft = self.access(source, draft);
        let draft = self.language(source, draft);
        let draft = self.title(source, draft);
        let draft = creators::apply(self, source, draft).await?;
        let draft = self.description(source, draft);
        let draft = self.identifiers(draft);
        let draft = self.resource_kind(source, draft);
        let draft = self.restrictions(draft);
        let draft = extensions::apply(source, draft);
        let draft = files::apply(self, source, draft).await?;
        let draft = self.groups(source, draft).await;
        Ok(draft.finish())
    }

    /// Version-chain metadata, when versioning is enabled and the identity
    /// already has records.
    async fn versions(&self, source: &SourceRecord, mut draft: Draft) -> Result<Draft> {
        if !self.config.versioning_enabled {
            return Ok(draft);
        }
        if let Some(info) = Versioning::new(self.rdm).version_info(source.uuid()).await? {
            draft.record.metadata_version = Some(info.this_version);
            draft.record.metadata_other_versions = info.other_versions;
        }
        Ok(draft)
    }

    /// Seed the owner set from the source, or the configured fallback.
    fn owners(&self, source: &SourceRecord, mut draft: Draft) -> Draft {
        if let Some(list) = source.at(&[K("_owners")]).and_then(Value::as_array) {
            draft
                .owners
                .extend(list.iter().filter_map(Value::as_i64));
        }
        if draft.owners.is_empty() {
            draft.owners.insert(self.config.fallback_owner);
        }
        draft
    }

    /// Access right and the paired restriction flags.
    ///
    /// An unmapped permission is logged and the field stays unset; the
    /// record then falls under the default restrictions rather than a
    /// guessed access level.
    fn access(&self, source: &SourceRecord, mut draft: Draft) -> Draft {
        if let Some(permission) =
            source.non_empty_str(&[K("openAccessPermissions"), I(0), K("value")])
        {
            match vocab::access_right(permission) {
                Some(access_right) => draft.record.access_right = Some(access_right),
                None => warn!(permission, "Unmapped open-access permission"),
            }
        }

        let confidential = source.bool_at(&[K("confidential")]);
        draft.record.access = AccessFlags {
            metadata_restricted: confidential,
            files_restricted: confidential,
        };
        draft
    }

    fn language(&self, source: &SourceRecord, mut draft: Draft) -> Draft {
        if let Some(name) = source.non_empty_str(&[K("languages"), I(0), K("value")]) {
            match self.languages.code_for(name) {
                Some(code) => draft.record.language = Some(code.to_string()),
                None => debug!(language = name, "No ISO 639-3 code for language"),
            }
        }
        draft
    }

    fn title(&self, source: &SourceRecord, mut draft: Draft) -> Draft {
        if let Some(title) = source.non_empty_str(&[K("title")]) {
            let lang = draft.record.language.clone();
            draft.record.titles.push(Title::main(title, lang));
        }
        draft
    }

    /// Abstract, or a fixed placeholder so the repository form validates.
    fn description(&self, source: &SourceRecord, mut draft: Draft) -> Draft {
        let text = source
            .non_empty_str(&[K("abstracts"), I(0), K("value")])
            .unwrap_or("No description available for this record.");
        let lang = draft.record.language.clone();
        draft
            .record
            .descriptions
            .push(Description::abstract_text(text, lang));
        draft
    }

    fn identifiers(&self, mut draft: Draft) -> Draft {
        draft.record.identifiers.doi = Some(PLACEHOLDER_DOI.to_string());
        draft.record.version = PLACEHOLDER_VERSION.to_string();
        draft
    }

    fn resource_kind(&self, source: &SourceRecord, mut draft: Draft) -> Draft {
        let pure_type = source
            .non_empty_str(&[K("types"), I(0), K("value")])
            .unwrap_or("Other report");
        let kind = vocab::resource_type(pure_type);
        draft.record.resource_type = ResourceTypeEntry {
            kind,
            subtype: vocab::resource_subtype(kind),
        };
        draft
    }

    /// Everything that is not fully open gets the default restriction set.
    fn restrictions(&self, mut draft: Draft) -> Draft {
        if draft.record.access_right != Some(AccessRight::Open) {
            draft.record.applied_restrictions = vocab::DEFAULT_RESTRICTIONS
                .iter()
                .map(|r| r.to_string())
                .collect();
            vocab::validate_restrictions(&draft.record.applied_restrictions);
        }
        draft
    }

    /// Organisational units become group restrictions; the groups are
    /// created on the repository side as a best effort.
    async fn groups(&self, source: &SourceRecord, mut draft: Draft) -> Draft {
        let Some(units) = source
            .at(&[K("organisationalUnits")])
            .and_then(Value::as_array)
        else {
            return draft;
        };
        for unit in units {
            let Some(external_id) = non_empty_str(unit, &[K("externalId")]) else {
                continue;
            };
            let name = non_empty_str(unit, &[K("names"), I(0), K("value")]);
            if let Err(e) = self.rdm.ensure_group(external_id, name).await {
                warn!(group = external_id, error = %e, "Group creation failed");
            }
            draft.record.group_restrictions.push(external_id.to_string());
        }
        draft
    }
}
