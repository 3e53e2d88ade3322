//! The RDM-shaped target record and its nested wire types.
//!
//! These structs serialize to the JSON body submitted to the RDM records
//! endpoint. Optional fields are skipped rather than sent as `null`, and
//! the extensions map only ever holds keys whose source value was
//! non-empty (the transformer enforces that invariant).

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

/// RDM access right vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessRight {
    Open,
    Embargoed,
    Restricted,
    Closed,
}

impl AccessRight {
    /// The wire string for this access right.
    pub fn as_str(self) -> &'static str {
        match self {
            AccessRight::Open => "open",
            AccessRight::Embargoed => "embargoed",
            AccessRight::Restricted => "restricted",
            AccessRight::Closed => "closed",
        }
    }
}

/// RDM resource type vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Publication,
    Presentation,
    Poster,
    Software,
    Dataset,
    #[default]
    Other,
}

/// The `resource_type` wire entry.
///
/// Invariant: `subtype` is present only when `kind` is
/// [`ResourceType::Publication`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResourceTypeEntry {
    #[serde(rename = "type")]
    pub kind: ResourceType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtype: Option<&'static str>,
}

/// Metadata/files restriction flags; both always move together.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct AccessFlags {
    pub metadata_restricted: bool,
    pub files_restricted: bool,
}

/// One title entry.
#[derive(Debug, Clone, Serialize)]
pub struct Title {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

impl Title {
    /// The record's single main title, tagged with the resolved language.
    pub fn main(title: impl Into<String>, lang: Option<String>) -> Self {
        Self {
            lang,
            title: title.into(),
            kind: "MainTitle",
        }
    }
}

/// One description entry.
#[derive(Debug, Clone, Serialize)]
pub struct Description {
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

impl Description {
    /// An abstract, tagged with the resolved language.
    pub fn abstract_text(description: impl Into<String>, lang: Option<String>) -> Self {
        Self {
            description: description.into(),
            lang,
            kind: "Abstract",
        }
    }
}

/// Identifier sub-map on a creator.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonIdentifiers {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orcid: Option<String>,
}

impl PersonIdentifiers {
    /// True when no identifier was found.
    pub fn is_empty(&self) -> bool {
        self.uuid.is_none() && self.external_id.is_none() && self.orcid.is_none()
    }
}

/// Identifier sub-map on an affiliation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AffiliationIdentifiers {
    pub external_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
}

/// One creator affiliation; only emitted when both name and externalId
/// were present in the source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Affiliation {
    pub name: String,
    pub identifiers: AffiliationIdentifiers,
}

/// One record creator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Person {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(skip_serializing_if = "PersonIdentifiers::is_empty")]
    pub identifiers: PersonIdentifiers,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub affiliations: Vec<Affiliation>,
}

impl Person {
    /// A personal creator with the given display name.
    pub fn personal(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: "Personal",
            identifiers: PersonIdentifiers::default(),
            affiliations: Vec::new(),
        }
    }
}

/// Record-level identifier stubs.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Identifiers {
    #[serde(rename = "DOI", skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
}

/// One file attached to the target record.
///
/// The `internal_review` flag carries over the reconciler's verdict; the
/// remaining per-file metadata is copied from the source when non-empty.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_type: Option<AccessRight>,
    pub internal_review: bool,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extensions: BTreeMap<String, Value>,
}

/// Snapshot of a file already stored on the RDM side.
///
/// Fetched once per record for comparison; the size stays a string because
/// the two systems disagree on the numeric type and the match is defined
/// as string equality.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub size: String,
    pub review: bool,
    pub name: String,
}

/// Version-chain metadata for one source identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionInfo {
    /// Tag for the record being built.
    pub this_version: String,
    /// Recids of the sibling records sharing the identity.
    pub other_versions: Vec<String>,
}

/// The accumulated target record, ready for submission.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TargetRecord {
    /// Deduplicated owner user ids.
    #[serde(rename = "_owners")]
    pub owners: Vec<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_right: Option<AccessRight>,
    #[serde(rename = "_access")]
    pub access: AccessFlags,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    pub titles: Vec<Title>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub creators: Vec<Person>,
    pub descriptions: Vec<Description>,
    pub version: String,
    pub identifiers: Identifiers,
    pub resource_type: ResourceTypeEntry,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub applied_restrictions: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub group_restrictions: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<FileEntry>,
    #[serde(rename = "metadataVersion", skip_serializing_if = "Option::is_none")]
    pub metadata_version: Option<String>,
    #[serde(
        rename = "metadataOtherVersions",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub metadata_other_versions: Vec<String>,
    pub extensions: BTreeMap<String, Value>,
}

impl TargetRecord {
    /// Serialize to the wire representation submitted to RDM.
    pub fn to_wire(&self) -> Value {
        serde_json::to_value(self).expect("target record serializes")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subtype_skipped_when_absent() {
        let entry = ResourceTypeEntry {
            kind: ResourceType::Poster,
            subtype: None,
        };
        let wire = serde_json::to_value(&entry).unwrap();
        assert_eq!(wire, serde_json::json!({"type": "poster"}));
    }

    #[test]
    fn access_right_serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(AccessRight::Embargoed).unwrap(),
            serde_json::json!("embargoed")
        );
    }

    #[test]
    fn empty_person_identifiers_skipped() {
        let person = Person::personal("Ada Lovelace");
        let wire = serde_json::to_value(&person).unwrap();
        assert!(wire.get("identifiers").is_none());
        assert!(wire.get("affiliations").is_none());
        assert_eq!(wire["type"], "Personal");
    }

    #[test]
    fn wire_uses_rdm_field_names() {
        let record = TargetRecord {
            owners: vec![1],
            titles: vec![Title::main("A record", Some("eng".into()))],
            ..TargetRecord::default()
        };
        let wire = record.to_wire();
        assert_eq!(wire["_owners"], serde_json::json!([1]));
        assert_eq!(wire["titles"][0]["type"], "MainTitle");
        assert!(wire.get("metadataVersion").is_none());
    }
}
