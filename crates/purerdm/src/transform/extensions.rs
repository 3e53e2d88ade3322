//! Record-level extension fields.
//!
//! Pure metadata with no RDM counterpart is preserved under namespaced
//! extension keys. Only fields whose source value is non-empty make it
//! into the map, so the wire payload never carries empty placeholders.

use purerdm_core::extract::Seg::{self, Index as I, Key as K};
use purerdm_core::record::SourceRecord;

use super::Draft;

/// Extension key and the source path it is copied from.
const EXTENSION_FIELDS: &[(&str, &[Seg<'static>])] = &[
    ("pure:uuid", &[K("uuid")]),
    ("pure:type", &[K("types"), I(0), K("value")]),
    ("pure:category", &[K("categories"), I(0), K("value")]),
    ("pure:peerReview", &[K("peerReview")]),
    // nested list really is keyed "publicationStatuses" twice in Pure
    (
        "pure:publicationStatus",
        &[
            K("publicationStatuses"),
            I(0),
            K("publicationStatuses"),
            I(0),
            K("value"),
        ],
    ),
    (
        "pure:publicationDate",
        &[K("publicationStatuses"), I(0), K("publicationDate"), K("year")],
    ),
    ("pure:workflow", &[K("workflows"), I(0), K("value")]),
    ("pure:pages", &[K("info"), K("pages")]),
    ("pure:volume", &[K("info"), K("volume")]),
    (
        "pure:journalTitle",
        &[K("info"), K("journalAssociation"), K("title"), K("value")],
    ),
    ("pure:journalNumber", &[K("info"), K("journalNumber")]),
    ("pure:portalUrl", &[K("info"), K("portalUrl")]),
    ("pure:publisherUuid", &[K("publisher"), K("uuid")]),
    (
        "pure:publisherName",
        &[K("publisher"), K("names"), I(0), K("value")],
    ),
    (
        "pure:publisherType",
        &[K("publisher"), K("types"), I(0), K("value")],
    ),
    (
        "pure:managingOrganisationalUnitName",
        &[K("managingOrganisationalUnit"), K("names"), I(0), K("value")],
    ),
    (
        "pure:managingOrganisationalUnitUuid",
        &[K("managingOrganisationalUnit"), K("uuid")],
    ),
    (
        "pure:managingOrganisationalUnitExternalId",
        &[K("managingOrganisationalUnit"), K("externalId")],
    ),
];

pub(super) fn apply(source: &SourceRecord, mut draft: Draft) -> Draft {
    for (key, path) in EXTENSION_FIELDS {
        if let Some(value) = source.non_empty(path) {
            draft
                .record
                .extensions
                .insert((*key).to_string(), value.clone());
        }
    }
    draft
}
