//! Record types: the Pure source record and the RDM-shaped target record.

mod source;
mod target;

pub use source::SourceRecord;
pub use target::{
    AccessFlags, AccessRight, Affiliation, AffiliationIdentifiers, Description, FileEntry,
    Identifiers, Person, PersonIdentifiers, ResourceType, ResourceTypeEntry, StoredFile,
    TargetRecord, Title, VersionInfo,
};
