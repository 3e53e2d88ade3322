//! Identifier types shared across the workspace.

mod recid;
mod record_uuid;

pub use recid::Recid;
pub use record_uuid::RecordUuid;
