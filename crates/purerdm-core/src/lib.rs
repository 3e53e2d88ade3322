//! purerdm-core - Shared types and traits for the Pure-to-RDM synchronizer.

pub mod counters;
pub mod error;
pub mod extract;
pub mod record;
pub mod traits;
pub mod types;

pub use counters::{Counters, CountersSnapshot};
pub use error::Error;
pub use record::{SourceRecord, TargetRecord};
pub use traits::{PureApi, RdmApi, RecordHit, RecordPage, SyncStore};
pub use types::{Recid, RecordUuid};

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
