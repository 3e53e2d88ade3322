//! purerdm - Synchronizes research-output records from a Pure CRIS
//! instance into an Invenio RDM repository.
//!
//! The engine walks the Pure change feed date by date, transforms every
//! touched record into the repository's shape (vocabulary mapping,
//! creator enrichment, file reconciliation, extension fields), and
//! submits it with rate-limit-aware pacing. Failures queue identities in
//! a persisted retry queue that the next run drains first.
//!
//! The pieces compose through the traits in [`purerdm_core`]: any
//! [`PureApi`](purerdm_core::PureApi), [`RdmApi`](purerdm_core::RdmApi),
//! and [`SyncStore`](purerdm_core::SyncStore) implementation plugs into
//! [`SyncEngine`]. The `purerdm-http` and `purerdm-store` crates provide
//! the production implementations.

pub mod config;
pub mod engine;
pub mod reconcile;
pub mod scheduler;
pub mod submit;
pub mod transform;
pub mod versioning;
pub mod vocab;

pub use config::SyncConfig;
pub use engine::SyncEngine;
pub use submit::{SubmissionOutcome, Submitter};
pub use transform::{StagedFile, TransformOutput, Transformer};
pub use vocab::LanguageTable;

pub use purerdm_core::{Counters, CountersSnapshot, Error, Result};
