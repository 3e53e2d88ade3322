//! Traits for the external collaborators: Pure, RDM, and local state.

mod pure;
mod rdm;
mod store;

pub use pure::PureApi;
pub use rdm::{RdmApi, RecordHit, RecordPage};
pub use store::SyncStore;
