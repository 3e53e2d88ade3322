//! purerdm-store - Persisted synchronization state.

mod file;
mod memory;

pub use file::FileSyncStore;
pub use memory::MemorySyncStore;
