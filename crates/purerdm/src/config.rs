//! Engine configuration.

use std::time::Duration;

/// Tunables for one synchronization run.
///
/// Defaults match the behavior of the production deployment: a seven-day
/// lookback window, a one-second wait for the repository's search index to
/// catch up after a metadata write, and versioning switched off (duplicate
/// records are deleted rather than chained).
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Keep prior records for an identity as a version chain instead of
    /// deleting them as duplicates.
    pub versioning_enabled: bool,
    /// Owner assigned to records with no resolvable Pure owner.
    pub fallback_owner: i64,
    /// How many days back the scheduler looks for unsynced dates.
    pub lookback_days: u32,
    /// Wait between a metadata write and the recid query that follows it.
    pub index_delay: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            versioning_enabled: false,
            fallback_owner: 1,
            lookback_days: 7,
            index_delay: Duration::from_secs(1),
        }
    }
}

impl SyncConfig {
    /// A configuration with no artificial delays, for tests.
    pub fn immediate() -> Self {
        Self {
            index_delay: Duration::ZERO,
            ..Self::default()
        }
    }
}
