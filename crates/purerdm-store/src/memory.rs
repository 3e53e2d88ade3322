//! In-memory state, for tests and dry runs.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::NaiveDate;

use purerdm_core::Result;
use purerdm_core::traits::SyncStore;
use purerdm_core::types::{Recid, RecordUuid};

#[derive(Debug, Default)]
struct Inner {
    retries: Vec<RecordUuid>,
    successes: Vec<RecordUuid>,
    users: HashMap<String, i64>,
    seen: Vec<(RecordUuid, Recid)>,
    dates: Vec<NaiveDate>,
}

/// [`SyncStore`] held entirely in memory.
///
/// Behaves like [`FileSyncStore`](crate::FileSyncStore) without touching
/// the filesystem. Used by tests and useful for dry runs where persisted
/// retry state is not wanted.
#[derive(Debug, Default)]
pub struct MemorySyncStore {
    inner: Mutex<Inner>,
}

impl MemorySyncStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Preload one externalId-to-user-id mapping.
    pub fn insert_user(&self, external_id: impl Into<String>, user_id: i64) {
        self.inner
            .lock()
            .expect("store mutex poisoned")
            .users
            .insert(external_id.into(), user_id);
    }
}

impl SyncStore for MemorySyncStore {
    fn queue_retry(&self, uuid: &RecordUuid) -> Result<()> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        if !inner.retries.contains(uuid) {
            inner.retries.push(uuid.clone());
        }
        Ok(())
    }

    fn remove_retry(&self, uuid: &RecordUuid) -> Result<()> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        if let Some(pos) = inner.retries.iter().position(|u| u == uuid) {
            inner.retries.remove(pos);
        }
        Ok(())
    }

    fn pending_retries(&self) -> Result<Vec<RecordUuid>> {
        Ok(self.inner.lock().expect("store mutex poisoned").retries.clone())
    }

    fn log_success(&self, uuid: &RecordUuid) -> Result<()> {
        self.inner
            .lock()
            .expect("store mutex poisoned")
            .successes
            .push(uuid.clone());
        Ok(())
    }

    fn successes(&self) -> Result<Vec<RecordUuid>> {
        Ok(self
            .inner
            .lock()
            .expect("store mutex poisoned")
            .successes
            .clone())
    }

    fn user_id_for(&self, external_id: &str) -> Result<Option<i64>> {
        Ok(self
            .inner
            .lock()
            .expect("store mutex poisoned")
            .users
            .get(external_id)
            .copied())
    }

    fn record_seen(&self, uuid: &RecordUuid, recid: &Recid) -> Result<()> {
        self.inner
            .lock()
            .expect("store mutex poisoned")
            .seen
            .push((uuid.clone(), recid.clone()));
        Ok(())
    }

    fn seen_records(&self) -> Result<Vec<(RecordUuid, Recid)>> {
        Ok(self.inner.lock().expect("store mutex poisoned").seen.clone())
    }

    fn add_synced_date(&self, date: NaiveDate) -> Result<()> {
        self.inner
            .lock()
            .expect("store mutex poisoned")
            .dates
            .push(date);
        Ok(())
    }

    fn synced_dates(&self) -> Result<Vec<NaiveDate>> {
        Ok(self.inner.lock().expect("store mutex poisoned").dates.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uuid(n: u8) -> RecordUuid {
        RecordUuid::new(format!("00000000-0000-0000-0000-0000000000{:02}", n)).unwrap()
    }

    #[test]
    fn mirrors_file_store_semantics() {
        let store = MemorySyncStore::new();
        store.queue_retry(&uuid(1)).unwrap();
        store.queue_retry(&uuid(1)).unwrap();
        assert_eq!(store.pending_retries().unwrap().len(), 1);

        store.remove_retry(&uuid(2)).unwrap();
        store.remove_retry(&uuid(1)).unwrap();
        assert!(store.pending_retries().unwrap().is_empty());

        store.insert_user("ext-1", 9);
        assert_eq!(store.user_id_for("ext-1").unwrap(), Some(9));
        assert_eq!(store.user_id_for("ext-2").unwrap(), None);
    }
}
