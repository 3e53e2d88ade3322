//! Shared in-memory fakes for the engine tests.
//!
//! The fakes clone cheaply and share their call logs through `Arc`, so a
//! test can keep a handle while the engine owns the other.

// not every test file uses every helper
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;
use tempfile::TempDir;

use purerdm_core::error::{ApiError, Error};
use purerdm_core::record::SourceRecord;
use purerdm_core::traits::{PureApi, RdmApi, RecordPage};
use purerdm_core::types::{Recid, RecordUuid};
use purerdm_core::Result;

pub fn uuid() -> RecordUuid {
    RecordUuid::new("2a9f57e3-1b2c-4d5e-8f90-a1b2c3d4e5f6").unwrap()
}

pub fn recid(s: &str) -> Recid {
    Recid::new(s).unwrap()
}

fn not_found() -> Error {
    Error::Api(ApiError::new(404, None))
}

// ============================================================================
// Pure
// ============================================================================

#[derive(Clone)]
pub struct FakePure {
    records: Arc<Mutex<HashMap<String, Value>>>,
    persons: Arc<Mutex<HashMap<String, Value>>>,
    changes: Arc<Mutex<HashMap<NaiveDate, Vec<RecordUuid>>>>,
    downloads: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    staging: Arc<TempDir>,
}

impl FakePure {
    pub fn new() -> Self {
        Self {
            records: Arc::default(),
            persons: Arc::default(),
            changes: Arc::default(),
            downloads: Arc::default(),
            staging: Arc::new(tempfile::tempdir().unwrap()),
        }
    }

    pub fn add_record(&self, record: Value) {
        let uuid = record["uuid"].as_str().unwrap().to_string();
        self.records.lock().unwrap().insert(uuid, record);
    }

    pub fn add_person(&self, uuid: &str, person: Value) {
        self.persons.lock().unwrap().insert(uuid.to_string(), person);
    }

    pub fn add_change(&self, date: NaiveDate, uuid: RecordUuid) {
        self.changes.lock().unwrap().entry(date).or_default().push(uuid);
    }

    pub fn add_download(&self, url: &str, bytes: &[u8]) {
        self.downloads
            .lock()
            .unwrap()
            .insert(url.to_string(), bytes.to_vec());
    }
}

#[async_trait]
impl PureApi for FakePure {
    async fn record_by_uuid(&self, uuid: &RecordUuid) -> Result<Option<SourceRecord>> {
        match self.records.lock().unwrap().get(uuid.as_str()) {
            Some(value) => Ok(Some(SourceRecord::new(value.clone())?)),
            None => Ok(None),
        }
    }

    async fn person(&self, person_uuid: &str) -> Result<Value> {
        self.persons
            .lock()
            .unwrap()
            .get(person_uuid)
            .cloned()
            .ok_or_else(not_found)
    }

    async fn download_file(&self, url: &str, file_name: &str) -> Result<PathBuf> {
        let bytes = self
            .downloads
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(not_found)?;
        let path = self.staging.path().join(file_name);
        std::fs::write(&path, bytes).unwrap();
        Ok(path)
    }

    async fn changed_uuids(&self, date: NaiveDate) -> Result<Vec<RecordUuid>> {
        Ok(self
            .changes
            .lock()
            .unwrap()
            .get(&date)
            .cloned()
            .unwrap_or_default())
    }
}

// ============================================================================
// RDM
// ============================================================================

#[derive(Clone)]
pub struct FakeRdm {
    /// Responses served to `query_records`, front first. When the queue
    /// runs dry an empty page is served.
    pub query_pages: Arc<Mutex<VecDeque<RecordPage>>>,
    pub created: Arc<Mutex<Vec<Value>>>,
    pub replaced: Arc<Mutex<Vec<(Recid, Value)>>>,
    pub deleted: Arc<Mutex<Vec<Recid>>>,
    pub uploads: Arc<Mutex<Vec<(Recid, String, Vec<u8>)>>>,
    pub groups: Arc<Mutex<Vec<(String, Option<String>)>>>,
    pub fail_create: Arc<AtomicBool>,
}

impl FakeRdm {
    pub fn new() -> Self {
        Self {
            query_pages: Arc::default(),
            created: Arc::default(),
            replaced: Arc::default(),
            deleted: Arc::default(),
            uploads: Arc::default(),
            groups: Arc::default(),
            fail_create: Arc::default(),
        }
    }

    pub fn push_query_page(&self, page: RecordPage) {
        self.query_pages.lock().unwrap().push_back(page);
    }

    pub fn fail_next_creates(&self) {
        self.fail_create.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl RdmApi for FakeRdm {
    async fn query_records(&self, _query: &str, _page: u32, _size: u32) -> Result<RecordPage> {
        Ok(self
            .query_pages
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(RecordPage {
                total: 0,
                hits: Vec::new(),
            }))
    }

    async fn get_record(&self, _recid: &Recid) -> Result<Value> {
        Err(not_found())
    }

    async fn create_record(&self, record: &Value) -> Result<()> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(Error::Api(ApiError::new(500, Some("boom".to_string()))));
        }
        self.created.lock().unwrap().push(record.clone());
        Ok(())
    }

    async fn replace_record(&self, recid: &Recid, record: &Value) -> Result<()> {
        self.replaced
            .lock()
            .unwrap()
            .push((recid.clone(), record.clone()));
        Ok(())
    }

    async fn delete_record(&self, recid: &Recid) -> Result<()> {
        self.deleted.lock().unwrap().push(recid.clone());
        Ok(())
    }

    async fn put_file(&self, recid: &Recid, file_name: &str, staged: &Path) -> Result<()> {
        let bytes = std::fs::read(staged).map_err(purerdm_core::error::StoreError::from)?;
        self.uploads
            .lock()
            .unwrap()
            .push((recid.clone(), file_name.to_string(), bytes));
        Ok(())
    }

    async fn ensure_group(&self, external_id: &str, name: Option<&str>) -> Result<()> {
        self.groups
            .lock()
            .unwrap()
            .push((external_id.to_string(), name.map(str::to_string)));
        Ok(())
    }
}
