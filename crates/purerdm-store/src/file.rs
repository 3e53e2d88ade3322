//! Line-oriented state files.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::debug;

use purerdm_core::Result;
use purerdm_core::error::{Error, StoreError};
use purerdm_core::traits::SyncStore;
use purerdm_core::types::{Recid, RecordUuid};

const RETRY_FILE: &str = "to_transmit.txt";
const SUCCESS_FILE: &str = "succeeded.txt";
const USER_MAP_FILE: &str = "user_ids.txt";
const SEEN_FILE: &str = "all_records.txt";
const HISTORY_FILE: &str = "sync_history.txt";

const DATE_FORMAT: &str = "%Y-%m-%d";

fn map_io(err: std::io::Error) -> Error {
    Error::Store(StoreError::from(err))
}

/// Filesystem-backed [`SyncStore`].
///
/// Each concern lives in one plain text file under the root directory, one
/// entry per line. The files are rewritten in full on removal; they stay
/// small (pending retries and run history), so no index is kept.
#[derive(Debug, Clone)]
pub struct FileSyncStore {
    root: PathBuf,
}

impl FileSyncStore {
    /// Create a store rooted at the given directory.
    ///
    /// The directory and files are created lazily on first write.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// The root directory of this store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, file: &str) -> PathBuf {
        self.root.join(file)
    }

    fn read_lines(&self, file: &str) -> Result<Vec<String>> {
        let path = self.path(file);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&path).map_err(map_io)?;
        Ok(content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    fn append_line(&self, file: &str, line: &str) -> Result<()> {
        fs::create_dir_all(&self.root).map_err(map_io)?;
        let mut handle = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path(file))
            .map_err(map_io)?;
        writeln!(handle, "{}", line).map_err(map_io)?;
        Ok(())
    }

    /// Rewrite a file without the first line equal to `line`.
    fn remove_line(&self, file: &str, line: &str) -> Result<()> {
        let mut lines = self.read_lines(file)?;
        let Some(pos) = lines.iter().position(|l| l == line) else {
            return Ok(());
        };
        lines.remove(pos);

        let path = self.path(file);
        let temp = path.with_extension("tmp");
        let mut content = lines.join("\n");
        if !content.is_empty() {
            content.push('\n');
        }
        fs::write(&temp, content).map_err(map_io)?;
        fs::rename(&temp, &path).map_err(map_io)?;
        Ok(())
    }
}

impl SyncStore for FileSyncStore {
    fn queue_retry(&self, uuid: &RecordUuid) -> Result<()> {
        let queued = self.read_lines(RETRY_FILE)?;
        if queued.iter().any(|line| line == uuid.as_str()) {
            return Ok(());
        }
        self.append_line(RETRY_FILE, uuid.as_str())?;
        debug!(uuid = %uuid, "Queued identity for retry");
        Ok(())
    }

    fn remove_retry(&self, uuid: &RecordUuid) -> Result<()> {
        self.remove_line(RETRY_FILE, uuid.as_str())
    }

    fn pending_retries(&self) -> Result<Vec<RecordUuid>> {
        self.read_lines(RETRY_FILE)?
            .into_iter()
            .map(|line| {
                RecordUuid::new(&line).map_err(|_| {
                    Error::Store(StoreError::MalformedEntry {
                        file: RETRY_FILE.to_string(),
                        line,
                    })
                })
            })
            .collect()
    }

    fn log_success(&self, uuid: &RecordUuid) -> Result<()> {
        self.append_line(SUCCESS_FILE, uuid.as_str())
    }

    fn successes(&self) -> Result<Vec<RecordUuid>> {
        self.read_lines(SUCCESS_FILE)?
            .into_iter()
            .map(|line| {
                RecordUuid::new(&line).map_err(|_| {
                    Error::Store(StoreError::MalformedEntry {
                        file: SUCCESS_FILE.to_string(),
                        line,
                    })
                })
            })
            .collect()
    }

    fn user_id_for(&self, external_id: &str) -> Result<Option<i64>> {
        for line in self.read_lines(USER_MAP_FILE)? {
            let mut parts = line.split_whitespace();
            let (Some(ext), Some(id)) = (parts.next(), parts.next()) else {
                return Err(Error::Store(StoreError::MalformedEntry {
                    file: USER_MAP_FILE.to_string(),
                    line,
                }));
            };
            if ext == external_id {
                let id = id.parse::<i64>().map_err(|_| {
                    Error::Store(StoreError::MalformedEntry {
                        file: USER_MAP_FILE.to_string(),
                        line: line.clone(),
                    })
                })?;
                return Ok(Some(id));
            }
        }
        Ok(None)
    }

    fn record_seen(&self, uuid: &RecordUuid, recid: &Recid) -> Result<()> {
        self.append_line(SEEN_FILE, &format!("{} {}", uuid, recid))
    }

    fn seen_records(&self) -> Result<Vec<(RecordUuid, Recid)>> {
        self.read_lines(SEEN_FILE)?
            .into_iter()
            .map(|line| {
                let mut parts = line.split_whitespace();
                let pair = match (parts.next(), parts.next()) {
                    (Some(uuid), Some(recid)) => {
                        RecordUuid::new(uuid).and_then(|u| Recid::new(recid).map(|r| (u, r)))
                    }
                    _ => Err(Error::Store(StoreError::MalformedEntry {
                        file: SEEN_FILE.to_string(),
                        line: line.clone(),
                    })),
                };
                pair.map_err(|_| {
                    Error::Store(StoreError::MalformedEntry {
                        file: SEEN_FILE.to_string(),
                        line,
                    })
                })
            })
            .collect()
    }

    fn add_synced_date(&self, date: NaiveDate) -> Result<()> {
        self.append_line(HISTORY_FILE, &date.format(DATE_FORMAT).to_string())
    }

    fn synced_dates(&self) -> Result<Vec<NaiveDate>> {
        self.read_lines(HISTORY_FILE)?
            .into_iter()
            .map(|line| {
                NaiveDate::parse_from_str(&line, DATE_FORMAT).map_err(|_| {
                    Error::Store(StoreError::MalformedEntry {
                        file: HISTORY_FILE.to_string(),
                        line,
                    })
                })
            })
            .collect()
    }
}
