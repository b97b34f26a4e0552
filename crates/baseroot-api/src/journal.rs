//! # Saga Journal
//!
//! Persists [`UploadRecord`]s so an interrupted upload can be finished or
//! compensated after a restart.
//!
//! - [`MemoryJournal`]: process-local, lost on restart. Used when no
//!   journal directory is configured, and in tests.
//! - [`FileJournal`]: one JSON document per upload. Each save writes a
//!   temp file and renames it over the previous version, so a crash leaves
//!   either the old or the new record, never a torn one.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use baseroot_core::UploadId;
use baseroot_state::UploadRecord;
use parking_lot::RwLock;

#[derive(Debug, thiserror::Error)]
pub enum JournalError {
    #[error("journal I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("corrupt journal entry {path}: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Durable store of upload saga records.
#[async_trait]
pub trait UploadJournal: Send + Sync {
    /// Insert or replace the record with `record.id`.
    async fn save(&self, record: &UploadRecord) -> Result<(), JournalError>;

    async fn get(&self, id: &UploadId) -> Result<Option<UploadRecord>, JournalError>;

    /// All records, oldest first.
    async fn list(&self) -> Result<Vec<UploadRecord>, JournalError>;

    fn kind(&self) -> &'static str;
}

// ── Memory ───────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MemoryJournal {
    records: RwLock<HashMap<UploadId, UploadRecord>>,
}

impl MemoryJournal {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UploadJournal for MemoryJournal {
    async fn save(&self, record: &UploadRecord) -> Result<(), JournalError> {
        self.records.write().insert(record.id, record.clone());
        Ok(())
    }

    async fn get(&self, id: &UploadId) -> Result<Option<UploadRecord>, JournalError> {
        Ok(self.records.read().get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<UploadRecord>, JournalError> {
        let mut all: Vec<_> = self.records.read().values().cloned().collect();
        all.sort_by_key(|r| r.created_at);
        Ok(all)
    }

    fn kind(&self) -> &'static str {
        "memory"
    }
}

// ── File ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct FileJournal {
    dir: PathBuf,
}

impl FileJournal {
    /// Open (and create if needed) a journal rooted at `dir`.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, JournalError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|source| JournalError::Io {
                path: dir.clone(),
                source,
            })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &UploadId) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    async fn read_record(path: &Path) -> Result<UploadRecord, JournalError> {
        let bytes = tokio::fs::read(path).await.map_err(|source| JournalError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_slice(&bytes).map_err(|source| JournalError::Corrupt {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[async_trait]
impl UploadJournal for FileJournal {
    async fn save(&self, record: &UploadRecord) -> Result<(), JournalError> {
        let path = self.path_for(&record.id);
        let tmp = self.dir.join(format!(".{}.json.tmp", record.id));
        let json = serde_json::to_vec_pretty(record).map_err(|source| JournalError::Corrupt {
            path: path.clone(),
            source,
        })?;
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|source| JournalError::Io {
                path: tmp.clone(),
                source,
            })?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|source| JournalError::Io { path, source })?;
        Ok(())
    }

    async fn get(&self, id: &UploadId) -> Result<Option<UploadRecord>, JournalError> {
        let path = self.path_for(id);
        match tokio::fs::try_exists(&path).await {
            Ok(true) => Self::read_record(&path).await.map(Some),
            Ok(false) => Ok(None),
            Err(source) => Err(JournalError::Io { path, source }),
        }
    }

    async fn list(&self) -> Result<Vec<UploadRecord>, JournalError> {
        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .map_err(|source| JournalError::Io {
                path: self.dir.clone(),
                source,
            })?;

        let mut records = Vec::new();
        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(source) => {
                    return Err(JournalError::Io {
                        path: self.dir.clone(),
                        source,
                    })
                }
            };
            let path = entry.path();
            let is_record = path.extension().is_some_and(|ext| ext == "json")
                && !entry.file_name().to_string_lossy().starts_with('.');
            if !is_record {
                continue;
            }
            match Self::read_record(&path).await {
                Ok(record) => records.push(record),
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "skipping unreadable journal entry"),
            }
        }
        records.sort_by_key(|r| r.created_at);
        Ok(records)
    }

    fn kind(&self) -> &'static str {
        "file"
    }
}
