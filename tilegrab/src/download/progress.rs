//! Persistent per-directory download ledger.
//!
//! One JSON document per tile directory, named [`PROGRESS_FILE_NAME`].
//! Every mutation re-serializes the document; the file is rewritten only
//! if the serialization changed, through a temp file and a rename so a
//! reader never sees a half-written ledger.

use super::DownloadStatus;
use crate::coord::TileIndex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Reserved file name of the ledger inside a tile directory.
pub const PROGRESS_FILE_NAME: &str = ".dlprog.tilegrab";

/// Ledger format version written by this crate.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum ProgressError {
    #[error("I/O error on progress file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Existing ledger is unreadable; resuming from it is unsafe.
    #[error("progress file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("progress file {path} has unsupported schema version {version}")]
    UnsupportedSchema { path: PathBuf, version: u32 },

    #[error("failed to serialize progress: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Item is missing a required field.
    #[error("invalid progress item for tile {index}: {reason}")]
    InvalidItem { index: TileIndex, reason: String },
}

/// One tile's record in the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressItem {
    pub tile_index: TileIndex,
    pub download_status: DownloadStatus,
    #[serde(rename = "tileURL")]
    pub tile_url: String,
    /// Directory the tile file lives in.
    pub tile_image_path: PathBuf,
    pub tile_source_id: String,
    /// Whether the payload was written to disk.
    pub saved: bool,
}

impl ProgressItem {
    pub fn validate(&self) -> Result<(), ProgressError> {
        let missing = if self.tile_url.is_empty() {
            Some("tileURL")
        } else if self.tile_source_id.is_empty() {
            Some("tileSourceId")
        } else if self.tile_image_path.as_os_str().is_empty() {
            Some("tileImagePath")
        } else {
            None
        };
        match missing {
            Some(field) => Err(ProgressError::InvalidItem {
                index: self.tile_index,
                reason: format!("{} is empty", field),
            }),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProgressDocument {
    schema_version: u32,
    last_run_date: String,
    last_run_time: String,
    progress: Vec<ProgressItem>,
}

impl Default for ProgressDocument {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            last_run_date: String::new(),
            last_run_time: String::new(),
            progress: Vec::new(),
        }
    }
}

/// The ledger for one tile directory.
#[derive(Debug)]
pub struct ProgressStore {
    path: PathBuf,
    doc: ProgressDocument,
    by_index: HashMap<TileIndex, usize>,
    last_flushed: Option<String>,
    flush_suspended: bool,
}

impl ProgressStore {
    /// Opens the ledger in `dir`, or starts an empty one.
    pub fn open(dir: &Path) -> Result<Self, ProgressError> {
        let path = dir.join(PROGRESS_FILE_NAME);

        let (doc, last_flushed) = match fs::read_to_string(&path) {
            Ok(contents) => {
                let doc: ProgressDocument =
                    serde_json::from_str(&contents).map_err(|source| ProgressError::Corrupt {
                        path: path.clone(),
                        source,
                    })?;
                if doc.schema_version != SCHEMA_VERSION {
                    return Err(ProgressError::UnsupportedSchema {
                        path,
                        version: doc.schema_version,
                    });
                }
                for item in &doc.progress {
                    item.validate()?;
                }
                info!(
                    path = %path.display(),
                    entries = doc.progress.len(),
                    "Loaded download progress"
                );
                (doc, Some(contents))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                (ProgressDocument::default(), None)
            }
            Err(source) => return Err(ProgressError::Io { path, source }),
        };

        let by_index = doc
            .progress
            .iter()
            .enumerate()
            .map(|(i, item)| (item.tile_index, i))
            .collect();

        Ok(Self {
            path,
            doc,
            by_index,
            last_flushed,
            flush_suspended: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.doc.progress.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doc.progress.is_empty()
    }

    pub fn items(&self) -> &[ProgressItem] {
        &self.doc.progress
    }

    pub fn last_run(&self) -> (&str, &str) {
        (&self.doc.last_run_date, &self.doc.last_run_time)
    }

    pub fn lookup(&self, index: TileIndex) -> Option<&ProgressItem> {
        self.by_index.get(&index).map(|&i| &self.doc.progress[i])
    }

    /// Stamps the run date and time, then flushes.
    pub fn start_run(&mut self) -> Result<(), ProgressError> {
        let now = chrono::Local::now();
        self.doc.last_run_date = now.format("%Y-%m-%d").to_string();
        self.doc.last_run_time = now.format("%H:%M:%S").to_string();
        self.flush_unless_suspended()
    }

    /// Replaces the item with the same tile index, or appends it.
    ///
    /// Invalid items are rejected without touching the ledger.
    pub fn upsert(&mut self, item: ProgressItem) -> Result<(), ProgressError> {
        item.validate()?;
        match self.by_index.get(&item.tile_index) {
            Some(&i) => self.doc.progress[i] = item,
            None => {
                self.by_index.insert(item.tile_index, self.doc.progress.len());
                self.doc.progress.push(item);
            }
        }
        self.flush_unless_suspended()
    }

    /// Defers writes until [`resume_flush`](Self::resume_flush).
    pub fn suspend_flush(&mut self) {
        self.flush_suspended = true;
    }

    pub fn resume_flush(&mut self) -> Result<(), ProgressError> {
        self.flush_suspended = false;
        self.flush().map(|_| ())
    }

    fn flush_unless_suspended(&mut self) -> Result<(), ProgressError> {
        if self.flush_suspended {
            return Ok(());
        }
        self.flush().map(|_| ())
    }

    /// Writes the ledger if it changed since the last write.
    ///
    /// Returns true if the file was rewritten.
    pub fn flush(&mut self) -> Result<bool, ProgressError> {
        let serialized = serde_json::to_string_pretty(&self.doc)?;
        if self.last_flushed.as_deref() == Some(serialized.as_str()) {
            return Ok(false);
        }

        let io_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source| ProgressError::Io { path, source }
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(io_err(parent))?;
        }

        let mut tmp: OsString = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, serialized.as_bytes()).map_err(io_err(&tmp))?;
        fs::rename(&tmp, &self.path).map_err(io_err(&self.path))?;

        debug!(path = %self.path.display(), entries = self.len(), "Progress flushed");
        self.last_flushed = Some(serialized);
        Ok(true)
    }
}
