//! Per-tile download outcome.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of one tile in one run.
///
/// Persisted in the progress ledger as its integer code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
pub enum DownloadStatus {
    /// Fetched and decoded.
    Success,
    /// Skipped on resume and the saved file was loaded.
    SkipAndExists,
    /// Skipped on resume; no saved file was found.
    Skip,
    /// Network failure or non-2xx response after retries.
    Undefined,
    /// Not fetched because the file was already on disk.
    AlreadyExists,
    /// Response was not an image, or did not decode.
    Failed,
    /// Image response with an empty body.
    Empty,
}

impl DownloadStatus {
    pub fn code(&self) -> u16 {
        match self {
            DownloadStatus::Success => 200,
            DownloadStatus::SkipAndExists => 100,
            DownloadStatus::Skip => 101,
            DownloadStatus::Undefined => 900,
            DownloadStatus::AlreadyExists => 500,
            DownloadStatus::Failed => 401,
            DownloadStatus::Empty => 400,
        }
    }

    pub fn from_code(code: u16) -> Option<Self> {
        Some(match code {
            200 => DownloadStatus::Success,
            100 => DownloadStatus::SkipAndExists,
            101 => DownloadStatus::Skip,
            900 => DownloadStatus::Undefined,
            500 => DownloadStatus::AlreadyExists,
            401 => DownloadStatus::Failed,
            400 => DownloadStatus::Empty,
            _ => return None,
        })
    }

    /// A later resumed run may skip this tile.
    pub fn is_resumable(&self) -> bool {
        matches!(self, DownloadStatus::Success | DownloadStatus::SkipAndExists)
    }

    /// The fetch was attempted and produced no usable tile.
    pub fn is_failure(&self) -> bool {
        matches!(self, DownloadStatus::Undefined | DownloadStatus::Failed)
    }
}

impl From<DownloadStatus> for u16 {
    fn from(status: DownloadStatus) -> Self {
        status.code()
    }
}

impl TryFrom<u16> for DownloadStatus {
    type Error = String;

    fn try_from(code: u16) -> Result<Self, Self::Error> {
        Self::from_code(code).ok_or_else(|| format!("unknown download status code {}", code))
    }
}

impl fmt::Display for DownloadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DownloadStatus::Success => "SUCCESS",
            DownloadStatus::SkipAndExists => "SKIP_AND_EXISTS",
            DownloadStatus::Skip => "SKIP",
            DownloadStatus::Undefined => "UNDEFINED",
            DownloadStatus::AlreadyExists => "ALREADY_EXISTS",
            DownloadStatus::Failed => "FAILED",
            DownloadStatus::Empty => "EMPTY",
        };
        f.write_str(name)
    }
}
