//! Download orchestration.

use super::http::{HttpClient, ReqwestClient};
use super::progress::{ProgressError, ProgressItem, ProgressStore};
use super::strategy::{DownloadStrategy, ParallelStrategy, SequentialStrategy};
use super::worker::{TileOutcome, TileWorker};
use super::{DownloadConfig, DownloadStatus, HttpError};
use crate::coord::TileIndex;
use crate::raster::{scan_tile_dir, ImageCollection, RasterError};
use crate::tile::TileCollection;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Progress callback, `(done, total)`.
///
/// Called on the thread that runs [`Downloader::download`], so it may borrow
/// local state such as a progress bar.
pub type ProgressCallback<'a> = dyn Fn(usize, usize) + Send + Sync + 'a;

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("no tiles to download")]
    NoTiles,

    #[error("tile collection has no source id")]
    NoSource,

    /// Resume would skip every tile and none of them is on disk.
    #[error(
        "all {skipped} tiles are marked done in the progress file but none were found on disk; \
         disable resume to fetch them again"
    )]
    NothingToFetch { skipped: usize },

    #[error("failed to create tile directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to start worker pool: {0}")]
    Pool(String),

    #[error(transparent)]
    Progress(#[from] ProgressError),

    #[error(transparent)]
    Raster(#[from] RasterError),

    #[error(transparent)]
    Http(#[from] HttpError),
}

/// Tile counts by outcome. The fields partition `total`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadSummary {
    pub total: usize,
    /// Fetched and decoded this run.
    pub succeeded: usize,
    /// Skipped on resume with nothing on disk.
    pub skipped: usize,
    /// Loaded from disk instead of fetched.
    pub reused: usize,
    pub empty: usize,
    pub failed: usize,
}

impl DownloadSummary {
    fn record(&mut self, status: DownloadStatus) {
        if status.is_failure() {
            self.failed += 1;
            return;
        }
        match status {
            DownloadStatus::Success => self.succeeded += 1,
            DownloadStatus::Skip => self.skipped += 1,
            DownloadStatus::SkipAndExists | DownloadStatus::AlreadyExists => self.reused += 1,
            DownloadStatus::Empty => self.empty += 1,
            DownloadStatus::Undefined | DownloadStatus::Failed => {}
        }
    }

    /// Tiles that contributed an image.
    pub fn available(&self) -> usize {
        self.succeeded + self.reused
    }
}

/// Result of a download run.
#[derive(Debug)]
pub struct DownloadReport {
    pub images: ImageCollection,
    pub summary: DownloadSummary,
    /// Status per tile, in completion order.
    pub statuses: Vec<(TileIndex, DownloadStatus)>,
}

impl DownloadReport {
    pub fn status_of(&self, index: TileIndex) -> Option<DownloadStatus> {
        self.statuses
            .iter()
            .find(|(i, _)| *i == index)
            .map(|(_, s)| *s)
    }
}

/// Fetches a [`TileCollection`] into an [`ImageCollection`].
///
/// Consults and updates the progress ledger in the tile directory so an
/// interrupted run can resume.
pub struct Downloader {
    client: Arc<dyn HttpClient>,
    config: DownloadConfig,
}

impl Downloader {
    pub fn new(client: Arc<dyn HttpClient>, config: DownloadConfig) -> Self {
        Self { client, config }
    }

    /// Creates a downloader over a fresh reqwest client.
    pub fn with_default_client(config: DownloadConfig) -> Result<Self, DownloadError> {
        let client = ReqwestClient::from_config(&config)?;
        Ok(Self::new(Arc::new(client), config))
    }

    pub fn config(&self) -> &DownloadConfig {
        &self.config
    }

    fn strategy(&self) -> Box<dyn DownloadStrategy> {
        if self.config.parallel() {
            Box::new(ParallelStrategy::new(self.config.workers()))
        } else {
            Box::new(SequentialStrategy::new())
        }
    }

    /// Downloads every tile, saving into `tile_dir`.
    pub fn download(
        &self,
        tiles: &mut TileCollection,
        tile_dir: &Path,
        on_progress: Option<&ProgressCallback<'_>>,
    ) -> Result<DownloadReport, DownloadError> {
        if tiles.is_empty() {
            return Err(DownloadError::NoTiles);
        }
        if tiles.source_id().is_empty() {
            return Err(DownloadError::NoSource);
        }

        std::fs::create_dir_all(tile_dir).map_err(|source| DownloadError::CreateDir {
            path: tile_dir.to_path_buf(),
            source,
        })?;

        let mut store = ProgressStore::open(tile_dir)?;
        let on_disk = scan_tile_dir(tile_dir)?;

        let skipped = self.mark_resumed(tiles, &store);
        if skipped == tiles.len() && !tiles.iter().any(|t| on_disk.contains_key(&t.index())) {
            return Err(DownloadError::NothingToFetch { skipped });
        }

        store.start_run()?;

        let total = tiles.len();
        info!(
            total,
            to_fetch = total - skipped,
            resumed = skipped,
            source = tiles.source_id(),
            zoom = tiles.zoom(),
            "Starting download"
        );

        let source_id = tiles.source_id().to_string();
        let mut images = ImageCollection::new();
        let mut summary = DownloadSummary {
            total,
            ..Default::default()
        };
        let mut statuses = Vec::with_capacity(total);

        let mut sink = |outcome: TileOutcome| -> Result<(), DownloadError> {
            summary.record(outcome.status);
            statuses.push((outcome.index, outcome.status));

            store.upsert(ProgressItem {
                tile_index: outcome.index,
                download_status: outcome.status,
                tile_url: outcome.url,
                tile_image_path: tile_dir.to_path_buf(),
                tile_source_id: source_id.clone(),
                saved: outcome.saved,
            })?;

            if let Some(image) = outcome.image {
                if let Err(e) = images.push(image) {
                    warn!(x = outcome.index.x, y = outcome.index.y, error = %e, "Tile left out of collection");
                }
            }

            if let Some(cb) = on_progress {
                cb(statuses.len(), total);
            }
            Ok(())
        };

        let worker = TileWorker::new(
            self.client.as_ref(),
            tiles.headers(),
            &self.config,
            tile_dir,
            &on_disk,
        );
        self.strategy().execute(tiles.tiles(), &worker, &mut sink)?;

        info!(
            succeeded = summary.succeeded,
            reused = summary.reused,
            skipped = summary.skipped,
            empty = summary.empty,
            failed = summary.failed,
            "Download completed: {}/{} successful",
            summary.available(),
            summary.total
        );

        Ok(DownloadReport {
            images,
            summary,
            statuses,
        })
    }

    /// Clears `need_download` on tiles a prior run finished with the same
    /// source. Returns how many were cleared.
    fn mark_resumed(&self, tiles: &mut TileCollection, store: &ProgressStore) -> usize {
        let source_id = tiles.source_id().to_string();
        let resume = self.config.resume();
        let mut skipped = 0;
        for tile in tiles.iter_mut() {
            let done = resume
                && store.lookup(tile.index()).is_some_and(|item| {
                    item.download_status.is_resumable() && item.tile_source_id == source_id
                });
            tile.set_need_download(!done);
            if done {
                skipped += 1;
            }
        }
        skipped
    }
}
