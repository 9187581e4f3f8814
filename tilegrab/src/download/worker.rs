//! Per-tile fetch and classification.

use super::http::{fetch_with_retry, HttpClient};
use super::{DownloadConfig, DownloadStatus};
use crate::coord::TileIndex;
use crate::raster::TileImage;
use crate::tile::Tile;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// What happened to one tile.
#[derive(Debug)]
pub struct TileOutcome {
    pub index: TileIndex,
    pub url: String,
    pub status: DownloadStatus,
    pub image: Option<TileImage>,
    /// The payload is on disk in the tile directory.
    pub saved: bool,
}

impl TileOutcome {
    fn without_image(tile: &Tile, status: DownloadStatus) -> Self {
        Self {
            index: tile.index(),
            url: tile.url().to_string(),
            status,
            image: None,
            saved: false,
        }
    }

    fn with_image(tile: &Tile, status: DownloadStatus, image: TileImage, saved: bool) -> Self {
        Self {
            index: tile.index(),
            url: tile.url().to_string(),
            status,
            image: Some(image),
            saved,
        }
    }
}

/// Runs the per-tile state machine. Shared read-only by all workers.
pub struct TileWorker<'a> {
    client: &'a dyn HttpClient,
    headers: &'a BTreeMap<String, String>,
    config: &'a DownloadConfig,
    tile_dir: &'a Path,
    /// Tile files already present in `tile_dir` when the run started.
    on_disk: &'a BTreeMap<TileIndex, PathBuf>,
}

impl<'a> TileWorker<'a> {
    pub fn new(
        client: &'a dyn HttpClient,
        headers: &'a BTreeMap<String, String>,
        config: &'a DownloadConfig,
        tile_dir: &'a Path,
        on_disk: &'a BTreeMap<TileIndex, PathBuf>,
    ) -> Self {
        Self {
            client,
            headers,
            config,
            tile_dir,
            on_disk,
        }
    }

    /// Processes one tile. Never fails; errors become a status.
    pub fn process(&self, tile: &Tile) -> TileOutcome {
        if !tile.need_download() {
            return self.reconcile_skip(tile);
        }

        if !self.config.overwrite() {
            if let Some(image) = self.load_saved(tile) {
                debug!(x = tile.index().x, y = tile.index().y, "Tile already on disk");
                return TileOutcome::with_image(tile, DownloadStatus::AlreadyExists, image, true);
            }
        }

        self.fetch(tile)
    }

    fn load_saved(&self, tile: &Tile) -> Option<TileImage> {
        let path = self.on_disk.get(&tile.index())?;
        match TileImage::open(path, tile.url()) {
            Ok(image) => Some(image),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Saved tile is unreadable");
                None
            }
        }
    }

    /// A skipped tile contributes its saved image if one can be loaded.
    fn reconcile_skip(&self, tile: &Tile) -> TileOutcome {
        match self.load_saved(tile) {
            Some(image) => {
                TileOutcome::with_image(tile, DownloadStatus::SkipAndExists, image, true)
            }
            None => {
                let index = tile.index();
                warn!(
                    x = index.x,
                    y = index.y,
                    z = index.z,
                    "Tile marked done in progress file but not found on disk; not re-fetching"
                );
                TileOutcome::without_image(tile, DownloadStatus::Skip)
            }
        }
    }

    fn fetch(&self, tile: &Tile) -> TileOutcome {
        let index = tile.index();
        let url = tile.url();

        let response = match fetch_with_retry(self.client, url, self.headers, self.config) {
            Ok(response) => response,
            Err(e) => {
                warn!(x = index.x, y = index.y, z = index.z, url, error = %e, "Tile request failed");
                return TileOutcome::without_image(tile, DownloadStatus::Undefined);
            }
        };

        if !response.is_success() {
            warn!(x = index.x, y = index.y, z = index.z, url, status = response.status, "Tile request rejected");
            return TileOutcome::without_image(tile, DownloadStatus::Undefined);
        }
        if !response.is_image() {
            warn!(
                x = index.x,
                y = index.y,
                z = index.z,
                url,
                content_type = response.content_type.as_deref().unwrap_or(""),
                "Response is not an image"
            );
            return TileOutcome::without_image(tile, DownloadStatus::Failed);
        }
        if response.body.is_empty() {
            warn!(x = index.x, y = index.y, z = index.z, url, "Empty tile body");
            return TileOutcome::without_image(tile, DownloadStatus::Empty);
        }

        let mut image = match TileImage::decode(tile, &response.body) {
            Ok(image) => image,
            Err(e) => {
                warn!(x = index.x, y = index.y, z = index.z, url, error = %e, "Tile did not decode");
                return TileOutcome::without_image(tile, DownloadStatus::Failed);
            }
        };

        let saved = self.config.save_tiles() && self.save(&mut image, &response.body);
        TileOutcome::with_image(tile, DownloadStatus::Success, image, saved)
    }

    /// Writes the raw payload as `{z}_{x}_{y}.{ext}`.
    ///
    /// The payload is written to a `.tmp` sibling and renamed into place.
    fn save(&self, image: &mut TileImage, body: &[u8]) -> bool {
        let path = self.tile_dir.join(image.file_name());
        match write_replacing(&path, body) {
            Ok(()) => {
                image.set_path(path);
                true
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to save tile");
                false
            }
        }
    }
}

fn write_replacing(path: &Path, body: &[u8]) -> std::io::Result<()> {
    let mut tmp: OsString = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    std::fs::write(&tmp, body)?;
    std::fs::rename(&tmp, path).inspect_err(|_| {
        let _ = std::fs::remove_file(&tmp);
    })
}
