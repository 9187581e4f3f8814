//! Configuration for an end-to-end run.

use super::AppError;
use crate::config::ConfigFile;
use crate::coord::{GeoBounds, MAX_ZOOM};
use crate::download::DownloadConfig;
use crate::provider::{ProviderConfig, ProviderError};
use crate::raster::{ExportFormat, GroupSpec};
use crate::tile::{SelectionMode, DEFAULT_SAFE_LIMIT};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Subdirectory of the output directory holding raw tiles and the ledger.
pub const TILE_DIR_NAME: &str = "tiles";

/// Where the region comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum RegionSpec {
    /// `min_lon, min_lat, max_lon, max_lat` in degrees.
    BBox(GeoBounds),
    /// A GeoJSON file with polygon features.
    GeoJson(PathBuf),
}

/// Everything one run needs.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub region: RegionSpec,
    pub mode: SelectionMode,
    pub provider: ProviderConfig,
    /// Extra request headers on top of the source's own.
    pub headers: BTreeMap<String, String>,
    pub zoom: u8,
    pub safe_limit: usize,
    pub download: DownloadConfig,
    pub output_dir: PathBuf,
    /// Defaults to `{output_dir}/tiles`.
    pub tile_dir: Option<PathBuf>,
    pub formats: Vec<ExportFormat>,
    pub grouping: Option<GroupSpec>,
    /// Stop after downloading.
    pub download_only: bool,
}

impl AppConfig {
    pub fn new(
        region: RegionSpec,
        provider: ProviderConfig,
        zoom: u8,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            region,
            mode: SelectionMode::default(),
            provider,
            headers: BTreeMap::new(),
            zoom,
            safe_limit: DEFAULT_SAFE_LIMIT,
            download: DownloadConfig::default(),
            output_dir: output_dir.into(),
            tile_dir: None,
            formats: vec![ExportFormat::Png],
            grouping: None,
            download_only: false,
        }
    }

    /// Seeds download, limit and format settings from a config file.
    pub fn with_config_file(mut self, file: &ConfigFile) -> Self {
        self.download = file.download;
        self.safe_limit = file.tiles.safe_limit;
        self.formats = file.output.formats.clone();
        self
    }

    pub fn with_mode(mut self, mode: SelectionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_safe_limit(mut self, limit: usize) -> Self {
        self.safe_limit = limit;
        self
    }

    pub fn with_download(mut self, download: DownloadConfig) -> Self {
        self.download = download;
        self
    }

    pub fn with_tile_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.tile_dir = Some(dir.into());
        self
    }

    pub fn with_formats(mut self, formats: Vec<ExportFormat>) -> Self {
        self.formats = formats;
        self
    }

    pub fn with_grouping(mut self, grouping: Option<GroupSpec>) -> Self {
        self.grouping = grouping;
        self
    }

    pub fn with_headers(mut self, headers: BTreeMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_download_only(mut self, download_only: bool) -> Self {
        self.download_only = download_only;
        self
    }

    pub fn tile_dir(&self) -> PathBuf {
        self.tile_dir
            .clone()
            .unwrap_or_else(|| self.output_dir.join(TILE_DIR_NAME))
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Checks everything that can be checked without I/O.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.zoom > MAX_ZOOM {
            return Err(AppError::Config(format!(
                "zoom {} is out of range (0..={})",
                self.zoom, MAX_ZOOM
            )));
        }
        if self.safe_limit == 0 {
            return Err(AppError::Config("safe limit must be at least 1".to_string()));
        }
        if self.provider.requires_api_key() && self.provider.api_key().is_none() {
            let id = match &self.provider {
                ProviderConfig::Template { id, .. } => id.clone(),
                _ => "nmsat".to_string(),
            };
            return Err(ProviderError::MissingApiKey(id).into());
        }
        if self.download_only {
            return Ok(());
        }
        if self.formats.is_empty() {
            return Err(crate::raster::ExportError::NoFormats.into());
        }
        if self.grouping.is_some() {
            if let Some(format) = self.formats.iter().find(|f| f.is_georeferenced()) {
                return Err(crate::raster::ExportError::NotSupported(format!(
                    "grouped output cannot be written as {}; use png or jpg",
                    format
                ))
                .into());
            }
        }
        Ok(())
    }
}
