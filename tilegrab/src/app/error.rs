//! Application error types.

use crate::config::ConfigFileError;
use crate::download::DownloadError;
use crate::provider::ProviderError;
use crate::raster::{ExportError, RasterError};
use crate::region::RegionError;
use crate::tile::ResolveError;
use thiserror::Error;

/// Errors from an end-to-end run.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    ConfigFile(#[from] ConfigFileError),

    #[error("Region error: {0}")]
    Region(#[from] RegionError),

    #[error("Tile source error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Tile resolution failed: {0}")]
    Resolve(#[from] ResolveError),

    #[error("Download failed: {0}")]
    Download(#[from] DownloadError),

    #[error("Raster assembly failed: {0}")]
    Raster(#[from] RasterError),

    #[error("Export failed: {0}")]
    Export(#[from] ExportError),

    /// Every tile failed or was skipped; there is nothing to assemble.
    #[error("no tile images were downloaded or found on disk ({failed} failed)")]
    NoImages { failed: usize },
}
