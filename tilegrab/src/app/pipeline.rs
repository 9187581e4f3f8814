//! The end-to-end pipeline.
//!
//! region → resolver → downloader → mosaic → (groups) → export

use super::{AppConfig, AppError, RegionSpec};
use crate::download::{DownloadSummary, Downloader, HttpClient, ProgressCallback, ReqwestClient};
use crate::provider::create_source_with_headers;
use crate::raster::{build_mosaic, export_groups, export_mosaic, group_mosaic};
use crate::region::{BoundsRegion, GeoSource, ShapeRegion};
use crate::tile::TileIndexResolver;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// What a run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Tiles selected for the region.
    pub tiles: usize,
    pub summary: DownloadSummary,
    /// Mosaic pixel size, if one was assembled.
    pub mosaic_size: Option<(u32, u32)>,
    /// Files written by the exporter.
    pub outputs: Vec<PathBuf>,
    pub tile_dir: PathBuf,
}

/// Loads the configured region.
pub fn load_region(spec: &RegionSpec) -> Result<Box<dyn GeoSource>, AppError> {
    Ok(match spec {
        RegionSpec::BBox(bounds) => Box::new(BoundsRegion::from_bounds(*bounds)),
        RegionSpec::GeoJson(path) => Box::new(ShapeRegion::from_geojson_file(path)?),
    })
}

/// Runs the pipeline over a real HTTP client.
pub fn run(config: &AppConfig, on_progress: Option<&ProgressCallback<'_>>) -> Result<RunReport, AppError> {
    let client = ReqwestClient::from_config(&config.download)
        .map_err(crate::download::DownloadError::from)?;
    run_with_client(config, Arc::new(client), on_progress)
}

/// Runs the pipeline over `client`.
pub fn run_with_client(
    config: &AppConfig,
    client: Arc<dyn HttpClient>,
    on_progress: Option<&ProgressCallback<'_>>,
) -> Result<RunReport, AppError> {
    config.validate()?;

    let region = load_region(&config.region)?;
    let source = create_source_with_headers(&config.provider, config.headers.clone())?;

    let mut tiles = TileIndexResolver::new(region.as_ref(), config.zoom)
        .with_source(source.as_ref())
        .with_mode(config.mode)
        .with_safe_limit(config.safe_limit)
        .resolve()?;
    info!(tiles = tiles.len(), extent = %tiles.extent(), "Tiles resolved");

    let tile_dir = config.tile_dir();
    let downloader = Downloader::new(client, config.download);
    let report = downloader.download(&mut tiles, &tile_dir, on_progress)?;

    let mut run = RunReport {
        tiles: tiles.len(),
        summary: report.summary,
        mosaic_size: None,
        outputs: Vec::new(),
        tile_dir,
    };

    if config.download_only {
        info!(dir = %run.tile_dir.display(), "Download-only run; skipping mosaic");
        return Ok(run);
    }

    if report.images.is_empty() {
        return Err(AppError::NoImages {
            failed: report.summary.failed,
        });
    }

    let mosaic = build_mosaic(&report.images)?;
    run.mosaic_size = Some((mosaic.width(), mosaic.height()));

    run.outputs = match config.grouping {
        Some(spec) => {
            let groups = group_mosaic(mosaic.image(), mosaic.tile_size(), spec);
            export_groups(groups, &config.output_dir, &config.formats)?
        }
        None => export_mosaic(&mosaic, &config.output_dir, &config.formats)?,
    };

    info!(files = run.outputs.len(), dir = %config.output_dir.display(), "Run complete");
    Ok(run)
}
