//! Resolves run settings from CLI args and the config file.
//!
//! CLI flags take precedence, then the config file, then library defaults.

use std::path::PathBuf;
use std::time::Duration;

use tilegrab::app::{AppConfig, RegionSpec};
use tilegrab::config::ConfigFile;
use tilegrab::provider::ProviderConfig;
use tilegrab::raster::ExportFormat;
use tilegrab::tile::SelectionMode;

use crate::args::Args;
use crate::error::CliError;

/// Output directory used when neither the CLI nor the config file names one.
pub const DEFAULT_OUTPUT_DIR: &str = "tilegrab-output";

/// Loads the config file named by `--config`, or the default one.
pub fn load_config_file(args: &Args) -> Result<ConfigFile, CliError> {
    let file = match &args.config {
        Some(path) => {
            if !path.exists() {
                return Err(CliError::Config(format!(
                    "config file {} does not exist",
                    path.display()
                )));
            }
            ConfigFile::load_from(path)?
        }
        None => ConfigFile::load()?,
    };
    Ok(file)
}

/// Resolve the tile source from CLI args and config.
pub fn resolve_provider(args: &Args, config: &ConfigFile) -> Result<ProviderConfig, CliError> {
    let api_key = args.api_key.clone().or_else(|| config.provider.api_key.clone());

    if let Some(url) = &args.url {
        return Ok(ProviderConfig::template("custom", url.clone(), api_key));
    }
    if let Some(source) = args.source {
        return ProviderConfig::from_name(source.name(), api_key)
            .map_err(|e| CliError::Config(e.to_string()));
    }

    let from_file = config.provider.provider_config()?;
    Ok(match from_file {
        // A CLI key still applies to a source chosen in the file.
        Some(ProviderConfig::Nearmap { api_key: file_key }) => ProviderConfig::Nearmap {
            api_key: args.api_key.clone().or(file_key),
        },
        Some(other) => other,
        None => ProviderConfig::Osm,
    })
}

fn selection_mode(args: &Args) -> SelectionMode {
    match (args.shape, args.invert) {
        (true, true) => SelectionMode::ShapeInverted,
        (true, false) => SelectionMode::Shape,
        _ => SelectionMode::BBox,
    }
}

/// Builds the run configuration.
pub fn build_app_config(args: &Args, config: &ConfigFile) -> Result<AppConfig, CliError> {
    let region = match (&args.bbox, &args.geojson) {
        (Some(bbox), _) => RegionSpec::BBox(*bbox),
        (None, Some(path)) => RegionSpec::GeoJson(path.clone()),
        (None, None) => {
            return Err(CliError::Config(
                "either --bbox or --geojson is required".to_string(),
            ))
        }
    };

    let zoom = args.zoom.or(config.tiles.zoom).ok_or_else(|| {
        CliError::Config("no zoom level: pass --zoom or set zoom under [tiles]".to_string())
    })?;

    let output_dir = args
        .output
        .clone()
        .or_else(|| config.output.directory.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));

    let provider = resolve_provider(args, config)?;

    let mut download = config.download;
    if let Some(workers) = args.workers {
        download = download.with_workers(workers);
    }
    if let Some(secs) = args.timeout {
        download = download.with_timeout(Duration::from_secs(secs));
    }
    if let Some(retries) = args.retries {
        download = download.with_max_retries(retries);
    }
    if args.sequential {
        download = download.with_parallel(false);
    }
    if args.no_resume {
        download = download.with_resume(false);
    }
    if args.keep_existing {
        download = download.with_overwrite(false);
    }
    if args.no_save_tiles {
        download = download.with_save_tiles(false);
    }

    let mut app = AppConfig::new(region, provider, zoom, output_dir)
        .with_config_file(config)
        .with_mode(selection_mode(args))
        .with_download(download)
        .with_grouping(args.group.map(|g| g.with_overlap(args.overlap)))
        .with_headers(args.headers.iter().cloned().collect())
        .with_download_only(args.download_only);

    if let Some(limit) = args.safe_limit {
        app = app.with_safe_limit(limit);
    }
    if let Some(list) = &args.formats {
        let formats =
            ExportFormat::parse_list(list).map_err(|e| CliError::Config(e.to_string()))?;
        app = app.with_formats(formats);
    }
    if let Some(dir) = &args.tile_dir {
        app = app.with_tile_dir(dir.clone());
    }

    Ok(app)
}
