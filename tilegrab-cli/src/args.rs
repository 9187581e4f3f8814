//! Command-line arguments.

use std::path::PathBuf;

use clap::{ArgGroup, Parser, ValueEnum};
use tilegrab::coord::GeoBounds;
use tilegrab::raster::GroupSpec;

/// Built-in tile source selection for CLI arguments.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum SourceType {
    /// OpenStreetMap standard layer (no API key required)
    Osm,
    /// Esri World Imagery (no API key required)
    Esri,
    /// Google satellite layer (no API key required)
    Gsat,
    /// Nearmap vertical imagery (requires API key)
    Nmsat,
}

impl SourceType {
    pub fn name(&self) -> &'static str {
        match self {
            SourceType::Osm => "osm",
            SourceType::Esri => "esri",
            SourceType::Gsat => "gsat",
            SourceType::Nmsat => "nmsat",
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "tilegrab", version)]
#[command(about = "Download map tiles for a region and stitch them into a georeferenced mosaic")]
#[command(group(ArgGroup::new("region").required(true).args(["bbox", "geojson"])))]
pub struct Args {
    /// Bounding box as MIN_LON,MIN_LAT,MAX_LON,MAX_LAT (degrees)
    #[arg(long, value_parser = parse_bbox, allow_hyphen_values = true)]
    pub bbox: Option<GeoBounds>,

    /// GeoJSON file with Polygon/MultiPolygon features
    #[arg(long)]
    pub geojson: Option<PathBuf>,

    /// Keep only tiles intersecting the region's shape
    #[arg(long)]
    pub shape: bool,

    /// With --shape, keep only tiles outside the shape instead
    #[arg(long, requires = "shape")]
    pub invert: bool,

    /// Built-in tile source
    #[arg(long, value_enum, conflicts_with = "url")]
    pub source: Option<SourceType>,

    /// Custom URL template with {z}, {x}, {y} and optional {key}
    #[arg(long)]
    pub url: Option<String>,

    /// API key for sources that need one
    #[arg(long)]
    pub api_key: Option<String>,

    /// Extra request header as NAME:VALUE (repeatable)
    #[arg(long = "header", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Zoom level
    #[arg(short, long)]
    pub zoom: Option<u8>,

    /// Refuse to run when the region needs more tiles than this
    #[arg(long)]
    pub safe_limit: Option<usize>,

    /// Number of download workers
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Download one tile at a time
    #[arg(long)]
    pub sequential: bool,

    /// Ignore the progress ledger from earlier runs
    #[arg(long)]
    pub no_resume: bool,

    /// Reuse tile files already on disk instead of fetching them again
    #[arg(long)]
    pub keep_existing: bool,

    /// Keep downloaded tiles in memory only
    #[arg(long)]
    pub no_save_tiles: bool,

    /// Per-request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Retries per tile after the first attempt
    #[arg(long)]
    pub retries: Option<u32>,

    /// Comma-separated output formats: png, jpg, tiff
    #[arg(short, long)]
    pub formats: Option<String>,

    /// Split the mosaic into windows of WxH tiles
    #[arg(long, value_parser = parse_group)]
    pub group: Option<GroupSpec>,

    /// Overlap neighbouring group windows
    #[arg(long, requires = "group")]
    pub overlap: bool,

    /// Output directory
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Tile directory (default: OUTPUT/tiles)
    #[arg(long)]
    pub tile_dir: Option<PathBuf>,

    /// Stop after downloading tiles
    #[arg(long)]
    pub download_only: bool,

    /// Config file (default: ~/.tilegrab/config.ini)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Only print warnings and errors to the console
    #[arg(short, long)]
    pub quiet: bool,

    /// Do not draw a progress bar
    #[arg(long)]
    pub no_progress: bool,
}

fn parse_bbox(s: &str) -> Result<GeoBounds, String> {
    let parts: Vec<f64> = s
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|e| format!("invalid number in bbox: {}", e))?;
    let [min_lon, min_lat, max_lon, max_lat] = parts[..] else {
        return Err(format!("expected 4 comma-separated values, got {}", parts.len()));
    };
    GeoBounds::new(min_lon, min_lat, max_lon, max_lat).map_err(|e| e.to_string())
}

fn parse_group(s: &str) -> Result<GroupSpec, String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| "expected WxH, e.g. 4x4".to_string())?;
    let w: u32 = w.trim().parse().map_err(|_| format!("invalid width '{}'", w))?;
    let h: u32 = h.trim().parse().map_err(|_| format!("invalid height '{}'", h))?;
    GroupSpec::new(w, h).map_err(|e| e.to_string())
}

fn parse_header(s: &str) -> Result<(String, String), String> {
    let (name, value) = s
        .split_once(':')
        .ok_or_else(|| "expected NAME:VALUE".to_string())?;
    let name = name.trim();
    if name.is_empty() {
        return Err("header name is empty".to_string());
    }
    Ok((name.to_string(), value.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(std::iter::once("tilegrab").chain(args.iter().copied()))
    }

    #[test]
    fn test_bbox_with_negative_values() {
        let args = parse(&["--bbox", "-122.5,37.7,-122.3,37.9", "-z", "10"]).unwrap();
        let b = args.bbox.unwrap();
        assert_eq!(b.min_lon, -122.5);
        assert_eq!(b.max_lat, 37.9);
        assert_eq!(args.zoom, Some(10));
    }

    #[test]
    fn test_region_is_required() {
        assert!(parse(&["-z", "10"]).is_err());
    }

    #[test]
    fn test_bbox_and_geojson_conflict() {
        assert!(parse(&["--bbox", "0,0,1,1", "--geojson", "a.geojson"]).is_err());
    }

    #[test]
    fn test_inverted_bbox_is_rejected() {
        assert!(parse(&["--bbox", "1,0,0,1"]).is_err());
        assert!(parse(&["--bbox", "0,0,1"]).is_err());
    }

    #[test]
    fn test_invert_requires_shape() {
        assert!(parse(&["--geojson", "a.geojson", "--invert"]).is_err());
        let args = parse(&["--geojson", "a.geojson", "--shape", "--invert"]).unwrap();
        assert!(args.invert);
    }

    #[test]
    fn test_group_parsing() {
        let args = parse(&["--bbox", "0,0,1,1", "--group", "4x2", "--overlap"]).unwrap();
        let g = args.group.unwrap();
        assert_eq!((g.width_tiles(), g.height_tiles()), (4, 2));
        assert!(args.overlap);

        assert!(parse(&["--bbox", "0,0,1,1", "--group", "0x2"]).is_err());
        assert!(parse(&["--bbox", "0,0,1,1", "--group", "4"]).is_err());
    }

    #[test]
    fn test_headers_repeat() {
        let args = parse(&[
            "--bbox",
            "0,0,1,1",
            "--header",
            "Referer: https://example.com",
            "--header",
            "X-Token:abc",
        ])
        .unwrap();
        assert_eq!(
            args.headers,
            vec![
                ("Referer".to_string(), "https://example.com".to_string()),
                ("X-Token".to_string(), "abc".to_string()),
            ]
        );
    }

    #[test]
    fn test_source_conflicts_with_url() {
        assert!(parse(&[
            "--bbox",
            "0,0,1,1",
            "--source",
            "osm",
            "--url",
            "https://t/{z}/{x}/{y}.png"
        ])
        .is_err());
    }
}
