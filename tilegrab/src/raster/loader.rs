//! Loading previously saved tile files.
//!
//! Tiles are stored as `{z}_{x}_{y}.{ext}` in a flat directory. Any other
//! file (the progress ledger, mosaics) is ignored.

use super::{ImageCollection, RasterError, TileImage};
use crate::coord::TileIndex;
use crate::tile::TileCollection;
use regex::Regex;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info, warn};

fn tile_file_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // (\d+)_(\d+)_(\d+) - zoom, column, row
    // \.\w+             - any extension
    PATTERN.get_or_init(|| Regex::new(r"^(\d+)_(\d+)_(\d+)\.\w+$").expect("valid tile file pattern"))
}

/// Parses a tile index from a `{z}_{x}_{y}.{ext}` file name.
pub fn parse_tile_file_name(path: &Path) -> Option<TileIndex> {
    let name = path.file_name()?.to_str()?;
    let caps = tile_file_pattern().captures(name)?;
    let z: u8 = caps[1].parse().ok()?;
    let x: u32 = caps[2].parse().ok()?;
    let y: u32 = caps[3].parse().ok()?;
    Some(TileIndex::new(x, y, z))
}

/// Maps every tile file in `dir` to its index.
///
/// A missing directory yields an empty map. When two files share an index
/// (say `.png` and `.jpg`), the first in name order wins.
pub fn scan_tile_dir(dir: &Path) -> Result<BTreeMap<TileIndex, PathBuf>, RasterError> {
    let mut found = BTreeMap::new();
    if !dir.exists() {
        return Ok(found);
    }

    let io_err = |source: std::io::Error| RasterError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(io_err)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file())
        .collect();
    paths.sort();

    for path in paths {
        if let Some(index) = parse_tile_file_name(&path) {
            found.entry(index).or_insert(path);
        }
    }

    debug!(dir = %dir.display(), files = found.len(), "Tile directory scanned");
    Ok(found)
}

/// Loads the images for the tiles of `tiles` present in `dir`.
///
/// Files that fail to decode are logged and skipped. The download engine
/// loads resumed tiles one at a time; this is for callers rebuilding a
/// mosaic from an existing tile directory without downloading.
pub fn load_images(dir: &Path, tiles: &TileCollection) -> Result<ImageCollection, RasterError> {
    let files = scan_tile_dir(dir)?;
    let mut collection = ImageCollection::new();

    for tile in tiles {
        let Some(path) = files.get(&tile.index()) else {
            continue;
        };
        match TileImage::open(path, tile.url()) {
            Ok(image) => collection.push(image)?,
            Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable tile file"),
        }
    }

    info!(loaded = collection.len(), requested = tiles.len(), "Loaded {} images", collection.len());
    Ok(collection)
}

/// Loads every tile file in `dir` at zoom `zoom`.
///
/// Not used by the pipeline. Lets callers and integration tests inspect
/// what a run left on disk.
pub fn load_directory(dir: &Path, zoom: u8) -> Result<ImageCollection, RasterError> {
    let files = scan_tile_dir(dir)?;
    let mut collection = ImageCollection::new();

    for (index, path) in files.iter().filter(|(index, _)| index.z == zoom) {
        match TileImage::open(path, "") {
            Ok(image) => collection.push(image)?,
            Err(e) => warn!(tile = %index, error = %e, "Skipping unreadable tile file"),
        }
    }

    info!(dir = %dir.display(), zoom, loaded = collection.len(), "Tile directory loaded");
    Ok(collection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::test_support::encoded;
    use crate::tile::Tile;
    use image::ImageFormat;

    #[test]
    fn test_parse_tile_file_name() {
        assert_eq!(
            parse_tile_file_name(Path::new("/tmp/10_163_395.png")),
            Some(TileIndex::new(163, 395, 10))
        );
        assert_eq!(
            parse_tile_file_name(Path::new("3_1_2.jpg")),
            Some(TileIndex::new(1, 2, 3))
        );
        assert_eq!(parse_tile_file_name(Path::new(".dlprog.tilegrab")), None);
        assert_eq!(parse_tile_file_name(Path::new("mosaic.png")), None);
        assert_eq!(parse_tile_file_name(Path::new("10_1_2")), None);
        assert_eq!(parse_tile_file_name(Path::new("x10_1_2.png")), None);
    }

    #[test]
    fn test_scan_missing_dir_is_empty() {
        let found = scan_tile_dir(Path::new("/nonexistent/tiles")).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn test_scan_ignores_other_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("10_1_2.png"), b"x").unwrap();
        fs::write(dir.path().join("10_1_3.jpg"), b"x").unwrap();
        fs::write(dir.path().join(".dlprog.tilegrab"), b"{}").unwrap();
        fs::write(dir.path().join("notes.txt"), b"").unwrap();

        let found = scan_tile_dir(dir.path()).unwrap();
        assert_eq!(found.len(), 2);
        assert!(found.contains_key(&TileIndex::new(1, 3, 10)));
    }

    #[test]
    fn test_load_images_for_collection() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("5_1_2.png"), encoded([9, 9, 9], ImageFormat::Png)).unwrap();
        fs::write(dir.path().join("5_2_2.png"), b"corrupt").unwrap();

        let tiles = TileCollection::new(
            vec![
                Tile::new(TileIndex::new(1, 2, 5), "u1").unwrap(),
                Tile::new(TileIndex::new(2, 2, 5), "u2").unwrap(),
                Tile::new(TileIndex::new(3, 2, 5), "u3").unwrap(),
            ],
            5,
            "osm",
            Default::default(),
            10,
        )
        .unwrap();

        let images = load_images(dir.path(), &tiles).unwrap();
        assert_eq!(images.len(), 1);
        let first = images.iter().next().unwrap();
        assert_eq!(first.index(), TileIndex::new(1, 2, 5));
        assert_eq!(first.url(), "u1");
    }

    #[test]
    fn test_load_directory_filters_zoom() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("5_1_2.png"), encoded([1, 1, 1], ImageFormat::Png)).unwrap();
        fs::write(dir.path().join("5_1_3.png"), encoded([1, 1, 1], ImageFormat::Png)).unwrap();
        fs::write(dir.path().join("6_1_2.png"), encoded([1, 1, 1], ImageFormat::Png)).unwrap();

        let images = load_directory(dir.path(), 5).unwrap();
        assert_eq!(images.len(), 2);
        assert_eq!(images.zoom(), Some(5));
    }
}
