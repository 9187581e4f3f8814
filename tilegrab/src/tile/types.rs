//! Tile and tile collection types.

use crate::coord::{tile_to_bounds, CoordError, GeoBounds, TileIndex};
use crate::region::bounds_polygon;
use crate::provider::ProviderError;
use geo::Polygon;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Errors from tile-index resolution.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Coord(#[from] CoordError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// More tiles than the configured safety limit.
    #[error("query exceeds the tile limit: {}{count} tiles > {limit}", count_qualifier(.exact))]
    LimitExceeded { count: u64, limit: usize, exact: bool },

    /// The selection kept no tiles.
    #[error("no tiles selected for the region at zoom {zoom}")]
    NoTiles { zoom: u8 },

    /// Tiles in one collection must share a zoom level.
    #[error("mixed zoom levels in tile collection ({expected} and {found})")]
    MixedZoom { expected: u8, found: u8 },
}

fn count_qualifier(exact: &bool) -> &'static str {
    if *exact {
        ""
    } else {
        "at least "
    }
}

/// A single tile to fetch.
///
/// The index, bounds and URL are fixed at construction. Only the
/// `need_download` flag changes, when a resumed run finds the tile already
/// fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    index: TileIndex,
    bounds: GeoBounds,
    url: String,
    need_download: bool,
}

impl Tile {
    pub fn new(index: TileIndex, url: impl Into<String>) -> Result<Self, CoordError> {
        let bounds = tile_to_bounds(index.x, index.y, index.z)?;
        Ok(Self {
            index,
            bounds,
            url: url.into(),
            need_download: true,
        })
    }

    pub fn index(&self) -> TileIndex {
        self.index
    }

    pub fn bounds(&self) -> GeoBounds {
        self.bounds
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn need_download(&self) -> bool {
        self.need_download
    }

    pub fn set_need_download(&mut self, value: bool) {
        self.need_download = value;
    }

    /// Tile footprint as a polygon in EPSG:4326 degrees.
    pub fn polygon(&self) -> Polygon<f64> {
        bounds_polygon(&self.bounds)
    }
}

/// Inclusive tile-index rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileExtent {
    pub min_x: u32,
    pub max_x: u32,
    pub min_y: u32,
    pub max_y: u32,
}

impl TileExtent {
    /// Smallest extent covering all `indices`, or `None` when empty.
    pub fn covering<I>(indices: I) -> Option<Self>
    where
        I: IntoIterator<Item = TileIndex>,
    {
        indices.into_iter().fold(None, |acc, t| {
            Some(match acc {
                None => Self {
                    min_x: t.x,
                    max_x: t.x,
                    min_y: t.y,
                    max_y: t.y,
                },
                Some(e) => Self {
                    min_x: e.min_x.min(t.x),
                    max_x: e.max_x.max(t.x),
                    min_y: e.min_y.min(t.y),
                    max_y: e.max_y.max(t.y),
                },
            })
        })
    }

    /// Number of columns.
    pub fn columns(&self) -> u32 {
        self.max_x - self.min_x + 1
    }

    /// Number of rows.
    pub fn rows(&self) -> u32 {
        self.max_y - self.min_y + 1
    }

    /// Number of tiles in the rectangle.
    pub fn tile_count(&self) -> u64 {
        self.columns() as u64 * self.rows() as u64
    }
}

impl fmt::Display for TileExtent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "x=({}, {}) y=({}, {})",
            self.min_x, self.max_x, self.min_y, self.max_y
        )
    }
}

/// Ordered set of tiles selected for one run.
///
/// Membership is fixed once built. The extent covers the member tiles only,
/// so a shape-clipped selection places its mosaic without blank margins.
#[derive(Debug, Clone)]
pub struct TileCollection {
    tiles: Vec<Tile>,
    zoom: u8,
    extent: TileExtent,
    source_id: String,
    headers: BTreeMap<String, String>,
    safe_limit: usize,
}

impl TileCollection {
    /// Builds a collection, enforcing the safety limit.
    pub fn new(
        tiles: Vec<Tile>,
        zoom: u8,
        source_id: impl Into<String>,
        headers: BTreeMap<String, String>,
        safe_limit: usize,
    ) -> Result<Self, ResolveError> {
        if tiles.len() > safe_limit {
            return Err(ResolveError::LimitExceeded {
                count: tiles.len() as u64,
                limit: safe_limit,
                exact: true,
            });
        }
        if let Some(other) = tiles.iter().find(|t| t.index.z != zoom) {
            return Err(ResolveError::MixedZoom {
                expected: zoom,
                found: other.index.z,
            });
        }
        let extent = TileExtent::covering(tiles.iter().map(Tile::index))
            .ok_or(ResolveError::NoTiles { zoom })?;

        Ok(Self {
            tiles,
            zoom,
            extent,
            source_id: source_id.into(),
            headers,
            safe_limit,
        })
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    /// Extrema of the member tiles.
    pub fn extent(&self) -> TileExtent {
        self.extent
    }

    /// Identifier of the source that produced the URLs.
    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    /// Static request headers of the source.
    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    pub fn safe_limit(&self) -> usize {
        self.safe_limit
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Tile> {
        self.tiles.iter()
    }

    /// Mutable access for updating `need_download` flags.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Tile> {
        self.tiles.iter_mut()
    }

    pub fn get(&self, index: TileIndex) -> Option<&Tile> {
        self.tiles.iter().find(|t| t.index == index)
    }

    /// Number of tiles still marked for download.
    pub fn pending(&self) -> usize {
        self.tiles.iter().filter(|t| t.need_download).count()
    }
}

impl<'a> IntoIterator for &'a TileCollection {
    type Item = &'a Tile;
    type IntoIter = std::slice::Iter<'a, Tile>;

    fn into_iter(self) -> Self::IntoIter {
        self.tiles.iter()
    }
}

impl fmt::Display for TileCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TileCollection(len={}, zoom={}, {})",
            self.tiles.len(),
            self.zoom,
            self.extent
        )
    }
}
