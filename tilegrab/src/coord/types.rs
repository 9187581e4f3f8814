//! Coordinate types and constants

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum latitude representable in Web Mercator (degrees).
pub const MAX_LAT: f64 = 85.051129;

/// Minimum latitude representable in Web Mercator (degrees).
pub const MIN_LAT: f64 = -85.051129;

/// Minimum longitude (degrees).
pub const MIN_LON: f64 = -180.0;

/// Maximum longitude (degrees).
pub const MAX_LON: f64 = 180.0;

/// Minimum zoom level.
pub const MIN_ZOOM: u8 = 0;

/// Maximum zoom level. Keeps `2^z` comfortably inside `u32`.
pub const MAX_ZOOM: u8 = 24;

/// Half the Web Mercator world width in meters (EPSG:3857).
pub const WEB_MERCATOR_EXTENT: f64 = 20037508.342789244;

/// EPSG code of the Web Mercator projection.
pub const WEB_MERCATOR_EPSG: u16 = 3857;

/// EPSG code of WGS84 geographic coordinates.
pub const WGS84_EPSG: u16 = 4326;

/// Errors from coordinate conversion.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordError {
    #[error("invalid zoom level {0} (supported: {MIN_ZOOM}..={MAX_ZOOM})")]
    InvalidZoom(u8),

    #[error("invalid bounds: min ({min_lon}, {min_lat}) must be below max ({max_lon}, {max_lat})")]
    InvalidBounds {
        min_lon: f64,
        min_lat: f64,
        max_lon: f64,
        max_lat: f64,
    },

    #[error("tile ({x}, {y}) out of range at zoom {z}")]
    TileOutOfRange { x: u32, y: u32, z: u8 },
}

/// A geographic box in EPSG:4326 degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoBounds {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl GeoBounds {
    /// Creates bounds, rejecting empty or inverted boxes.
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Result<Self, CoordError> {
        if !(min_lon < max_lon && min_lat < max_lat) {
            return Err(CoordError::InvalidBounds {
                min_lon,
                min_lat,
                max_lon,
                max_lat,
            });
        }
        Ok(Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        })
    }

    /// Returns true if `(lon, lat)` lies inside or on the edge of the box.
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        lon >= self.min_lon && lon <= self.max_lon && lat >= self.min_lat && lat <= self.max_lat
    }

    /// Geographic midpoint of the box.
    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_lon + self.max_lon) / 2.0,
            (self.min_lat + self.max_lat) / 2.0,
        )
    }

    /// Returns true if any edge lies outside the Web Mercator valid range.
    pub fn exceeds_web_mercator(&self) -> bool {
        self.min_lat < MIN_LAT
            || self.max_lat > MAX_LAT
            || self.min_lon < MIN_LON
            || self.max_lon > MAX_LON
    }

    /// Clips the box to the Web Mercator valid range.
    pub fn clamp_to_web_mercator(&self) -> Self {
        Self {
            min_lon: self.min_lon.max(MIN_LON),
            min_lat: self.min_lat.max(MIN_LAT),
            max_lon: self.max_lon.min(MAX_LON),
            max_lat: self.max_lat.min(MAX_LAT),
        }
    }
}

/// Address of a tile in the slippy-map pyramid.
///
/// Serialized as `[x, y, z]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "[u32; 3]", into = "[u32; 3]")]
pub struct TileIndex {
    pub x: u32,
    pub y: u32,
    pub z: u8,
}

impl TileIndex {
    pub fn new(x: u32, y: u32, z: u8) -> Self {
        Self { x, y, z }
    }

    /// On-disk file stem, `{z}_{x}_{y}`.
    pub fn file_stem(&self) -> String {
        format!("{}_{}_{}", self.z, self.x, self.y)
    }
}

impl std::fmt::Display for TileIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}

impl From<[u32; 3]> for TileIndex {
    fn from(v: [u32; 3]) -> Self {
        // Zoom is bounded by MAX_ZOOM on every path that creates an index.
        Self {
            x: v[0],
            y: v[1],
            z: v[2].min(u8::MAX as u32) as u8,
        }
    }
}

impl From<TileIndex> for [u32; 3] {
    fn from(t: TileIndex) -> Self {
        [t.x, t.y, t.z as u32]
    }
}

/// A box in Web Mercator meters (EPSG:3857).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MercatorBounds {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl MercatorBounds {
    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }
}
