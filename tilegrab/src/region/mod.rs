//! Geographic regions that drive tile selection.
//!
//! A [`GeoSource`] supplies a WGS84 bounding box and a polygon geometry. The
//! resolver enumerates tiles over the box and, in shape mode, clips them
//! against the geometry.

mod bounds;
mod geojson;
mod shape;

pub use bounds::BoundsRegion;
pub(crate) use bounds::bounds_polygon;
pub use geojson::{parse_geojson, read_geojson};
pub use shape::ShapeRegion;

use crate::coord::{CoordError, GeoBounds};
use geo::MultiPolygon;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building a region.
#[derive(Debug, Error)]
pub enum RegionError {
    #[error("failed to read region file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid GeoJSON: {0}")]
    InvalidGeoJson(String),

    #[error("unsupported coordinate reference system '{0}' (expected WGS84 / EPSG:4326)")]
    UnsupportedCrs(String),

    #[error("region contains no polygon geometry")]
    NoPolygons,

    #[error(transparent)]
    Bounds(#[from] CoordError),
}

/// Read-only provider of a region's extent and shape.
///
/// Both values are computed once when the region is built.
pub trait GeoSource: Send + Sync {
    /// Bounding box in EPSG:4326 degrees.
    fn bbox(&self) -> GeoBounds;

    /// Combined region geometry in EPSG:4326 degrees.
    fn geometry(&self) -> &MultiPolygon<f64>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geo_source_is_object_safe_and_send_sync() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn GeoSource>();
    }
}
