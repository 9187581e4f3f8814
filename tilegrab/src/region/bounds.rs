//! Rectangular region.

use super::{GeoSource, RegionError};
use crate::coord::GeoBounds;
use geo::{LineString, MultiPolygon, Polygon};

/// A region defined by a bounding box alone.
///
/// Its geometry is the box itself, so shape-mode selection over a
/// `BoundsRegion` keeps the same tiles as bbox mode.
#[derive(Debug, Clone)]
pub struct BoundsRegion {
    bounds: GeoBounds,
    geometry: MultiPolygon<f64>,
}

impl BoundsRegion {
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Result<Self, RegionError> {
        let bounds = GeoBounds::new(min_lon, min_lat, max_lon, max_lat)?;
        Ok(Self::from_bounds(bounds))
    }

    pub fn from_bounds(bounds: GeoBounds) -> Self {
        Self {
            bounds,
            geometry: MultiPolygon::new(vec![bounds_polygon(&bounds)]),
        }
    }
}

impl GeoSource for BoundsRegion {
    fn bbox(&self) -> GeoBounds {
        self.bounds
    }

    fn geometry(&self) -> &MultiPolygon<f64> {
        &self.geometry
    }
}

/// Closed rectangle polygon for a geographic box.
pub(crate) fn bounds_polygon(b: &GeoBounds) -> Polygon<f64> {
    Polygon::new(
        LineString::from(vec![
            (b.min_lon, b.min_lat),
            (b.max_lon, b.min_lat),
            (b.max_lon, b.max_lat),
            (b.min_lon, b.max_lat),
            (b.min_lon, b.min_lat),
        ]),
        vec![],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_region_reports_its_box() {
        let region = BoundsRegion::new(-122.5, 37.7, -122.3, 37.9).unwrap();
        let b = region.bbox();
        assert_eq!(b.min_lon, -122.5);
        assert_eq!(b.max_lat, 37.9);
        assert_eq!(region.geometry().0.len(), 1);
    }

    #[test]
    fn test_bounds_region_rejects_inverted_box() {
        let result = BoundsRegion::new(10.0, 10.0, 0.0, 20.0);
        assert!(matches!(result, Err(RegionError::Bounds(_))));
    }
}
