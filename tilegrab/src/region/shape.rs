//! Polygon region.

use super::{GeoSource, RegionError};
use crate::coord::GeoBounds;
use geo::{unary_union, BoundingRect, MultiPolygon, Polygon};
use std::path::Path;
use tracing::debug;

/// A region defined by one or more polygons, treated as a single union.
#[derive(Debug, Clone)]
pub struct ShapeRegion {
    bounds: GeoBounds,
    geometry: MultiPolygon<f64>,
}

impl ShapeRegion {
    /// Builds a region from polygons, merging overlapping parts.
    pub fn from_polygons(polygons: Vec<Polygon<f64>>) -> Result<Self, RegionError> {
        if polygons.is_empty() {
            return Err(RegionError::NoPolygons);
        }
        let geometry = unary_union(&polygons);
        Self::new(geometry)
    }

    pub fn new(geometry: MultiPolygon<f64>) -> Result<Self, RegionError> {
        let rect = geometry.bounding_rect().ok_or(RegionError::NoPolygons)?;
        let bounds = GeoBounds::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y)?;

        debug!(
            polygons = geometry.0.len(),
            min_lon = bounds.min_lon,
            min_lat = bounds.min_lat,
            max_lon = bounds.max_lon,
            max_lat = bounds.max_lat,
            "Shape region bounds computed"
        );

        Ok(Self { bounds, geometry })
    }

    /// Loads a region from a GeoJSON file.
    pub fn from_geojson_file(path: &Path) -> Result<Self, RegionError> {
        Self::from_polygons(super::read_geojson(path)?)
    }
}

impl GeoSource for ShapeRegion {
    fn bbox(&self) -> GeoBounds {
        self.bounds
    }

    fn geometry(&self) -> &MultiPolygon<f64> {
        &self.geometry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::LineString;

    fn square(x0: f64, y0: f64, size: f64) -> Polygon<f64> {
        Polygon::new(
            LineString::from(vec![
                (x0, y0),
                (x0 + size, y0),
                (x0 + size, y0 + size),
                (x0, y0 + size),
                (x0, y0),
            ]),
            vec![],
        )
    }

    #[test]
    fn test_bbox_spans_all_polygons() {
        let region =
            ShapeRegion::from_polygons(vec![square(0.0, 0.0, 1.0), square(5.0, 5.0, 1.0)]).unwrap();
        let b = region.bbox();
        assert_eq!((b.min_lon, b.min_lat), (0.0, 0.0));
        assert_eq!((b.max_lon, b.max_lat), (6.0, 6.0));
        assert_eq!(region.geometry().0.len(), 2);
    }

    #[test]
    fn test_overlapping_polygons_are_merged() {
        let region =
            ShapeRegion::from_polygons(vec![square(0.0, 0.0, 2.0), square(1.0, 1.0, 2.0)]).unwrap();
        assert_eq!(region.geometry().0.len(), 1);
    }

    #[test]
    fn test_empty_shape_is_rejected() {
        assert!(matches!(
            ShapeRegion::from_polygons(vec![]),
            Err(RegionError::NoPolygons)
        ));
        assert!(matches!(
            ShapeRegion::new(MultiPolygon::new(vec![])),
            Err(RegionError::NoPolygons)
        ));
    }
}
