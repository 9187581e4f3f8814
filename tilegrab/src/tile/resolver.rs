//! Tile-index resolution.
//!
//! Converts a region into the set of tiles covering it at one zoom level.
//! The candidate rectangle runs from the tile under the region's north-west
//! corner to the tile under its south-east corner. Shape modes then keep
//! the candidates whose footprint does (or, inverted, does not) intersect
//! the region geometry.

use super::types::{ResolveError, Tile, TileCollection, TileExtent};
use crate::coord::{lon_lat_to_tile, GeoBounds, TileIndex};
use crate::provider::TileSource;
use crate::region::GeoSource;
use geo::Intersects;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Default cap on tiles per run.
pub const DEFAULT_SAFE_LIMIT: usize = 250;

/// Inset applied to the south-east corner so a coordinate lying exactly on
/// a tile edge does not pull in an extra row or column.
pub const CORNER_EPSILON: f64 = 1e-11;

/// Above this many candidates, shape modes stop counting once the limit is
/// passed instead of testing every candidate.
const EXACT_COUNT_CANDIDATES: u64 = 1 << 22;

/// How candidate tiles are filtered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionMode {
    /// Every tile in the bounding rectangle.
    #[default]
    BBox,
    /// Tiles intersecting the region geometry.
    Shape,
    /// Tiles in the rectangle that do not intersect the geometry.
    ShapeInverted,
}

impl SelectionMode {
    fn clips(&self) -> bool {
        !matches!(self, Self::BBox)
    }
}

/// Resolves a region into a [`TileCollection`].
///
/// # Example
///
/// ```
/// use tilegrab::region::BoundsRegion;
/// use tilegrab::tile::TileIndexResolver;
///
/// let region = BoundsRegion::new(-122.5, 37.7, -122.3, 37.9).unwrap();
/// let tiles = TileIndexResolver::new(&region, 10).resolve().unwrap();
/// assert!(!tiles.is_empty());
/// ```
pub struct TileIndexResolver<'a> {
    region: &'a dyn GeoSource,
    source: Option<&'a dyn TileSource>,
    zoom: u8,
    safe_limit: usize,
    mode: SelectionMode,
}

impl<'a> TileIndexResolver<'a> {
    pub fn new(region: &'a dyn GeoSource, zoom: u8) -> Self {
        Self {
            region,
            source: None,
            zoom,
            safe_limit: DEFAULT_SAFE_LIMIT,
            mode: SelectionMode::BBox,
        }
    }

    /// Embeds URLs, headers and the source id from `source`.
    pub fn with_source(mut self, source: &'a dyn TileSource) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_mode(mut self, mode: SelectionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_safe_limit(mut self, safe_limit: usize) -> Self {
        self.safe_limit = safe_limit;
        self
    }

    /// Region bounds clipped to the Web Mercator latitude range.
    fn clamped_bounds(&self) -> GeoBounds {
        let bbox = self.region.bbox();
        if bbox.exceeds_web_mercator() {
            warn!(
                min_lat = bbox.min_lat,
                max_lat = bbox.max_lat,
                "Region bounds exceed Web Mercator limits, clipping"
            );
            bbox.clamp_to_web_mercator()
        } else {
            bbox
        }
    }

    /// Tile rectangle spanned by the region's corners.
    pub fn candidate_extent(&self) -> Result<TileExtent, ResolveError> {
        let b = self.clamped_bounds();
        let (min_x, min_y) = lon_lat_to_tile(b.min_lon, b.max_lat, self.zoom)?;
        let (max_x, max_y) = lon_lat_to_tile(
            b.max_lon - CORNER_EPSILON,
            b.min_lat + CORNER_EPSILON,
            self.zoom,
        )?;

        debug!(
            upper_left_x = min_x,
            upper_left_y = min_y,
            lower_right_x = max_x,
            lower_right_y = max_y,
            zoom = self.zoom,
            "Corner tiles computed"
        );

        Ok(TileExtent {
            min_x,
            max_x: max_x.max(min_x),
            min_y,
            max_y: max_y.max(min_y),
        })
    }

    fn keep(&self, index: TileIndex) -> Result<bool, ResolveError> {
        if !self.mode.clips() {
            return Ok(true);
        }
        // Footprint only; the URL is resolved for kept tiles.
        let footprint = Tile::new(index, "")?.polygon();
        let hit = self.region.geometry().intersects(&footprint);
        Ok(match self.mode {
            SelectionMode::Shape => hit,
            _ => !hit,
        })
    }

    /// Enumerates, filters and bounds-checks the tiles.
    pub fn resolve(&self) -> Result<TileCollection, ResolveError> {
        if let Some(source) = self.source {
            source.check_zoom(self.zoom)?;
        }

        let candidates = self.candidate_extent()?;
        let candidate_count = candidates.tile_count();
        info!(
            zoom = self.zoom,
            mode = ?self.mode,
            safe_limit = self.safe_limit,
            candidates = candidate_count,
            "Resolving tiles: {}",
            candidates
        );

        // Plain rectangles can be rejected before enumerating anything.
        if !self.mode.clips() && candidate_count > self.safe_limit as u64 {
            warn!(count = candidate_count, limit = self.safe_limit, "Tile count exceeds safe limit");
            return Err(ResolveError::LimitExceeded {
                count: candidate_count,
                limit: self.safe_limit,
                exact: true,
            });
        }

        let exact = candidate_count <= EXACT_COUNT_CANDIDATES;
        let mut kept: Vec<TileIndex> = Vec::new();
        let mut count: u64 = 0;

        'columns: for x in candidates.min_x..=candidates.max_x {
            for y in candidates.min_y..=candidates.max_y {
                let index = TileIndex::new(x, y, self.zoom);
                if !self.keep(index)? {
                    debug!(x, y, z = self.zoom, "Tile excluded");
                    continue;
                }
                count += 1;
                if count as usize <= self.safe_limit {
                    kept.push(index);
                } else if !exact {
                    break 'columns;
                }
            }
        }

        if count > self.safe_limit as u64 {
            warn!(count, limit = self.safe_limit, "Tile count exceeds safe limit");
            return Err(ResolveError::LimitExceeded {
                count,
                limit: self.safe_limit,
                exact,
            });
        }
        if kept.is_empty() {
            return Err(ResolveError::NoTiles { zoom: self.zoom });
        }

        let tiles = kept
            .into_iter()
            .map(|index| {
                let url = match self.source {
                    Some(source) => source.url_for(index.z, index.x, index.y)?,
                    None => String::new(),
                };
                Ok(Tile::new(index, url)?)
            })
            .collect::<Result<Vec<_>, ResolveError>>()?;

        let (source_id, headers) = match self.source {
            Some(source) => (source.id().to_string(), source.headers().clone()),
            None => (String::new(), BTreeMap::new()),
        };

        let collection = TileCollection::new(tiles, self.zoom, source_id, headers, self.safe_limit)?;
        info!(
            tiles = collection.len(),
            "TileCollection built: {}",
            collection.extent()
        );
        Ok(collection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{Nearmap, Osm, ProviderError};
    use crate::region::{BoundsRegion, ShapeRegion};
    use geo::{LineString, Polygon};
    use std::collections::HashSet;

    fn triangle() -> ShapeRegion {
        // Right triangle over the lower-left half of a box.
        ShapeRegion::from_polygons(vec![Polygon::new(
            LineString::from(vec![(0.0, 0.0), (20.0, 0.0), (0.0, 20.0), (0.0, 0.0)]),
            vec![],
        )])
        .unwrap()
    }

    fn indices(collection: &TileCollection) -> HashSet<TileIndex> {
        collection.iter().map(Tile::index).collect()
    }

    #[test]
    fn test_bbox_mode_fills_rectangle() {
        let region = BoundsRegion::new(-122.5, 37.7, -122.3, 37.9).unwrap();
        let resolver = TileIndexResolver::new(&region, 10);
        let extent = resolver.candidate_extent().unwrap();
        let tiles = resolver.resolve().unwrap();

        assert_eq!(tiles.len() as u64, extent.tile_count());
        assert_eq!(tiles.extent(), extent);
        assert_eq!(extent.min_x, 163);
        assert_eq!(extent.max_x, 164);
        assert_eq!(extent.min_y, 395);
        assert_eq!(extent.max_y, 396);
        assert_eq!(tiles.len(), 4);
    }

    #[test]
    fn test_enumeration_order_is_column_major() {
        let region = BoundsRegion::new(-10.0, -10.0, 10.0, 10.0).unwrap();
        let tiles = TileIndexResolver::new(&region, 2).resolve().unwrap();
        let order: Vec<(u32, u32)> = tiles.iter().map(|t| (t.index().x, t.index().y)).collect();
        assert_eq!(order, vec![(1, 1), (1, 2), (2, 1), (2, 2)]);
    }

    #[test]
    fn test_edge_exact_corner_does_not_spill() {
        // Zoom 1 quadrant boundary at lon 0 / lat 0.
        let region = BoundsRegion::new(-90.0, 0.0, 0.0, 60.0).unwrap();
        let tiles = TileIndexResolver::new(&region, 1).resolve().unwrap();
        assert_eq!(tiles.len(), 1);
        assert_eq!(tiles.tiles()[0].index(), TileIndex::new(0, 0, 1));
    }

    #[test]
    fn test_world_bbox_exceeds_limit() {
        let region = BoundsRegion::new(-180.0, -85.0, 180.0, 85.0).unwrap();
        let result = TileIndexResolver::new(&region, 5).with_safe_limit(1).resolve();
        assert!(matches!(
            result,
            Err(ResolveError::LimitExceeded {
                count: 1024,
                limit: 1,
                exact: true
            })
        ));
    }

    #[test]
    fn test_shape_limit_counts_after_filtering() {
        let region = triangle();
        let bbox_count = TileIndexResolver::new(&region, 6)
            .with_safe_limit(usize::MAX)
            .resolve()
            .unwrap()
            .len();
        let shape_count = TileIndexResolver::new(&region, 6)
            .with_mode(SelectionMode::Shape)
            .with_safe_limit(usize::MAX)
            .resolve()
            .unwrap()
            .len();
        assert!(shape_count < bbox_count);

        // A limit between the two counts only trips the full rectangle.
        let limit = shape_count;
        assert!(TileIndexResolver::new(&region, 6)
            .with_mode(SelectionMode::Shape)
            .with_safe_limit(limit)
            .resolve()
            .is_ok());
        assert!(matches!(
            TileIndexResolver::new(&region, 6).with_safe_limit(limit).resolve(),
            Err(ResolveError::LimitExceeded { .. })
        ));

        match TileIndexResolver::new(&region, 6)
            .with_mode(SelectionMode::Shape)
            .with_safe_limit(limit - 1)
            .resolve()
        {
            Err(ResolveError::LimitExceeded { count, limit: l, exact }) => {
                assert_eq!(count, shape_count as u64);
                assert_eq!(l, limit - 1);
                assert!(exact);
            }
            other => panic!("expected limit error, got {:?}", other.map(|c| c.len())),
        }
    }

    #[test]
    fn test_shape_is_subset_and_invert_is_complement() {
        let region = triangle();
        let resolve = |mode| {
            TileIndexResolver::new(&region, 5)
                .with_mode(mode)
                .with_safe_limit(10_000)
                .resolve()
                .unwrap()
        };
        let bbox = indices(&resolve(SelectionMode::BBox));
        let shape = indices(&resolve(SelectionMode::Shape));
        let inverted = indices(&resolve(SelectionMode::ShapeInverted));

        assert!(shape.is_subset(&bbox));
        assert!(!inverted.is_empty());
        let expected: HashSet<_> = bbox.difference(&shape).copied().collect();
        assert_eq!(inverted, expected);
    }

    #[test]
    fn test_shape_extent_uses_kept_tiles() {
        // Two small squares in opposite corners of a large box.
        let square = |x: f64, y: f64| {
            Polygon::new(
                LineString::from(vec![
                    (x, y),
                    (x + 0.5, y),
                    (x + 0.5, y + 0.5),
                    (x, y + 0.5),
                    (x, y),
                ]),
                vec![],
            )
        };
        let region =
            ShapeRegion::from_polygons(vec![square(1.0, 1.0), square(30.0, 30.0)]).unwrap();
        let tiles = TileIndexResolver::new(&region, 6)
            .with_mode(SelectionMode::Shape)
            .with_safe_limit(1000)
            .resolve()
            .unwrap();
        assert!(tiles.len() < tiles.extent().tile_count() as usize);
        let computed = TileExtent::covering(tiles.iter().map(Tile::index)).unwrap();
        assert_eq!(tiles.extent(), computed);
    }

    #[test]
    fn test_bounds_region_shape_equals_bbox() {
        let region = BoundsRegion::new(2.0, 48.0, 3.0, 49.0).unwrap();
        let bbox = TileIndexResolver::new(&region, 8).resolve().unwrap();
        let shape = TileIndexResolver::new(&region, 8)
            .with_mode(SelectionMode::Shape)
            .resolve()
            .unwrap();
        assert_eq!(indices(&bbox), indices(&shape));
    }

    #[test]
    fn test_invert_of_full_cover_is_empty_error() {
        let region = BoundsRegion::new(2.0, 48.0, 3.0, 49.0).unwrap();
        let result = TileIndexResolver::new(&region, 8)
            .with_mode(SelectionMode::ShapeInverted)
            .resolve();
        assert!(matches!(result, Err(ResolveError::NoTiles { zoom: 8 })));
    }

    #[test]
    fn test_urls_and_source_id_are_embedded() {
        let region = BoundsRegion::new(-122.5, 37.7, -122.3, 37.9).unwrap();
        let source = Osm::new();
        let tiles = TileIndexResolver::new(&region, 10)
            .with_source(&source)
            .resolve()
            .unwrap();
        assert_eq!(tiles.source_id(), "osm");
        let first = &tiles.tiles()[0];
        assert_eq!(
            first.url(),
            format!(
                "https://tile.openstreetmap.org/10/{}/{}.png",
                first.index().x,
                first.index().y
            )
        );
    }

    #[test]
    fn test_missing_api_key_fails_resolution() {
        let region = BoundsRegion::new(-122.5, 37.7, -122.3, 37.9).unwrap();
        let source = Nearmap::new(None);
        let result = TileIndexResolver::new(&region, 10).with_source(&source).resolve();
        assert!(matches!(
            result,
            Err(ResolveError::Provider(ProviderError::MissingApiKey(_)))
        ));
    }

    #[test]
    fn test_unsupported_zoom_fails_resolution() {
        let region = BoundsRegion::new(-122.5, 37.7, -122.3, 37.9).unwrap();
        let source = Osm::new();
        let result = TileIndexResolver::new(&region, 20).with_source(&source).resolve();
        assert!(matches!(
            result,
            Err(ResolveError::Provider(ProviderError::UnsupportedZoom { zoom: 20, .. }))
        ));
    }

    #[test]
    fn test_polar_bounds_are_clipped() {
        let region = BoundsRegion::new(-10.0, 80.0, 10.0, 89.9).unwrap();
        let tiles = TileIndexResolver::new(&region, 3).resolve().unwrap();
        assert_eq!(tiles.extent().min_y, 0);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_bbox_cardinality(
                lon in -179.0..170.0_f64,
                lat in -80.0..75.0_f64,
                width in 0.01..8.0_f64,
                height in 0.01..8.0_f64,
                zoom in 0u8..=6
            ) {
                let region = BoundsRegion::new(lon, lat, lon + width, lat + height).unwrap();
                let resolver = TileIndexResolver::new(&region, zoom).with_safe_limit(usize::MAX);
                let extent = resolver.candidate_extent()?;
                let tiles = resolver.resolve()?;

                let (ulx, uly) = lon_lat_to_tile(lon, lat + height, zoom)?;
                prop_assert_eq!((extent.min_x, extent.min_y), (ulx, uly));
                prop_assert_eq!(
                    tiles.len() as u64,
                    (extent.max_x - extent.min_x + 1) as u64 * (extent.max_y - extent.min_y + 1) as u64
                );
                prop_assert_eq!(tiles.extent(), extent);
            }
        }
    }
}
