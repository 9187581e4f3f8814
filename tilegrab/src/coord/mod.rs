//! Coordinate conversion module
//!
//! Provides conversions between geographic coordinates (longitude/latitude,
//! EPSG:4326) and the Web Mercator slippy-map tile grid, plus the tile-grid
//! extents in Web Mercator meters (EPSG:3857) used for georeferencing.

mod types;

pub use types::{
    CoordError, GeoBounds, MercatorBounds, TileIndex, MAX_LAT, MAX_LON, MAX_ZOOM, MIN_LAT,
    MIN_LON, MIN_ZOOM, WEB_MERCATOR_EPSG, WEB_MERCATOR_EXTENT, WGS84_EPSG,
};

use std::f64::consts::PI;

/// Points within this distance (in unit tile space) of a tile's right or
/// bottom edge are counted in the next tile over.
pub const EDGE_EPSILON: f64 = 1e-14;

/// Number of tiles along one side of the grid at `zoom`.
#[inline]
pub fn tiles_per_side(zoom: u8) -> u32 {
    1u32 << zoom
}

fn check_zoom(zoom: u8) -> Result<(), CoordError> {
    if zoom > MAX_ZOOM {
        return Err(CoordError::InvalidZoom(zoom));
    }
    Ok(())
}

/// Converts a longitude/latitude pair to the tile containing it.
///
/// Longitude at +180° maps to the last column; latitudes at or beyond the
/// poles map to the first or last row.
///
/// # Arguments
///
/// * `lon` - Longitude in degrees
/// * `lat` - Latitude in degrees
/// * `zoom` - Zoom level (0 to [`MAX_ZOOM`])
#[inline]
pub fn lon_lat_to_tile(lon: f64, lat: f64, zoom: u8) -> Result<(u32, u32), CoordError> {
    check_zoom(zoom)?;

    let n = tiles_per_side(zoom);
    let z2 = n as f64;
    let last = n - 1;

    let x = lon / 360.0 + 0.5;
    let sin_lat = (lat * PI / 180.0).sin();
    let y = 0.5 - 0.25 * ((1.0 + sin_lat) / (1.0 - sin_lat)).ln() / PI;

    let col = if x <= 0.0 {
        0
    } else if x >= 1.0 {
        last
    } else {
        (((x + EDGE_EPSILON) * z2).floor() as u32).min(last)
    };

    let row = if y.is_nan() || y <= 0.0 {
        0
    } else if y >= 1.0 {
        last
    } else {
        (((y + EDGE_EPSILON) * z2).floor() as u32).min(last)
    };

    Ok((col, row))
}

/// Returns the geographic box covered by tile `(x, y)` at zoom `z`.
///
/// This is the analytic inverse of [`lon_lat_to_tile`].
pub fn tile_to_bounds(x: u32, y: u32, z: u8) -> Result<GeoBounds, CoordError> {
    check_zoom(z)?;
    let n = tiles_per_side(z);
    if x >= n || y >= n {
        return Err(CoordError::TileOutOfRange { x, y, z });
    }

    let n = n as f64;
    let min_lon = x as f64 / n * 360.0 - 180.0;
    let max_lon = (x as f64 + 1.0) / n * 360.0 - 180.0;

    let row_to_lat = |row: f64| -> f64 {
        let merc_y = PI * (1.0 - 2.0 * row / n);
        merc_y.sinh().atan() * 180.0 / PI
    };

    // Smaller row means further north.
    let max_lat = row_to_lat(y as f64);
    let min_lat = row_to_lat(y as f64 + 1.0);

    Ok(GeoBounds {
        min_lon,
        min_lat,
        max_lon,
        max_lat,
    })
}

/// Returns the geographic center of a tile.
pub fn tile_center(x: u32, y: u32, z: u8) -> Result<(f64, f64), CoordError> {
    Ok(tile_to_bounds(x, y, z)?.center())
}

/// Returns the Web Mercator extent of the tile rectangle
/// `min_x..=max_x, min_y..=max_y` at zoom `z`.
///
/// The result is aligned to the tile grid, so a raster covering exactly those
/// tiles maps onto it pixel for pixel.
pub fn tile_range_mercator_bounds(
    min_x: u32,
    max_x: u32,
    min_y: u32,
    max_y: u32,
    z: u8,
) -> Result<MercatorBounds, CoordError> {
    check_zoom(z)?;
    let tile_size_m = 2.0 * WEB_MERCATOR_EXTENT / tiles_per_side(z) as f64;

    Ok(MercatorBounds {
        xmin: -WEB_MERCATOR_EXTENT + min_x as f64 * tile_size_m,
        xmax: -WEB_MERCATOR_EXTENT + (max_x as f64 + 1.0) * tile_size_m,
        ymax: WEB_MERCATOR_EXTENT - min_y as f64 * tile_size_m,
        ymin: WEB_MERCATOR_EXTENT - (max_y as f64 + 1.0) * tile_size_m,
    })
}
