//! Minimal GeoJSON reader for polygon regions.
//!
//! Accepts `Polygon`, `MultiPolygon`, `GeometryCollection`, `Feature` and
//! `FeatureCollection` documents. Other geometry types are skipped. A
//! top-level `crs` member naming anything other than WGS84 is rejected, since
//! tile selection works in EPSG:4326 degrees.

use super::RegionError;
use crate::coord::WGS84_EPSG;
use geo::{Coord, LineString, Polygon};
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Reads all polygons from a GeoJSON file.
pub fn read_geojson(path: &Path) -> Result<Vec<Polygon<f64>>, RegionError> {
    let text = fs::read_to_string(path).map_err(|source| RegionError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let polygons = parse_geojson(&text)?;
    debug!(path = %path.display(), polygons = polygons.len(), "GeoJSON region loaded");
    Ok(polygons)
}

/// Parses all polygons from a GeoJSON document.
pub fn parse_geojson(text: &str) -> Result<Vec<Polygon<f64>>, RegionError> {
    let doc: Value =
        serde_json::from_str(text).map_err(|e| RegionError::InvalidGeoJson(e.to_string()))?;

    check_crs(&doc)?;

    let mut polygons = Vec::new();
    collect_object(&doc, &mut polygons)?;

    if polygons.is_empty() {
        return Err(RegionError::NoPolygons);
    }
    Ok(polygons)
}

fn check_crs(doc: &Value) -> Result<(), RegionError> {
    let Some(crs) = doc.get("crs") else {
        return Ok(());
    };
    if crs.is_null() {
        return Ok(());
    }

    let name = crs
        .get("properties")
        .and_then(|p| p.get("name"))
        .and_then(Value::as_str)
        .ok_or_else(|| RegionError::UnsupportedCrs(crs.to_string()))?;

    if is_wgs84(name) {
        Ok(())
    } else {
        Err(RegionError::UnsupportedCrs(name.to_string()))
    }
}

fn is_wgs84(name: &str) -> bool {
    let upper = name.to_ascii_uppercase();
    upper.ends_with("CRS84") || upper.ends_with(&format!(":{}", WGS84_EPSG))
}

fn type_of(value: &Value) -> Result<&str, RegionError> {
    value
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| RegionError::InvalidGeoJson("object without 'type'".to_string()))
}

fn collect_object(value: &Value, out: &mut Vec<Polygon<f64>>) -> Result<(), RegionError> {
    match type_of(value)? {
        "FeatureCollection" => {
            let features = value
                .get("features")
                .and_then(Value::as_array)
                .ok_or_else(|| missing("features"))?;
            for feature in features {
                collect_object(feature, out)?;
            }
        }
        "Feature" => match value.get("geometry") {
            Some(Value::Null) | None => {}
            Some(geometry) => collect_object(geometry, out)?,
        },
        "GeometryCollection" => {
            let geometries = value
                .get("geometries")
                .and_then(Value::as_array)
                .ok_or_else(|| missing("geometries"))?;
            for geometry in geometries {
                collect_object(geometry, out)?;
            }
        }
        "Polygon" => out.push(parse_polygon(coordinates(value)?)?),
        "MultiPolygon" => {
            let parts = coordinates(value)?
                .as_array()
                .ok_or_else(|| invalid("MultiPolygon coordinates must be an array"))?;
            for part in parts {
                out.push(parse_polygon(part)?);
            }
        }
        other => warn!(geometry_type = other, "Skipping non-polygon geometry"),
    }
    Ok(())
}

fn coordinates(value: &Value) -> Result<&Value, RegionError> {
    value.get("coordinates").ok_or_else(|| missing("coordinates"))
}

fn parse_polygon(value: &Value) -> Result<Polygon<f64>, RegionError> {
    let rings = value
        .as_array()
        .ok_or_else(|| invalid("polygon must be an array of rings"))?;
    let mut rings = rings.iter().map(parse_ring);

    let exterior = rings
        .next()
        .ok_or_else(|| invalid("polygon has no exterior ring"))??;
    let interiors = rings.collect::<Result<Vec<_>, _>>()?;

    Ok(Polygon::new(exterior, interiors))
}

fn parse_ring(value: &Value) -> Result<LineString<f64>, RegionError> {
    let positions = value
        .as_array()
        .ok_or_else(|| invalid("ring must be an array of positions"))?;
    if positions.len() < 4 {
        return Err(invalid("ring needs at least four positions"));
    }

    positions
        .iter()
        .map(|p| {
            let pair = p.as_array().filter(|a| a.len() >= 2);
            match pair.map(|a| (a[0].as_f64(), a[1].as_f64())) {
                Some((Some(x), Some(y))) => Ok(Coord { x, y }),
                _ => Err(invalid("position must hold two numbers")),
            }
        })
        .collect::<Result<Vec<_>, _>>()
        .map(LineString::new)
}

fn missing(member: &str) -> RegionError {
    RegionError::InvalidGeoJson(format!("missing '{}' member", member))
}

fn invalid(reason: &str) -> RegionError {
    RegionError::InvalidGeoJson(reason.to_string())
}
