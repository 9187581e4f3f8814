//! OpenStreetMap standard tile layer.
//!
//! The public servers require an identifying User-Agent, which the shared
//! HTTP session supplies.

use crate::provider::types::fill_template;
use crate::provider::{ProviderError, TileSource};
use std::collections::BTreeMap;

const OSM_URL_TEMPLATE: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";

const MIN_ZOOM: u8 = 0;
const MAX_ZOOM: u8 = 19;

/// OpenStreetMap raster tiles.
#[derive(Debug, Clone, Default)]
pub struct Osm {
    headers: BTreeMap<String, String>,
}

impl Osm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_headers(mut self, headers: BTreeMap<String, String>) -> Self {
        self.headers = headers;
        self
    }
}

impl TileSource for Osm {
    fn id(&self) -> &str {
        "osm"
    }

    fn name(&self) -> &str {
        "OpenStreetMap"
    }

    fn url_for(&self, z: u8, x: u32, y: u32) -> Result<String, ProviderError> {
        self.check_zoom(z)?;
        Ok(fill_template(OSM_URL_TEMPLATE, z, x, y, None))
    }

    fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    fn min_zoom(&self) -> u8 {
        MIN_ZOOM
    }

    fn max_zoom(&self) -> u8 {
        MAX_ZOOM
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_identity() {
        let source = Osm::new();
        assert_eq!(source.id(), "osm");
        assert_eq!(source.name(), "OpenStreetMap");
        assert!(source.headers().is_empty());
    }

    #[test]
    fn test_url_construction() {
        let url = Osm::new().url_for(10, 163, 395).unwrap();
        assert_eq!(url, "https://tile.openstreetmap.org/10/163/395.png");
    }

    #[test]
    fn test_supports_zoom() {
        let source = Osm::new();
        assert!(source.supports_zoom(0));
        assert!(source.supports_zoom(19));
        assert!(!source.supports_zoom(20));
    }

    #[test]
    fn test_custom_headers() {
        let mut headers = BTreeMap::new();
        headers.insert("Referer".to_string(), "https://example.org".to_string());
        let source = Osm::new().with_headers(headers);
        assert_eq!(source.headers().get("Referer").map(String::as_str), Some("https://example.org"));
    }
}
