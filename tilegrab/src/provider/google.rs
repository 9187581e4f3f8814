//! Google satellite imagery source.
//!
//! Uses the public `mt1` tile endpoint with the satellite layer (`lyrs=s`).
//! Bulk use of this endpoint is outside Google's terms of service; prefer a
//! licensed source for production work.

use crate::provider::types::fill_template;
use crate::provider::{ProviderError, TileSource};
use std::collections::BTreeMap;
use tracing::warn;

const GOOGLE_SAT_URL_TEMPLATE: &str = "https://mt1.google.com/vt/lyrs=s&x={x}&y={y}&z={z}";

const MIN_ZOOM: u8 = 0;
const MAX_ZOOM: u8 = 22;

/// Google satellite tiles.
#[derive(Debug, Clone)]
pub struct GoogleSatellite {
    headers: BTreeMap<String, String>,
}

impl GoogleSatellite {
    pub fn new() -> Self {
        warn!("Google satellite tiles are subject to Google Maps terms of service");
        Self {
            headers: BTreeMap::new(),
        }
    }

    pub fn with_headers(mut self, headers: BTreeMap<String, String>) -> Self {
        self.headers = headers;
        self
    }
}

impl Default for GoogleSatellite {
    fn default() -> Self {
        Self::new()
    }
}

impl TileSource for GoogleSatellite {
    fn id(&self) -> &str {
        "gsat"
    }

    fn name(&self) -> &str {
        "Google Satellite"
    }

    fn url_for(&self, z: u8, x: u32, y: u32) -> Result<String, ProviderError> {
        self.check_zoom(z)?;
        Ok(fill_template(GOOGLE_SAT_URL_TEMPLATE, z, x, y, None))
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
