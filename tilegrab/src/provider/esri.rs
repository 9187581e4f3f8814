//! Esri World Imagery source.
//!
//! # URL Pattern
//!
//! `https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/{z}/{y}/{x}`
//!
//! Note the row-before-column order. No key is needed for light use; Esri
//! expects a token for production traffic.

use crate::provider::types::fill_template;
use crate::provider::{ProviderError, TileSource};
use std::collections::BTreeMap;

const ESRI_URL_TEMPLATE: &str =
    "https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/{z}/{y}/{x}";

/// Minimum zoom level supported by World Imagery.
const MIN_ZOOM: u8 = 0;

/// Maximum zoom level supported by World Imagery.
const MAX_ZOOM: u8 = 23;

/// Esri World Imagery satellite source.
#[derive(Debug, Clone, Default)]
pub struct EsriWorldImagery {
    headers: BTreeMap<String, String>,
}

impl EsriWorldImagery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_headers(mut self, headers: BTreeMap<String, String>) -> Self {
        self.headers = headers;
        self
    }
}

impl TileSource for EsriWorldImagery {
    fn id(&self) -> &str {
        "esri"
    }

    fn name(&self) -> &str {
        "ESRI World Imagery"
    }

    fn url_for(&self, z: u8, x: u32, y: u32) -> Result<String, ProviderError> {
        self.check_zoom(z)?;
        Ok(fill_template(ESRI_URL_TEMPLATE, z, x, y, None))
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
