//! Nearmap vertical imagery source.
//!
//! Requires an API key. Without one every URL request fails with
//! [`ProviderError::MissingApiKey`] rather than producing an unauthenticated
//! URL.

use crate::provider::types::fill_template;
use crate::provider::{ProviderError, TileSource};
use std::collections::BTreeMap;
use tracing::error;

const NEARMAP_URL_TEMPLATE: &str =
    "https://api.nearmap.com/tiles/v3/Vert/{z}/{x}/{y}.png?apikey={key}";

const MIN_ZOOM: u8 = 0;
const MAX_ZOOM: u8 = 24;

/// Nearmap satellite tiles.
#[derive(Debug, Clone)]
pub struct Nearmap {
    api_key: Option<String>,
    headers: BTreeMap<String, String>,
}

impl Nearmap {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            headers: BTreeMap::new(),
        }
    }

    pub fn with_headers(mut self, headers: BTreeMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

impl TileSource for Nearmap {
    fn id(&self) -> &str {
        "nmsat"
    }

    fn name(&self) -> &str {
        "Nearmap Satellite"
    }

    fn url_for(&self, z: u8, x: u32, y: u32) -> Result<String, ProviderError> {
        let Some(key) = self.api_key.as_deref() else {
            error!("Nearmap API key missing");
            return Err(ProviderError::MissingApiKey(self.id().to_string()));
        };
        self.check_zoom(z)?;
        Ok(fill_template(NEARMAP_URL_TEMPLATE, z, x, y, Some(key)))
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
    fn test_url_includes_api_key() {
        let source = Nearmap::new(Some("secret".to_string()));
        let url = source.url_for(18, 1, 2).unwrap();
        assert_eq!(url, "https://api.nearmap.com/tiles/v3/Vert/18/1/2.png?apikey=secret");
    }

    #[test]
    fn test_missing_key_is_an_error() {
        let source = Nearmap::new(None);
        assert!(!source.has_api_key());
        assert_eq!(
            source.url_for(18, 1, 2),
            Err(ProviderError::MissingApiKey("nmsat".to_string()))
        );
    }

    #[test]
    fn test_blank_key_counts_as_missing() {
        let source = Nearmap::new(Some("  ".to_string()));
        assert!(matches!(
            source.url_for(18, 1, 2),
            Err(ProviderError::MissingApiKey(_))
        ));
    }
}
