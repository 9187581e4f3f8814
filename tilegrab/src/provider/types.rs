//! Tile source types and traits

use std::collections::BTreeMap;
use thiserror::Error;

/// Errors that can occur while configuring or querying a tile source.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    /// The source needs an API key and none was configured
    #[error("tile source '{0}' requires an API key")]
    MissingApiKey(String),

    /// Zoom level outside the source's range
    #[error("zoom level {zoom} not supported by '{source_id}' (supported: {min}..={max})")]
    UnsupportedZoom {
        source_id: String,
        zoom: u8,
        min: u8,
        max: u8,
    },

    /// Provider name not recognised
    #[error("unknown tile source '{0}' (expected one of: osm, esri, gsat, nmsat, template)")]
    UnknownProvider(String),

    /// URL template is unusable
    #[error("invalid URL template '{template}': {reason}")]
    InvalidTemplate { template: String, reason: String },
}

/// Trait for tile sources.
///
/// A source turns a tile address into a request: the URL, the static headers
/// sent with it, and a stable identifier recorded alongside every download so
/// results from different sources are never confused.
pub trait TileSource: Send + Sync {
    /// Stable, non-empty identifier (e.g. `osm`).
    fn id(&self) -> &str;

    /// Human-readable name for logging.
    fn name(&self) -> &str;

    /// Builds the fetch URL for tile `(x, y)` at zoom `z`.
    fn url_for(&self, z: u8, x: u32, y: u32) -> Result<String, ProviderError>;

    /// Static headers sent with every request to this source.
    fn headers(&self) -> &BTreeMap<String, String>;

    /// Returns the minimum supported zoom level.
    fn min_zoom(&self) -> u8;

    /// Returns the maximum supported zoom level.
    fn max_zoom(&self) -> u8;

    /// Checks if this source supports the given zoom level.
    fn supports_zoom(&self, zoom: u8) -> bool {
        zoom >= self.min_zoom() && zoom <= self.max_zoom()
    }

    /// Returns an error naming the supported range if `zoom` is outside it.
    fn check_zoom(&self, zoom: u8) -> Result<(), ProviderError> {
        if self.supports_zoom(zoom) {
            Ok(())
        } else {
            Err(ProviderError::UnsupportedZoom {
                source_id: self.id().to_string(),
                zoom,
                min: self.min_zoom(),
                max: self.max_zoom(),
            })
        }
    }
}

/// Substitutes `{z}`, `{x}`, `{y}` and `{key}` in a URL template.
pub(crate) fn fill_template(template: &str, z: u8, x: u32, y: u32, key: Option<&str>) -> String {
    let url = template
        .replace("{z}", &z.to_string())
        .replace("{x}", &x.to_string())
        .replace("{y}", &y.to_string());
    match key {
        Some(key) => url.replace("{key}", key),
        None => url,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_template_substitutes_all_placeholders() {
        let url = fill_template("https://t/{z}/{x}/{y}?k={key}", 3, 1, 2, Some("abc"));
        assert_eq!(url, "https://t/3/1/2?k=abc");
    }

    #[test]
    fn test_fill_template_leaves_key_without_value() {
        let url = fill_template("https://t/{z}/{y}/{x}", 7, 10, 20, None);
        assert_eq!(url, "https://t/7/20/10");
    }

    #[test]
    fn test_tile_source_is_object_safe() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn TileSource>();
    }
}
