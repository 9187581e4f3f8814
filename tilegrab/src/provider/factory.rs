//! Tile source factory.
//!
//! Centralizes source creation so the CLI, the config file and tests build
//! sources the same way.
//!
//! ```
//! use tilegrab::provider::{create_source, ProviderConfig};
//!
//! let source = create_source(&ProviderConfig::Osm).unwrap();
//! assert_eq!(source.id(), "osm");
//! ```

use super::esri::EsriWorldImagery;
use super::google::GoogleSatellite;
use super::nearmap::Nearmap;
use super::osm::Osm;
use super::template::TemplateSource;
use super::types::{ProviderError, TileSource};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Configuration for creating a tile source.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderConfig {
    /// OpenStreetMap standard layer.
    Osm,

    /// Esri World Imagery.
    Esri,

    /// Google satellite layer.
    GoogleSatellite,

    /// Nearmap vertical imagery. Requires an API key.
    Nearmap { api_key: Option<String> },

    /// Arbitrary URL template.
    Template {
        id: String,
        url: String,
        api_key: Option<String>,
        min_zoom: u8,
        max_zoom: u8,
    },
}

impl ProviderConfig {
    /// Parses a named built-in source.
    ///
    /// Accepts the source ids (`osm`, `esri`, `gsat`, `nmsat`) and a few
    /// common aliases. Template sources take a URL and are built directly.
    pub fn from_name(name: &str, api_key: Option<String>) -> Result<Self, ProviderError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "osm" | "openstreetmap" => Ok(Self::Osm),
            "esri" | "esri_world" | "esriworldimagery" | "arcgis" => Ok(Self::Esri),
            "gsat" | "google" | "googlesat" | "ggl_sat" => Ok(Self::GoogleSatellite),
            "nmsat" | "nearmap" | "nearmapsat" => Ok(Self::Nearmap { api_key }),
            other => Err(ProviderError::UnknownProvider(other.to_string())),
        }
    }

    /// Template source with the default zoom range.
    pub fn template(id: impl Into<String>, url: impl Into<String>, api_key: Option<String>) -> Self {
        Self::Template {
            id: id.into(),
            url: url.into(),
            api_key,
            min_zoom: crate::coord::MIN_ZOOM,
            max_zoom: 22,
        }
    }

    /// Returns true if this source cannot build URLs without a key.
    pub fn requires_api_key(&self) -> bool {
        match self {
            Self::Nearmap { .. } => true,
            Self::Template { url, .. } => url.contains("{key}"),
            _ => false,
        }
    }

    /// Returns the configured key, if any.
    pub fn api_key(&self) -> Option<&str> {
        match self {
            Self::Nearmap { api_key } | Self::Template { api_key, .. } => api_key.as_deref(),
            _ => None,
        }
    }
}

/// Creates a tile source from configuration.
pub fn create_source(config: &ProviderConfig) -> Result<Arc<dyn TileSource>, ProviderError> {
    create_source_with_headers(config, BTreeMap::new())
}

/// Creates a tile source that sends `headers` with every request.
pub fn create_source_with_headers(
    config: &ProviderConfig,
    headers: BTreeMap<String, String>,
) -> Result<Arc<dyn TileSource>, ProviderError> {
    let source: Arc<dyn TileSource> = match config {
        ProviderConfig::Osm => Arc::new(Osm::new().with_headers(headers)),
        ProviderConfig::Esri => Arc::new(EsriWorldImagery::new().with_headers(headers)),
        ProviderConfig::GoogleSatellite => Arc::new(GoogleSatellite::new().with_headers(headers)),
        ProviderConfig::Nearmap { api_key } => {
            Arc::new(Nearmap::new(api_key.clone()).with_headers(headers))
        }
        ProviderConfig::Template {
            id,
            url,
            api_key,
            min_zoom,
            max_zoom,
        } => Arc::new(
            TemplateSource::new(id.clone(), url.clone())?
                .with_api_key(api_key.clone())
                .with_zoom_range(*min_zoom, *max_zoom)
                .with_headers(headers),
        ),
    };

    debug!(
        source = source.id(),
        name = source.name(),
        min_zoom = source.min_zoom(),
        max_zoom = source.max_zoom(),
        "Tile source created"
    );

    Ok(source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name_builtins() {
        assert_eq!(ProviderConfig::from_name("osm", None).unwrap(), ProviderConfig::Osm);
        assert_eq!(ProviderConfig::from_name("ESRI", None).unwrap(), ProviderConfig::Esri);
        assert_eq!(
            ProviderConfig::from_name("gsat", None).unwrap(),
            ProviderConfig::GoogleSatellite
        );
        assert_eq!(
            ProviderConfig::from_name("nearmap", Some("k".to_string())).unwrap(),
            ProviderConfig::Nearmap {
                api_key: Some("k".to_string())
            }
        );
    }

    #[test]
    fn test_from_name_unknown() {
        assert!(matches!(
            ProviderConfig::from_name("bing", None),
            Err(ProviderError::UnknownProvider(name)) if name == "bing"
        ));
    }

    #[test]
    fn test_create_each_source_id() {
        let cases = [
            (ProviderConfig::Osm, "osm"),
            (ProviderConfig::Esri, "esri"),
            (ProviderConfig::GoogleSatellite, "gsat"),
            (ProviderConfig::Nearmap { api_key: None }, "nmsat"),
            (ProviderConfig::template("mine", "http://h/{z}/{x}/{y}", None), "mine"),
        ];
        for (config, id) in cases {
            let source = create_source(&config).unwrap();
            assert_eq!(source.id(), id);
        }
    }

    #[test]
    fn test_nearmap_without_key_fails_on_url() {
        let source = create_source(&ProviderConfig::Nearmap { api_key: None }).unwrap();
        assert!(matches!(
            source.url_for(10, 0, 0),
            Err(ProviderError::MissingApiKey(_))
        ));
    }

    #[test]
    fn test_headers_are_attached() {
        let mut headers = BTreeMap::new();
        headers.insert("X-Test".to_string(), "1".to_string());
        let source = create_source_with_headers(&ProviderConfig::Osm, headers).unwrap();
        assert_eq!(source.headers().len(), 1);
    }

    #[test]
    fn test_requires_api_key() {
        assert!(!ProviderConfig::Osm.requires_api_key());
        assert!(ProviderConfig::Nearmap { api_key: None }.requires_api_key());
        assert!(ProviderConfig::template("t", "http://h/{z}/{x}/{y}?k={key}", None).requires_api_key());
    }

    #[test]
    fn test_invalid_template_is_rejected() {
        let config = ProviderConfig::template("t", "http://h/static.png", None);
        assert!(matches!(
            create_source(&config),
            Err(ProviderError::InvalidTemplate { .. })
        ));
    }
}
