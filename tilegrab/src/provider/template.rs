//! User-defined URL template source.

use crate::provider::types::fill_template;
use crate::provider::{ProviderError, TileSource};
use std::collections::BTreeMap;

/// A source built from a URL template with `{z}`, `{x}`, `{y}` and an
/// optional `{key}` placeholder.
#[derive(Debug, Clone)]
pub struct TemplateSource {
    id: String,
    template: String,
    api_key: Option<String>,
    min_zoom: u8,
    max_zoom: u8,
    headers: BTreeMap<String, String>,
}

impl TemplateSource {
    /// Creates a template source.
    ///
    /// The template must contain all three tile placeholders, and `id` must
    /// be non-empty.
    pub fn new(id: impl Into<String>, template: impl Into<String>) -> Result<Self, ProviderError> {
        let id = id.into();
        let template = template.into();

        for placeholder in ["{z}", "{x}", "{y}"] {
            if !template.contains(placeholder) {
                return Err(ProviderError::InvalidTemplate {
                    template,
                    reason: format!("missing {} placeholder", placeholder),
                });
            }
        }
        if id.trim().is_empty() {
            return Err(ProviderError::InvalidTemplate {
                template,
                reason: "source id must not be empty".to_string(),
            });
        }

        Ok(Self {
            id,
            template,
            api_key: None,
            min_zoom: crate::coord::MIN_ZOOM,
            max_zoom: 22,
            headers: BTreeMap::new(),
        })
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|k| !k.trim().is_empty());
        self
    }

    pub fn with_zoom_range(mut self, min_zoom: u8, max_zoom: u8) -> Self {
        self.min_zoom = min_zoom;
        self.max_zoom = max_zoom;
        self
    }

    pub fn with_headers(mut self, headers: BTreeMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    fn requires_key(&self) -> bool {
        self.template.contains("{key}")
    }
}

impl TileSource for TemplateSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.id
    }

    fn url_for(&self, z: u8, x: u32, y: u32) -> Result<String, ProviderError> {
        if self.requires_key() && self.api_key.is_none() {
            return Err(ProviderError::MissingApiKey(self.id.clone()));
        }
        self.check_zoom(z)?;
        Ok(fill_template(&self.template, z, x, y, self.api_key.as_deref()))
    }

    fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    fn min_zoom(&self) -> u8 {
        self.min_zoom
    }

    fn max_zoom(&self) -> u8 {
        self.max_zoom
    }
}
