//! Configuration file types and loading.

use crate::download::DownloadConfig;
use crate::provider::{ProviderConfig, ProviderError};
use crate::raster::ExportFormat;
use crate::tile::DEFAULT_SAFE_LIMIT;
use ini::Ini;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Directory under the home directory holding tilegrab state.
pub const CONFIG_DIR_NAME: &str = ".tilegrab";
pub const CONFIG_FILE_NAME: &str = "config.ini";

#[derive(Debug, Error)]
pub enum ConfigFileError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    #[error("Invalid provider configuration: {0}")]
    Provider(#[from] ProviderError),
}

/// `[tiles]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileSettings {
    pub safe_limit: usize,
    pub zoom: Option<u8>,
}

impl Default for TileSettings {
    fn default() -> Self {
        Self {
            safe_limit: DEFAULT_SAFE_LIMIT,
            zoom: None,
        }
    }
}

/// `[provider]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderSettings {
    /// Source id (`osm`, `esri`, `gsat`, `nmsat`) or `template`.
    pub provider_type: Option<String>,
    pub api_key: Option<String>,
    /// URL template, used when `provider_type` is `template`.
    pub url: Option<String>,
}

impl ProviderSettings {
    /// Builds the configured source, if any.
    pub fn provider_config(&self) -> Result<Option<ProviderConfig>, ConfigFileError> {
        let Some(kind) = self.provider_type.as_deref() else {
            return Ok(None);
        };
        if kind == "template" {
            let url = self.url.clone().ok_or_else(|| ConfigFileError::InvalidValue {
                section: "provider".to_string(),
                key: "url".to_string(),
                value: String::new(),
                reason: "required when type = template".to_string(),
            })?;
            return Ok(Some(ProviderConfig::template(
                "template",
                url,
                self.api_key.clone(),
            )));
        }
        Ok(Some(ProviderConfig::from_name(kind, self.api_key.clone())?))
    }
}

/// `[output]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSettings {
    pub directory: Option<PathBuf>,
    pub formats: Vec<ExportFormat>,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            directory: None,
            formats: vec![ExportFormat::Png],
        }
    }
}

/// Parsed configuration file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigFile {
    pub download: DownloadConfig,
    pub tiles: TileSettings,
    pub provider: ProviderSettings,
    pub output: OutputSettings,
}

impl ConfigFile {
    /// Loads from the default path (`~/.tilegrab/config.ini`).
    pub fn load() -> Result<Self, ConfigFileError> {
        match config_file_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Loads from `path`. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        super::parser::parse_ini(&ini)
    }

    /// Parses INI text.
    pub fn parse(contents: &str) -> Result<Self, ConfigFileError> {
        let ini = Ini::load_from_str(contents).map_err(ini::Error::Parse)?;
        super::parser::parse_ini(&ini)
    }
}

/// Default config file location, if a home directory is known.
pub fn config_file_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}
