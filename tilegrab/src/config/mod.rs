//! Configuration file support.
//!
//! Settings live in an INI file, by default `~/.tilegrab/config.ini`. A
//! missing file yields defaults; command-line flags override file values.
//!
//! ```ini
//! [download]
//! timeout = 15
//! max_retries = 5
//! backoff_factor = 0.3
//! workers = 8
//! parallel = true
//! resume = true
//!
//! [tiles]
//! safe_limit = 250
//! zoom = 17
//!
//! [provider]
//! type = esri
//! api_key =
//!
//! [output]
//! directory = ~/tiles
//! formats = png,tiff
//! ```

mod file;
mod parser;

pub use file::{config_file_path, ConfigFile, ConfigFileError, OutputSettings, ProviderSettings, TileSettings};
