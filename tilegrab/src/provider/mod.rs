//! Tile source abstraction
//!
//! A tile source maps tile addresses to request URLs and static headers. The
//! download engine never talks to a source directly: URLs are resolved when
//! the tile collection is built, so a misconfigured source (for example a
//! missing API key) fails before any network activity.
//!
//! # Factory Pattern
//!
//! ```ignore
//! use tilegrab::provider::{create_source, ProviderConfig};
//!
//! let source = create_source(&ProviderConfig::Nearmap { api_key: Some(key) })?;
//! let url = source.url_for(18, 41234, 99876)?;
//! ```

mod esri;
mod factory;
mod google;
mod nearmap;
mod osm;
mod template;
mod types;

pub use esri::EsriWorldImagery;
pub use factory::{create_source, create_source_with_headers, ProviderConfig};
pub use google::GoogleSatellite;
pub use nearmap::Nearmap;
pub use osm::Osm;
pub use template::TemplateSource;
pub use types::{ProviderError, TileSource};
