//! End-to-end application pipeline.
//!
//! [`AppConfig`] gathers every setting of a run; [`run`] drives the
//! resolver, the downloader and the raster stages in order:
//!
//! ```text
//! RegionSpec ──► GeoSource ──┐
//!                            ├──► TileIndexResolver ──► TileCollection
//! ProviderConfig ► TileSource┘                               │
//!                                                            ▼
//!                          Exporter ◄── Mosaic ◄── Downloader (+ ledger)
//! ```

mod config;
mod error;
mod pipeline;

pub use config::{AppConfig, RegionSpec, TILE_DIR_NAME};
pub use error::AppError;
pub use pipeline::{load_region, run, run_with_client, RunReport};
