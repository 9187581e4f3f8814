//! Tilegrab - map tile download and mosaic assembly
//!
//! This library computes the slippy-map tiles covering a region, fetches
//! them from a tile server with resumable parallel downloading, and stitches
//! them into one georeferenced mosaic.
//!
//! # Modules
//!
//! - [`coord`]: lon/lat to tile conversion and Web Mercator extents
//! - [`region`]: bounding-box and polygon regions, GeoJSON input
//! - [`provider`]: tile sources and the source factory
//! - [`tile`]: tile sets and the region resolver
//! - [`download`]: HTTP client, progress ledger and download engine
//! - [`raster`]: image collection, mosaic, grouping and export
//! - [`config`]: INI configuration file
//! - [`app`]: the end-to-end pipeline
//! - [`logging`]: tracing subscriber setup

pub mod app;
pub mod config;
pub mod coord;
pub mod download;
pub mod logging;
pub mod provider;
pub mod raster;
pub mod region;
pub mod tile;
