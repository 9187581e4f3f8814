//! Concurrent, resumable tile downloading.
//!
//! This module provides:
//! - An HTTP client seam with retry and backoff (`http`)
//! - The per-tile outcome codes (`status`)
//! - The on-disk progress ledger used for resuming (`progress`)
//! - The per-tile fetch/classify state machine (`worker`)
//! - Sequential and parallel execution strategies (`strategy`)
//! - Run orchestration and reporting (`engine`)
//!
//! # Architecture
//!
//! ```text
//! Downloader (engine)
//!         │
//!         ├── ProgressStore (ledger in the tile directory)
//!         │
//!         ├── DownloadStrategy (trait)
//!         │       ├── SequentialStrategy
//!         │       └── ParallelStrategy (rayon pool)
//!         │
//!         └── TileWorker ──► HttpClient (trait)
//!                                 └── ReqwestClient
//! ```
//!
//! Workers only fetch and decode. Every outcome flows back to one sink on
//! the calling thread, which alone mutates the ledger and the
//! [`ImageCollection`](crate::raster::ImageCollection).
//!
//! # Example
//!
//! ```no_run
//! use tilegrab::download::{DownloadConfig, Downloader};
//! use tilegrab::provider::Osm;
//! use tilegrab::region::BoundsRegion;
//! use tilegrab::tile::TileIndexResolver;
//! use std::path::Path;
//!
//! let region = BoundsRegion::new(-122.5, 37.7, -122.3, 37.9)?;
//! let source = Osm::new();
//! let mut tiles = TileIndexResolver::new(&region, 12).with_source(&source).resolve()?;
//!
//! let downloader = Downloader::with_default_client(DownloadConfig::default())?;
//! let report = downloader.download(&mut tiles, Path::new("tiles"), None)?;
//! println!("{} tiles available", report.summary.available());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
mod engine;
pub mod http;
mod progress;
mod status;
mod strategy;
mod worker;

pub use config::DownloadConfig;
pub use engine::{DownloadError, DownloadReport, DownloadSummary, Downloader, ProgressCallback};
pub use http::{fetch_with_retry, HttpClient, HttpError, HttpResponse, ReqwestClient};
pub use progress::{ProgressError, ProgressItem, ProgressStore, PROGRESS_FILE_NAME};
pub use status::DownloadStatus;
pub use strategy::{DownloadStrategy, OutcomeSink, ParallelStrategy, SequentialStrategy};
pub use worker::{TileOutcome, TileWorker};

#[cfg(test)]
pub use http::tests::MockHttpClient;
