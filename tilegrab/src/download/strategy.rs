//! Sequential and parallel execution of tile work.
//!
//! Both strategies hand every [`TileOutcome`] to a single sink on the
//! calling thread, so the sink owns all shared mutable state.

use super::worker::{TileOutcome, TileWorker};
use super::DownloadError;
use crate::tile::Tile;
use std::sync::mpsc;
use tracing::debug;

/// Receives outcomes in completion order.
pub type OutcomeSink<'s> = dyn FnMut(TileOutcome) -> Result<(), DownloadError> + 's;

/// Strategy for running many tiles.
pub trait DownloadStrategy: Send + Sync {
    /// Runs every tile through `worker` and feeds `sink`.
    ///
    /// Stops early only if the sink fails.
    fn execute(
        &self,
        tiles: &[Tile],
        worker: &TileWorker<'_>,
        sink: &mut OutcomeSink<'_>,
    ) -> Result<(), DownloadError>;
}

/// Processes tiles one at a time in enumeration order.
#[derive(Debug, Default)]
pub struct SequentialStrategy;

impl SequentialStrategy {
    pub fn new() -> Self {
        Self
    }
}

impl DownloadStrategy for SequentialStrategy {
    fn execute(
        &self,
        tiles: &[Tile],
        worker: &TileWorker<'_>,
        sink: &mut OutcomeSink<'_>,
    ) -> Result<(), DownloadError> {
        for tile in tiles {
            sink(worker.process(tile))?;
        }
        Ok(())
    }
}

/// Processes tiles on a bounded rayon pool.
#[derive(Debug)]
pub struct ParallelStrategy {
    /// Number of worker threads.
    pub concurrency: usize,
}

impl ParallelStrategy {
    /// Creates a strategy with at least one worker.
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency: concurrency.max(1),
        }
    }
}

impl Default for ParallelStrategy {
    fn default() -> Self {
        Self::new(super::config::DEFAULT_WORKERS)
    }
}

impl DownloadStrategy for ParallelStrategy {
    fn execute(
        &self,
        tiles: &[Tile],
        worker: &TileWorker<'_>,
        sink: &mut OutcomeSink<'_>,
    ) -> Result<(), DownloadError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.concurrency)
            .thread_name(|i| format!("tilegrab-dl-{}", i))
            .build()
            .map_err(|e| DownloadError::Pool(e.to_string()))?;

        debug!(workers = self.concurrency, tiles = tiles.len(), "Starting parallel download");

        pool.in_place_scope(|scope| {
            let (tx, rx) = mpsc::channel();
            for tile in tiles {
                let tx = tx.clone();
                scope.spawn(move |_| {
                    // Receiver is gone only if the sink failed.
                    let _ = tx.send(worker.process(tile));
                });
            }
            drop(tx);

            for outcome in rx {
                sink(outcome)?;
            }
            Ok(())
        })
    }
}
