//! Download engine configuration.

use std::time::Duration;

/// Per-request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;
/// Retry budget per tile.
pub const DEFAULT_MAX_RETRIES: u32 = 5;
/// Base backoff delay in seconds.
pub const DEFAULT_BACKOFF_FACTOR: f64 = 0.3;
/// Size of the parallel worker pool.
pub const DEFAULT_WORKERS: usize = 8;
/// Upper bound on a single backoff delay.
pub const MAX_BACKOFF: Duration = Duration::from_secs(120);

/// Configuration for tile downloading.
///
/// # Example
///
/// ```
/// use tilegrab::download::DownloadConfig;
/// use std::time::Duration;
///
/// let config = DownloadConfig::default();
/// assert_eq!(config.timeout(), Duration::from_secs(15));
/// assert_eq!(config.max_retries(), 5);
///
/// let config = DownloadConfig::new()
///     .with_workers(2)
///     .with_parallel(false)
///     .with_resume(false);
/// assert_eq!(config.workers(), 2);
/// assert!(!config.parallel());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DownloadConfig {
    timeout: Duration,
    max_retries: u32,
    /// Seconds; the n-th retry waits `backoff_factor * 2^n`.
    backoff_factor: f64,
    workers: usize,
    parallel: bool,
    /// Trust earlier successful progress records and skip those tiles.
    resume: bool,
    /// Write fetched payloads to the tile directory.
    save_tiles: bool,
    /// Fetch tiles even when their file already exists on disk.
    overwrite: bool,
}

impl DownloadConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Negative or NaN factors disable backoff.
    pub fn with_backoff_factor(mut self, factor: f64) -> Self {
        self.backoff_factor = if factor.is_finite() && factor > 0.0 {
            factor
        } else {
            0.0
        };
        self
    }

    /// Worker pool size, at least 1.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_resume(mut self, resume: bool) -> Self {
        self.resume = resume;
        self
    }

    pub fn with_save_tiles(mut self, save: bool) -> Self {
        self.save_tiles = save;
        self
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn backoff_factor(&self) -> f64 {
        self.backoff_factor
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn parallel(&self) -> bool {
        self.parallel
    }

    pub fn resume(&self) -> bool {
        self.resume
    }

    pub fn save_tiles(&self) -> bool {
        self.save_tiles
    }

    pub fn overwrite(&self) -> bool {
        self.overwrite
    }

    /// Delay before retry number `attempt` (0-based), capped at [`MAX_BACKOFF`].
    pub fn backoff(&self, attempt: u32) -> Duration {
        let secs = self.backoff_factor * 2f64.powi(attempt.min(30) as i32);
        Duration::try_from_secs_f64(secs)
            .unwrap_or(MAX_BACKOFF)
            .min(MAX_BACKOFF)
    }
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_factor: DEFAULT_BACKOFF_FACTOR,
            workers: DEFAULT_WORKERS,
            parallel: true,
            resume: true,
            save_tiles: true,
            overwrite: true,
        }
    }
}
