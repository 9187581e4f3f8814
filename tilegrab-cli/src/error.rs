//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;

use tilegrab::app::AppError;
use tilegrab::config::ConfigFileError;
use tilegrab::download::DownloadError;
use tilegrab::provider::ProviderError;
use tilegrab::tile::ResolveError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Invalid command-line arguments
    Config(String),
    /// Unreadable or invalid configuration file
    ConfigFile(ConfigFileError),
    /// The pipeline failed
    Run(AppError),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        if let Some(hint) = self.hint() {
            eprintln!();
            eprintln!("{}", hint);
        }

        process::exit(1)
    }

    fn hint(&self) -> Option<String> {
        match self {
            CliError::Run(AppError::Resolve(ResolveError::LimitExceeded { limit, .. })) => {
                Some(format!(
                    "The region needs more than {} tiles. Lower --zoom, shrink the region, \
                     or raise --safe-limit if you really want that many.",
                    limit
                ))
            }
            CliError::Run(AppError::Provider(ProviderError::MissingApiKey(_))) => Some(
                "This tile source needs an API key. Pass --api-key or set api_key under \
                 [provider] in config.ini."
                    .to_string(),
            ),
            CliError::Run(AppError::Provider(ProviderError::UnknownProvider(_))) => {
                Some("Known sources: osm, esri, gsat, nmsat. Use --url for anything else.".to_string())
            }
            CliError::Run(AppError::Download(DownloadError::NothingToFetch { .. })) => Some(
                "Every tile is already marked done but none are on disk. Run again with \
                 --no-resume to fetch them."
                    .to_string(),
            ),
            CliError::Run(AppError::NoImages { .. }) => Some(
                "Check network access and the tile source URL. Failed tiles are retried \
                 on the next run."
                    .to_string(),
            ),
            _ => None,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::ConfigFile(e) => write!(f, "Config file error: {}", e),
            CliError::Run(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::ConfigFile(e) => Some(e),
            CliError::Run(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::ConfigFile(e)
    }
}

impl From<AppError> for CliError {
    fn from(e: AppError) -> Self {
        CliError::Run(e)
    }
}
