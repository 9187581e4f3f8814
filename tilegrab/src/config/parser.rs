//! INI parsing logic for converting `Ini` into `ConfigFile`.
//!
//! This is the single place where INI key names map to struct fields.

use super::file::{ConfigFile, ConfigFileError};
use crate::coord::MAX_ZOOM;
use crate::provider::ProviderConfig;
use crate::raster::ExportFormat;
use ini::Ini;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_num<T: FromStr>(section: &str, key: &str, value: &str, reason: &str) -> Result<T, ConfigFileError> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(section, key, value, reason))
}

fn parse_bool(section: &str, key: &str, value: &str) -> Result<bool, ConfigFileError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(invalid(section, key, value, "must be true or false")),
    }
}

/// Expands a leading `~` to the home directory.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    } else if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

/// Parses an `Ini` into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [download] section
    if let Some(section) = ini.section(Some("download")) {
        let mut download = config.download;
        if let Some(v) = section.get("timeout") {
            let secs: u64 = parse_num("download", "timeout", v, "must be a positive integer (seconds)")?;
            if secs == 0 {
                return Err(invalid("download", "timeout", v, "must be a positive integer (seconds)"));
            }
            download = download.with_timeout(Duration::from_secs(secs));
        }
        if let Some(v) = section.get("max_retries") {
            download = download.with_max_retries(parse_num(
                "download",
                "max_retries",
                v,
                "must be a non-negative integer",
            )?);
        }
        if let Some(v) = section.get("backoff_factor") {
            let factor: f64 = parse_num("download", "backoff_factor", v, "must be a number of seconds")?;
            if !factor.is_finite() || factor < 0.0 {
                return Err(invalid("download", "backoff_factor", v, "must be zero or positive"));
            }
            download = download.with_backoff_factor(factor);
        }
        if let Some(v) = section.get("workers") {
            let workers: usize = parse_num("download", "workers", v, "must be a positive integer")?;
            if workers == 0 {
                return Err(invalid("download", "workers", v, "must be a positive integer"));
            }
            download = download.with_workers(workers);
        }
        if let Some(v) = section.get("parallel") {
            download = download.with_parallel(parse_bool("download", "parallel", v)?);
        }
        if let Some(v) = section.get("resume") {
            download = download.with_resume(parse_bool("download", "resume", v)?);
        }
        if let Some(v) = section.get("save_tiles") {
            download = download.with_save_tiles(parse_bool("download", "save_tiles", v)?);
        }
        if let Some(v) = section.get("overwrite") {
            download = download.with_overwrite(parse_bool("download", "overwrite", v)?);
        }
        config.download = download;
    }

    // [tiles] section
    if let Some(section) = ini.section(Some("tiles")) {
        if let Some(v) = section.get("safe_limit") {
            config.tiles.safe_limit = parse_num("tiles", "safe_limit", v, "must be a positive integer")?;
        }
        if let Some(v) = section.get("zoom") {
            let zoom: u8 = parse_num("tiles", "zoom", v, "must be an integer zoom level")?;
            if zoom > MAX_ZOOM {
                return Err(invalid(
                    "tiles",
                    "zoom",
                    v,
                    &format!("must be between 0 and {}", MAX_ZOOM),
                ));
            }
            config.tiles.zoom = Some(zoom);
        }
    }

    // [provider] section
    if let Some(section) = ini.section(Some("provider")) {
        if let Some(v) = section.get("api_key") {
            let v = v.trim();
            if !v.is_empty() {
                config.provider.api_key = Some(v.to_string());
            }
        }
        if let Some(v) = section.get("url") {
            let v = v.trim();
            if !v.is_empty() {
                config.provider.url = Some(v.to_string());
            }
        }
        if let Some(v) = section.get("type") {
            let v = v.trim().to_lowercase();
            if !v.is_empty() {
                if v != "template" && ProviderConfig::from_name(&v, None).is_err() {
                    return Err(invalid(
                        "provider",
                        "type",
                        &v,
                        "must be one of: osm, esri, gsat, nmsat, template",
                    ));
                }
                config.provider.provider_type = Some(v);
            }
        }
    }

    // [output] section
    if let Some(section) = ini.section(Some("output")) {
        if let Some(v) = section.get("directory") {
            let v = v.trim();
            if !v.is_empty() {
                config.output.directory = Some(expand_tilde(v));
            }
        }
        if let Some(v) = section.get("formats") {
            config.output.formats = ExportFormat::parse_list(v)
                .map_err(|_| invalid("output", "formats", v, "comma-separated list of png, jpg, tiff"))?;
        }
    }

    Ok(config)
}
