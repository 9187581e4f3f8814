//! Writing mosaics and group windows to disk.
//!
//! Pixel-only formats (PNG, JPEG) go through the `image` encoders. The
//! georeferenced format is a GeoTIFF in EPSG:3857, see [`super::geotiff`].
//! Grouped windows are only written in pixel-only formats.

use super::geotiff::write_geotiff;
use super::{ExportError, GroupWindow, Mosaic};
use image::{ImageFormat, RgbImage};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

/// Name of the mosaic file stem and of the grouped-output subdirectory.
pub const MOSAIC_STEM: &str = "mosaic";
pub const GROUPS_DIR: &str = "groups";

/// Output raster format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    Png,
    Jpeg,
    /// Georeferenced TIFF (EPSG:3857).
    GeoTiff,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpeg => "jpg",
            ExportFormat::GeoTiff => "tiff",
        }
    }

    pub fn is_georeferenced(&self) -> bool {
        matches!(self, ExportFormat::GeoTiff)
    }

    /// Encoder for pixel-only formats.
    fn pixel_format(&self) -> Option<ImageFormat> {
        match self {
            ExportFormat::Png => Some(ImageFormat::Png),
            ExportFormat::Jpeg => Some(ImageFormat::Jpeg),
            ExportFormat::GeoTiff => None,
        }
    }

    /// Parses a comma-separated list such as `png,tiff`.
    pub fn parse_list(list: &str) -> Result<Vec<Self>, ExportError> {
        let mut formats = Vec::new();
        for part in list.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let format = part.parse()?;
            if !formats.contains(&format) {
                formats.push(format);
            }
        }
        if formats.is_empty() {
            return Err(ExportError::NoFormats);
        }
        Ok(formats)
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(ExportFormat::Png),
            "jpg" | "jpeg" => Ok(ExportFormat::Jpeg),
            "tif" | "tiff" | "geotiff" => Ok(ExportFormat::GeoTiff),
            _ => Err(ExportError::UnknownFormat(s.to_string())),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

fn create_dir(dir: &Path) -> Result<(), ExportError> {
    std::fs::create_dir_all(dir).map_err(|source| ExportError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })
}

fn save_pixels(image: &RgbImage, path: &Path, format: ImageFormat) -> Result<(), ExportError> {
    image
        .save_with_format(path, format)
        .map_err(|source| ExportError::Encode {
            path: path.to_path_buf(),
            source,
        })
}

/// Writes the whole mosaic as `mosaic.{ext}` for each format.
///
/// Returns the written paths in the order of `formats`.
pub fn export_mosaic(
    mosaic: &Mosaic,
    out_dir: &Path,
    formats: &[ExportFormat],
) -> Result<Vec<PathBuf>, ExportError> {
    if formats.is_empty() {
        return Err(ExportError::NoFormats);
    }
    create_dir(out_dir)?;

    let mut written = Vec::with_capacity(formats.len());
    for format in formats {
        let path = out_dir.join(format!("{}.{}", MOSAIC_STEM, format.extension()));
        match format.pixel_format() {
            Some(image_format) => save_pixels(mosaic.image(), &path, image_format)?,
            None => write_geotiff(&path, mosaic.image(), &mosaic.bounds())?,
        }
        info!(path = %path.display(), format = %format, "Mosaic exported");
        written.push(path);
    }
    Ok(written)
}

/// Writes each window as `groups/{n}_mosaic.{ext}`.
///
/// Fails before writing anything if a georeferenced format is requested.
pub fn export_groups<I>(
    groups: I,
    out_dir: &Path,
    formats: &[ExportFormat],
) -> Result<Vec<PathBuf>, ExportError>
where
    I: IntoIterator<Item = GroupWindow>,
{
    if formats.is_empty() {
        return Err(ExportError::NoFormats);
    }
    let mut encoders = Vec::with_capacity(formats.len());
    for format in formats {
        let image_format = format.pixel_format().ok_or_else(|| {
            ExportError::NotSupported(format!(
                "grouped output cannot be written as {}; use png or jpg",
                format
            ))
        })?;
        encoders.push((*format, image_format));
    }

    let dir = out_dir.join(GROUPS_DIR);
    create_dir(&dir)?;

    let mut written = Vec::new();
    for window in groups {
        for (format, image_format) in &encoders {
            let path = dir.join(format!(
                "{}_{}.{}",
                window.number,
                MOSAIC_STEM,
                format.extension()
            ));
            save_pixels(&window.image, &path, *image_format)?;
            written.push(path);
        }
    }

    info!(files = written.len(), dir = %dir.display(), "Groups exported");
    Ok(written)
}
