//! Decoded tile images.

use super::RasterError;
use crate::coord::{tile_to_bounds, GeoBounds, TileIndex};
use crate::tile::Tile;
use image::RgbImage;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default tile edge length in pixels.
pub const DEFAULT_TILE_SIZE: u32 = 256;

const PNG_MAGIC: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
const JPEG_MAGIC: [u8; 2] = [0xFF, 0xD8];
const BMP_MAGIC: [u8; 2] = [b'B', b'M'];

/// Encoding of a tile payload or output raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileFormat {
    Png,
    Jpeg,
    Bmp,
    Tiff,
}

impl TileFormat {
    /// Detects the format from leading magic bytes, defaulting to PNG.
    pub fn sniff(bytes: &[u8]) -> Self {
        if bytes.starts_with(&PNG_MAGIC) {
            Self::Png
        } else if bytes.starts_with(&JPEG_MAGIC) {
            Self::Jpeg
        } else if bytes.starts_with(&BMP_MAGIC) {
            Self::Bmp
        } else {
            Self::Png
        }
    }

    /// File extension without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Bmp => "bmp",
            Self::Tiff => "tiff",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "bmp" => Some(Self::Bmp),
            "tif" | "tiff" => Some(Self::Tiff),
            _ => None,
        }
    }

    fn image_format(&self) -> image::ImageFormat {
        match self {
            Self::Png => image::ImageFormat::Png,
            Self::Jpeg => image::ImageFormat::Jpeg,
            Self::Bmp => image::ImageFormat::Bmp,
            Self::Tiff => image::ImageFormat::Tiff,
        }
    }
}

impl fmt::Display for TileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// A decoded tile raster and where it belongs.
#[derive(Debug, Clone)]
pub struct TileImage {
    index: TileIndex,
    bounds: GeoBounds,
    url: String,
    format: TileFormat,
    image: RgbImage,
    path: Option<PathBuf>,
}

impl TileImage {
    /// Decodes a downloaded payload for `tile`.
    pub fn decode(tile: &Tile, bytes: &[u8]) -> Result<Self, RasterError> {
        let format = TileFormat::sniff(bytes);
        let image = decode_rgb(tile.index(), bytes, format)?;
        debug!(
            x = tile.index().x,
            y = tile.index().y,
            z = tile.index().z,
            format = %format,
            "TileImage decoded"
        );
        Ok(Self {
            index: tile.index(),
            bounds: tile.bounds(),
            url: tile.url().to_string(),
            format,
            image,
            path: None,
        })
    }

    /// Wraps an already decoded raster.
    pub fn from_rgb(
        index: TileIndex,
        url: impl Into<String>,
        format: TileFormat,
        image: RgbImage,
    ) -> Result<Self, RasterError> {
        Ok(Self {
            index,
            bounds: tile_to_bounds(index.x, index.y, index.z)?,
            url: url.into(),
            format,
            image,
            path: None,
        })
    }

    /// Loads a saved tile file named `{z}_{x}_{y}.{ext}`.
    pub fn open(path: &Path, url: impl Into<String>) -> Result<Self, RasterError> {
        let index = super::loader::parse_tile_file_name(path)
            .ok_or_else(|| RasterError::InvalidTileName(path.to_path_buf()))?;
        let bytes = std::fs::read(path).map_err(|source| RasterError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let format = TileFormat::sniff(&bytes);
        let image = decode_rgb(index, &bytes, format)?;

        let mut tile = Self::from_rgb(index, url, format, image)?;
        tile.path = Some(path.to_path_buf());
        Ok(tile)
    }

    pub fn index(&self) -> TileIndex {
        self.index
    }

    pub fn bounds(&self) -> GeoBounds {
        self.bounds
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn format(&self) -> TileFormat {
        self.format
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Location on disk, once attached to a directory.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn set_path(&mut self, path: impl Into<PathBuf>) {
        self.path = Some(path.into());
    }

    /// On-disk file name, `{z}_{x}_{y}.{ext}`.
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.index.file_stem(), self.format.extension())
    }
}

fn decode_rgb(index: TileIndex, bytes: &[u8], format: TileFormat) -> Result<RgbImage, RasterError> {
    // Unrecognised payloads default to PNG in the name only; let the
    // decoder guess the real format.
    let decoded = image::load_from_memory_with_format(bytes, format.image_format())
        .or_else(|_| image::load_from_memory(bytes))
        .map_err(|source| RasterError::Decode { index, source })?;
    Ok(decoded.to_rgb8())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::test_support::encoded;
    use image::{ImageFormat, Rgb};

    fn tile(x: u32, y: u32, z: u8) -> Tile {
        Tile::new(TileIndex::new(x, y, z), "http://t").unwrap()
    }

    #[test]
    fn test_sniff_magic_bytes() {
        assert_eq!(TileFormat::sniff(&PNG_MAGIC), TileFormat::Png);
        assert_eq!(TileFormat::sniff(&[0xFF, 0xD8, 0xFF, 0xE0]), TileFormat::Jpeg);
        assert_eq!(TileFormat::sniff(b"BM\x00\x00"), TileFormat::Bmp);
        assert_eq!(TileFormat::sniff(b"GIF89a"), TileFormat::Png);
        assert_eq!(TileFormat::sniff(&[]), TileFormat::Png);
    }

    #[test]
    fn test_extension_mapping() {
        assert_eq!(TileFormat::Jpeg.extension(), "jpg");
        assert_eq!(TileFormat::from_extension("JPEG"), Some(TileFormat::Jpeg));
        assert_eq!(TileFormat::from_extension("tif"), Some(TileFormat::Tiff));
        assert_eq!(TileFormat::from_extension("webp"), None);
    }

    #[test]
    fn test_decode_png_payload() {
        let bytes = encoded([255, 0, 0], ImageFormat::Png);
        let img = TileImage::decode(&tile(1, 2, 10), &bytes).unwrap();
        assert_eq!(img.format(), TileFormat::Png);
        assert_eq!((img.width(), img.height()), (256, 256));
        assert_eq!(img.image().get_pixel(10, 10), &Rgb([255, 0, 0]));
        assert_eq!(img.file_name(), "10_1_2.png");
        assert_eq!(img.url(), "http://t");
        assert!(img.path().is_none());
    }

    #[test]
    fn test_decode_jpeg_payload() {
        let bytes = encoded([0, 0, 255], ImageFormat::Jpeg);
        let img = TileImage::decode(&tile(1, 2, 10), &bytes).unwrap();
        assert_eq!(img.format(), TileFormat::Jpeg);
        assert_eq!(img.file_name(), "10_1_2.jpg");
    }

    #[test]
    fn test_decode_garbage_fails() {
        let result = TileImage::decode(&tile(1, 2, 10), b"definitely not an image");
        assert!(matches!(result, Err(RasterError::Decode { .. })));
    }

    #[test]
    fn test_open_saved_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("10_1_2.png");
        std::fs::write(&path, encoded([0, 255, 0], ImageFormat::Png)).unwrap();

        let img = TileImage::open(&path, "http://t/10/1/2").unwrap();
        assert_eq!(img.index(), TileIndex::new(1, 2, 10));
        assert_eq!(img.path(), Some(path.as_path()));
        assert_eq!(img.image().get_pixel(0, 0), &Rgb([0, 255, 0]));
    }

    #[test]
    fn test_open_rejects_bad_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mosaic.png");
        std::fs::write(&path, encoded([0, 0, 0], ImageFormat::Png)).unwrap();
        assert!(matches!(
            TileImage::open(&path, ""),
            Err(RasterError::InvalidTileName(_))
        ));
    }
}
