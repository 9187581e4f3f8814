//! Error types for raster assembly and export.

use crate::coord::{CoordError, TileIndex};
use std::path::PathBuf;
use thiserror::Error;

/// Errors from decoding, collecting and assembling tile images.
#[derive(Debug, Error)]
pub enum RasterError {
    /// Tile payload could not be decoded.
    #[error("failed to decode image for tile {index}: {source}")]
    Decode {
        index: TileIndex,
        #[source]
        source: image::ImageError,
    },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File name does not follow `{z}_{x}_{y}.{ext}`.
    #[error("not a tile image file name: {0}")]
    InvalidTileName(PathBuf),

    /// Tile pixel size differs from the rest of the collection.
    #[error(
        "tile {index} is {found_width}x{found_height} px, collection uses {width}x{height} px"
    )]
    SizeMismatch {
        index: TileIndex,
        width: u32,
        height: u32,
        found_width: u32,
        found_height: u32,
    },

    /// Tile zoom differs from the rest of the collection.
    #[error("tile {index} is at zoom {}, collection is at zoom {expected}", .index.z)]
    ZoomMismatch { index: TileIndex, expected: u8 },

    #[error("image collection is empty")]
    EmptyCollection,

    /// Grouping window dimensions must be positive.
    #[error("invalid group size {width}x{height} tiles (both must be at least 1)")]
    InvalidGroupSize { width: u32, height: u32 },

    /// Mosaic would not fit in memory addressing.
    #[error("mosaic of {width}x{height} px is too large")]
    TooLarge { width: u64, height: u64 },

    #[error(transparent)]
    Coord(#[from] CoordError),
}

/// Errors from writing output rasters.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Requested format/shape combination cannot be written.
    #[error("not supported: {0}")]
    NotSupported(String),

    #[error("unknown export format '{0}' (expected png, jpg or tiff)")]
    UnknownFormat(String),

    #[error("no export formats requested")]
    NoFormats,

    #[error("failed to create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to write GeoTIFF {path}: {source}")]
    GeoTiff {
        path: PathBuf,
        #[source]
        source: tiff::TiffError,
    },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_mismatch_display() {
        let err = RasterError::SizeMismatch {
            index: TileIndex::new(1, 2, 3),
            width: 256,
            height: 256,
            found_width: 512,
            found_height: 512,
        };
        assert_eq!(
            err.to_string(),
            "tile 3/1/2 is 512x512 px, collection uses 256x256 px"
        );
    }

    #[test]
    fn test_zoom_mismatch_display() {
        let err = RasterError::ZoomMismatch {
            index: TileIndex::new(1, 2, 3),
            expected: 4,
        };
        assert_eq!(err.to_string(), "tile 3/1/2 is at zoom 3, collection is at zoom 4");
    }

    #[test]
    fn test_not_supported_display() {
        let err = ExportError::NotSupported("grouped GeoTIFF export".to_string());
        assert_eq!(err.to_string(), "not supported: grouped GeoTIFF export");
    }
}
