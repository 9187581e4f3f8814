//! Raster reassembly.
//!
//! Decoded tiles are gathered into an [`ImageCollection`], stitched into a
//! single [`Mosaic`], optionally cut into group windows, and exported.
//!
//! ```text
//!   TileImage ──► ImageCollection ──► build_mosaic ──► Mosaic
//!                                                        │
//!                                   ┌────────────────────┤
//!                                   ▼                    ▼
//!                             group_mosaic         export_mosaic
//!                                   │              (png/jpg/tiff)
//!                                   ▼
//!                             export_groups
//!                               (png/jpg)
//! ```

mod collection;
mod error;
mod export;
pub mod geotiff;
mod grouping;
mod loader;
mod mosaic;
mod tile_image;

pub use collection::ImageCollection;
pub use error::{ExportError, RasterError};
pub use export::{export_groups, export_mosaic, ExportFormat, GROUPS_DIR, MOSAIC_STEM};
pub use geotiff::{write_geotiff, AffineTransform};
pub use grouping::{group_mosaic, GroupSpec, GroupWindow, Groups};
pub use loader::{load_directory, load_images, parse_tile_file_name, scan_tile_dir};
pub use mosaic::{build_mosaic, Mosaic};
pub use tile_image::{TileFormat, TileImage, DEFAULT_TILE_SIZE};

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::coord::TileIndex;
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    /// A solid 256x256 image encoded in `format`.
    pub fn encoded(color: [u8; 3], format: ImageFormat) -> Vec<u8> {
        let img = RgbImage::from_pixel(DEFAULT_TILE_SIZE, DEFAULT_TILE_SIZE, Rgb(color));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, format).unwrap();
        buf.into_inner()
    }

    /// A solid 256x256 decoded tile.
    pub fn solid_tile(x: u32, y: u32, z: u8, color: [u8; 3]) -> TileImage {
        let img = RgbImage::from_pixel(DEFAULT_TILE_SIZE, DEFAULT_TILE_SIZE, Rgb(color));
        TileImage::from_rgb(
            TileIndex::new(x, y, z),
            format!("https://tiles.test/{}/{}/{}.png", z, x, y),
            TileFormat::Png,
            img,
        )
        .unwrap()
    }
}
