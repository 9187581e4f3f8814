//! Georeferenced TIFF output in Web Mercator.
//!
//! The writer emits an uncompressed 8-bit RGB image with planar
//! (band-major) layout, one strip per band, and the three GeoTIFF tags
//! needed to place it: pixel scale, a tiepoint at the top-left corner,
//! and a key directory naming EPSG:3857.

use super::ExportError;
use crate::coord::{MercatorBounds, WEB_MERCATOR_EPSG};
use image::RgbImage;
use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::Path;
use tiff::encoder::TiffEncoder;
use tiff::tags::Tag;

const MODEL_PIXEL_SCALE: u16 = 33550;
const MODEL_TIEPOINT: u16 = 33922;
const GEO_KEY_DIRECTORY: u16 = 34735;

const GT_MODEL_TYPE_GEO_KEY: u16 = 1024;
const GT_RASTER_TYPE_GEO_KEY: u16 = 1025;
const PROJECTED_CS_TYPE_GEO_KEY: u16 = 3072;
const MODEL_TYPE_PROJECTED: u16 = 1;
const RASTER_PIXEL_IS_AREA: u16 = 1;

/// Pixel-to-world mapping of a north-up raster.
///
/// `world_x = a * col + b * row + c`, `world_y = d * col + e * row + f`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineTransform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl AffineTransform {
    /// Transform mapping a `width` x `height` raster onto `bounds`.
    pub fn from_bounds(bounds: &MercatorBounds, width: u32, height: u32) -> Self {
        Self {
            a: bounds.width() / width.max(1) as f64,
            b: 0.0,
            c: bounds.xmin,
            d: 0.0,
            e: -bounds.height() / height.max(1) as f64,
            f: bounds.ymax,
        }
    }

    /// World coordinate of the top-left corner of pixel `(col, row)`.
    pub fn apply(&self, col: f64, row: f64) -> (f64, f64) {
        (
            self.a * col + self.b * row + self.c,
            self.d * col + self.e * row + self.f,
        )
    }
}

/// Writes `image` to `path` georeferenced on `bounds`.
pub fn write_geotiff(
    path: &Path,
    image: &RgbImage,
    bounds: &MercatorBounds,
) -> Result<(), ExportError> {
    let file = File::create(path).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer = BufWriter::new(file);
    encode_geotiff(&mut writer, image, bounds).map_err(|source| ExportError::GeoTiff {
        path: path.to_path_buf(),
        source,
    })?;
    writer.flush().map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Encodes a GeoTIFF into any seekable writer.
pub fn encode_geotiff<W: Write + Seek>(
    writer: W,
    image: &RgbImage,
    bounds: &MercatorBounds,
) -> Result<(), tiff::TiffError> {
    let (width, height) = image.dimensions();
    let transform = AffineTransform::from_bounds(bounds, width, height);

    let mut encoder = TiffEncoder::new(writer)?;
    let mut dir = encoder.image_directory()?;

    dir.write_tag(Tag::ImageWidth, width)?;
    dir.write_tag(Tag::ImageLength, height)?;
    dir.write_tag(Tag::BitsPerSample, [8u16, 8, 8].as_slice())?;
    dir.write_tag(Tag::Compression, 1u16)?;
    // RGB
    dir.write_tag(Tag::PhotometricInterpretation, 2u16)?;
    dir.write_tag(Tag::SamplesPerPixel, 3u16)?;
    // Planar: each band in its own strip.
    dir.write_tag(Tag::PlanarConfiguration, 2u16)?;
    dir.write_tag(Tag::RowsPerStrip, height)?;

    let scale = [transform.a, -transform.e, 0.0];
    dir.write_tag(Tag::Unknown(MODEL_PIXEL_SCALE), scale.as_slice())?;
    let tiepoint = [0.0, 0.0, 0.0, transform.c, transform.f, 0.0];
    dir.write_tag(Tag::Unknown(MODEL_TIEPOINT), tiepoint.as_slice())?;
    let keys = geo_key_directory();
    dir.write_tag(Tag::Unknown(GEO_KEY_DIRECTORY), keys.as_slice())?;

    let mut offsets = Vec::with_capacity(3);
    let mut counts = Vec::with_capacity(3);
    for band in 0..3 {
        let plane: Vec<u8> = image.pixels().map(|p| p.0[band]).collect();
        let offset = dir.write_data(plane.as_slice())?;
        offsets.push(strip_u32(offset)?);
        counts.push(strip_u32(plane.len() as u64)?);
    }
    dir.write_tag(Tag::StripOffsets, offsets.as_slice())?;
    dir.write_tag(Tag::StripByteCounts, counts.as_slice())?;

    dir.finish()
}

fn strip_u32(value: u64) -> Result<u32, tiff::TiffError> {
    u32::try_from(value).map_err(|_| tiff::TiffError::LimitsExceeded)
}

fn geo_key_directory() -> Vec<u16> {
    vec![
        // version, revision, minor revision, key count
        1,
        1,
        0,
        3,
        GT_MODEL_TYPE_GEO_KEY,
        0,
        1,
        MODEL_TYPE_PROJECTED,
        GT_RASTER_TYPE_GEO_KEY,
        0,
        1,
        RASTER_PIXEL_IS_AREA,
        PROJECTED_CS_TYPE_GEO_KEY,
        0,
        1,
        WEB_MERCATOR_EPSG,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::{tile_range_mercator_bounds, WEB_MERCATOR_EXTENT};
    use image::Rgb;
    use std::io::Cursor;

    fn sample() -> RgbImage {
        let mut img = RgbImage::from_pixel(4, 2, Rgb([10, 20, 30]));
        img.put_pixel(3, 1, Rgb([200, 100, 50]));
        img
    }

    fn encode(image: &RgbImage, bounds: &MercatorBounds) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        encode_geotiff(&mut buf, image, bounds).unwrap();
        buf.into_inner()
    }

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|w| w == needle)
    }

    #[test]
    fn test_affine_from_bounds() {
        let bounds = MercatorBounds {
            xmin: 100.0,
            ymin: 0.0,
            xmax: 500.0,
            ymax: 200.0,
        };
        let t = AffineTransform::from_bounds(&bounds, 4, 2);
        assert_eq!(t.a, 100.0);
        assert_eq!(t.e, -100.0);
        assert_eq!(t.c, 100.0);
        assert_eq!(t.f, 200.0);
        assert_eq!(t.apply(4.0, 2.0), (500.0, 0.0));
    }

    #[test]
    fn test_header_is_little_endian_tiff() {
        let bounds = tile_range_mercator_bounds(0, 0, 0, 0, 0).unwrap();
        let bytes = encode(&sample(), &bounds);
        assert_eq!(&bytes[..4], b"II*\0");
    }

    #[test]
    fn test_bands_are_stored_band_major() {
        let bounds = tile_range_mercator_bounds(0, 0, 0, 0, 0).unwrap();
        let bytes = encode(&sample(), &bounds);

        assert!(contains(&bytes, &[10, 10, 10, 10, 10, 10, 10, 200]));
        assert!(contains(&bytes, &[20, 20, 20, 20, 20, 20, 20, 100]));
        assert!(contains(&bytes, &[30, 30, 30, 30, 30, 30, 30, 50]));
    }

    #[test]
    fn test_tiepoint_and_epsg_are_written() {
        let bounds = tile_range_mercator_bounds(0, 0, 0, 0, 0).unwrap();
        let bytes = encode(&sample(), &bounds);

        let mut tiepoint = Vec::new();
        for v in [-WEB_MERCATOR_EXTENT, WEB_MERCATOR_EXTENT] {
            tiepoint.extend_from_slice(&v.to_le_bytes());
        }
        assert!(contains(&bytes, &tiepoint));

        let mut keys = Vec::new();
        for v in [PROJECTED_CS_TYPE_GEO_KEY, 0, 1, WEB_MERCATOR_EPSG] {
            keys.extend_from_slice(&v.to_le_bytes());
        }
        assert!(contains(&bytes, &keys));
    }

    #[test]
    fn test_write_geotiff_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mosaic.tiff");
        let bounds = tile_range_mercator_bounds(3, 4, 5, 5, 4).unwrap();
        write_geotiff(&path, &sample(), &bounds).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        // Three 8-byte planes plus the directory.
        assert!(bytes.len() > 24);
        assert_eq!(&bytes[..2], b"II");
    }
}
