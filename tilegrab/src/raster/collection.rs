//! Image collection with cached placement metadata.

use super::{RasterError, TileImage, DEFAULT_TILE_SIZE};
use crate::coord::{tile_range_mercator_bounds, MercatorBounds};
use crate::tile::TileExtent;
use std::cell::OnceCell;
use tracing::debug;

/// Ordered tile images from one zoom level.
///
/// The tile-index extent and aggregate pixel size are kept current on every
/// insertion. The Web Mercator bounds are computed on first request and
/// dropped whenever membership changes.
#[derive(Debug, Clone, Default)]
pub struct ImageCollection {
    images: Vec<TileImage>,
    zoom: Option<u8>,
    tile_width: u32,
    tile_height: u32,
    extent: Option<TileExtent>,
    width: u64,
    height: u64,
    mercator: OnceCell<MercatorBounds>,
}

impl ImageCollection {
    pub fn new() -> Self {
        Self {
            tile_width: DEFAULT_TILE_SIZE,
            tile_height: DEFAULT_TILE_SIZE,
            ..Default::default()
        }
    }

    /// Builds a collection from images sharing a zoom level and pixel size.
    pub fn from_images<I>(images: I) -> Result<Self, RasterError>
    where
        I: IntoIterator<Item = TileImage>,
    {
        let mut collection = Self::new();
        for image in images {
            collection.check_compatible(&image)?;
            collection.images.push(image);
        }
        collection.update_dimensions();
        Ok(collection)
    }

    /// Adds an image, checking it matches the existing members.
    pub fn push(&mut self, image: TileImage) -> Result<(), RasterError> {
        self.check_compatible(&image)?;
        self.images.push(image);
        self.update_dimensions();
        Ok(())
    }

    fn check_compatible(&mut self, image: &TileImage) -> Result<(), RasterError> {
        let index = image.index();
        match self.zoom {
            None => {
                self.zoom = Some(index.z);
                self.tile_width = image.width();
                self.tile_height = image.height();
            }
            Some(zoom) if zoom != index.z => {
                return Err(RasterError::ZoomMismatch {
                    index,
                    expected: zoom,
                })
            }
            Some(_) => {}
        }
        if (image.width(), image.height()) != (self.tile_width, self.tile_height) {
            return Err(RasterError::SizeMismatch {
                index,
                width: self.tile_width,
                height: self.tile_height,
                found_width: image.width(),
                found_height: image.height(),
            });
        }
        Ok(())
    }

    /// Recomputes extent and pixel size. A no-op while empty.
    fn update_dimensions(&mut self) {
        self.mercator = OnceCell::new();

        let Some(extent) = TileExtent::covering(self.images.iter().map(TileImage::index)) else {
            return;
        };
        self.extent = Some(extent);
        self.width = extent.columns() as u64 * self.tile_width as u64;
        self.height = extent.rows() as u64 * self.tile_height as u64;

        debug!(
            tiles = self.images.len(),
            width = self.width,
            height = self.height,
            "Collection dimensions updated: {}",
            extent
        );
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TileImage> {
        self.images.iter()
    }

    pub fn images(&self) -> &[TileImage] {
        &self.images
    }

    /// Zoom level of the members, if any.
    pub fn zoom(&self) -> Option<u8> {
        self.zoom
    }

    /// Pixel size of each member tile.
    pub fn tile_size(&self) -> (u32, u32) {
        (self.tile_width, self.tile_height)
    }

    /// Tile-index extrema of the members.
    pub fn extent(&self) -> Option<TileExtent> {
        self.extent
    }

    /// Mosaic width in pixels.
    pub fn width(&self) -> u64 {
        self.width
    }

    /// Mosaic height in pixels.
    pub fn height(&self) -> u64 {
        self.height
    }

    /// Tile-grid-aligned mosaic bounds in Web Mercator meters.
    pub fn mercator_bounds(&self) -> Result<MercatorBounds, RasterError> {
        if let Some(bounds) = self.mercator.get() {
            return Ok(*bounds);
        }
        let (Some(extent), Some(zoom)) = (self.extent, self.zoom) else {
            return Err(RasterError::EmptyCollection);
        };
        let bounds =
            tile_range_mercator_bounds(extent.min_x, extent.max_x, extent.min_y, extent.max_y, zoom)?;
        Ok(*self.mercator.get_or_init(|| bounds))
    }
}

impl<'a> IntoIterator for &'a ImageCollection {
    type Item = &'a TileImage;
    type IntoIter = std::slice::Iter<'a, TileImage>;

    fn into_iter(self) -> Self::IntoIter {
        self.images.iter()
    }
}

impl IntoIterator for ImageCollection {
    type Item = TileImage;
    type IntoIter = std::vec::IntoIter<TileImage>;

    fn into_iter(self) -> Self::IntoIter {
        self.images.into_iter()
    }
}
