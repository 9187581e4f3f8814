//! Mosaic assembly.
//!
//! Each tile lands at `((x - min_x) * tile_w, (y - min_y) * tile_h)` on a
//! black RGB canvas covering the collection's extent. Cells with no tile
//! stay black.

use super::{ImageCollection, RasterError};
use crate::coord::MercatorBounds;
use crate::tile::TileExtent;
use image::RgbImage;
use tracing::{debug, info};

/// An assembled raster plus what is needed to georeference it.
#[derive(Debug, Clone)]
pub struct Mosaic {
    image: RgbImage,
    bounds: MercatorBounds,
    extent: TileExtent,
    tile_width: u32,
    tile_height: u32,
}

impl Mosaic {
    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    pub fn into_image(self) -> RgbImage {
        self.image
    }

    /// Web Mercator bounds aligned to the tile grid.
    pub fn bounds(&self) -> MercatorBounds {
        self.bounds
    }

    pub fn extent(&self) -> TileExtent {
        self.extent
    }

    pub fn tile_size(&self) -> (u32, u32) {
        (self.tile_width, self.tile_height)
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Stitches the collection into one raster.
pub fn build_mosaic(collection: &ImageCollection) -> Result<Mosaic, RasterError> {
    let extent = collection.extent().ok_or(RasterError::EmptyCollection)?;
    if collection.is_empty() {
        return Err(RasterError::EmptyCollection);
    }
    let bounds = collection.mercator_bounds()?;
    let (tile_width, tile_height) = collection.tile_size();

    let (width, height) = (collection.width(), collection.height());
    let fits = u32::try_from(width).is_ok()
        && u32::try_from(height).is_ok()
        && width
            .checked_mul(height)
            .and_then(|px| px.checked_mul(3))
            .is_some_and(|bytes| usize::try_from(bytes).is_ok());
    if !fits {
        return Err(RasterError::TooLarge { width, height });
    }

    let mut canvas = RgbImage::new(width as u32, height as u32);

    for tile in collection {
        let index = tile.index();
        let px = (index.x - extent.min_x) as i64 * tile_width as i64;
        let py = (index.y - extent.min_y) as i64 * tile_height as i64;
        image::imageops::replace(&mut canvas, tile.image(), px, py);
        debug!(x = index.x, y = index.y, px, py, "Tile pasted");
    }

    info!(
        width = canvas.width(),
        height = canvas.height(),
        tiles = collection.len(),
        "Mosaic assembled"
    );

    Ok(Mosaic {
        image: canvas,
        bounds,
        extent,
        tile_width,
        tile_height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::test_support::solid_tile;
    use image::Rgb;

    fn block_is(image: &RgbImage, x0: u32, y0: u32, size: u32, color: [u8; 3]) -> bool {
        (y0..y0 + size).all(|y| (x0..x0 + size).all(|x| image.get_pixel(x, y) == &Rgb(color)))
    }

    #[test]
    fn test_three_tile_placement() {
        let collection = ImageCollection::from_images(vec![
            solid_tile(1, 2, 10, [255, 0, 0]),
            solid_tile(1, 3, 10, [0, 255, 0]),
            solid_tile(2, 2, 10, [0, 0, 255]),
        ])
        .unwrap();

        let mosaic = build_mosaic(&collection).unwrap();
        let image = mosaic.image();

        // Two columns (x 1..=2) by two rows (y 2..=3).
        assert_eq!((mosaic.width(), mosaic.height()), (512, 512));
        assert!(block_is(image, 0, 0, 256, [255, 0, 0]));
        assert!(block_is(image, 0, 256, 256, [0, 255, 0]));
        assert!(block_is(image, 256, 0, 256, [0, 0, 255]));
        // (2, 3) was never fetched.
        assert!(block_is(image, 256, 256, 256, [0, 0, 0]));
    }

    #[test]
    fn test_paste_order_does_not_matter() {
        let tiles = vec![
            solid_tile(4, 4, 6, [10, 20, 30]),
            solid_tile(5, 4, 6, [40, 50, 60]),
            solid_tile(4, 5, 6, [70, 80, 90]),
            solid_tile(5, 5, 6, [1, 2, 3]),
        ];
        let forward = build_mosaic(&ImageCollection::from_images(tiles.clone()).unwrap()).unwrap();
        let reversed =
            build_mosaic(&ImageCollection::from_images(tiles.into_iter().rev()).unwrap()).unwrap();
        assert_eq!(forward.image().as_raw(), reversed.image().as_raw());
    }

    #[test]
    fn test_mosaic_bounds_match_collection() {
        let collection = ImageCollection::from_images(vec![solid_tile(3, 3, 3, [1, 1, 1])]).unwrap();
        let mosaic = build_mosaic(&collection).unwrap();
        assert_eq!(mosaic.bounds(), collection.mercator_bounds().unwrap());
        assert_eq!(mosaic.tile_size(), (256, 256));
    }

    #[test]
    fn test_empty_collection_fails() {
        assert!(matches!(
            build_mosaic(&ImageCollection::new()),
            Err(RasterError::EmptyCollection)
        ));
    }
}
