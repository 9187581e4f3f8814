//! Re-partitioning a mosaic into fixed-size windows.
//!
//! Windows are `group_w * tile_w` by `group_h * tile_h` pixels and are
//! produced lazily in row-major order. Windows overhanging the right or
//! bottom edge are padded with black. Windows containing only black pixels
//! are skipped.

use super::RasterError;
use image::{GenericImageView, RgbImage};
use tracing::debug;

/// Window size in tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupSpec {
    width_tiles: u32,
    height_tiles: u32,
    overlap: bool,
}

impl GroupSpec {
    pub fn new(width_tiles: u32, height_tiles: u32) -> Result<Self, RasterError> {
        if width_tiles == 0 || height_tiles == 0 {
            return Err(RasterError::InvalidGroupSize {
                width: width_tiles,
                height: height_tiles,
            });
        }
        Ok(Self {
            width_tiles,
            height_tiles,
            overlap: false,
        })
    }

    /// Overlapping windows share one tile with their neighbour.
    pub fn with_overlap(mut self, overlap: bool) -> Self {
        self.overlap = overlap;
        self
    }

    pub fn width_tiles(&self) -> u32 {
        self.width_tiles
    }

    pub fn height_tiles(&self) -> u32 {
        self.height_tiles
    }

    pub fn overlap(&self) -> bool {
        self.overlap
    }
}

/// One non-empty window of the mosaic.
#[derive(Debug, Clone)]
pub struct GroupWindow {
    /// 1-based position among the emitted windows.
    pub number: usize,
    /// Window column and row in the scan grid.
    pub column: u32,
    pub row: u32,
    /// Top-left pixel in the mosaic.
    pub x: u32,
    pub y: u32,
    pub image: RgbImage,
}

/// Lazy sequence of windows over a mosaic.
pub struct Groups<'a> {
    source: &'a RgbImage,
    window: (u32, u32),
    step: (u32, u32),
    x: u32,
    y: u32,
    column: u32,
    row: u32,
    emitted: usize,
    done: bool,
}

/// Splits `mosaic` into windows of `spec` tiles of `tile_size` pixels.
pub fn group_mosaic(mosaic: &RgbImage, tile_size: (u32, u32), spec: GroupSpec) -> Groups<'_> {
    let (tile_w, tile_h) = (tile_size.0.max(1), tile_size.1.max(1));
    let window = (spec.width_tiles * tile_w, spec.height_tiles * tile_h);
    let step = if spec.overlap {
        (
            window.0.saturating_sub(tile_w).max(tile_w),
            window.1.saturating_sub(tile_h).max(tile_h),
        )
    } else {
        window
    };

    debug!(
        window_w = window.0,
        window_h = window.1,
        step_x = step.0,
        step_y = step.1,
        "Grouping mosaic of {}x{} px",
        mosaic.width(),
        mosaic.height()
    );

    Groups {
        source: mosaic,
        window,
        step,
        x: 0,
        y: 0,
        column: 0,
        row: 0,
        emitted: 0,
        done: mosaic.width() == 0 || mosaic.height() == 0,
    }
}

impl Groups<'_> {
    /// Moves to the next scan position, row-major.
    fn advance(&mut self) {
        let (width, height) = self.source.dimensions();
        if self.x + self.window.0 < width {
            self.x += self.step.0;
            self.column += 1;
        } else if self.y + self.window.1 < height {
            self.x = 0;
            self.column = 0;
            self.y += self.step.1;
            self.row += 1;
        } else {
            self.done = true;
        }
    }

    fn cut(&self) -> Option<RgbImage> {
        let (width, height) = self.source.dimensions();
        let w = self.window.0.min(width - self.x);
        let h = self.window.1.min(height - self.y);
        let view = self.source.view(self.x, self.y, w, h);

        if view.pixels().all(|(_, _, p)| p.0 == [0, 0, 0]) {
            return None;
        }

        let mut out = RgbImage::new(self.window.0, self.window.1);
        image::imageops::replace(&mut out, &*view, 0, 0);
        Some(out)
    }
}

impl Iterator for Groups<'_> {
    type Item = GroupWindow;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            let (x, y, column, row) = (self.x, self.y, self.column, self.row);
            let cut = self.cut();
            self.advance();

            match cut {
                Some(image) => {
                    self.emitted += 1;
                    return Some(GroupWindow {
                        number: self.emitted,
                        column,
                        row,
                        x,
                        y,
                        image,
                    });
                }
                None => debug!(x, y, "Skipping empty group window"),
            }
        }
        None
    }
}

impl std::iter::FusedIterator for Groups<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn filled(width: u32, height: u32) -> RgbImage {
        RgbImage::from_pixel(width, height, Rgb([7, 7, 7]))
    }

    #[test]
    fn test_rejects_zero_dims() {
        assert!(matches!(
            GroupSpec::new(0, 2),
            Err(RasterError::InvalidGroupSize { width: 0, height: 2 })
        ));
        assert!(GroupSpec::new(2, 0).is_err());
    }

    #[test]
    fn test_four_windows_row_major() {
        let mosaic = filled(1024, 1024);
        let spec = GroupSpec::new(2, 2).unwrap();
        let windows: Vec<_> = group_mosaic(&mosaic, (256, 256), spec).collect();

        assert_eq!(windows.len(), 4);
        let origins: Vec<_> = windows.iter().map(|w| (w.x, w.y)).collect();
        assert_eq!(origins, vec![(0, 0), (512, 0), (0, 512), (512, 512)]);
        let numbers: Vec<_> = windows.iter().map(|w| w.number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4]);
        assert!(windows.iter().all(|w| w.image.dimensions() == (512, 512)));
        assert_eq!((windows[3].column, windows[3].row), (1, 1));
    }

    #[test]
    fn test_empty_window_is_skipped() {
        let mut mosaic = filled(1024, 1024);
        // Blank out the top-right window.
        for y in 0..512 {
            for x in 512..1024 {
                mosaic.put_pixel(x, y, Rgb([0, 0, 0]));
            }
        }
        let spec = GroupSpec::new(2, 2).unwrap();
        let windows: Vec<_> = group_mosaic(&mosaic, (256, 256), spec).collect();

        assert_eq!(windows.len(), 3);
        let origins: Vec<_> = windows.iter().map(|w| (w.x, w.y)).collect();
        assert_eq!(origins, vec![(0, 0), (0, 512), (512, 512)]);
        // Numbering counts emitted windows only.
        assert_eq!(windows[2].number, 3);
    }

    #[test]
    fn test_single_lit_pixel_keeps_window() {
        let mut mosaic = RgbImage::new(512, 512);
        mosaic.put_pixel(300, 300, Rgb([0, 0, 1]));
        let spec = GroupSpec::new(1, 1).unwrap();
        let windows: Vec<_> = group_mosaic(&mosaic, (256, 256), spec).collect();
        assert_eq!(windows.len(), 1);
        assert_eq!((windows[0].x, windows[0].y), (256, 256));
    }

    #[test]
    fn test_edge_windows_are_padded() {
        let mosaic = filled(768, 256);
        let spec = GroupSpec::new(2, 1).unwrap();
        let windows: Vec<_> = group_mosaic(&mosaic, (256, 256), spec).collect();

        assert_eq!(windows.len(), 2);
        let last = &windows[1];
        assert_eq!((last.x, last.y), (512, 0));
        assert_eq!(last.image.dimensions(), (512, 256));
        assert_eq!(last.image.get_pixel(100, 100), &Rgb([7, 7, 7]));
        assert_eq!(last.image.get_pixel(300, 100), &Rgb([0, 0, 0]));
    }

    #[test]
    fn test_overlap_steps_one_tile_less() {
        let mosaic = filled(1024, 512);
        let spec = GroupSpec::new(2, 2).unwrap().with_overlap(true);
        let origins: Vec<_> = group_mosaic(&mosaic, (256, 256), spec)
            .map(|w| (w.x, w.y))
            .collect();
        assert_eq!(origins, vec![(0, 0), (256, 0), (512, 0)]);
    }

    #[test]
    fn test_overlap_with_single_tile_window_steps_one_tile() {
        let mosaic = filled(512, 256);
        let spec = GroupSpec::new(1, 1).unwrap().with_overlap(true);
        assert_eq!(group_mosaic(&mosaic, (256, 256), spec).count(), 2);
    }

    #[test]
    fn test_iterator_is_fused() {
        let mosaic = filled(256, 256);
        let spec = GroupSpec::new(1, 1).unwrap();
        let mut groups = group_mosaic(&mosaic, (256, 256), spec);
        assert!(groups.next().is_some());
        assert!(groups.next().is_none());
        assert!(groups.next().is_none());
    }
}
