//! Tiles and tile selection
//!
//! A [`TileIndexResolver`] turns a region into a [`TileCollection`]: the
//! ordered tiles covering it at one zoom level, each with its bounds and
//! fetch URL resolved up front.

mod resolver;
mod types;

pub use resolver::{SelectionMode, TileIndexResolver, CORNER_EPSILON, DEFAULT_SAFE_LIMIT};
pub use types::{ResolveError, Tile, TileCollection, TileExtent};
