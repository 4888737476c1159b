//! Tiling of a country's bounding box into bounded query cells.
//!
//! Country-scale feature queries routinely exceed the query service's size
//! and time limits, so the bounding box is cut into fixed-size square cells
//! and each cell is queried on its own. Cells that do not touch the boundary
//! polygon are skipped. The union of the produced cells always covers the
//! boundary's full extent; adjacent cells share edges, so a feature sitting
//! exactly on a cell edge may be returned by more than one query. The
//! deduplication step resolves those collisions.

use geo::{Coord, Rect};
use thiserror::Error;

use crate::boundary::Boundary;

/// Errors returned by [`TileGrid::cover`].
#[derive(Debug, Error, PartialEq)]
pub enum TileError {
    /// The requested edge length cannot produce a finite grid.
    #[error("tile edge length must be a positive, finite number of degrees, got {edge_deg}")]
    InvalidEdge {
        /// The rejected edge length.
        edge_deg: f64,
    },
}

/// One axis-aligned square cell of a country's bounding box.
///
/// The `index` records the cell's position in the grid's deterministic
/// generation order; the merge step relies on it to keep results stable
/// regardless of query completion order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tile {
    /// Position in the grid's generation order.
    pub index: usize,
    /// Cell extent in WGS84 degrees.
    pub bounds: Rect<f64>,
}

impl Tile {
    /// The cell extent as `(south, west, north, east)` degrees.
    #[must_use]
    pub fn bbox(&self) -> (f64, f64, f64, f64) {
        let min = self.bounds.min();
        let max = self.bounds.max();
        (min.y, min.x, max.y, max.x)
    }
}

/// The finite set of query cells covering one country boundary.
///
/// # Examples
/// ```
/// use geo::{polygon, MultiPolygon};
/// use sitesift_core::{Boundary, TileGrid};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let shape = polygon![
///     (x: 0.0, y: 0.0),
///     (x: 1.5, y: 0.0),
///     (x: 1.5, y: 1.0),
///     (x: 0.0, y: 1.0),
/// ];
/// let boundary = Boundary::new(MultiPolygon::new(vec![shape]))?;
/// let grid = TileGrid::cover(&boundary, 0.8)?;
/// assert_eq!(grid.len(), 4);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TileGrid {
    tiles: Vec<Tile>,
}

impl TileGrid {
    /// Cut the boundary's bounding box into square cells of `edge_deg`
    /// degrees, keeping only cells that touch the boundary polygon.
    ///
    /// The final column and row are clamped to the bounding box, so the
    /// union of all cells covers the extent exactly. Cells are generated
    /// column-major from the south-west corner.
    ///
    /// # Errors
    ///
    /// Returns [`TileError::InvalidEdge`] when `edge_deg` is not a positive,
    /// finite number.
    pub fn cover(boundary: &Boundary, edge_deg: f64) -> Result<Self, TileError> {
        if !edge_deg.is_finite() || edge_deg <= 0.0 {
            return Err(TileError::InvalidEdge { edge_deg });
        }

        let extent = boundary.bounding_rect();
        let xs = breakpoints(extent.min().x, extent.max().x, edge_deg);
        let ys = breakpoints(extent.min().y, extent.max().y, edge_deg);

        let mut tiles = Vec::new();
        for window_x in xs.windows(2) {
            for window_y in ys.windows(2) {
                let cell = Rect::new(
                    Coord {
                        x: window_x[0],
                        y: window_y[0],
                    },
                    Coord {
                        x: window_x[1],
                        y: window_y[1],
                    },
                );
                if boundary.intersects_cell(&cell) {
                    tiles.push(Tile {
                        index: tiles.len(),
                        bounds: cell,
                    });
                }
            }
        }

        Ok(Self { tiles })
    }

    /// Number of cells that will be queried.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// Whether the grid contains no queryable cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Iterate over the cells in generation order.
    pub fn iter(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }
}

impl IntoIterator for TileGrid {
    type Item = Tile;
    type IntoIter = std::vec::IntoIter<Tile>;

    fn into_iter(self) -> Self::IntoIter {
        self.tiles.into_iter()
    }
}

/// Grid line positions from `min` to `max` in steps of `edge`, with the last
/// line clamped to `max`.
fn breakpoints(min: f64, max: f64, edge: f64) -> Vec<f64> {
    let mut lines = Vec::new();
    let mut position = min;
    while position < max {
        lines.push(position);
        position += edge;
    }
    lines.push(max);
    lines
}
