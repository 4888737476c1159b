//! Resolved country boundary geometry.
//!
//! A [`Boundary`] wraps the polygon (or multipolygon) returned by the
//! geocoding step. It is immutable once constructed and is sourced once per
//! country run. Coordinates are WGS84 with `x = longitude`, `y = latitude`.

use geo::{BoundingRect, Intersects, MultiPolygon, Polygon, Rect};
use thiserror::Error;

/// Errors returned by [`Boundary::new`].
#[derive(Debug, Error, PartialEq)]
pub enum BoundaryError {
    /// The supplied geometry contained no area.
    #[error("boundary geometry must contain at least one non-empty polygon")]
    Empty,
}

/// The polygon boundary of one country.
///
/// # Examples
/// ```
/// use geo::{polygon, MultiPolygon};
/// use sitesift_core::Boundary;
///
/// # fn main() -> Result<(), sitesift_core::BoundaryError> {
/// let shape = polygon![
///     (x: 0.0, y: 0.0),
///     (x: 2.0, y: 0.0),
///     (x: 2.0, y: 1.0),
///     (x: 0.0, y: 1.0),
/// ];
/// let boundary = Boundary::new(MultiPolygon::new(vec![shape]))?;
/// assert_eq!(boundary.bounding_rect().width(), 2.0);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Boundary {
    shape: MultiPolygon<f64>,
    bounds: Rect<f64>,
}

impl Boundary {
    /// Validates and constructs a [`Boundary`].
    ///
    /// # Errors
    ///
    /// Returns [`BoundaryError::Empty`] when the geometry has no extent.
    pub fn new(shape: MultiPolygon<f64>) -> Result<Self, BoundaryError> {
        let bounds = shape.bounding_rect().ok_or(BoundaryError::Empty)?;
        Ok(Self { shape, bounds })
    }

    /// The boundary polygons.
    #[must_use]
    pub fn shape(&self) -> &MultiPolygon<f64> {
        &self.shape
    }

    /// Axis-aligned bounding rectangle of the boundary.
    #[must_use]
    pub fn bounding_rect(&self) -> Rect<f64> {
        self.bounds
    }

    /// Whether the given cell touches the boundary at all.
    ///
    /// Cells wholly outside the boundary are skipped by the tiler.
    #[must_use]
    pub fn intersects_cell(&self, cell: &Rect<f64>) -> bool {
        cell.to_polygon().intersects(&self.shape)
    }
}

impl TryFrom<Polygon<f64>> for Boundary {
    type Error = BoundaryError;

    fn try_from(polygon: Polygon<f64>) -> Result<Self, Self::Error> {
        Self::new(MultiPolygon::new(vec![polygon]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Coord, polygon};

    fn unit_square() -> Polygon<f64> {
        polygon![
            (x: 0.0, y: 0.0),
            (x: 1.0, y: 0.0),
            (x: 1.0, y: 1.0),
            (x: 0.0, y: 1.0),
        ]
    }

    #[test]
    fn rejects_empty_geometry() {
        let result = Boundary::new(MultiPolygon::new(Vec::new()));
        assert_eq!(result.unwrap_err(), BoundaryError::Empty);
    }

    #[test]
    fn reports_bounding_rect() {
        let boundary = Boundary::try_from(unit_square()).unwrap();
        let rect = boundary.bounding_rect();
        assert_eq!(rect.min(), Coord { x: 0.0, y: 0.0 });
        assert_eq!(rect.max(), Coord { x: 1.0, y: 1.0 });
    }

    #[test]
    fn detects_cell_overlap() {
        let boundary = Boundary::try_from(unit_square()).unwrap();
        let inside = Rect::new(Coord { x: 0.2, y: 0.2 }, Coord { x: 0.4, y: 0.4 });
        let outside = Rect::new(Coord { x: 5.0, y: 5.0 }, Coord { x: 6.0, y: 6.0 });
        assert!(boundary.intersects_cell(&inside));
        assert!(!boundary.intersects_cell(&outside));
    }
}
