use serde::{Deserialize, Serialize};

use crate::cartesian::{Point2d, Rect};

/// Geometry of a feature exchanged with remote services.
///
/// Only the concrete `f64` shapes the services actually report are represented here.
/// Polygons are stored as lists of rings with the outer ring first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Geom {
    /// A single point.
    Point(Point2d),
    /// An open polyline.
    Contour(Vec<Point2d>),
    /// A polygon as a list of rings.
    Polygon(Vec<Vec<Point2d>>),
    /// A set of polygons.
    MultiPolygon(Vec<Vec<Vec<Point2d>>>),
}

impl Geom {
    /// Bounding rectangle of the geometry. `None` for geometries with no points.
    pub fn bounding_rect(&self) -> Option<Rect> {
        match self {
            Geom::Point(p) => Some(Rect::new(p.x, p.y, p.x, p.y)),
            Geom::Contour(points) => Rect::from_points(points.iter()),
            Geom::Polygon(rings) => Rect::from_points(rings.iter().flatten()),
            Geom::MultiPolygon(polygons) => {
                Rect::from_points(polygons.iter().flatten().flatten())
            }
        }
    }
}

impl From<Point2d> for Geom {
    fn from(value: Point2d) -> Self {
        Self::Point(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounding_rect() {
        let point = Geom::Point(Point2d::new(3.0, -2.0));
        assert_eq!(point.bounding_rect(), Some(Rect::new(3.0, -2.0, 3.0, -2.0)));

        let contour = Geom::Contour(vec![Point2d::new(0.0, 1.0), Point2d::new(5.0, -1.0)]);
        assert_eq!(contour.bounding_rect(), Some(Rect::new(0.0, -1.0, 5.0, 1.0)));

        let polygon = Geom::Polygon(vec![vec![
            Point2d::new(0.0, 0.0),
            Point2d::new(4.0, 0.0),
            Point2d::new(4.0, 3.0),
        ]]);
        assert_eq!(polygon.bounding_rect(), Some(Rect::new(0.0, 0.0, 4.0, 3.0)));

        assert_eq!(Geom::Contour(vec![]).bounding_rect(), None);
    }
}
