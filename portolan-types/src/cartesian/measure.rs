use crate::cartesian::{CartesianPoint2dFloat, Point2d};

/// Length of the polyline going through the given points, in map units.
pub fn polyline_length(points: &[Point2d]) -> f64 {
    points
        .windows(2)
        .map(|segment| segment[0].distance(&segment[1]))
        .sum()
}

/// Area of the polygon with the given ring, in square map units.
///
/// The closing segment between the last and the first point is implied. The result does
/// not depend on the winding direction of the ring.
pub fn ring_area(ring: &[Point2d]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }

    let mut doubled: f64 = 0.0;
    for i in 0..ring.len() {
        let p = ring[i];
        let q = ring[(i + 1) % ring.len()];
        doubled += p.x * q.y - q.x * p.y;
    }

    (doubled / 2.0).abs()
}
