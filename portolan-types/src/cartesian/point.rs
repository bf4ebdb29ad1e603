use nalgebra::{Point2, Scalar, Vector2};
use num_traits::{Float, FromPrimitive, Num};

/// Point on a cartesian plane with `f64` coordinates.
pub type Point2d = Point2<f64>;

/// A point in 2d cartesian coordinates.
pub trait CartesianPoint2d {
    /// Numeric type used to represent coordinates.
    type Num: Num + Copy + PartialOrd + Scalar + FromPrimitive;

    /// X coordinate.
    fn x(&self) -> Self::Num;
    /// Y coordinate.
    fn y(&self) -> Self::Num;

    /// Difference between the points as a vector.
    fn sub(&self, other: &impl CartesianPoint2d<Num = Self::Num>) -> Vector2<Self::Num> {
        Vector2::new(self.x() - other.x(), self.y() - other.y())
    }

    /// Squared distance between the points.
    fn distance_sq(&self, other: &impl CartesianPoint2d<Num = Self::Num>) -> Self::Num {
        let v = self.sub(other);
        v.x * v.x + v.y * v.y
    }
}

/// Distance operations available for points with floating point coordinates.
pub trait CartesianPoint2dFloat<N: Float + Scalar + FromPrimitive = f64>:
    CartesianPoint2d<Num = N>
{
    /// Distance between the points.
    fn distance(&self, other: &impl CartesianPoint2d<Num = N>) -> N {
        self.distance_sq(other).sqrt()
    }
}

impl<N: Float + Scalar + FromPrimitive, T: CartesianPoint2d<Num = N>> CartesianPoint2dFloat<N>
    for T
{
}

impl<T: Num + Copy + PartialOrd + Scalar + FromPrimitive> CartesianPoint2d for Point2<T> {
    type Num = T;

    fn x(&self) -> T {
        self.x
    }

    fn y(&self) -> T {
        self.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn distance() {
        let a = Point2d::new(0.0, 0.0);
        let b = Point2d::new(3.0, 4.0);

        assert_abs_diff_eq!(a.distance_sq(&b), 25.0);
        assert_abs_diff_eq!(a.distance(&b), 5.0);
    }
}
