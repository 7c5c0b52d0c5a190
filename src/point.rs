/// 2D Point (X,Y).
pub type Point2 = [f64; 2];

/// 3D Point (X,Y,Z).
pub type Point3 = [f64; 3];

/// Vector arithmetic over fixed size coordinate arrays.
pub trait Point: Copy + Sized + IntoIterator<Item = f64> {
    /// Combine each pair of dimensions with `f`.
    fn zip_with<F: Fn(f64, f64) -> f64>(self, b: Self, f: F) -> Self;

    /// Scale point by multiplying all dimensions by `scalar`.
    fn scale(self, scalar: f64) -> Self;

    fn add(self, rhs: Self) -> Self {
        self.zip_with(rhs, |a, b| a + b)
    }

    fn sub(self, rhs: Self) -> Self {
        self.zip_with(rhs, |a, b| a - b)
    }

    fn dot(self, rhs: Self) -> f64 {
        self.into_iter().zip(rhs).map(|(a, b)| a * b).sum()
    }

    /// Calculate the magnitude of the vector.
    fn mag(self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Normalise the vector by the magnitude.
    fn unit(self) -> Self {
        self.scale(self.mag().recip())
    }

    /// All dimensions are finite.
    fn is_finite(self) -> bool {
        self.into_iter().all(f64::is_finite)
    }
}

impl<const N: usize> Point for [f64; N] {
    fn zip_with<F: Fn(f64, f64) -> f64>(self, b: Self, f: F) -> Self {
        let mut out = self;
        for (o, b) in out.iter_mut().zip(b) {
            *o = f(*o, b);
        }
        out
    }

    fn scale(self, scalar: f64) -> Self {
        self.map(|f| f * scalar)
    }
}

/// Lift a point into 3D.
///
/// A [`Point2`] is placed on the `z = 0` plane.
pub trait ToPoint3 {
    fn to_p3(self) -> Point3;
}

impl ToPoint3 for Point2 {
    fn to_p3(self) -> Point3 {
        let [x, y] = self;
        [x, y, 0.0]
    }
}
impl ToPoint3 for &Point2 {
    fn to_p3(self) -> Point3 {
        (*self).to_p3()
    }
}
impl ToPoint3 for Point3 {
    fn to_p3(self) -> Point3 {
        self
    }
}
impl ToPoint3 for &Point3 {
    fn to_p3(self) -> Point3 {
        *self
    }
}

/// Returns the point `distance` back from `to`, travelling towards `from`.
///
/// The offset runs along the unit vector `from -> to`, so a `distance` larger than the segment
/// overshoots past `from`.
/// Returns `None` if `from` and `to` coincide.
///
/// # Example
/// ```rust
/// # use shp2ifc::*;
/// let p = offset_towards([0.0, 0.0, 0.0], [4.0, 0.0, 0.0], 1.0).unwrap();
/// assert_eq!(p, [3.0, 0.0, 0.0]);
/// ```
pub fn offset_towards<P: Point>(from: P, to: P, distance: f64) -> Option<P> {
    let v = to.sub(from);
    let len = v.mag();
    (len > f64::EPSILON).then(|| to.sub(v.scale(distance / len)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_arithmetic() {
        assert_eq!([0.0, 1.0].add([3.0, 1.0]), [3.0, 2.0]);
        assert_eq!([0.0, 1.0, 5.0].add([3.0, 1.0, 5.0]), [3.0, 2.0, 10.0]);
        assert_eq!([0.0, 1.0, 5.0].sub([3.0, 1.0, 5.0]), [-3.0, 0.0, 0.0]);
        assert_eq!([-2.0, 0.5, 3.0].scale(-0.5), [1.0, -0.25, -1.5]);
        assert_eq!([1.0, 2.0, 3.0].dot([4.0, -5.0, 6.0]), 12.0);
    }

    #[test]
    fn magnitudes() {
        assert!(([3.0, -4.0].mag() - 5.0).abs() < 1e-11);
        assert!(([-2.0, -3.0, 6.0].mag() - 7.0).abs() < 1e-11);

        assert_eq!([2.0, 0.0].unit(), [1.0, 0.0]);
        assert_eq!([0.0, 0.0, 2.0].unit(), [0.0, 0.0, 1.0]);

        assert!([1.0, 2.0, 3.0].is_finite());
        assert!(![1.0, f64::NAN].is_finite());
    }

    #[test]
    fn lifting_to_3d() {
        assert_eq!([1.0, 2.0].to_p3(), [1.0, 2.0, 0.0]);
        assert_eq!([1.0, 2.0, 3.0].to_p3(), [1.0, 2.0, 3.0]);
    }

    #[test]
    fn offsetting() {
        let p = offset_towards([0.0, 0.0], [3.0, 4.0], 5.0).unwrap();
        assert!(p.mag() < 1e-11);

        let p = offset_towards([0.0, 0.0, 10.0], [0.0, 0.0, 0.0], 2.0).unwrap();
        assert_eq!(p, [0.0, 0.0, 2.0]);

        // overshoots when distance is longer than the segment
        let p = offset_towards([1.0, 0.0], [2.0, 0.0], 3.0).unwrap();
        assert_eq!(p, [-1.0, 0.0]);

        assert_eq!(offset_towards([1.0, 1.0, 1.0], [1.0, 1.0, 1.0], 1.0), None);
    }
}
