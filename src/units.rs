use crate::*;

/// Millimetres in a metre.
pub const MM_PER_M: f64 = 1000.0;

/// Integer millimetre coordinates (X,Y,Z).
pub type PointMm = [i64; 3];

/// Rescale metre coordinates into integer millimetres.
///
/// Each coordinate is multiplied by 1000 and truncated toward zero (not rounded), saturating at
/// the `i64` bounds. 2D points are promoted to 3D with `z = 0`.
///
/// # Example
/// ```rust
/// # use shp2ifc::*;
/// assert_eq!(to_millimeters([[1.2, 3.4]]), vec![[1200, 3400, 0]]);
/// assert_eq!(to_millimeters([[-0.0019, 0.0019, 2.5]]), vec![[-1, 1, 2500]]);
/// ```
pub fn to_millimeters<I, P>(points: I) -> Vec<PointMm>
where
    I: IntoIterator<Item = P>,
    P: ToPoint3,
{
    points
        .into_iter()
        .map(|p| p.to_p3().map(|x| (x * MM_PER_M) as i64))
        .collect()
}
