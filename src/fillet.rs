//! Inserting bend points around the interior vertices of a centerline.
//!
//! Each interior vertex `v` is replaced with `before, v, after`, where `before` and `after` sit on
//! the incoming and outgoing segments a _curve distance_ away from `v`. The position of `v` in the
//! output is recorded as an _arc index_: a sweep builder renders `before, v, after` as an arc
//! through three points, giving the pipe a rounded bend instead of a mitre.
use crate::*;

/// Curve distance used when none is given.
pub const DEFAULT_CURVE_DISTANCE: f64 = 1.0;

/// Segments this short or shorter are treated as zero length.
pub const SEGMENT_EPSILON: f64 = 1e-9;

/// What to do when the curve distance does not fit on an adjacent segment.
///
/// A bend _fits_ when the curve distance is no more than half of the shorter segment either side
/// of the vertex, which guarantees the approach and departure points of neighbouring bends never
/// cross.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Overshoot {
    /// Shrink the curve distance at that vertex to half the shorter adjacent segment.
    #[default]
    Clamp,
    /// Use the curve distance as given; the bend points may pass the neighbouring vertex.
    Allow,
    /// Fail with [`GeometryError::Overshoot`].
    Reject,
}

/// A centerline with bend points inserted.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AdjustedPath {
    points: Vec<Point3>,
    arc_indices: Vec<usize>,
    dim: Dim,
}

impl AdjustedPath {
    pub fn points(&self) -> &[Point3] {
        &self.points
    }

    /// Output positions of the original interior vertices, ascending.
    pub fn arc_indices(&self) -> &[usize] {
        &self.arc_indices
    }

    /// The dimensionality of the source polyline.
    pub fn dim(&self) -> Dim {
        self.dim
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn into_parts(self) -> (Vec<Point3>, Vec<usize>) {
        let Self {
            points,
            arc_indices,
            ..
        } = self;
        (points, arc_indices)
    }
}

impl AsRef<[Point3]> for AdjustedPath {
    fn as_ref(&self) -> &[Point3] {
        &self.points
    }
}

/// Insert bend points with the default [`Overshoot::Clamp`] policy.
///
/// # Example
/// ```rust
/// # use shp2ifc::*;
/// let line = Polyline::xy([[0.0, 0.0], [5.0, 3.0], [9.0, 4.0], [12.0, 6.0]]).unwrap();
/// let path = adjust_path(&line, DEFAULT_CURVE_DISTANCE).unwrap();
///
/// assert_eq!(path.len(), 8);
/// assert_eq!(path.arc_indices(), &[2, 5]);
/// ```
pub fn adjust_path(polyline: &Polyline, curve_distance: f64) -> Result<AdjustedPath, GeometryError> {
    adjust_path_with(polyline, curve_distance, Overshoot::default())
}

/// Insert bend points around every interior vertex of `polyline`.
///
/// Output order is `v0, b1, v1, a1, ..., b(n-2), v(n-2), a(n-2), v(n-1)`, so a polyline of `n`
/// vertices yields `3n - 4` points, with arc indices `2, 5, 8, ...`.
/// Every segment is checked before any point is produced; a zero length segment fails with
/// [`GeometryError::DegenerateSegment`].
pub fn adjust_path_with(
    polyline: &Polyline,
    curve_distance: f64,
    overshoot: Overshoot,
) -> Result<AdjustedPath, GeometryError> {
    if !(curve_distance.is_finite() && curve_distance > 0.0) {
        return Err(GeometryError::InvalidCurveDistance(curve_distance));
    }

    let vs = polyline.pts();
    let lens = polyline
        .segments()
        .map(|(a, b)| b.sub(a).mag())
        .collect::<Vec<_>>();

    if let Some(segment) = lens.iter().position(|&l| l <= SEGMENT_EPSILON) {
        return Err(GeometryError::DegenerateSegment { segment });
    }

    let n = vs.len();
    let mut points = Vec::with_capacity(3 * n - 4);
    let mut arc_indices = Vec::with_capacity(n - 2);

    points.push(vs[0]);

    for i in 1..n - 1 {
        let d = bend_distance(i, curve_distance, lens[i - 1].min(lens[i]), overshoot)?;

        let (prev, curr, next) = (vs[i - 1], vs[i], vs[i + 1]);
        let before = offset_towards(prev, curr, d)
            .ok_or(GeometryError::DegenerateSegment { segment: i - 1 })?;
        let after =
            offset_towards(next, curr, d).ok_or(GeometryError::DegenerateSegment { segment: i })?;

        points.push(before);
        points.push(curr);
        arc_indices.push(points.len() - 1);
        points.push(after);
    }

    points.push(vs[n - 1]);

    Ok(AdjustedPath {
        points,
        arc_indices,
        dim: polyline.dim(),
    })
}

fn bend_distance(
    vertex: usize,
    distance: f64,
    shorter_segment: f64,
    overshoot: Overshoot,
) -> Result<f64, GeometryError> {
    let limit = shorter_segment * 0.5;
    if distance <= limit {
        return Ok(distance);
    }

    match overshoot {
        Overshoot::Allow => Ok(distance),
        Overshoot::Clamp => {
            log::warn!(
                "curve distance {} clamped to {} at vertex {}",
                distance,
                limit,
                vertex
            );
            Ok(limit)
        }
        Overshoot::Reject => Err(GeometryError::Overshoot { vertex, distance }),
    }
}
