use crate::*;

/// Dimensionality of a polyline, decided once for all of its vertices.
#[derive(Copy, Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Dim {
    /// Planar (X,Y) coordinates, carried with `z = 0`.
    Xy,
    /// Full (X,Y,Z) coordinates.
    Xyz,
}

impl Dim {
    /// Number of coordinates per vertex.
    pub fn arity(self) -> usize {
        match self {
            Dim::Xy => 2,
            Dim::Xyz => 3,
        }
    }
}

/// An open pipe centerline of 2 or more vertices.
///
/// Vertices are stored as [`Point3`] regardless of [`Dim`]; planar polylines have every
/// `z == 0`.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Polyline {
    points: Vec<Point3>,
    dim: Dim,
}

impl Polyline {
    /// A planar polyline.
    pub fn xy<I>(points: I) -> Result<Self, GeometryError>
    where
        I: IntoIterator<Item = Point2>,
    {
        Self::validated(points.into_iter().map(ToPoint3::to_p3).collect(), Dim::Xy)
    }

    /// A 3D polyline.
    pub fn xyz<I>(points: I) -> Result<Self, GeometryError>
    where
        I: IntoIterator<Item = Point3>,
    {
        Self::validated(points.into_iter().collect(), Dim::Xyz)
    }

    /// Build from raw coordinate tuples.
    ///
    /// The first tuple decides the dimensionality; any later tuple of a different length is
    /// rejected rather than silently padded or truncated.
    ///
    /// # Example
    /// ```rust
    /// # use shp2ifc::*;
    /// let p = Polyline::from_coords([vec![0.0, 0.0], vec![1.0, 2.0]]).unwrap();
    /// assert_eq!(p.dim(), Dim::Xy);
    ///
    /// let e = Polyline::from_coords([vec![0.0, 0.0], vec![1.0, 2.0, 3.0]]).unwrap_err();
    /// assert_eq!(e, GeometryError::MixedDimensions { vertex: 1, expected: 2, found: 3 });
    /// ```
    pub fn from_coords<I, C>(coords: I) -> Result<Self, GeometryError>
    where
        I: IntoIterator<Item = C>,
        C: AsRef<[f64]>,
    {
        let mut dim = None;
        let mut points = Vec::new();

        for (vertex, c) in coords.into_iter().enumerate() {
            let c = c.as_ref();
            let d = match (dim, c.len()) {
                (Some(d), _) => d,
                (None, 2) => *dim.insert(Dim::Xy),
                (None, 3) => *dim.insert(Dim::Xyz),
                (None, len) => return Err(GeometryError::UnsupportedArity { vertex, len }),
            };

            let p = match (d, c) {
                (Dim::Xy, &[x, y]) => [x, y, 0.0],
                (Dim::Xyz, &[x, y, z]) => [x, y, z],
                _ => {
                    return Err(GeometryError::MixedDimensions {
                        vertex,
                        expected: d.arity(),
                        found: c.len(),
                    })
                }
            };
            points.push(p);
        }

        Self::validated(points, dim.unwrap_or(Dim::Xy))
    }

    fn validated(points: Vec<Point3>, dim: Dim) -> Result<Self, GeometryError> {
        if points.len() < 2 {
            return Err(GeometryError::TooFewPoints(points.len()));
        }
        if let Some(i) = points.iter().position(|p| !p.is_finite()) {
            return Err(GeometryError::NonFinite(i));
        }

        Ok(Self { points, dim })
    }

    pub fn dim(&self) -> Dim {
        self.dim
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn pts(&self) -> &[Point3] {
        &self.points
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = Point3> + '_ {
        self.points.iter().copied()
    }

    /// Consecutive vertex pairs.
    pub fn segments(&self) -> impl ExactSizeIterator<Item = (Point3, Point3)> + '_ {
        self.points.windows(2).map(|w| (w[0], w[1]))
    }

    /// Total length along the centerline.
    pub fn length(&self) -> f64 {
        self.segments().map(|(a, b)| b.sub(a).mag()).sum()
    }
}

impl AsRef<[Point3]> for Polyline {
    fn as_ref(&self) -> &[Point3] {
        &self.points
    }
}

impl IntoIterator for Polyline {
    type Item = Point3;
    type IntoIter = std::vec::IntoIter<Self::Item>;
    fn into_iter(self) -> Self::IntoIter {
        self.points.into_iter()
    }
}
