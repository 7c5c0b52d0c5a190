use thiserror::Error as ThisError;

/// Result type for conversion runs.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors that abort a conversion run.
#[derive(ThisError, Debug)]
pub enum Error {
    #[error("input format error: {0}")]
    InputFormat(String),

    #[error("field '{field}': {reason}")]
    Field { field: String, reason: String },

    #[error("geometry error in record {record}: {source}")]
    Geometry {
        record: usize,
        #[source]
        source: GeometryError,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Field {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Errors in building or filleting a single centerline.
#[derive(ThisError, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("polyline requires 2 or more points, found {0}")]
    TooFewPoints(usize),

    #[error("vertex {vertex} has {len} coordinates, expecting 2 or 3")]
    UnsupportedArity { vertex: usize, len: usize },

    #[error("vertex {vertex} has {found} coordinates but the polyline started with {expected}")]
    MixedDimensions {
        vertex: usize,
        expected: usize,
        found: usize,
    },

    #[error("vertex {0} has a non-finite coordinate")]
    NonFinite(usize),

    #[error("segment starting at vertex {segment} has zero length")]
    DegenerateSegment { segment: usize },

    #[error("curve distance must be finite and positive, got {0}")]
    InvalidCurveDistance(f64),

    #[error("curve distance {distance} overshoots an adjacent segment at vertex {vertex}")]
    Overshoot { vertex: usize, distance: f64 },
}
