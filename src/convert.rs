//! Driving the core transforms over a layer of pipe centerlines.
use crate::*;
use rayon::prelude::*;

/// Curve distance used when converting pipe runs, in source units (metres).
pub const PIPE_CURVE_DISTANCE: f64 = 5.0;

/// Pipe diameter used when no attribute field is given, in model units (millimetres).
pub const DEFAULT_DIAMETER: f64 = 200.0;

/// Where each pipe's diameter comes from.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiameterSource {
    /// One diameter for every pipe.
    Fixed(f64),
    /// A numeric attribute field, read per record.
    Field(String),
}

impl Default for DiameterSource {
    fn default() -> Self {
        DiameterSource::Fixed(DEFAULT_DIAMETER)
    }
}

/// Settings for a conversion run.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ConvertOptions {
    /// Distance from each interior vertex to its bend points.
    pub curve_distance: f64,
    /// Policy for bends that do not fit on their adjacent segments.
    pub overshoot: Overshoot,
    pub diameter: DiameterSource,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            curve_distance: PIPE_CURVE_DISTANCE,
            overshoot: Overshoot::default(),
            diameter: DiameterSource::default(),
        }
    }
}

/// Centerlines and their attributes, in record order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PipeLayer {
    centerlines: Vec<Polyline>,
    table: Option<Table>,
}

impl PipeLayer {
    /// A layer with an optional attribute table.
    ///
    /// The table, if given, must have one row per centerline.
    pub fn new(centerlines: Vec<Polyline>, table: Option<Table>) -> Result<Self> {
        match &table {
            Some(t) if t.len() != centerlines.len() => Err(Error::InputFormat(format!(
                "{} centerlines but {} attribute rows",
                centerlines.len(),
                t.len()
            ))),
            _ => Ok(Self { centerlines, table }),
        }
    }

    pub fn centerlines(&self) -> &[Polyline] {
        &self.centerlines
    }

    pub fn table(&self) -> Option<&Table> {
        self.table.as_ref()
    }

    pub fn len(&self) -> usize {
        self.centerlines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.centerlines.is_empty()
    }
}

/// A centerline ready to be swept.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PreparedPipe {
    /// Filleted path in millimetres.
    pub points: Vec<PointMm>,
    /// Positions in `points` to render as arc midpoints.
    pub arc_indices: Vec<usize>,
    pub diameter: f64,
}

/// Builds a swept solid from a prepared path.
///
/// Implementors own whatever model the solids are collected in; the returned handle identifies
/// the built element.
pub trait SweepBuilder {
    type Handle;

    /// Sweep a disk of `radius` along `points`, rendering each `arc_indices` position and its
    /// neighbours as an arc.
    fn sweep(
        &mut self,
        points: &[PointMm],
        arc_indices: &[usize],
        radius: f64,
    ) -> Result<Self::Handle>;
}

/// Check `field` exists on `table` and holds numbers.
pub fn validate_diameter_field(table: Option<&Table>, field: &str) -> Result<()> {
    let numeric = table.map(numeric_fields).unwrap_or_default();
    if numeric.iter().any(|f| f == field) {
        Ok(())
    } else {
        Err(Error::field(field, "does not exist or is not numeric"))
    }
}

/// Resolve the diameter of every record, in record order.
fn diameters(layer: &PipeLayer, source: &DiameterSource) -> Result<Vec<f64>> {
    let positive = |d: f64| d.is_finite() && d > 0.0;

    match source {
        DiameterSource::Fixed(d) if positive(*d) => Ok(vec![*d; layer.len()]),
        DiameterSource::Fixed(d) => Err(Error::field(
            "diameter",
            format!("fixed diameter must be positive, got {}", d),
        )),
        DiameterSource::Field(field) => {
            validate_diameter_field(layer.table(), field)?;
            let column = layer
                .table()
                .and_then(|t| t.column(field))
                .ok_or_else(|| Error::field(field.as_str(), "does not exist or is not numeric"))?;

            column
                .enumerate()
                .map(|(record, v)| match v.as_f64() {
                    Some(d) if positive(d) => Ok(d),
                    Some(d) => Err(Error::field(
                        field.as_str(),
                        format!("record {} has a non-positive diameter {}", record, d),
                    )),
                    None => Err(Error::field(
                        field.as_str(),
                        format!("record {} has no value", record),
                    )),
                })
                .collect()
        }
    }
}

/// Fillet and rescale a single centerline.
pub fn prepare_pipe(
    centerline: &Polyline,
    diameter: f64,
    curve_distance: f64,
    overshoot: Overshoot,
) -> Result<PreparedPipe, GeometryError> {
    let (points, arc_indices) =
        adjust_path_with(centerline, curve_distance, overshoot)?.into_parts();

    Ok(PreparedPipe {
        points: to_millimeters(points),
        arc_indices,
        diameter,
    })
}

/// Prepare every centerline of the layer.
///
/// Diameters are resolved (and a diameter field validated) before any geometry work. Records are
/// processed in parallel but returned in record order; the first failing record, by index, aborts
/// the run.
pub fn prepare(layer: &PipeLayer, options: &ConvertOptions) -> Result<Vec<PreparedPipe>> {
    let diameters = diameters(layer, &options.diameter)?;

    let prepared = layer
        .centerlines()
        .par_iter()
        .zip(diameters.par_iter())
        .enumerate()
        .map(|(record, (line, &diameter))| -> Result<PreparedPipe> {
            let pipe =
                prepare_pipe(line, diameter, options.curve_distance, options.overshoot)
                    .map_err(|source| Error::Geometry { record, source })?;
            log::trace!(
                "record {}: {} vertices to {} points, {} bends",
                record,
                line.len(),
                pipe.points.len(),
                pipe.arc_indices.len()
            );
            Ok(pipe)
        })
        .collect::<Vec<_>>();

    prepared.into_iter().collect()
}

/// Prepare every centerline and sweep them, in record order.
///
/// Returns the builder's handles in record order. Nothing is swept unless every record prepares
/// successfully.
pub fn convert<B: SweepBuilder>(
    layer: &PipeLayer,
    options: &ConvertOptions,
    builder: &mut B,
) -> Result<Vec<B::Handle>> {
    let pipes = prepare(layer, options)?;
    log::debug!("prepared {} pipes", pipes.len());

    pipes
        .iter()
        .map(|p| builder.sweep(&p.points, &p.arc_indices, p.diameter * 0.5))
        .collect()
}
