//! Convert pipe centerlines to an IFC model of swept-disk solids.
//!
//! ```text
//! shp2ifc pipes.shp pipes.ifc --diameter-field DIAM
//! shp2ifc pipes.shp --list-fields
//! RUST_LOG=debug shp2ifc network.dxf --diameter 150 --dxf-out filleted.dxf
//! ```
use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use shp2ifc::{io, *};
use std::path::{Path, PathBuf};

/// Sweep pipe centerlines from a shapefile or DXF drawing into an IFC4 model
#[derive(Parser)]
#[command(name = "shp2ifc", version, long_about = None)]
struct Cli {
    /// Line strings to convert (.shp or .dxf)
    input: PathBuf,

    /// IFC file to write; defaults to the input path with an .ifc extension
    output: Option<PathBuf>,

    /// Numeric attribute field holding each pipe's diameter, in millimetres
    #[arg(long, conflicts_with = "diameter")]
    diameter_field: Option<String>,

    /// Diameter of every pipe, in millimetres
    #[arg(long)]
    diameter: Option<f64>,

    /// Distance from each bend vertex to where the arc starts, in input units
    #[arg(long, default_value_t = PIPE_CURVE_DISTANCE)]
    curve_distance: f64,

    /// What to do when a bend does not fit on its adjacent segments
    #[arg(long, value_enum, default_value_t = OvershootArg::Clamp)]
    overshoot: OvershootArg,

    /// Also write the filleted centerlines to a DXF file
    #[arg(long)]
    dxf_out: Option<PathBuf>,

    /// Print the numeric attribute fields of the input and exit
    #[arg(long)]
    list_fields: bool,
}

#[derive(Copy, Clone, ValueEnum)]
enum OvershootArg {
    Clamp,
    Allow,
    Reject,
}

impl From<OvershootArg> for Overshoot {
    fn from(a: OvershootArg) -> Self {
        match a {
            OvershootArg::Clamp => Overshoot::Clamp,
            OvershootArg::Allow => Overshoot::Allow,
            OvershootArg::Reject => Overshoot::Reject,
        }
    }
}

#[derive(Copy, Clone, PartialEq)]
enum Format {
    Shp,
    Dxf,
}

impl Cli {
    fn format(&self) -> Result<Format> {
        let ext = self
            .input
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase());
        match ext.as_deref() {
            Some("shp") => Ok(Format::Shp),
            Some("dxf") => Ok(Format::Dxf),
            _ => bail!(
                "{} is not a .shp or .dxf file",
                self.input.display()
            ),
        }
    }

    fn options(&self) -> ConvertOptions {
        let diameter = match (&self.diameter_field, self.diameter) {
            (Some(field), _) => DiameterSource::Field(field.clone()),
            (None, Some(d)) => DiameterSource::Fixed(d),
            (None, None) => DiameterSource::default(),
        };

        ConvertOptions {
            curve_distance: self.curve_distance,
            overshoot: self.overshoot.into(),
            diameter,
        }
    }
}

fn read_layer(path: &Path, format: Format) -> Result<PipeLayer> {
    let layer = match format {
        Format::Shp => io::read_layer(path),
        Format::Dxf => io::read_dxf_layer(path),
    };
    layer.with_context(|| format!("reading {}", path.display()))
}

fn write_filleted(layer: &PipeLayer, options: &ConvertOptions, path: &Path) -> Result<()> {
    let paths = layer
        .centerlines()
        .iter()
        .enumerate()
        .map(|(record, line)| {
            adjust_path_with(line, options.curve_distance, options.overshoot)
                .map_err(|source| Error::Geometry { record, source })
        })
        .collect::<shp2ifc::Result<Vec<_>>>()?;

    let dxf = io::dxf::to_dxf("centerlines", &paths)?;
    std::fs::write(path, dxf).with_context(|| format!("writing {}", path.display()))?;
    log::info!("filleted centerlines written to {}", path.display());
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let format = cli.format()?;
    let options = cli.options();

    if cli.list_fields {
        let layer = read_layer(&cli.input, format)?;
        for field in layer.table().map(numeric_fields).unwrap_or_default() {
            println!("{}", field);
        }
        return Ok(());
    }

    if let Some(path) = &cli.dxf_out {
        write_filleted(&read_layer(&cli.input, format)?, &options, path)?;
    }

    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| cli.input.with_extension("ifc"));

    let pipes = match format {
        Format::Shp => io::shp_to_ifc(&cli.input, &output, &options),
        Format::Dxf => io::dxf_to_ifc(&cli.input, &output, &options),
    }
    .with_context(|| format!("converting {}", cli.input.display()))?;

    log::info!("{} pipes converted", pipes);

    Ok(())
}
