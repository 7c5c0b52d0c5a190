//! Geometry data interop.
//! Reads pipe centerlines from shapefiles and DXF drawings, writes IFC models.
use crate::*;
use byteorder::*;
use std::{
    io::{
        Cursor, ErrorKind, Seek,
        SeekFrom::{Current as Rel, Start},
    },
    path::{Path, PathBuf},
};

pub mod dbf;
pub mod dxf;
pub mod ifc;
pub mod shp;

/// Read a shapefile layer: the `.shp` geometry and, if one sits beside it, the `.dbf` table.
pub fn read_layer(shp_path: impl AsRef<Path>) -> Result<PipeLayer> {
    let shp_path = shp_path.as_ref();
    let centerlines = shp::from_shp(&std::fs::read(shp_path)?)?;

    let dbf_path = ["dbf", "DBF"]
        .into_iter()
        .map(|ext| shp_path.with_extension(ext))
        .find(|p| p.exists());

    let table = match dbf_path {
        Some(p) => Some(dbf::from_dbf(&std::fs::read(p)?)?),
        None => {
            log::warn!(
                "no attribute table beside {}, only a fixed diameter can be used",
                shp_path.display()
            );
            None
        }
    };

    log::debug!(
        "read {} centerlines from {}",
        centerlines.len(),
        shp_path.display()
    );

    PipeLayer::new(centerlines, table)
}

/// Read the polylines of a DXF drawing as a layer without attributes.
pub fn read_dxf_layer(dxf_path: impl AsRef<Path>) -> Result<PipeLayer> {
    let centerlines = dxf::from_dxf(&std::fs::read(dxf_path)?)?;
    PipeLayer::new(centerlines, None)
}

/// Convert a layer to the bytes of an IFC file.
pub fn layer_to_ifc(
    layer: &PipeLayer,
    options: &ConvertOptions,
    project_name: &str,
) -> Result<Vec<u8>> {
    let mut model = ifc::IfcModel::new(project_name);
    let elements = convert(layer, options, &mut model)?;
    Ok(model.finish(&elements))
}

/// Convert a shapefile of pipe centerlines into an IFC file.
///
/// Nothing is written unless the whole layer converts. Returns the number of pipes written.
pub fn shp_to_ifc(
    shp_path: impl AsRef<Path>,
    ifc_path: impl AsRef<Path>,
    options: &ConvertOptions,
) -> Result<usize> {
    let layer = read_layer(shp_path.as_ref())?;
    write_ifc(&layer, project_name(shp_path.as_ref()), ifc_path.as_ref(), options)
}

/// Convert the polylines of a DXF drawing into an IFC file.
///
/// Nothing is written unless the whole drawing converts. Returns the number of pipes written.
pub fn dxf_to_ifc(
    dxf_path: impl AsRef<Path>,
    ifc_path: impl AsRef<Path>,
    options: &ConvertOptions,
) -> Result<usize> {
    let layer = read_dxf_layer(dxf_path.as_ref())?;
    write_ifc(&layer, project_name(dxf_path.as_ref()), ifc_path.as_ref(), options)
}

fn write_ifc(
    layer: &PipeLayer,
    project_name: String,
    ifc_path: &Path,
    options: &ConvertOptions,
) -> Result<usize> {
    let bytes = layer_to_ifc(layer, options, &project_name)?;

    // written beside the target and renamed, so a failed write leaves no partial model
    let part = part_path(ifc_path);
    let written = std::fs::write(&part, bytes).and_then(|_| std::fs::rename(&part, ifc_path));
    if let Err(e) = written {
        let _ = std::fs::remove_file(&part);
        return Err(e.into());
    }

    log::info!("IFC file created at: {}", ifc_path.display());
    Ok(layer.len())
}

/// `model.ifc` is staged as `model.ifc.part`.
fn part_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    path.with_file_name(name)
}

/// The project is named after the input file.
pub fn project_name(input: &Path) -> String {
    input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Pipes".to_string())
}

/// A short read past the end of a buffer means the file is cut off.
fn truncated(format: &str) -> impl FnOnce(Error) -> Error + '_ {
    move |e| match e {
        Error::Io(e) if e.kind() == ErrorKind::UnexpectedEof => {
            Error::InputFormat(format!("{} is truncated: {}", format, e))
        }
        e => e,
    }
}
