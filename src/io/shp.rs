use super::*;

// ESRI shapefiles are serialized as follows:
// 100 bytes header
//   4 bytes i32 BE -- file code 9994
//   20 bytes unused
//   4 bytes i32 BE -- file length, in 16-bit words
//   4 bytes i32 LE -- version 1000
//   4 bytes i32 LE -- shape type
//   64 bytes f64 LE -- bounding box (x, y, z, m ranges)
// (record header: 4 bytes i32 BE record number, 4 bytes i32 BE content length in words)
// (record content: 4 bytes i32 LE shape type, then the shape)
// --> repeats for all records
//
// a polyline shape (little endian):
// 32 bytes f64 -- bounding box
// 4 bytes i32 -- part count
// 4 bytes i32 -- point count
// (4 bytes i32: first point of part) --> repeats for parts
// (8 bytes f64: x, 8 bytes f64: y) --> repeats for points
// polyline z only:
// 16 bytes f64 -- z range
// (8 bytes f64: z) --> repeats for points
// optional measures follow, which are ignored

const FILE_CODE: i32 = 9994;
const HEADER_LEN: u64 = 100;

const NULL_SHAPE: i32 = 0;
const POLYLINE: i32 = 3;
const POLYLINE_Z: i32 = 13;
const POLYLINE_M: i32 = 23;

/// Deserialize the line strings of a `.shp` file, in record order.
///
/// Every record must be a single part polyline; anything else (points, polygons, null shapes,
/// multi-part lines) fails the whole read with [`Error::InputFormat`].
pub fn from_shp(shp: &[u8]) -> Result<Vec<Polyline>> {
    parse(shp).map_err(truncated("shapefile"))
}

fn parse(shp: &[u8]) -> Result<Vec<Polyline>> {
    let mut c = Cursor::new(shp);

    if c.read_i32::<BE>()? != FILE_CODE {
        return Err(Error::InputFormat(
            "expecting shapefile code 9994 at position 0x00".into(),
        ));
    }

    c.seek(Rel(20))?; // skip unused bytes
    let file_len = c.read_i32::<BE>()?.max(0) as u64 * 2;
    let _version = c.read_i32::<LE>()?;
    let shape_type = c.read_i32::<LE>()?;
    log::debug!(
        "shapefile header: {} bytes, shape type {}",
        file_len,
        shape_type
    );

    c.seek(Start(HEADER_LEN))?;

    let mut lines = Vec::new();
    while c.position() < file_len {
        let record = lines.len();
        let _number = c.read_i32::<BE>()?;
        let content_len = c.read_i32::<BE>()?.max(0) as u64 * 2;
        let start = c.position();

        lines.push(read_polyline(&mut c, record)?);

        c.seek(Start(start + content_len))?;
    }

    Ok(lines)
}

fn read_polyline(c: &mut Cursor<&[u8]>, record: usize) -> Result<Polyline> {
    let not_line = |what: String| {
        Error::InputFormat(format!(
            "record {} is {}, expecting a single part line string",
            record, what
        ))
    };

    let dim = match c.read_i32::<LE>()? {
        POLYLINE | POLYLINE_M => Dim::Xy,
        POLYLINE_Z => Dim::Xyz,
        NULL_SHAPE => return Err(not_line("a null shape".into())),
        t => return Err(not_line(format!("shape type {}", t))),
    };

    c.seek(Rel(32))?; // skip bounding box
    let parts = c.read_i32::<LE>()?;
    let npoints = c.read_i32::<LE>()?;

    if parts != 1 {
        return Err(not_line(format!("a polyline with {} parts", parts)));
    }
    if npoints < 0 {
        return Err(Error::InputFormat(format!(
            "record {} has a negative point count",
            record
        )));
    }

    c.seek(Rel(4))?; // skip the only part index
    let npoints = npoints as usize;

    let mut xys = Vec::with_capacity(npoints.min(c.get_ref().len() / 16));
    for _ in 0..npoints {
        let x = c.read_f64::<LE>()?;
        let y = c.read_f64::<LE>()?;
        xys.push([x, y]);
    }

    let line = match dim {
        Dim::Xy => Polyline::xy(xys),
        Dim::Xyz => {
            c.seek(Rel(16))?; // skip z range
            let mut ps = Vec::with_capacity(xys.len());
            for [x, y] in xys {
                ps.push([x, y, c.read_f64::<LE>()?]);
            }
            Polyline::xyz(ps)
        }
    };

    line.map_err(|e| Error::InputFormat(format!("record {}: {}", record, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    /// Serialize single part shapes of the given type.
    /// Z values are written for type 13; for type 23 the third coordinate is written as the
    /// measure.
    fn shp_file(shape_type: i32, shapes: &[Vec<Point3>]) -> Vec<u8> {
        let mut records = Vec::new();
        for (i, pts) in shapes.iter().enumerate() {
            let mut content = Vec::new();
            content.write_i32::<LE>(shape_type).unwrap();
            content.write_all(&[0; 32]).unwrap();
            content.write_i32::<LE>(1).unwrap();
            content.write_i32::<LE>(pts.len() as i32).unwrap();
            content.write_i32::<LE>(0).unwrap();
            for &[x, y, _] in pts {
                content.write_f64::<LE>(x).unwrap();
                content.write_f64::<LE>(y).unwrap();
            }
            if shape_type == POLYLINE_Z || shape_type == POLYLINE_M {
                content.write_all(&[0; 16]).unwrap();
                for &[_, _, z] in pts {
                    content.write_f64::<LE>(z).unwrap();
                }
            }

            records.write_i32::<BE>(i as i32 + 1).unwrap();
            records.write_i32::<BE>(content.len() as i32 / 2).unwrap();
            records.extend(content);
        }

        let mut wtr = Vec::new();
        wtr.write_i32::<BE>(FILE_CODE).unwrap();
        wtr.write_all(&[0; 20]).unwrap();
        wtr.write_i32::<BE>((100 + records.len() as i32) / 2).unwrap();
        wtr.write_i32::<LE>(1000).unwrap();
        wtr.write_i32::<LE>(shape_type).unwrap();
        wtr.write_all(&[0; 64]).unwrap();
        wtr.extend(records);
        wtr
    }

    #[test]
    fn reading_planar_lines() {
        let shp = shp_file(
            POLYLINE,
            &[
                vec![[0.0, 0.0, 0.0], [1.0, 1.0, 0.0], [2.0, 2.0, 0.0]],
                vec![[-50.0, 0.0, 0.0], [10.0, 5.0, 0.0]],
            ],
        );
        let lines = from_shp(&shp).unwrap();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].dim(), Dim::Xy);
        assert_eq!(lines[0].pts()[2], [2.0, 2.0, 0.0]);
        assert_eq!(lines[1].pts(), &[[-50.0, 0.0, 0.0], [10.0, 5.0, 0.0]]);
    }

    #[test]
    fn measures_are_ignored() {
        let shp = shp_file(
            POLYLINE_M,
            &[
                vec![[0.0, 0.0, 1.0], [4.0, 3.0, 2.0], [8.0, 0.0, 3.0]],
                vec![[1.0, 1.0, 9.0], [2.0, 1.0, 8.0]],
            ],
        );
        let lines = from_shp(&shp).unwrap();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].dim(), Dim::Xy);
        assert_eq!(
            lines[0].pts(),
            &[[0.0, 0.0, 0.0], [4.0, 3.0, 0.0], [8.0, 0.0, 0.0]]
        );
        assert_eq!(lines[1].pts(), &[[1.0, 1.0, 0.0], [2.0, 1.0, 0.0]]);
    }

    #[test]
    fn reading_3d_lines() {
        let shp = shp_file(
            POLYLINE_Z,
            &[vec![[0.0, 0.0, 1.0], [100.0, 0.0, 2.0], [171.0, 29.0, 3.0]]],
        );
        let lines = from_shp(&shp).unwrap();

        assert_eq!(lines[0].dim(), Dim::Xyz);
        assert_eq!(
            lines[0].pts(),
            &[[0.0, 0.0, 1.0], [100.0, 0.0, 2.0], [171.0, 29.0, 3.0]]
        );
    }

    #[test]
    fn rejecting_non_lines() {
        // polygons
        let shp = shp_file(5, &[vec![[0.0; 3], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0]]]);
        let e = from_shp(&shp).unwrap_err();
        assert!(matches!(e, Error::InputFormat(m) if m.contains("shape type 5")));

        // a single point is not a line
        let shp = shp_file(POLYLINE, &[vec![[0.0; 3]]]);
        assert!(matches!(from_shp(&shp), Err(Error::InputFormat(_))));

        // multi-part
        let mut shp = shp_file(POLYLINE, &[vec![[0.0; 3], [1.0, 0.0, 0.0]]]);
        // record header (8) + shape type (4) + bbox (32) => part count
        shp[100 + 8 + 4 + 32] = 2;
        let e = from_shp(&shp).unwrap_err();
        assert!(matches!(e, Error::InputFormat(m) if m.contains("2 parts")));

        assert!(matches!(
            from_shp(b"not a shapefile at all"),
            Err(Error::InputFormat(_))
        ));
    }

    #[test]
    fn truncated_files() {
        let shp = shp_file(POLYLINE, &[vec![[0.0; 3], [1.0, 0.0, 0.0]]]);
        let e = from_shp(&shp[..shp.len() - 4]).unwrap_err();
        assert!(matches!(e, Error::InputFormat(m) if m.contains("truncated")));
    }

    #[test]
    fn empty_layer() {
        let shp = shp_file(POLYLINE, &[]);
        assert!(from_shp(&shp).unwrap().is_empty());
    }
}
