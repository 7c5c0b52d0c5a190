use super::*;
use ::dxf::{
    entities::{Entity, EntityType, LwPolyline, Polyline as DxfPolyline, Vertex},
    Drawing,
};

fn to_dxf_point(p: Point3) -> ::dxf::Point {
    let [x, y, z] = p;
    ::dxf::Point { x, y, z }
}

fn from_dxf_point(p: &::dxf::Point) -> Point3 {
    [p.x, p.y, p.z]
}

fn to_polyline(drawing: &mut Drawing, ps: impl Iterator<Item = Point3>) -> DxfPolyline {
    let mut polyline = DxfPolyline::default();

    for vertex in ps.map(to_dxf_point).map(Vertex::new) {
        polyline.add_vertex(drawing, vertex);
    }

    polyline.set_is_3d_polyline(true);

    polyline
}

/// Write paths as 3D polylines on a single layer.
///
/// Useful for checking filleted centerlines in a CAD viewer before they are swept.
pub fn to_dxf<L, I, P>(layer_name: L, paths: I) -> Result<Vec<u8>>
where
    L: std::fmt::Display,
    I: IntoIterator<Item = P>,
    P: AsRef<[Point3]>,
{
    let mut d = Drawing::new();

    let layer_name = layer_name.to_string();
    for path in paths {
        let polyline = to_polyline(&mut d, path.as_ref().iter().copied());
        let mut entity = Entity::new(EntityType::Polyline(polyline));
        entity.common.layer = layer_name.clone();
        d.add_entity(entity);
    }

    d.normalize();
    let mut buf = Vec::new();
    d.save(&mut buf)
        .map_err(|e| std::io::Error::new(ErrorKind::Other, e.to_string()))?;

    Ok(buf)
}

/// Read the polylines of a drawing, in entity order.
///
/// `POLYLINE` entities are read as 3D. `LWPOLYLINE` entities are planar, unless they sit at a
/// non-zero elevation, which becomes the `z` of every vertex. Other entities are skipped.
pub fn from_dxf(dxf: &[u8]) -> Result<Vec<Polyline>> {
    let dxf = Drawing::load(&mut Cursor::new(dxf))
        .map_err(|e| Error::InputFormat(format!("reading dxf: {}", e)))?;

    let mut lines = Vec::new();
    for e in dxf.entities() {
        let line = match &e.specific {
            EntityType::Polyline(p) => {
                Polyline::xyz(p.vertices().map(|v| from_dxf_point(&v.location)))
            }
            EntityType::LwPolyline(LwPolyline { vertices, .. }) if e.common.elevation != 0.0 => {
                let elevation = e.common.elevation;
                Polyline::xyz(vertices.iter().map(|v| [v.x, v.y, elevation]))
            }
            EntityType::LwPolyline(LwPolyline { vertices, .. }) => {
                Polyline::xy(vertices.iter().map(|v| [v.x, v.y]))
            }
            _ => continue,
        };

        let line =
            line.map_err(|e| Error::InputFormat(format!("dxf polyline {}: {}", lines.len(), e)))?;
        lines.push(line);
    }

    log::debug!("read {} polylines from dxf", lines.len());

    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adjusted_paths_through_dxf() {
        let line = Polyline::xyz([[0., 0., 0.], [10., 0., 1.], [10., 10., 2.]]).unwrap();
        let path = adjust_path(&line, 1.0).unwrap();

        let dxf = to_dxf("pipes", [&path]).unwrap();
        let back = from_dxf(&dxf).unwrap();

        assert_eq!(back.len(), 1);
        assert_eq!(back[0].dim(), Dim::Xyz);
        assert_eq!(back[0].len(), 5);
        for (a, b) in back[0].iter().zip(path.points()) {
            assert!(a.sub(*b).mag() < 1e-6);
        }
    }

    /// A drawing holding one `LWPOLYLINE` at `elevation`.
    fn lw_drawing(elevation: f64) -> Vec<u8> {
        let mut d = Drawing::new();
        d.header.version = ::dxf::enums::AcadVersion::R2000;
        let mut lw = LwPolyline::default();
        for (x, y) in [(0.0, 0.0), (5.0, 3.0), (9.0, 4.0)] {
            lw.vertices.push(::dxf::LwPolylineVertex {
                x,
                y,
                ..Default::default()
            });
        }
        let mut entity = Entity::new(EntityType::LwPolyline(lw));
        entity.common.elevation = elevation;
        d.add_entity(entity);
        let mut buf = Vec::new();
        d.save(&mut buf).unwrap();
        buf
    }

    #[test]
    fn lightweight_polylines_are_planar() {
        let lines = from_dxf(&lw_drawing(0.0)).unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].dim(), Dim::Xy);
        assert_eq!(lines[0].pts()[1], [5.0, 3.0, 0.0]);
    }

    #[test]
    fn lightweight_polylines_keep_their_elevation() {
        let lines = from_dxf(&lw_drawing(50.0)).unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].dim(), Dim::Xyz);
        assert_eq!(
            lines[0].pts(),
            &[[0.0, 0.0, 50.0], [5.0, 3.0, 50.0], [9.0, 4.0, 50.0]]
        );
    }
}
