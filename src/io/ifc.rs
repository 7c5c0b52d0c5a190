//! IFC4 models written as STEP physical files (ISO 10303-21).
//!
//! Every pipe is an `IfcPipeSegment` whose body is an `IfcSweptDiskSolid` along an
//! `IfcIndexedPolyCurve`; the curve is straight `IfcLineIndex` runs joined by an `IfcArcIndex`
//! through each bend. Pipes are contained in a single site / building / storey hierarchy.
use super::*;
use chrono::{DateTime, Utc};

const GUID_CHARS: &[u8; 64] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz_$";

/// Reference to an entity instance, written as `#n`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct EntityId(u64);

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An IFC model under construction.
///
/// Use [`SweepBuilder::sweep`] to add pipes, then [`IfcModel::finish`] to assemble the spatial
/// hierarchy and serialize.
pub struct IfcModel {
    name: String,
    entities: Vec<String>,
    project: EntityId,
    world: EntityId,
    body: EntityId,
    pipes: usize,
}

impl IfcModel {
    /// Start a model with the project, its units and its representation contexts.
    ///
    /// Lengths are millimetres.
    pub fn new(project_name: &str) -> Self {
        let mut m = Self {
            name: project_name.to_string(),
            entities: Vec::new(),
            project: EntityId(0),
            world: EntityId(0),
            body: EntityId(0),
            pipes: 0,
        };

        let units = [
            m.add("IFCSIUNIT(*,.LENGTHUNIT.,.MILLI.,.METRE.)".into()),
            m.add("IFCSIUNIT(*,.AREAUNIT.,$,.SQUARE_METRE.)".into()),
            m.add("IFCSIUNIT(*,.VOLUMEUNIT.,$,.CUBIC_METRE.)".into()),
            m.add("IFCSIUNIT(*,.PLANEANGLEUNIT.,$,.RADIAN.)".into()),
        ];
        let units = m.add(format!("IFCUNITASSIGNMENT({})", list(units)));

        let origin = m.add("IFCCARTESIANPOINT((0.,0.,0.))".into());
        let world = m.add(format!("IFCAXIS2PLACEMENT3D({},$,$)", origin));
        let model = m.add(format!(
            "IFCGEOMETRICREPRESENTATIONCONTEXT($,'Model',3,1.E-05,{},$)",
            world
        ));
        let body = m.add(format!(
            "IFCGEOMETRICREPRESENTATIONSUBCONTEXT('Body','Model',*,*,*,*,{},$,.MODEL_VIEW.,$)",
            model
        ));
        let project = m.add(format!(
            "IFCPROJECT({},$,{},$,$,$,$,({}),{})",
            new_guid(),
            string(project_name),
            model,
            units
        ));

        m.world = world;
        m.body = body;
        m.project = project;
        m
    }

    fn add(&mut self, record: String) -> EntityId {
        let id = EntityId(self.entities.len() as u64 + 1);
        self.entities.push(format!("{}={};", id, record));
        id
    }

    /// Number of entity instances so far.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Place `elements` in a site / building / storey hierarchy under the project and serialize
    /// the file.
    pub fn finish(mut self, elements: &[EntityId]) -> Vec<u8> {
        let site = self.add(format!(
            "IFCSITE({},$,'Example Site',$,$,$,$,$,.ELEMENT.,$,$,$,$,$)",
            new_guid()
        ));
        let building = self.add(format!(
            "IFCBUILDING({},$,'Example Building',$,$,$,$,$,.ELEMENT.,$,$,$)",
            new_guid()
        ));
        let storey = self.add(format!(
            "IFCBUILDINGSTOREY({},$,'Ground Floor',$,$,$,$,$,.ELEMENT.,$)",
            new_guid()
        ));

        for (relating, related) in [(self.project, site), (site, building), (building, storey)] {
            self.add(format!(
                "IFCRELAGGREGATES({},$,$,$,{},({}))",
                new_guid(),
                relating,
                related
            ));
        }

        if !elements.is_empty() {
            self.add(format!(
                "IFCRELCONTAINEDINSPATIALSTRUCTURE({},$,$,$,{},{})",
                new_guid(),
                list(elements),
                storey
            ));
        }

        log::debug!(
            "serializing {} entities, {} pipes",
            self.entities.len(),
            self.pipes
        );

        let mut out = String::new();
        out.push_str("ISO-10303-21;\nHEADER;\n");
        out.push_str("FILE_DESCRIPTION(('ViewDefinition [DesignTransferView]'),'2;1');\n");
        out.push_str(&format!(
            "FILE_NAME({},'{}',(''),(''),'{} {}','{}','');\n",
            string(&format!("{}.ifc", self.name)),
            timestamp(Utc::now()),
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION"),
            env!("CARGO_PKG_NAME"),
        ));
        out.push_str("FILE_SCHEMA(('IFC4'));\nENDSEC;\nDATA;\n");
        for e in &self.entities {
            out.push_str(e);
            out.push('\n');
        }
        out.push_str("ENDSEC;\nEND-ISO-10303-21;\n");

        out.into_bytes()
    }
}

impl SweepBuilder for IfcModel {
    type Handle = EntityId;

    fn sweep(
        &mut self,
        points: &[PointMm],
        arc_indices: &[usize],
        radius: f64,
    ) -> Result<EntityId> {
        if !(radius.is_finite() && radius > 0.0) {
            return Err(Error::field(
                "diameter",
                format!("sweep radius must be positive, got {}", radius),
            ));
        }
        let segments = segments(points, arc_indices)?;

        let coords = points
            .iter()
            .map(|[x, y, z]| format!("({}.,{}.,{}.)", x, y, z))
            .collect::<Vec<_>>()
            .join(",");
        let pts = self.add(format!("IFCCARTESIANPOINTLIST3D(({}))", coords));
        let curve = self.add(format!("IFCINDEXEDPOLYCURVE({},({}),.F.)", pts, segments));
        let solid = self.add(format!(
            "IFCSWEPTDISKSOLID({},{},$,$,$)",
            curve,
            real(radius)
        ));
        let rep = self.add(format!(
            "IFCSHAPEREPRESENTATION({},'Body','AdvancedSweptSolid',({}))",
            self.body, solid
        ));
        let shape = self.add(format!("IFCPRODUCTDEFINITIONSHAPE($,$,({}))", rep));
        let placement = self.add(format!("IFCLOCALPLACEMENT($,{})", self.world));

        self.pipes += 1;
        let name = string(&format!("Pipe {}", self.pipes));
        Ok(self.add(format!(
            "IFCPIPESEGMENT({},$,{},$,$,{},{},$,$)",
            new_guid(),
            name,
            placement,
            shape
        )))
    }
}

/// The segments of an indexed poly curve.
///
/// Each arc index `a` becomes an arc through the 1-based points `(a, a+1, a+2)`, that is the
/// bend point before the vertex, the vertex, and the bend point after. Straight runs between
/// arcs become line indices. Repeated points are dropped from a run, and a run left with a
/// single point is left out. A bend whose three points are not distinct (a bend on a segment
/// shorter than a millimetre) cannot carry an arc and joins the surrounding straight run.
fn segments(points: &[PointMm], arc_indices: &[usize]) -> Result<String> {
    let n = points.len();
    if n < 2 {
        return Err(Error::InputFormat(format!(
            "a swept path needs 2 or more points, found {}",
            n
        )));
    }

    let mut segs = Vec::with_capacity(arc_indices.len() * 2 + 1);
    let line = |from: usize, to: usize, segs: &mut Vec<String>| {
        let mut idx: Vec<usize> = Vec::new();
        for i in from..=to {
            if idx.last().map_or(true, |&j| points[j] != points[i]) {
                idx.push(i);
            }
        }
        if idx.len() > 1 {
            let idx = idx
                .iter()
                .map(|i| (i + 1).to_string())
                .collect::<Vec<_>>()
                .join(",");
            segs.push(format!("IFCLINEINDEX(({}))", idx));
        }
    };

    let mut start = 0;
    let mut next = 0;
    for &a in arc_indices {
        if a == 0 || a + 1 >= n || a - 1 < next {
            return Err(Error::InputFormat(format!(
                "arc index {} does not fit a path of {} points",
                a, n
            )));
        }
        next = a + 1;

        let (p, v, q) = (points[a - 1], points[a], points[a + 1]);
        if p == v || v == q || p == q {
            log::debug!("bend at point {} collapses to a straight run", a + 1);
            continue;
        }

        line(start, a - 1, &mut segs);
        segs.push(format!("IFCARCINDEX(({},{},{}))", a, a + 1, a + 2));
        start = a + 1;
    }
    line(start, n - 1, &mut segs);

    if segs.is_empty() {
        return Err(Error::InputFormat(
            "swept path collapses to a single point".into(),
        ));
    }

    Ok(segs.join(","))
}

/// A fresh GlobalId: a v4 UUID in the 22 character IFC base 64 encoding, quoted.
fn new_guid() -> String {
    format!("'{}'", compress_guid(uuid::Uuid::new_v4().as_u128()))
}

fn compress_guid(n: u128) -> String {
    (0..22)
        .map(|i| GUID_CHARS[((n >> (6 * (21 - i))) & 0x3f) as usize] as char)
        .collect()
}

fn list<I>(ids: I) -> String
where
    I: IntoIterator,
    I::Item: std::borrow::Borrow<EntityId>,
{
    use std::borrow::Borrow;
    let ids = ids
        .into_iter()
        .map(|id| id.borrow().to_string())
        .collect::<Vec<_>>();
    format!("({})", ids.join(","))
}

/// A quoted STEP string.
fn string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        match c {
            '\'' => out.push_str("''"),
            '\\' => out.push_str("\\\\"),
            ' '..='~' => out.push(c),
            c => {
                out.push_str("\\X2\\");
                for u in c.encode_utf16(&mut [0; 2]) {
                    out.push_str(&format!("{:04X}", u));
                }
                out.push_str("\\X0\\");
            }
        }
    }
    out.push('\'');
    out
}

/// A STEP real, which always carries a decimal point and an upper case exponent.
fn real(x: f64) -> String {
    let s = format!("{:?}", x);
    match s.split_once('e') {
        Some((m, e)) if m.contains('.') => format!("{}E{}", m, e),
        Some((m, e)) => format!("{}.E{}", m, e),
        None => s,
    }
}

/// `YYYY-MM-DDTHH:MM:SS` in UTC.
fn timestamp(t: DateTime<Utc>) -> String {
    t.format("%Y-%m-%dT%H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(s: &str, pat: &str) -> usize {
        s.matches(pat).count()
    }

    fn flat(n: usize) -> Vec<PointMm> {
        (0..n as i64).map(|i| [i * 1000, (i % 2) * 500, 0]).collect()
    }

    #[test]
    fn curve_segments() {
        assert_eq!(
            segments(&flat(8), &[2, 5]).unwrap(),
            "IFCLINEINDEX((1,2)),IFCARCINDEX((2,3,4)),IFCLINEINDEX((4,5)),\
             IFCARCINDEX((5,6,7)),IFCLINEINDEX((7,8))"
        );
        assert_eq!(segments(&flat(3), &[]).unwrap(), "IFCLINEINDEX((1,2,3))");
        // adjacent bends share a point
        assert_eq!(
            segments(&flat(5), &[1, 3]).unwrap(),
            "IFCARCINDEX((1,2,3)),IFCARCINDEX((3,4,5))"
        );
    }

    #[test]
    fn zero_length_runs_are_skipped() {
        let mut pts = flat(6);
        pts[3] = pts[2];
        assert_eq!(
            segments(&pts, &[1, 4]).unwrap(),
            "IFCARCINDEX((1,2,3)),IFCARCINDEX((4,5,6))"
        );
    }

    #[test]
    fn collapsed_bends_become_lines() {
        // the bend point before the vertex truncated onto the vertex
        let mut pts = flat(5);
        pts[1] = pts[2];
        assert_eq!(segments(&pts, &[2]).unwrap(), "IFCLINEINDEX((1,2,4,5))");

        // only the collapsed bend is replaced
        let mut pts = flat(8);
        pts[6] = pts[5];
        assert_eq!(
            segments(&pts, &[2, 5]).unwrap(),
            "IFCLINEINDEX((1,2)),IFCARCINDEX((2,3,4)),IFCLINEINDEX((4,5,6,8))"
        );

        // bends still have to be ordered
        assert!(segments(&pts, &[5, 5]).is_err());
    }

    #[test]
    fn bad_arcs() {
        assert!(segments(&flat(1), &[]).is_err());
        assert!(segments(&[[7, 7, 7]; 2], &[]).is_err());
        assert!(segments(&flat(5), &[0]).is_err());
        assert!(segments(&flat(5), &[4]).is_err());
        assert!(segments(&flat(8), &[5, 2]).is_err());
        assert!(segments(&flat(8), &[2, 3]).is_err());
    }

    #[test]
    fn guids() {
        assert_eq!(compress_guid(0), "0000000000000000000000");
        assert_eq!(compress_guid(u128::MAX), "3$$$$$$$$$$$$$$$$$$$$$");

        let g = new_guid();
        assert_eq!(g.len(), 24);
        assert!(g[1..23].bytes().all(|b| GUID_CHARS.contains(&b)));
        assert_ne!(g, new_guid());
    }

    #[test]
    fn step_values() {
        assert_eq!(string("Pipe 1"), "'Pipe 1'");
        assert_eq!(string("O'Neil\\"), "'O''Neil\\\\'");
        assert_eq!(string("Ø"), "'\\X2\\00D8\\X0\\'");

        assert_eq!(real(100.0), "100.0");
        assert_eq!(real(0.25), "0.25");
        assert_eq!(real(1e20), "1.E20");
        assert_eq!(real(2.5e-7), "2.5E-7");
    }

    #[test]
    fn timestamps() {
        let t = DateTime::<Utc>::from_timestamp(0, 0).unwrap();
        assert_eq!(timestamp(t), "1970-01-01T00:00:00");
        let t = DateTime::<Utc>::from_timestamp(1_709_210_096, 0).unwrap();
        assert_eq!(timestamp(t), "2024-02-29T12:34:56");
    }

    #[test]
    fn pipes_in_a_hierarchy() {
        let mut m = IfcModel::new("Pipes");
        let a = m.sweep(&flat(8), &[2, 5], 50.0).unwrap();
        let b = m.sweep(&flat(2), &[], 250.0).unwrap();
        let step = String::from_utf8(m.finish(&[a, b])).unwrap();

        assert!(step.starts_with("ISO-10303-21;\nHEADER;\n"));
        assert!(step.ends_with("ENDSEC;\nEND-ISO-10303-21;\n"));
        assert!(step.contains("FILE_SCHEMA(('IFC4'));"));
        assert!(step.contains("FILE_NAME('Pipes.ifc',"));
        assert!(step.contains("\n#1=IFCSIUNIT(*,.LENGTHUNIT.,.MILLI.,.METRE.);\n"));

        assert_eq!(count(&step, "IFCPROJECT("), 1);
        assert_eq!(count(&step, "IFCPIPESEGMENT("), 2);
        assert_eq!(count(&step, "IFCSWEPTDISKSOLID("), 2);
        assert_eq!(count(&step, "IFCARCINDEX("), 2);
        assert_eq!(count(&step, "IFCRELAGGREGATES("), 3);
        assert_eq!(count(&step, "IFCRELCONTAINEDINSPATIALSTRUCTURE("), 1);

        assert!(step.contains(",50.0,$,$,$);"));
        assert!(step.contains(",250.0,$,$,$);"));
        assert!(step.contains("IFCCARTESIANPOINTLIST3D(((0.,0.,0.),(1000.,500.,0.)));"));
        assert!(step.contains(&format!("'Pipe 2',$,$,#{}", b.0 - 1)));
        assert!(step.contains(&format!("({},{}),#", a, b)));
    }

    #[test]
    fn empty_models_have_no_containment() {
        let m = IfcModel::new("Empty");
        let n = m.len();
        let step = String::from_utf8(m.finish(&[])).unwrap();
        assert_eq!(count(&step, "IFCRELCONTAINEDINSPATIALSTRUCTURE("), 0);
        assert_eq!(count(&step, "IFCRELAGGREGATES("), 3);
        assert_eq!(count(&step, "\n#"), n + 6);
    }

    #[test]
    fn invalid_sweeps() {
        let mut m = IfcModel::new("Pipes");
        let n = m.len();
        assert!(m.sweep(&flat(3), &[1], 0.0).is_err());
        assert!(m.sweep(&flat(3), &[2], 10.0).is_err());
        assert_eq!(m.len(), n);
    }
}
