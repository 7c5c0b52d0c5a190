use super::*;

// dBASE III tables (the attribute half of a shapefile) are serialized as follows:
// **little endian encoding**
// 1 byte -- version
// 3 bytes -- date of last update (YY MM DD)
// 4 bytes u32 -- record count
// 2 bytes u16 -- header length, in bytes
// 2 bytes u16 -- record length, in bytes
// 20 bytes reserved
// (32 byte field descriptors)
//   11 bytes -- field name, NUL padded
//   1 byte -- field type (C, N, F, L, D, ...)
//   4 bytes reserved
//   1 byte -- field length
//   1 byte -- decimal count
//   14 bytes reserved
// --> repeats until a 0x0D terminator
// (records, starting at header length)
//   1 byte -- deletion flag ' ' or '*'
//   field values in descriptor order, fixed width ASCII text except
//   I (i32) and O (f64) which are binary
// --> repeats for record count

const DESCRIPTOR_LEN: usize = 32;
const TERMINATOR: u8 = 0x0D;
const DELETED: u8 = b'*';

struct Descriptor {
    name: String,
    kind: u8,
    len: usize,
}

impl Descriptor {
    fn field_kind(&self) -> FieldKind {
        match self.kind {
            b'N' | b'F' | b'I' | b'O' => FieldKind::Numeric,
            _ => FieldKind::Text,
        }
    }

    fn decode(&self, bytes: &[u8]) -> Option<Value> {
        Some(match self.kind {
            b'N' | b'F' => number(&String::from_utf8_lossy(bytes))?,
            b'I' => Value::Number(Cursor::new(bytes).read_i32::<LE>().ok()? as f64),
            b'O' => Value::Number(Cursor::new(bytes).read_f64::<LE>().ok()?),
            _ => Value::Text(String::from_utf8_lossy(bytes).trim().to_string()),
        })
    }
}

/// Deserialize a `.dbf` attribute table.
///
/// Records flagged as deleted are kept so rows stay aligned with the `.shp` records.
pub fn from_dbf(dbf: &[u8]) -> Result<Table> {
    parse(dbf).map_err(truncated("attribute table"))
}

fn parse(dbf: &[u8]) -> Result<Table> {
    let mut c = Cursor::new(dbf);

    c.seek(Rel(4))?; // skip version and date
    let nrecords = c.read_u32::<LE>()? as usize;
    let header_len = c.read_u16::<LE>()? as usize;
    let record_len = c.read_u16::<LE>()? as usize;
    c.seek(Rel(20))?; // skip reserved

    let descriptors = read_descriptors(&mut c)?;

    let width = 1 + descriptors.iter().map(|d| d.len).sum::<usize>();
    if width > record_len {
        return Err(Error::InputFormat(format!(
            "fields need {} bytes but records are {} bytes",
            width, record_len
        )));
    }

    let mut table = Table::new(
        descriptors
            .iter()
            .map(|d| Field {
                name: d.name.clone(),
                kind: d.field_kind(),
            })
            .collect(),
    );

    for record in 0..nrecords {
        let start = header_len + record * record_len;
        let bytes = dbf.get(start..start + record_len).ok_or_else(|| {
            Error::InputFormat(format!("attribute table is truncated at record {}", record))
        })?;

        if bytes[0] == DELETED {
            log::debug!("attribute record {} is flagged as deleted", record);
        }

        let mut offset = 1;
        let mut row = Vec::with_capacity(descriptors.len());
        for d in &descriptors {
            let value = d.decode(&bytes[offset..offset + d.len]).ok_or_else(|| {
                Error::InputFormat(format!(
                    "record {} has a malformed value in field '{}'",
                    record, d.name
                ))
            })?;
            row.push(value);
            offset += d.len;
        }

        table
            .push(row)
            .map_err(|e| Error::InputFormat(e.to_string()))?;
    }

    Ok(table)
}

fn read_descriptors(c: &mut Cursor<&[u8]>) -> Result<Vec<Descriptor>> {
    let mut descriptors = Vec::new();

    loop {
        let mut buf = [0u8; DESCRIPTOR_LEN];
        buf[0] = c.read_u8()?;
        if buf[0] == TERMINATOR {
            break Ok(descriptors);
        }
        std::io::Read::read_exact(c, &mut buf[1..])?;

        let name = buf[..11].split(|&b| b == 0).next().unwrap_or_default();
        descriptors.push(Descriptor {
            name: String::from_utf8_lossy(name).trim().to_string(),
            kind: buf[11],
            len: buf[16] as usize,
        });
    }
}

/// Parse a fixed width numeric value.
/// Blank values, and values overflowed with `*`, are null.
fn number(s: &str) -> Option<Value> {
    use nom::{
        character::complete::multispace0, combinator::all_consuming, number::complete::double,
        sequence::delimited, IResult,
    };

    let s = s.trim_matches(char::from(0));
    if s.trim().is_empty() || s.trim().chars().all(|c| c == '*') {
        return Some(Value::Null);
    }

    let r: IResult<&str, f64, ()> = all_consuming(delimited(multispace0, double, multispace0))(s);
    r.ok().map(|(_, x)| Value::Number(x))
}
