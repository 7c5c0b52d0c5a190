use rustc_hash::FxHashMap as HashMap;

/// The kind of values a field holds.
#[derive(Copy, Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum FieldKind {
    Numeric,
    Text,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Field {
    pub name: String,
    pub kind: FieldKind,
}

/// A single attribute value.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Value {
    Number(f64),
    Text(String),
    Null,
}

impl Value {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(x) => Some(*x),
            _ => None,
        }
    }
}

/// Per-record attributes, one row per centerline.
///
/// Every row has one value per field, in schema order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
    fields: Vec<Field>,
    index: HashMap<String, usize>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(fields: Vec<Field>) -> Self {
        let index = fields
            .iter()
            .enumerate()
            .map(|(i, f)| (f.name.clone(), i))
            .collect();

        Self {
            fields,
            index,
            rows: Vec::new(),
        }
    }

    /// Append a row, which must have exactly one value per field.
    pub fn push(&mut self, row: Vec<Value>) -> Result<(), &'static str> {
        if row.len() != self.fields.len() {
            Err("row does not have one value per field")
        } else {
            self.rows.push(row);
            Ok(())
        }
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.index.get(name).map(|&i| &self.fields[i])
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Lookup the value of `field` in `row`.
    pub fn get(&self, row: usize, field: &str) -> Option<&Value> {
        let col = *self.index.get(field)?;
        self.rows.get(row).map(|r| &r[col])
    }

    /// Iterate over the values of one field, in row order.
    pub fn column<'a>(&'a self, field: &str) -> Option<impl ExactSizeIterator<Item = &'a Value>> {
        let col = *self.index.get(field)?;
        Some(self.rows.iter().map(move |r| &r[col]))
    }
}

/// Names of the fields holding numbers, in schema order.
///
/// Used to check a user chosen diameter field before any conversion starts.
pub fn numeric_fields(table: &Table) -> Vec<String> {
    table
        .fields()
        .iter()
        .filter(|f| f.kind == FieldKind::Numeric)
        .map(|f| f.name.clone())
        .collect()
}
