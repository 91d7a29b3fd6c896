// Tabular data domain models
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A single parsed cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

/// Numeric reading of a cell, distinguishing missing from malformed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Numeric {
    Missing,
    Value(f64),
    Invalid,
}

impl CellValue {
    pub fn numeric(&self) -> Numeric {
        match self {
            CellValue::Null => Numeric::Missing,
            CellValue::Int(v) => Numeric::Value(*v as f64),
            CellValue::Float(v) if v.is_nan() => Numeric::Missing,
            CellValue::Float(v) if v.is_infinite() => Numeric::Invalid,
            CellValue::Float(v) => Numeric::Value(*v),
            CellValue::Bool(_) | CellValue::Text(_) => Numeric::Invalid,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => write!(f, "null"),
            CellValue::Bool(v) => write!(f, "{}", v),
            CellValue::Int(v) => write!(f, "{}", v),
            CellValue::Float(v) => write!(f, "{}", v),
            CellValue::Text(v) => write!(f, "{}", v),
        }
    }
}

/// Column reference by header name or zero-based position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldRef {
    Index(usize),
    Name(String),
}

impl FieldRef {
    pub fn resolve(&self, table: &Table) -> Option<usize> {
        match self {
            FieldRef::Index(i) if *i < table.columns.len() => Some(*i),
            FieldRef::Index(_) => None,
            FieldRef::Name(name) => table.column_index(name),
        }
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldRef::Index(i) => write!(f, "#{}", i),
            FieldRef::Name(name) => write!(f, "'{}'", name),
        }
    }
}

impl From<&str> for FieldRef {
    fn from(name: &str) -> Self {
        FieldRef::Name(name.to_string())
    }
}

impl From<usize> for FieldRef {
    fn from(index: usize) -> Self {
        FieldRef::Index(index)
    }
}

/// Row-oriented table handed over by a source loader.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl Table {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        Self { columns, rows }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell at `(row, column)`; short rows read as null.
    pub fn cell(&self, row: usize, column: usize) -> &CellValue {
        const NULL: &CellValue = &CellValue::Null;
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .unwrap_or(NULL)
    }
}

/// One component of a group key. Floats compare by total order so keys can
/// live in ordered and hashed collections.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum KeyPart {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl KeyPart {
    /// `None` for null cells; such rows do not belong to any group.
    pub fn from_cell(cell: &CellValue) -> Option<Self> {
        match cell {
            CellValue::Null => None,
            CellValue::Float(v) if v.is_nan() => None,
            CellValue::Bool(v) => Some(KeyPart::Bool(*v)),
            CellValue::Int(v) => Some(KeyPart::Int(*v)),
            // -0.0 and 0.0 are one key
            CellValue::Float(v) if *v == 0.0 => Some(KeyPart::Float(0.0)),
            CellValue::Float(v) => Some(KeyPart::Float(*v)),
            CellValue::Text(v) => Some(KeyPart::Text(v.clone())),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            KeyPart::Bool(_) => 0,
            KeyPart::Int(_) => 1,
            KeyPart::Float(_) => 2,
            KeyPart::Text(_) => 3,
        }
    }
}

impl Ord for KeyPart {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (KeyPart::Bool(a), KeyPart::Bool(b)) => a.cmp(b),
            (KeyPart::Int(a), KeyPart::Int(b)) => a.cmp(b),
            (KeyPart::Float(a), KeyPart::Float(b)) => a.total_cmp(b),
            (KeyPart::Text(a), KeyPart::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for KeyPart {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for KeyPart {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for KeyPart {}

impl Hash for KeyPart {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            KeyPart::Bool(v) => v.hash(state),
            KeyPart::Int(v) => v.hash(state),
            KeyPart::Float(v) => v.to_bits().hash(state),
            KeyPart::Text(v) => v.hash(state),
        }
    }
}

impl fmt::Display for KeyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyPart::Bool(v) => write!(f, "{}", v),
            KeyPart::Int(v) => write!(f, "{}", v),
            KeyPart::Float(v) => write!(f, "{}", v),
            KeyPart::Text(v) => write!(f, "{}", v),
        }
    }
}

/// Values of the grouping columns, in the order the columns were selected.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct GroupKey(pub Vec<KeyPart>);

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, part) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", part)?;
        }
        write!(f, ")")
    }
}
