use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;

/// A single cell as read from a source database.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Real(r) => Some(*r),
            _ => None,
        }
    }

    /// Canonical representation used to compare join keys across sources.
    ///
    /// Integers, integral reals and their text forms compare equal, so an
    /// identifier stored as `INTEGER` in one database and `TEXT` in another
    /// still aligns. Nulls never produce a key.
    pub fn key_repr(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Integer(i) => Some(i.to_string()),
            Value::Real(r) if r.fract() == 0.0 && r.abs() < 9.0e15 => Some((*r as i64).to_string()),
            Value::Real(r) => Some(r.to_string()),
            Value::Text(s) => Some(s.clone()),
        }
    }

    /// Total order over mixed cells: nulls first, then numbers by value,
    /// then text lexicographically.
    pub fn total_cmp(&self, other: &Value) -> Ordering {
        fn rank(value: &Value) -> u8 {
            match value {
                Value::Null => 0,
                Value::Integer(_) | Value::Real(_) => 1,
                Value::Text(_) => 2,
            }
        }

        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a.cmp(b),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            _ => match (self.as_f64(), other.as_f64()) {
                (Some(a), Some(b)) => a.total_cmp(&b),
                _ => rank(self).cmp(&rank(other)),
            },
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Real(r) => write!(f, "{}", r),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Real(r) if r.is_finite() => serializer.serialize_f64(*r),
            Value::Real(_) => serializer.serialize_none(),
            Value::Text(s) => serializer.serialize_str(s),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Real(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

/// Type tag carried alongside every column from schema discovery onwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Integer,
    Real,
    Text,
}

impl ColumnType {
    /// Maps a declared SQLite column type to a tag using SQLite's affinity
    /// rules. Returns `None` when the declaration does not pin the storage
    /// class (no declared type, `NUMERIC`, `DATE`, ...); such columns are
    /// tagged from their values at fetch time.
    pub fn from_declared(declared: &str) -> Option<ColumnType> {
        let declared = declared.to_ascii_uppercase();
        if declared.contains("INT") {
            Some(ColumnType::Integer)
        } else if ["CHAR", "CLOB", "TEXT"].iter().any(|t| declared.contains(t)) {
            Some(ColumnType::Text)
        } else if ["REAL", "FLOA", "DOUB"].iter().any(|t| declared.contains(t)) {
            Some(ColumnType::Real)
        } else {
            None
        }
    }

    /// Tags a column from the values it actually holds.
    pub fn infer<'a>(values: impl IntoIterator<Item = &'a Value>) -> ColumnType {
        let mut seen_value = false;
        let mut all_integer = true;
        for value in values {
            match value {
                Value::Null => continue,
                Value::Integer(_) => {}
                Value::Real(_) => all_integer = false,
                Value::Text(_) => return ColumnType::Text,
            }
            seen_value = true;
        }
        match (seen_value, all_integer) {
            (false, _) => ColumnType::Text,
            (true, true) => ColumnType::Integer,
            (true, false) => ColumnType::Real,
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Real)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    pub name: String,
    pub kind: ColumnType,
}

impl Column {
    pub fn new(name: impl Into<String>, kind: ColumnType) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Rectangular, column-named result. Every row has exactly one cell per column.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<Column>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn from_rows(columns: Vec<Column>, rows: Vec<Vec<Value>>) -> Self {
        debug_assert!(rows.iter().all(|row| row.len() == columns.len()));
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn push_row(&mut self, row: Vec<Value>) {
        debug_assert_eq!(row.len(), self.columns.len());
        self.rows.push(row);
    }

    /// Appends a column with one value per existing row.
    pub fn push_column(&mut self, column: Column, values: Vec<Value>) {
        debug_assert_eq!(values.len(), self.rows.len());
        self.columns.push(column);
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.push(value);
        }
    }

    pub fn set_column_kind(&mut self, index: usize, kind: ColumnType) {
        if let Some(column) = self.columns.get_mut(index) {
            column.kind = kind;
        }
    }

    /// Applies `f` to every cell, keeping the shape.
    pub fn map_values<F>(self, mut f: F) -> Table
    where
        F: FnMut(Value) -> Value,
    {
        let rows = self
            .rows
            .into_iter()
            .map(|row| row.into_iter().map(&mut f).collect())
            .collect();
        Table {
            columns: self.columns,
            rows,
        }
    }

    /// Reorders columns so that the named ones (those present) come first,
    /// in the given order, followed by the others in their current order.
    pub fn move_to_front(&mut self, names: &[&str]) {
        let mut order: Vec<usize> = Vec::with_capacity(self.columns.len());
        for name in names {
            if let Some(index) = self.column_index(name) {
                if !order.contains(&index) {
                    order.push(index);
                }
            }
        }
        if order.iter().enumerate().all(|(pos, index)| pos == *index) {
            return;
        }
        for index in 0..self.columns.len() {
            if !order.contains(&index) {
                order.push(index);
            }
        }

        let mut columns: Vec<Option<Column>> = self.columns.drain(..).map(Some).collect();
        self.columns = order.iter().filter_map(|&i| columns[i].take()).collect();
        for row in &mut self.rows {
            let mut reordered = Vec::with_capacity(row.len());
            for &i in &order {
                reordered.push(std::mem::take(&mut row[i]));
            }
            *row = reordered;
        }
    }

    pub fn into_parts(self) -> (Vec<Column>, Vec<Vec<Value>>) {
        (self.columns, self.rows)
    }

    /// Row-oriented view that serializes as a list of objects keyed by
    /// column name, preserving column order.
    pub fn records(&self) -> Records<'_> {
        Records { table: self }
    }
}

pub struct Records<'a> {
    table: &'a Table,
}

impl Serialize for Records<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.table.rows.len()))?;
        for row in &self.table.rows {
            seq.serialize_element(&Record {
                columns: &self.table.columns,
                row,
            })?;
        }
        seq.end()
    }
}

pub struct Record<'a> {
    columns: &'a [Column],
    row: &'a [Value],
}

impl Serialize for Record<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (column, value) in self.columns.iter().zip(self.row) {
            map.serialize_entry(&column.name, value)?;
        }
        map.end()
    }
}
