//! In-memory columnar result table.
//!
//! A [`TabularFrame`] is an ordered list of uniquely named [`Column`]s, each
//! tagged with a [`ColumnType`] fixed at construction. All columns have the
//! same length. Every derived view (projection, row selection, sort, filter)
//! returns a new frame and leaves `self` untouched.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;

use chrono::NaiveDate;

use crate::error::{Result, TabletalkError};

/// Element type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Text,
    Integer,
    Float,
    Date,
    /// Every value in the column is null.
    Null,
}

impl ColumnType {
    pub fn is_numeric(self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Float)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ColumnType::Text => "text",
            ColumnType::Integer => "integer",
            ColumnType::Float => "float",
            ColumnType::Date => "date",
            ColumnType::Null => "null",
        };
        f.write_str(s)
    }
}

/// A single scalar cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Text(String),
    Integer(i64),
    Float(f64),
    Date(NaiveDate),
}

impl Value {
    pub fn column_type(&self) -> ColumnType {
        match self {
            Value::Null => ColumnType::Null,
            Value::Text(_) => ColumnType::Text,
            Value::Integer(_) => ColumnType::Integer,
            Value::Float(_) => ColumnType::Float,
            Value::Date(_) => ColumnType::Date,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Ordering used by sorts. Integers and floats compare numerically,
    /// nulls sort after everything, and mismatched types fall back to their
    /// rendered text.
    pub fn compare(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Null, _) => Ordering::Greater,
            (_, Value::Null) => Ordering::Less,
            (Value::Integer(a), Value::Integer(b)) => a.cmp(b),
            (Value::Integer(a), Value::Float(b)) => (*a as f64).total_cmp(b),
            (Value::Float(a), Value::Integer(b)) => a.total_cmp(&(*b as f64)),
            (Value::Float(a), Value::Float(b)) => a.total_cmp(b),
            (Value::Date(a), Value::Date(b)) => a.cmp(b),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            _ => self.to_string().cmp(&other.to_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Text(s) => f.write_str(s),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

// =============================================================================
// Column
// =============================================================================

/// A named, typed column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    kind: ColumnType,
    values: Vec<Value>,
}

impl Column {
    /// Build a column, inferring its type from the values.
    ///
    /// Integer and float values mixed together promote to float. Any other
    /// mix of non-null types degrades the column to text.
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        let kind = infer_type(&values);
        let values = conform(values, kind);
        Self {
            name: name.into(),
            kind,
            values,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ColumnType {
        self.kind
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn get(&self, row: usize) -> Option<&Value> {
        self.values.get(row)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn pick(&self, rows: &[usize]) -> Column {
        Column {
            name: self.name.clone(),
            kind: self.kind,
            values: rows.iter().map(|&i| self.values[i].clone()).collect(),
        }
    }
}

fn infer_type(values: &[Value]) -> ColumnType {
    let mut kind = ColumnType::Null;
    for value in values {
        kind = match (kind, value.column_type()) {
            (current, ColumnType::Null) => current,
            (ColumnType::Null, next) => next,
            (current, next) if current == next => current,
            (ColumnType::Integer, ColumnType::Float) | (ColumnType::Float, ColumnType::Integer) => {
                ColumnType::Float
            }
            _ => return ColumnType::Text,
        };
    }
    kind
}

fn conform(values: Vec<Value>, kind: ColumnType) -> Vec<Value> {
    match kind {
        ColumnType::Float => values
            .into_iter()
            .map(|v| match v {
                Value::Integer(i) => Value::Float(i as f64),
                other => other,
            })
            .collect(),
        ColumnType::Text => values
            .into_iter()
            .map(|v| match v {
                Value::Null | Value::Text(_) => v,
                other => Value::Text(other.to_string()),
            })
            .collect(),
        _ => values,
    }
}

// =============================================================================
// TabularFrame
// =============================================================================

/// Ordered, row-aligned collection of uniquely named columns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TabularFrame {
    columns: Vec<Column>,
}

impl TabularFrame {
    /// Build a frame from columns.
    ///
    /// Fails if two columns share a name or the columns differ in length.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let mut seen = HashSet::new();
        for col in &columns {
            if !seen.insert(col.name.as_str()) {
                return Err(TabletalkError::Frame(format!(
                    "duplicate column name: {}",
                    col.name
                )));
            }
        }
        if let Some(first) = columns.first() {
            let rows = first.len();
            if let Some(bad) = columns.iter().find(|c| c.len() != rows) {
                return Err(TabletalkError::Frame(format!(
                    "column {} has {} rows, expected {}",
                    bad.name,
                    bad.len(),
                    rows
                )));
            }
        }
        Ok(Self { columns })
    }

    /// Build a frame from row-major data.
    pub fn from_rows(names: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self> {
        let width = names.len();
        let mut buckets: Vec<Vec<Value>> = (0..width).map(|_| Vec::with_capacity(rows.len())).collect();
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != width {
                return Err(TabletalkError::Frame(format!(
                    "row {} has {} values, expected {}",
                    i,
                    row.len(),
                    width
                )));
            }
            for (bucket, value) in buckets.iter_mut().zip(row) {
                bucket.push(value);
            }
        }
        let columns = names
            .into_iter()
            .zip(buckets)
            .map(|(name, values)| Column::new(name, values))
            .collect();
        Self::new(columns)
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// True when the frame has no columns or no rows.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() || self.row_count() == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Values of one row, in column order.
    pub fn row(&self, index: usize) -> Option<Vec<&Value>> {
        if index >= self.row_count() {
            return None;
        }
        Some(self.columns.iter().map(|c| &c.values[index]).collect())
    }

    pub fn rows(&self) -> impl Iterator<Item = Vec<&Value>> + '_ {
        (0..self.row_count()).map(move |i| self.columns.iter().map(|c| &c.values[i]).collect())
    }

    /// Keep only the named columns, in the requested order. Repeated names
    /// are collapsed to their first occurrence.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Self> {
        let mut seen = HashSet::new();
        let mut columns = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            if !seen.insert(name) {
                continue;
            }
            let col = self
                .column(name)
                .ok_or_else(|| TabletalkError::Frame(format!("unknown column: {}", name)))?;
            columns.push(col.clone());
        }
        Ok(Self { columns })
    }

    /// New frame holding the given rows, in the given order.
    ///
    /// Panics if an index is out of bounds.
    pub fn take_rows(&self, rows: &[usize]) -> Self {
        Self {
            columns: self.columns.iter().map(|c| c.pick(rows)).collect(),
        }
    }

    /// The first `n` rows.
    pub fn head(&self, n: usize) -> Self {
        let end = n.min(self.row_count());
        self.take_rows(&(0..end).collect::<Vec<_>>())
    }

    /// The last `n` rows, in original order.
    pub fn tail(&self, n: usize) -> Self {
        let total = self.row_count();
        let start = total - n.min(total);
        self.take_rows(&(start..total).collect::<Vec<_>>())
    }

    /// Stable sort on one column. Nulls go last in both directions.
    pub fn sort_by(&self, column: &str, descending: bool) -> Result<Self> {
        let col = self
            .column(column)
            .ok_or_else(|| TabletalkError::Frame(format!("unknown column: {}", column)))?;
        let mut order: Vec<usize> = (0..self.row_count()).collect();
        order.sort_by(|&a, &b| {
            let (va, vb) = (&col.values[a], &col.values[b]);
            match (va.is_null(), vb.is_null()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                _ if descending => vb.compare(va),
                _ => va.compare(vb),
            }
        });
        Ok(self.take_rows(&order))
    }

    /// Keep the rows whose value in `column` satisfies `keep`.
    pub fn filter_rows<F>(&self, column: &str, keep: F) -> Result<Self>
    where
        F: Fn(&Value) -> bool,
    {
        let col = self
            .column(column)
            .ok_or_else(|| TabletalkError::Frame(format!("unknown column: {}", column)))?;
        let rows: Vec<usize> = col
            .values
            .iter()
            .enumerate()
            .filter(|(_, v)| keep(v))
            .map(|(i, _)| i)
            .collect();
        Ok(self.take_rows(&rows))
    }

    /// Add a `name` column built from `first_name` and `last_name`.
    ///
    /// Returns an unchanged copy when a `name` or `names` column already
    /// exists or either source column is missing.
    pub fn with_name_column(&self) -> Self {
        if self.has_column("name") || self.has_column("names") {
            return self.clone();
        }
        let (Some(first), Some(last)) = (self.column("first_name"), self.column("last_name"))
        else {
            return self.clone();
        };
        let values = first
            .values
            .iter()
            .zip(&last.values)
            .map(|(f, l)| {
                Value::Text(format!(
                    "{} {}",
                    f.to_string().trim(),
                    l.to_string().trim()
                ))
            })
            .collect();
        let mut columns = self.columns.clone();
        columns.push(Column {
            name: "name".to_string(),
            kind: ColumnType::Text,
            values,
        });
        Self { columns }
    }
}
