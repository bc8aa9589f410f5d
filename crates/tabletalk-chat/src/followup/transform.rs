//! Structural transforms applied to a prior result.

use std::cmp::Ordering;
use std::fmt;

use tabletalk_core::error::Result;
use tabletalk_core::frame::{TabularFrame, Value};

/// Relational operator of a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Ge,
    Le,
    Eq,
    Gt,
    Lt,
}

impl CompareOp {
    /// Operators in match precedence: two-character forms first.
    pub const ALL: [CompareOp; 5] = [
        CompareOp::Ge,
        CompareOp::Le,
        CompareOp::Eq,
        CompareOp::Gt,
        CompareOp::Lt,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Ge => ">=",
            CompareOp::Le => "<=",
            CompareOp::Eq => "=",
            CompareOp::Gt => ">",
            CompareOp::Lt => "<",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.symbol() == symbol)
    }

    fn holds(self, ord: Ordering) -> bool {
        match self {
            CompareOp::Ge => ord != Ordering::Less,
            CompareOp::Le => ord != Ordering::Greater,
            CompareOp::Eq => ord == Ordering::Equal,
            CompareOp::Gt => ord == Ordering::Greater,
            CompareOp::Lt => ord == Ordering::Less,
        }
    }
}

/// Filter operand, already coerced to the column's element type.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Integer(i) => write!(f, "{}", i),
            FilterValue::Float(x) => write!(f, "{}", x),
            FilterValue::Text(s) => f.write_str(s),
        }
    }
}

impl FilterValue {
    /// Compare a cell against this operand. `None` means the pair is not
    /// comparable and the row is dropped.
    fn compare_cell(&self, cell: &Value) -> Option<Ordering> {
        match (cell, self) {
            (Value::Null, _) => None,
            (Value::Integer(a), FilterValue::Integer(b)) => Some(a.cmp(b)),
            (Value::Float(a), FilterValue::Float(b)) => a.partial_cmp(b),
            (Value::Integer(a), FilterValue::Float(b)) => (*a as f64).partial_cmp(b),
            (Value::Float(a), FilterValue::Integer(b)) => a.partial_cmp(&(*b as f64)),
            (cell, FilterValue::Text(b)) => Some(cell.to_string().as_str().cmp(b.as_str())),
            _ => None,
        }
    }
}

/// A deterministic operation on the previous result.
#[derive(Debug, Clone, PartialEq)]
pub enum Transform {
    /// Keep these columns, in this order.
    Project(Vec<String>),
    /// Stable sort on one column, nulls last.
    Sort { column: String, descending: bool },
    /// Leading `count` rows, or trailing ones when `from_end`.
    Limit { count: usize, from_end: bool },
    /// Keep rows where `column op value` holds.
    Filter {
        column: String,
        op: CompareOp,
        value: FilterValue,
    },
}

impl Transform {
    /// Apply to `frame`, returning a new frame.
    pub fn apply(&self, frame: &TabularFrame) -> Result<TabularFrame> {
        match self {
            Transform::Project(columns) => frame.select(columns),
            Transform::Sort { column, descending } => frame.sort_by(column, *descending),
            Transform::Limit { count, from_end } => Ok(if *from_end {
                frame.tail(*count)
            } else {
                frame.head(*count)
            }),
            Transform::Filter { column, op, value } => frame.filter_rows(column, |cell| {
                value.compare_cell(cell).is_some_and(|ord| op.holds(ord))
            }),
        }
    }
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transform::Project(columns) => write!(f, "only {}", columns.join(", ")),
            Transform::Sort { column, descending } => write!(
                f,
                "sort by {} {}",
                column,
                if *descending { "desc" } else { "asc" }
            ),
            Transform::Limit { count, from_end } => {
                write!(f, "{} {}", if *from_end { "last" } else { "first" }, count)
            }
            Transform::Filter { column, op, value } => {
                write!(f, "where {} {} {}", column, op.symbol(), value)
            }
        }
    }
}
