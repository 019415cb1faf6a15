use std::cmp::Ordering;

use crate::engine::value::{ColumnType, Value};
use crate::engine::{EngineError, Result};

/// Typed column storage. Every cell of a column shares one type; `None`
/// is the null cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Int64(Vec<Option<i64>>),
    Float64(Vec<Option<f64>>),
    Str(Vec<Option<String>>),
    List(Vec<Option<Vec<String>>>),
}

fn gather<T: Clone>(cells: &[Option<T>], positions: &[usize]) -> Vec<Option<T>> {
    positions.iter().map(|&i| cells[i].clone()).collect()
}

fn gather_or_null<T: Clone>(cells: &[Option<T>], positions: &[Option<usize>]) -> Vec<Option<T>> {
    positions
        .iter()
        .map(|p| p.and_then(|i| cells[i].clone()))
        .collect()
}

fn coalesce_cells<T: Clone>(
    left: &[Option<T>],
    right: &[Option<T>],
    pairs: &[(Option<usize>, Option<usize>)],
) -> Vec<Option<T>> {
    pairs
        .iter()
        .map(|pair| match *pair {
            (Some(l), _) => left[l].clone(),
            (None, Some(r)) => right[r].clone(),
            (None, None) => None,
        })
        .collect()
}

// nulls order below every present value
fn cmp_cells<T>(a: &Option<T>, b: &Option<T>, cmp: impl Fn(&T, &T) -> Ordering) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => cmp(x, y),
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
    }
}

impl Column {
    pub fn with_capacity(ty: ColumnType, capacity: usize) -> Self {
        match ty {
            ColumnType::Int64 => Column::Int64(Vec::with_capacity(capacity)),
            ColumnType::Float64 => Column::Float64(Vec::with_capacity(capacity)),
            ColumnType::Str => Column::Str(Vec::with_capacity(capacity)),
            ColumnType::List => Column::List(Vec::with_capacity(capacity)),
        }
    }

    pub fn column_type(&self) -> ColumnType {
        match self {
            Column::Int64(_) => ColumnType::Int64,
            Column::Float64(_) => ColumnType::Float64,
            Column::Str(_) => ColumnType::Str,
            Column::List(_) => ColumnType::List,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Column::Int64(v) => v.len(),
            Column::Float64(v) => v.len(),
            Column::Str(v) => v.len(),
            Column::List(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Random access; `None` when `idx` is out of range
    pub fn get(&self, idx: usize) -> Option<Value> {
        if idx >= self.len() {
            return None;
        }
        let value = match self {
            Column::Int64(v) => v[idx].map_or(Value::Null, Value::Int),
            Column::Float64(v) => v[idx].map_or(Value::Null, Value::Float),
            Column::Str(v) => v[idx].clone().map_or(Value::Null, Value::Str),
            Column::List(v) => v[idx].clone().map_or(Value::Null, Value::List),
        };
        Some(value)
    }

    pub fn is_null(&self, idx: usize) -> bool {
        match self {
            Column::Int64(v) => v.get(idx).is_none_or(Option::is_none),
            Column::Float64(v) => v.get(idx).is_none_or(Option::is_none),
            Column::Str(v) => v.get(idx).is_none_or(Option::is_none),
            Column::List(v) => v.get(idx).is_none_or(Option::is_none),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Value> + '_ {
        (0..self.len()).map(|i| self.get(i).unwrap_or_default())
    }

    /// Appends a value, rejecting anything that does not match the column type
    pub fn push(&mut self, value: Value) -> Result<()> {
        match (self, value) {
            (Column::Int64(v), Value::Int(x)) => v.push(Some(x)),
            (Column::Float64(v), Value::Float(x)) => v.push(Some(x)),
            (Column::Float64(v), Value::Int(x)) => v.push(Some(x as f64)),
            (Column::Str(v), Value::Str(x)) => v.push(Some(x)),
            (Column::List(v), Value::List(x)) => v.push(Some(x)),
            (col, Value::Null) => col.push_null(),
            (col, other) => {
                return Err(EngineError::TypeMismatch(format!(
                    "cannot store {other:?} in a {} column",
                    col.column_type()
                )));
            }
        }
        Ok(())
    }

    pub fn push_null(&mut self) {
        match self {
            Column::Int64(v) => v.push(None),
            Column::Float64(v) => v.push(None),
            Column::Str(v) => v.push(None),
            Column::List(v) => v.push(None),
        }
    }

    /// New column holding the cells at `positions`, in that order
    pub fn take(&self, positions: &[usize]) -> Column {
        match self {
            Column::Int64(v) => Column::Int64(gather(v, positions)),
            Column::Float64(v) => Column::Float64(gather(v, positions)),
            Column::Str(v) => Column::Str(gather(v, positions)),
            Column::List(v) => Column::List(gather(v, positions)),
        }
    }

    /// Like [`Column::take`], with `None` positions producing null cells
    pub fn take_or_null(&self, positions: &[Option<usize>]) -> Column {
        match self {
            Column::Int64(v) => Column::Int64(gather_or_null(v, positions)),
            Column::Float64(v) => Column::Float64(gather_or_null(v, positions)),
            Column::Str(v) => Column::Str(gather_or_null(v, positions)),
            Column::List(v) => Column::List(gather_or_null(v, positions)),
        }
    }

    /// Builds a key column for a join output: the left cell where the left
    /// side is present, the right cell otherwise.
    pub fn coalesce(
        &self,
        right: &Column,
        pairs: &[(Option<usize>, Option<usize>)],
    ) -> Result<Column> {
        let col = match (self, right) {
            (Column::Int64(l), Column::Int64(r)) => Column::Int64(coalesce_cells(l, r, pairs)),
            (Column::Float64(l), Column::Float64(r)) => {
                Column::Float64(coalesce_cells(l, r, pairs))
            }
            (Column::Str(l), Column::Str(r)) => Column::Str(coalesce_cells(l, r, pairs)),
            (Column::List(l), Column::List(r)) => Column::List(coalesce_cells(l, r, pairs)),
            (l, r) => {
                return Err(EngineError::TypeMismatch(format!(
                    "cannot merge {} column with {} column",
                    l.column_type(),
                    r.column_type()
                )));
            }
        };
        Ok(col)
    }

    /// Orders two rows of this column; nulls first
    pub fn compare_rows(&self, a: usize, b: usize) -> Ordering {
        match self {
            Column::Int64(v) => cmp_cells(&v[a], &v[b], Ord::cmp),
            Column::Float64(v) => cmp_cells(&v[a], &v[b], f64::total_cmp),
            Column::Str(v) => cmp_cells(&v[a], &v[b], Ord::cmp),
            Column::List(v) => cmp_cells(&v[a], &v[b], Ord::cmp),
        }
    }
}

impl From<Vec<i64>> for Column {
    fn from(v: Vec<i64>) -> Self {
        Column::Int64(v.into_iter().map(Some).collect())
    }
}

impl From<Vec<f64>> for Column {
    fn from(v: Vec<f64>) -> Self {
        Column::Float64(v.into_iter().map(Some).collect())
    }
}

impl From<Vec<&str>> for Column {
    fn from(v: Vec<&str>) -> Self {
        Column::Str(v.into_iter().map(|s| Some(s.to_string())).collect())
    }
}
