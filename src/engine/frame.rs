use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::engine::column::Column;
use crate::engine::value::{ColumnType, Value};
use crate::engine::{EngineError, Result};

static NEXT_FRAME_ID: AtomicU64 = AtomicU64::new(1);

/// Columnar table: an ordered list of uniquely named, equal-length columns.
///
/// Row `i` is the `i`-th cell of every column; there is no row object.
/// A `Frame` is never mutated after construction, every operator builds a
/// new one, so its [`Frame::id`] can key caches safely.
///
/// # Example
/// ```rust
/// # use reelframe::{Column, Frame, Value};
/// let frame = Frame::new(
///     vec!["movieId".into(), "title".into()],
///     vec![Column::from(vec![1_i64, 2]), Column::from(vec!["Heat", "Jumanji"])],
/// )
/// .unwrap();
/// assert_eq!(frame.row_count(), 2);
/// assert_eq!(frame.row(1).unwrap()[1], Value::from("Jumanji"));
/// ```
#[derive(Debug, Clone)]
pub struct Frame {
    id: u64,
    headers: Vec<String>,
    columns: Vec<Column>,
    row_count: usize,
}

impl Frame {
    /// Validates unique names and equal column lengths
    pub fn new(headers: Vec<String>, columns: Vec<Column>) -> Result<Self> {
        if headers.len() != columns.len() {
            return Err(EngineError::ColumnLength {
                column: "<header>".to_string(),
                expected: headers.len(),
                found: columns.len(),
            });
        }

        let mut seen = HashSet::with_capacity(headers.len());
        for name in &headers {
            if !seen.insert(name.as_str()) {
                return Err(EngineError::DuplicateColumn(name.clone()));
            }
        }

        let row_count = columns.first().map_or(0, Column::len);
        for (name, col) in headers.iter().zip(&columns) {
            if col.len() != row_count {
                return Err(EngineError::ColumnLength {
                    column: name.clone(),
                    expected: row_count,
                    found: col.len(),
                });
            }
        }

        Ok(Frame {
            id: NEXT_FRAME_ID.fetch_add(1, Ordering::Relaxed),
            headers,
            columns,
            row_count,
        })
    }

    /// Identity of this frame's contents
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    pub fn column_names(&self) -> &[String] {
        &self.headers
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn column(&self, name: &str) -> Result<&Column> {
        self.position(name)
            .map(|i| &self.columns[i])
            .ok_or_else(|| EngineError::UnknownColumn(name.to_string()))
    }

    pub fn column_type(&self, name: &str) -> Result<ColumnType> {
        self.column(name).map(Column::column_type)
    }

    /// Cell at (`column`, `row`)
    pub fn get(&self, column: &str, row: usize) -> Result<Value> {
        Ok(self.column(column)?.get(row).unwrap_or_default())
    }

    /// Columns paired with their names, in output order
    pub fn columns(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.headers.iter().map(String::as_str).zip(&self.columns)
    }

    /// One logical record, in column order
    pub fn row(&self, idx: usize) -> Option<Vec<Value>> {
        if idx >= self.row_count {
            return None;
        }
        Some(self.columns.iter().map(|c| c.get(idx).unwrap_or_default()).collect())
    }

    /// Row-major view, the transposition a renderer needs
    pub fn rows(&self) -> impl Iterator<Item = Vec<Value>> + '_ {
        (0..self.row_count).filter_map(|i| self.row(i))
    }

    /// New frame holding the rows at `positions` of every column
    pub fn take_rows(&self, positions: &[usize]) -> Frame {
        let columns = self.columns.iter().map(|c| c.take(positions)).collect();
        Frame {
            id: NEXT_FRAME_ID.fetch_add(1, Ordering::Relaxed),
            headers: self.headers.clone(),
            columns,
            row_count: positions.len(),
        }
    }
}

impl PartialEq for Frame {
    fn eq(&self, other: &Self) -> bool {
        self.headers == other.headers && self.columns == other.columns
    }
}
