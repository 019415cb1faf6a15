use crate::engine::column::Column;
use crate::engine::frame::Frame;
use crate::engine::value::Value;
use crate::engine::{EngineError, Result};

/// Name of the synthetic position column
pub const INDEX_COLUMN: &str = "index";

pub const DEFAULT_WINDOW: usize = 5;

/// Restricts `frame` to `names`, in the given order
pub fn select_columns<S: AsRef<str>>(frame: &Frame, names: &[S]) -> Result<Frame> {
    let mut headers = Vec::with_capacity(names.len());
    let mut columns = Vec::with_capacity(names.len());
    for name in names {
        let name = name.as_ref();
        columns.push(frame.column(name)?.clone());
        headers.push(name.to_string());
    }
    Frame::new(headers, columns)
}

/// Rows `[offset, offset + limit)`, clipped to the frame
pub fn head(frame: &Frame, limit: usize, offset: usize) -> Frame {
    let start = offset.min(frame.row_count());
    let end = start.saturating_add(limit).min(frame.row_count());
    let positions: Vec<usize> = (start..end).collect();
    frame.take_rows(&positions)
}

/// The last `n` rows, or every row when `n` exceeds the row count
pub fn tail(frame: &Frame, n: usize) -> Frame {
    let start = frame.row_count().saturating_sub(n);
    let positions: Vec<usize> = (start..frame.row_count()).collect();
    frame.take_rows(&positions)
}

/// Copy of `frame` with a trailing `index` column holding `0..row_count`
pub fn with_positional_index(frame: &Frame) -> Result<Frame> {
    if frame.has_column(INDEX_COLUMN) {
        return Err(EngineError::DuplicateColumn(INDEX_COLUMN.to_string()));
    }

    let mut headers = frame.column_names().to_vec();
    let mut columns: Vec<Column> = frame.columns().map(|(_, c)| c.clone()).collect();
    headers.push(INDEX_COLUMN.to_string());
    columns.push(Column::Int64((0..frame.row_count() as i64).map(Some).collect()));
    Frame::new(headers, columns)
}

/// Sorted distinct non-null values of a column
pub fn distinct(frame: &Frame, column: &str) -> Result<Vec<Value>> {
    let col = frame.column(column)?;
    let mut values: Vec<Value> = col.iter().filter(|v| !v.is_null()).collect();
    values.sort_by(|a, b| a.compare(b).unwrap_or(std::cmp::Ordering::Equal));
    values.dedup();
    Ok(values)
}
