use std::borrow::Cow;
use std::collections::HashMap;

use log::debug;

use crate::engine::column::Column;
use crate::engine::frame::Frame;
use crate::engine::value::Value;
use crate::engine::{AggregateOp, EngineError, Result};
use crate::helpers::parse_helpers::parse_float_cell;

/// One output measure: `op` applied to `column`, named `<column>_<op>`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Aggregation {
    pub column: String,
    pub op: AggregateOp,
}

impl Aggregation {
    pub fn new(column: &str, op: AggregateOp) -> Self {
        Aggregation {
            column: column.to_string(),
            op,
        }
    }

    pub fn output_name(&self) -> String {
        format!("{}_{}", self.column, self.op.name())
    }
}

/// Numeric view of an aggregated column
enum Numeric<'a> {
    Int(&'a [Option<i64>]),
    Float(Cow<'a, [Option<f64>]>),
}

fn numeric_view<'a>(name: &str, col: &'a Column) -> Result<Numeric<'a>> {
    match col {
        Column::Int64(cells) => Ok(Numeric::Int(cells)),
        Column::Float64(cells) => Ok(Numeric::Float(Cow::Borrowed(cells))),
        // text that reads as numbers can still be aggregated, blanks count as null
        Column::Str(cells) => {
            let parsed = cells
                .iter()
                .map(|cell| match cell {
                    Some(s) => parse_float_cell(s).map_err(|_| {
                        EngineError::TypeMismatch(format!(
                            "column '{name}' holds non-numeric value '{s}'"
                        ))
                    }),
                    None => Ok(None),
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(Numeric::Float(Cow::Owned(parsed)))
        }
        Column::List(_) => Err(EngineError::TypeMismatch(format!(
            "column '{name}' is a list and cannot be aggregated numerically"
        ))),
    }
}

fn present<'a, T: Copy + 'a>(
    cells: &'a [Option<T>],
    rows: &'a [usize],
) -> impl Iterator<Item = T> + 'a {
    rows.iter().filter_map(move |&i| cells[i])
}

fn checked_sum(name: &str, total: i128) -> Result<i64> {
    i64::try_from(total).map_err(|_| {
        EngineError::TypeMismatch(format!("integer sum of column '{name}' overflows"))
    })
}

fn aggregate_numeric(
    name: &str,
    values: &Numeric<'_>,
    op: AggregateOp,
    groups: &[Vec<usize>],
) -> Result<Column> {
    match values {
        Numeric::Int(cells) => aggregate_ints(name, cells, op, groups),
        Numeric::Float(cells) => Ok(aggregate_floats(cells, op, groups)),
    }
}

fn aggregate_ints(
    name: &str,
    cells: &[Option<i64>],
    op: AggregateOp,
    groups: &[Vec<usize>],
) -> Result<Column> {
    let per_group = groups.iter();
    Ok(match op {
        AggregateOp::Count => count_column(groups),
        AggregateOp::Sum => Column::Int64(
            per_group
                .map(|rows| {
                    let total: i128 = present(cells, rows).map(i128::from).sum();
                    checked_sum(name, total).map(Some)
                })
                .collect::<Result<Vec<_>>>()?,
        ),
        AggregateOp::Min => {
            Column::Int64(per_group.map(|rows| present(cells, rows).min()).collect())
        }
        AggregateOp::Max => {
            Column::Int64(per_group.map(|rows| present(cells, rows).max()).collect())
        }
        AggregateOp::Avg => Column::Float64(
            per_group
                .map(|rows| {
                    let (sum, n) = present(cells, rows)
                        .fold((0i128, 0usize), |(s, n), v| (s + i128::from(v), n + 1));
                    Some(if n == 0 { 0.0 } else { sum as f64 / n as f64 })
                })
                .collect(),
        ),
    })
}

fn aggregate_floats(cells: &[Option<f64>], op: AggregateOp, groups: &[Vec<usize>]) -> Column {
    let per_group = groups.iter();
    match op {
        AggregateOp::Count => count_column(groups),
        AggregateOp::Sum => {
            Column::Float64(per_group.map(|rows| Some(present(cells, rows).sum())).collect())
        }
        AggregateOp::Min => Column::Float64(
            per_group
                .map(|rows| present(cells, rows).min_by(f64::total_cmp))
                .collect(),
        ),
        AggregateOp::Max => Column::Float64(
            per_group
                .map(|rows| present(cells, rows).max_by(f64::total_cmp))
                .collect(),
        ),
        AggregateOp::Avg => Column::Float64(
            per_group
                .map(|rows| {
                    let (sum, n) =
                        present(cells, rows).fold((0.0f64, 0usize), |(s, n), v| (s + v, n + 1));
                    Some(if n == 0 { 0.0 } else { sum / n as f64 })
                })
                .collect(),
        ),
    }
}

fn count_column(groups: &[Vec<usize>]) -> Column {
    Column::Int64(groups.iter().map(|rows| Some(rows.len() as i64)).collect())
}

/// Buckets rows by the tuple of `key_columns` values, in first-seen order
fn bucket_rows(key_columns: &[&Column], row_count: usize) -> Vec<Vec<usize>> {
    let mut slots: HashMap<Vec<Value>, usize> = HashMap::new();
    let mut groups: Vec<Vec<usize>> = Vec::new();

    for row in 0..row_count {
        let key: Vec<Value> = key_columns
            .iter()
            .map(|c| c.get(row).unwrap_or_default())
            .collect();
        let slot = *slots.entry(key).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push(row);
    }

    groups
}

/// Groups `frame` by `group_columns` and computes every aggregation per group.
///
/// Output holds the group columns (one row per distinct key, first-seen
/// order) followed by one `<column>_<op>` column per aggregation. An empty
/// `group_columns` aggregates the whole frame into a single row.
///
/// # Errors
/// - [`EngineError::UnknownColumn`] for a missing group or aggregation column
/// - [`EngineError::TypeMismatch`] for `sum`/`avg`/`min`/`max` over non-numeric data,
///   or an integer sum that leaves the `i64` range
pub fn aggregate<S: AsRef<str>>(
    frame: &Frame,
    group_columns: &[S],
    aggregations: &[Aggregation],
) -> Result<Frame> {
    let key_columns = group_columns
        .iter()
        .map(|name| frame.column(name.as_ref()))
        .collect::<Result<Vec<_>>>()?;

    // resolve and type-check every measure before doing any work
    let mut measures = Vec::with_capacity(aggregations.len());
    for agg in aggregations {
        let col = frame.column(&agg.column)?;
        let view = match agg.op {
            AggregateOp::Count => None,
            _ => Some(numeric_view(&agg.column, col)?),
        };
        measures.push((agg, view));
    }

    let groups = bucket_rows(&key_columns, frame.row_count());
    let first_rows: Vec<usize> = groups.iter().map(|rows| rows[0]).collect();

    let mut headers: Vec<String> = Vec::with_capacity(group_columns.len() + measures.len());
    let mut columns: Vec<Column> = Vec::with_capacity(headers.capacity());

    for (name, col) in group_columns.iter().zip(&key_columns) {
        headers.push(name.as_ref().to_string());
        columns.push(col.take(&first_rows));
    }

    for (agg, view) in &measures {
        headers.push(agg.output_name());
        columns.push(match view {
            Some(values) => aggregate_numeric(&agg.column, values, agg.op, &groups)?,
            None => count_column(&groups),
        });
    }

    debug!(
        "group_by {} keys: {} rows into {} groups",
        group_columns.len(),
        frame.row_count(),
        groups.len()
    );
    Frame::new(headers, columns)
}

/// Single-function group-by: `op` over each of `agg_columns`
pub fn group_by<S: AsRef<str>>(
    frame: &Frame,
    group_columns: &[S],
    agg_columns: &[S],
    op: AggregateOp,
) -> Result<Frame> {
    let aggregations: Vec<Aggregation> = agg_columns
        .iter()
        .map(|c| Aggregation::new(c.as_ref(), op))
        .collect();
    aggregate(frame, group_columns, &aggregations)
}
