use std::cmp::Ordering;

use log::debug;

use crate::engine::column::Column;
use crate::engine::frame::Frame;
use crate::engine::value::Value;
use crate::engine::{CompareOp, Connective, EngineError, Result};

/// One predicate slot: `column op value`, folded into the running row set
/// with `connective`.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub column: String,
    pub op: CompareOp,
    pub value: Value,
    pub connective: Connective,
}

impl Condition {
    pub fn new(column: &str, op: CompareOp, value: impl Into<Value>) -> Self {
        Condition {
            column: column.to_string(),
            op,
            value: value.into(),
            connective: Connective::And,
        }
    }

    /// Union this slot into the running set instead of intersecting
    pub fn or(mut self) -> Self {
        self.connective = Connective::Or;
        self
    }
}

fn holds(op: CompareOp, ord: Ordering) -> bool {
    match op {
        CompareOp::Eq => ord == Ordering::Equal,
        CompareOp::NotEq => ord != Ordering::Equal,
        CompareOp::Gt => ord == Ordering::Greater,
        CompareOp::Lt => ord == Ordering::Less,
        CompareOp::GtEq => ord != Ordering::Less,
        CompareOp::LtEq => ord != Ordering::Greater,
    }
}

fn mismatch(col: &Column, cond: &Condition) -> EngineError {
    EngineError::TypeMismatch(format!(
        "cannot compare {} column '{}' with {:?}",
        col.column_type(),
        cond.column,
        cond.value
    ))
}

fn match_cells<T>(cells: &[Option<T>], mut test: impl FnMut(&T) -> bool) -> Vec<bool> {
    cells
        .iter()
        .map(|cell| cell.as_ref().is_some_and(&mut test))
        .collect()
}

/// Rows of `col` where the slot holds. Null cells only ever match an
/// `= null` slot.
fn evaluate(col: &Column, cond: &Condition) -> Result<Vec<bool>> {
    let op = cond.op;

    if cond.value.is_null() {
        return match op {
            CompareOp::Eq => Ok((0..col.len()).map(|i| col.is_null(i)).collect()),
            CompareOp::NotEq => Ok((0..col.len()).map(|i| !col.is_null(i)).collect()),
            _ => Err(EngineError::TypeMismatch(format!(
                "'{op}' cannot be applied to null"
            ))),
        };
    }

    let matched = match (col, &cond.value) {
        (Column::Int64(cells), Value::Int(target)) => {
            match_cells(cells, |v| holds(op, v.cmp(target)))
        }
        (Column::Int64(cells), Value::Float(target)) => {
            match_cells(cells, |v| holds(op, (*v as f64).total_cmp(target)))
        }
        (Column::Float64(cells), Value::Float(target)) => {
            match_cells(cells, |v| holds(op, v.total_cmp(target)))
        }
        (Column::Float64(cells), Value::Int(target)) => {
            let target = *target as f64;
            match_cells(cells, |v| holds(op, v.total_cmp(&target)))
        }
        (Column::Str(cells), Value::Str(target)) => {
            let target = target.to_lowercase();
            match_cells(cells, |v| holds(op, v.to_lowercase().cmp(&target)))
        }
        _ => return Err(mismatch(col, cond)),
    };
    Ok(matched)
}

/// Keeps the rows selected by a chain of predicate slots.
///
/// Every slot is evaluated against the full input, then folded into the
/// running set: `And` intersects, `Or` adds. The running set starts as
/// every row. Surviving rows keep their original order.
///
/// # Errors
/// - [`EngineError::UnknownColumn`] for a slot naming a missing column
/// - [`EngineError::TypeMismatch`] when operand and column types cannot be compared
///
/// # Example
/// ```rust
/// # use reelframe::{Column, CompareOp, Condition, Frame, filter};
/// let frame = Frame::new(
///     vec!["year".into()],
///     vec![Column::from(vec![1995_i64, 1996, 1997])],
/// )
/// .unwrap();
/// let out = filter(&frame, &[
///     Condition::new("year", CompareOp::Eq, 1995_i64),
///     Condition::new("year", CompareOp::Eq, 1997_i64).or(),
/// ])
/// .unwrap();
/// assert_eq!(out.row_count(), 2);
/// ```
pub fn filter(frame: &Frame, conditions: &[Condition]) -> Result<Frame> {
    let mut keep = vec![true; frame.row_count()];

    for cond in conditions {
        let col = frame.column(&cond.column)?;
        let current = evaluate(col, cond)?;

        match cond.connective {
            Connective::And => keep
                .iter_mut()
                .zip(&current)
                .for_each(|(k, c)| *k = *k && *c),
            Connective::Or => keep
                .iter_mut()
                .zip(&current)
                .for_each(|(k, c)| *k = *k || *c),
        }
    }

    let positions: Vec<usize> = keep
        .iter()
        .enumerate()
        .filter_map(|(i, k)| k.then_some(i))
        .collect();

    debug!(
        "filter: {} slots, {} of {} rows kept",
        conditions.len(),
        positions.len(),
        frame.row_count()
    );
    Ok(frame.take_rows(&positions))
}

/// Text-driven form of [`filter`]: parallel lists of columns, operators and
/// operands, with optional separators (`and`/`or`) defaulting to `and`.
///
/// Operands are converted to the type of their column.
pub fn filter_text<S: AsRef<str>>(
    frame: &Frame,
    columns: &[S],
    conditions: &[S],
    values: &[S],
    separators: &[S],
) -> Result<Frame> {
    if columns.len() != conditions.len() || columns.len() != values.len() {
        return Err(EngineError::InvalidCondition(format!(
            "{} columns, {} conditions and {} values do not line up",
            columns.len(),
            conditions.len(),
            values.len()
        )));
    }

    let mut slots = Vec::with_capacity(columns.len());
    for (i, ((column, op), raw)) in columns.iter().zip(conditions).zip(values).enumerate() {
        let column = column.as_ref();
        let op: CompareOp = op.as_ref().parse()?;
        let value = Value::parse_for(frame.column_type(column)?, raw.as_ref())?;
        let connective = match separators.get(i) {
            Some(sep) => sep.as_ref().parse()?,
            None => Connective::And,
        };
        slots.push(Condition {
            column: column.to_string(),
            op,
            value,
            connective,
        });
    }

    filter(frame, &slots)
}
