use std::cmp::Ordering;

use log::debug;

use crate::engine::frame::Frame;
use crate::engine::Result;

/// One sort key: a column and its direction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub column: String,
    pub descending: bool,
}

impl SortKey {
    pub fn asc(column: &str) -> Self {
        SortKey {
            column: column.to_string(),
            descending: false,
        }
    }

    pub fn desc(column: &str) -> Self {
        SortKey {
            column: column.to_string(),
            descending: true,
        }
    }
}

/// Stable sort by one column, optionally truncated to `limit` rows.
///
/// Nulls rank below every value, so they come last when descending.
/// Ties keep their input order in both directions.
pub fn order_by(frame: &Frame, column: &str, descending: bool, limit: Option<usize>) -> Result<Frame> {
    let key = SortKey {
        column: column.to_string(),
        descending,
    };
    order_by_keys(frame, std::slice::from_ref(&key), limit)
}

/// Stable lexicographic sort: later keys only break ties left by earlier ones
pub fn order_by_keys(frame: &Frame, keys: &[SortKey], limit: Option<usize>) -> Result<Frame> {
    let columns = keys
        .iter()
        .map(|k| Ok((frame.column(&k.column)?, k.descending)))
        .collect::<Result<Vec<_>>>()?;

    let mut positions: Vec<usize> = (0..frame.row_count()).collect();
    positions.sort_by(|&a, &b| {
        columns
            .iter()
            .map(|(col, descending)| {
                let ord = col.compare_rows(a, b);
                if *descending { ord.reverse() } else { ord }
            })
            .find(|ord| *ord != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    });

    if let Some(n) = limit {
        positions.truncate(n);
    }

    debug!("order_by {} keys over {} rows", keys.len(), frame.row_count());
    Ok(frame.take_rows(&positions))
}
