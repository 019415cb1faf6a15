use log::debug;

use crate::engine::column::Column;
use crate::engine::csv_reader::CsvTable;
use crate::engine::frame::Frame;
use crate::engine::value::{ColumnType, Value};
use crate::engine::{EngineError, Result};
use crate::helpers::parse_helpers::{
    MISSING_YEAR, extract_year, parse_float_cell, parse_int_cell, split_list_cell,
};

/// Name of the synthetic column appended by year extraction
pub const YEAR_COLUMN: &str = "year";

/// Position of the title among raw fields
const TITLE_FIELD: usize = 1;

/// Storage type for a column, decided by name. `None` means the column is
/// parsed as an integer but not materialised.
pub fn column_policy(name: &str) -> Option<ColumnType> {
    match name {
        "movieId" | "userId" | "year" => Some(ColumnType::Int64),
        "rating" => Some(ColumnType::Float64),
        "timestamp" => None,
        "genres" => Some(ColumnType::List),
        _ => Some(ColumnType::Str),
    }
}

fn parse_cell(ty: ColumnType, raw: &str) -> Result<Value> {
    let value = match ty {
        ColumnType::Int64 => parse_int_cell(raw)?.map_or(Value::Null, Value::Int),
        ColumnType::Float64 => parse_float_cell(raw)?.map_or(Value::Null, Value::Float),
        ColumnType::Str => Value::Str(raw.to_string()),
        ColumnType::List => Value::List(split_list_cell(raw)),
    };
    Ok(value)
}

/// Turns raw text rows into a typed [`Frame`]
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameBuilder {
    extract_year: bool,
}

impl FrameBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Strip `(YYYY)` from the second field and append it as a `year` column
    pub fn extract_year(mut self, enabled: bool) -> Self {
        self.extract_year = enabled;
        self
    }

    pub fn build_table(&self, table: &CsvTable) -> Result<Frame> {
        self.build(&table.header, &table.rows)
    }

    /// Builds a frame from a header and raw rows
    ///
    /// # Errors
    /// - [`EngineError::RowWidth`] when a row's field count differs from the header
    /// - [`EngineError::TypeMismatch`] for non-numeric text in a numeric column
    pub fn build(&self, columns: &[String], rows: &[Vec<String>]) -> Result<Frame> {
        let mut header: Vec<String> = columns.to_vec();
        if self.extract_year {
            header.push(YEAR_COLUMN.to_string());
        }

        let policies: Vec<Option<ColumnType>> =
            header.iter().map(|name| column_policy(name)).collect();
        let mut built: Vec<Option<Column>> = policies
            .iter()
            .map(|p| p.map(|ty| Column::with_capacity(ty, rows.len())))
            .collect();

        let mut missing_years = 0usize;
        let mut fields: Vec<String> = Vec::with_capacity(header.len());

        for (row_idx, raw) in rows.iter().enumerate() {
            fields.clear();
            fields.extend(raw.iter().cloned());

            if self.extract_year {
                let year = match fields.get_mut(TITLE_FIELD) {
                    Some(title) => {
                        let (clean, year) = extract_year(title);
                        *title = clean;
                        year
                    }
                    None => MISSING_YEAR,
                };
                if year == MISSING_YEAR {
                    missing_years += 1;
                }
                fields.push(year.to_string());
            }

            if fields.len() != header.len() {
                return Err(EngineError::RowWidth {
                    row: row_idx + 1,
                    expected: header.len(),
                    found: fields.len(),
                });
            }

            for (col_idx, raw_cell) in fields.iter().enumerate() {
                let ty = policies[col_idx].unwrap_or(ColumnType::Int64);
                let value = parse_cell(ty, raw_cell).map_err(|e| match e {
                    EngineError::TypeMismatch(msg) => EngineError::TypeMismatch(format!(
                        "column '{}', row {}: {msg}",
                        header[col_idx],
                        row_idx + 1
                    )),
                    other => other,
                })?;
                if let Some(col) = built[col_idx].as_mut() {
                    col.push(value)?;
                }
            }
        }

        if self.extract_year {
            debug!("{missing_years} of {} titles carried no year", rows.len());
        }

        let (names, cols): (Vec<String>, Vec<Column>) = header
            .into_iter()
            .zip(built)
            .filter_map(|(name, col)| col.map(|c| (name, c)))
            .unzip();

        Frame::new(names, cols)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ErrorKind;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_movies_with_year() {
        let header = strings(&["movieId", "title", "genres"]);
        let rows = vec![
            strings(&["1", "Toy Story (1995)", "Adventure|Animation|Children"]),
            strings(&["2", "Untitled", "(no genres listed)"]),
        ];

        let frame = FrameBuilder::new()
            .extract_year(true)
            .build(&header, &rows)
            .unwrap();

        assert_eq!(frame.column_names(), &strings(&["movieId", "title", "genres", "year"]));
        assert_eq!(frame.get("title", 0).unwrap(), Value::from("Toy Story"));
        assert_eq!(frame.get("year", 0).unwrap(), Value::Int(1995));
        assert_eq!(frame.get("year", 1).unwrap(), Value::Int(0));
        assert_eq!(frame.get("genres", 1).unwrap(), Value::List(vec![]));
    }

    #[test]
    fn test_timestamp_dropped_and_nulls() {
        let header = strings(&["userId", "movieId", "rating", "timestamp"]);
        let rows = vec![
            strings(&["1", "10", "4.5", "964982703"]),
            strings(&["2", "null", "", "964982224"]),
        ];

        let frame = FrameBuilder::new().build(&header, &rows).unwrap();
        assert_eq!(frame.column_names(), &strings(&["userId", "movieId", "rating"]));
        assert_eq!(frame.get("rating", 0).unwrap(), Value::Float(4.5));
        assert_eq!(frame.get("movieId", 1).unwrap(), Value::Null);
        assert_eq!(frame.get("rating", 1).unwrap(), Value::Null);
    }

    #[test]
    fn test_row_width_mismatch() {
        let header = strings(&["movieId", "title"]);
        let rows = vec![strings(&["1", "Heat", "extra"])];
        let err = FrameBuilder::new().build(&header, &rows).unwrap_err();
        assert!(matches!(err, EngineError::RowWidth { row: 1, expected: 2, found: 3 }));
        assert_eq!(err.kind(), ErrorKind::Schema);
    }

    #[test]
    fn test_bad_number_is_type_mismatch() {
        let header = strings(&["movieId", "title"]);
        let rows = vec![strings(&["one", "Heat"])];
        let err = FrameBuilder::new().build(&header, &rows).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
        assert!(err.to_string().contains("movieId"));
    }

    #[test]
    fn test_dropped_timestamp_is_still_parsed() {
        let header = strings(&["userId", "movieId", "rating", "timestamp"]);
        let rows = vec![strings(&["1", "1", "4.0", "not-a-time"])];
        let err = FrameBuilder::new().build(&header, &rows).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
        assert!(err.to_string().contains("timestamp"));

        // empty timestamps are nulls, not errors
        let rows = vec![strings(&["1", "1", "4.0", ""])];
        assert_eq!(FrameBuilder::new().build(&header, &rows).unwrap().row_count(), 1);
    }
}
