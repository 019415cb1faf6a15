use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

pub mod aggregate;
pub mod builder;
pub mod column;
pub mod csv_reader;
pub mod filter;
pub mod frame;
pub mod join;
pub mod loader;
pub mod projection;
pub mod query_builder;
pub mod sort;
pub mod value;

/// Error type used across the crate
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("UTF8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("Duplicate column: {0}")]
    DuplicateColumn(String),

    #[error("Column {column} has {found} rows, expected {expected}")]
    ColumnLength {
        column: String,
        expected: usize,
        found: usize,
    },

    #[error("Row {row} has {found} fields, expected {expected}")]
    RowWidth {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("Invalid condition: {0}")]
    InvalidCondition(String),

    #[error("Invalid aggregation: {0}")]
    InvalidAggregation(String),

    #[error("Type mismatch: {0}")]
    TypeMismatch(String),
}

/// Coarse error classes a caller can branch on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    FileNotFound,
    Io,
    Schema,
    InvalidCondition,
    InvalidAggregation,
    TypeMismatch,
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::FileNotFound(_) => ErrorKind::FileNotFound,
            EngineError::Io(_) | EngineError::Utf8(_) => ErrorKind::Io,
            EngineError::MissingColumn(_)
            | EngineError::UnknownColumn(_)
            | EngineError::DuplicateColumn(_)
            | EngineError::ColumnLength { .. }
            | EngineError::RowWidth { .. } => ErrorKind::Schema,
            EngineError::InvalidCondition(_) => ErrorKind::InvalidCondition,
            EngineError::InvalidAggregation(_) => ErrorKind::InvalidAggregation,
            EngineError::TypeMismatch(_) => ErrorKind::TypeMismatch,
        }
    }

    /// Load-time failures leave the caller without usable data.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            EngineError::FileNotFound(_)
                | EngineError::Io(_)
                | EngineError::Utf8(_)
                | EngineError::MissingColumn(_)
                | EngineError::RowWidth { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;

/// Comparison operator of one predicate slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Eq,
    NotEq,
    Gt,
    Lt,
    GtEq,
    LtEq,
}

impl FromStr for CompareOp {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "=" | "==" => Ok(CompareOp::Eq),
            "!=" => Ok(CompareOp::NotEq),
            ">" => Ok(CompareOp::Gt),
            "<" => Ok(CompareOp::Lt),
            ">=" => Ok(CompareOp::GtEq),
            "<=" => Ok(CompareOp::LtEq),
            other => Err(EngineError::InvalidCondition(other.to_string())),
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CompareOp::Eq => "=",
            CompareOp::NotEq => "!=",
            CompareOp::Gt => ">",
            CompareOp::Lt => "<",
            CompareOp::GtEq => ">=",
            CompareOp::LtEq => "<=",
        };
        f.write_str(s)
    }
}

/// How a predicate slot folds into the running row set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Connective {
    #[default]
    And,
    Or,
}

impl FromStr for Connective {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "and" => Ok(Connective::And),
            "or" => Ok(Connective::Or),
            other => Err(EngineError::InvalidCondition(format!(
                "unknown separator '{other}'"
            ))),
        }
    }
}

/// Aggregate operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateOp {
    /// Number of rows in the group, nulls included
    Count,
    /// Sum of present numeric values
    Sum,
    /// Sum divided by the number of present values
    Avg,
    /// Smallest present value
    Min,
    /// Largest present value
    Max,
}

impl AggregateOp {
    /// Suffix used when naming output columns, e.g. `rating_avg`
    pub fn name(&self) -> &'static str {
        match self {
            AggregateOp::Count => "count",
            AggregateOp::Sum => "sum",
            AggregateOp::Avg => "avg",
            AggregateOp::Min => "min",
            AggregateOp::Max => "max",
        }
    }
}

impl FromStr for AggregateOp {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "count" => Ok(AggregateOp::Count),
            "sum" => Ok(AggregateOp::Sum),
            "avg" | "mean" => Ok(AggregateOp::Avg),
            "min" => Ok(AggregateOp::Min),
            "max" => Ok(AggregateOp::Max),
            other => Err(EngineError::InvalidAggregation(other.to_string())),
        }
    }
}

/// Join semantics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
}

impl JoinKind {
    fn keeps_unmatched_left(&self) -> bool {
        matches!(self, JoinKind::Left | JoinKind::Full)
    }

    fn keeps_unmatched_right(&self) -> bool {
        matches!(self, JoinKind::Right | JoinKind::Full)
    }
}

impl FromStr for JoinKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inner" => Ok(JoinKind::Inner),
            "left" => Ok(JoinKind::Left),
            "right" => Ok(JoinKind::Right),
            "full" | "outer" => Ok(JoinKind::Full),
            other => Err(EngineError::InvalidCondition(format!(
                "unknown join type '{other}'"
            ))),
        }
    }
}
