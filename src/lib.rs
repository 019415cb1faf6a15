//! # reelframe
//!
//! `reelframe` is an in-memory columnar query engine for MovieLens-style CSV
//! data, written in Rust. It supports:
//!
//! - Memory-mapped, quote-aware CSV loading
//! - Typed columns chosen by column name (ids and years as integers, ratings as floats)
//! - Year extraction from `Title (1995)` style titles
//! - Cached join and group-by results for repeated dashboard queries
//!
//! # Features
//!
//! - **Filtering**: `=`, `!=`, `>`, `<`, `>=`, `<=` chained with `and`/`or`
//! - **Sorting**: stable, single or multi-key, ascending or descending
//! - **Group-by** on any tuple of columns with count, sum, avg, min, max
//! - **Joins**: inner, left, right and full hash joins with suffix renaming
//! - **Projection**: column selection, head/tail windows, distinct values
//!
//! Every operator reads its inputs and returns a new [`Frame`]; inputs are
//! never modified.
//!
//! # Example
//!
//! ```rust
//! use reelframe::{AggregateOp, CompareOp, Condition, CsvReader, FrameBuilder, filter, group_by};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let table = CsvReader::new().parse_str(
//!         "movieId,title,genres\n\
//!          1,Toy Story (1995),Animation|Comedy\n\
//!          2,\"Heat, Part One (1995)\",Action\n\
//!          3,Casino (1995),Crime\n",
//!     );
//!     let movies = FrameBuilder::new().extract_year(true).build_table(&table)?;
//!
//!     // Filter rows
//!     let early = filter(&movies, &[Condition::new("movieId", CompareOp::Lt, 3_i64)])?;
//!     assert_eq!(early.row_count(), 2);
//!
//!     // Count movies per year
//!     let per_year = group_by(&movies, &["year"], &["movieId"], AggregateOp::Count)?;
//!     for row in per_year.rows() {
//!         println!("{} => {}", row[0], row[1]);
//!     }
//!
//!     Ok(())
//! }
//! ```

mod helpers;
pub mod engine;

pub use engine::aggregate::{Aggregation, aggregate, group_by};
pub use engine::builder::FrameBuilder;
pub use engine::column::Column;
pub use engine::csv_reader::{CsvReader, CsvTable};
pub use engine::filter::{Condition, filter, filter_text};
pub use engine::frame::Frame;
pub use engine::join::{join, join_with_suffixes};
pub use engine::loader::{Dataset, LoadOptions, load_movies, load_ratings, load_tags};
pub use engine::projection::{distinct, head, select_columns, tail, with_positional_index};
pub use engine::query_builder::{QueryBuilder, QueryCache};
pub use engine::sort::{SortKey, order_by, order_by_keys};
pub use engine::value::{ColumnType, Value};
pub use engine::{AggregateOp, CompareOp, Connective, EngineError, ErrorKind, JoinKind, Result};
