use std::path::Path;

use log::info;

use crate::engine::builder::FrameBuilder;
use crate::engine::csv_reader::{CsvReader, CsvTable};
use crate::engine::frame::Frame;
use crate::engine::{EngineError, Result};

pub const MOVIES_FILE: &str = "movies.csv";
pub const RATINGS_FILE: &str = "ratings.csv";
pub const TAGS_FILE: &str = "tags.csv";

pub const MOVIES_REQUIRED: &[&str] = &["movieId", "title", "genres"];
pub const RATINGS_REQUIRED: &[&str] = &["userId", "movieId", "rating", "timestamp"];
pub const TAGS_REQUIRED: &[&str] = &["userId", "movieId", "tag", "timestamp"];

/// Options shared by every loader
#[derive(Debug, Clone, Copy)]
pub struct LoadOptions {
    pub separator: char,
}

impl Default for LoadOptions {
    fn default() -> Self {
        LoadOptions { separator: ',' }
    }
}

fn check_required(table: &CsvTable, required: &[&str]) -> Result<()> {
    match required
        .iter()
        .find(|need| !table.header.iter().any(|h| h == *need))
    {
        Some(missing) => Err(EngineError::MissingColumn(missing.to_string())),
        None => Ok(()),
    }
}

fn load(path: &Path, options: &LoadOptions, required: &[&str], extract_year: bool) -> Result<Frame> {
    let table = CsvReader::with_separator(options.separator).read(path)?;
    check_required(&table, required)?;

    let frame = FrameBuilder::new()
        .extract_year(extract_year)
        .build_table(&table)?;

    info!(
        "loaded {}: {} rows, {} columns",
        path.display(),
        frame.row_count(),
        frame.column_count()
    );
    Ok(frame)
}

/// Loads `movies.csv`, stripping years from titles into a `year` column
pub fn load_movies(path: &Path, options: &LoadOptions) -> Result<Frame> {
    load(path, options, MOVIES_REQUIRED, true)
}

/// Loads `ratings.csv`; `timestamp` is validated but not kept
pub fn load_ratings(path: &Path, options: &LoadOptions) -> Result<Frame> {
    load(path, options, RATINGS_REQUIRED, false)
}

/// Loads `tags.csv`; `timestamp` is validated but not kept
pub fn load_tags(path: &Path, options: &LoadOptions) -> Result<Frame> {
    load(path, options, TAGS_REQUIRED, false)
}

/// The three MovieLens tables
#[derive(Debug, Clone)]
pub struct Dataset {
    pub movies: Frame,
    pub ratings: Frame,
    pub tags: Frame,
}

impl Dataset {
    /// Loads all three files from `dir`. Any failure aborts the load.
    pub fn load(dir: &Path, options: &LoadOptions) -> Result<Self> {
        Ok(Dataset {
            movies: load_movies(&dir.join(MOVIES_FILE), options)?,
            ratings: load_ratings(&dir.join(RATINGS_FILE), options)?,
            tags: load_tags(&dir.join(TAGS_FILE), options)?,
        })
    }
}
