use std::sync::LazyLock;

use regex::Regex;

use crate::engine::{EngineError, Result};

/// Sentinel the MovieLens exports use for movies without genres
pub const NO_GENRES: &str = "(no genres listed)";

/// Year recorded for titles that carry no `(YYYY)` suffix
pub const MISSING_YEAR: i64 = 0;

static YEAR_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(([0-9]{4})\)\s*$").expect("valid year pattern"));

fn is_null_literal(s: &str) -> bool {
    s.is_empty() || s.eq_ignore_ascii_case("null")
}

/// Parses an integer cell; empty or `null` is `None`.
pub fn parse_int_cell(raw: &str) -> Result<Option<i64>> {
    let s = raw.trim();
    if is_null_literal(s) {
        return Ok(None);
    }

    atoi_simd::parse::<i64>(s.as_bytes())
        .map(Some)
        .map_err(|e| EngineError::TypeMismatch(format!("'{s}' is not an integer ({e})")))
}

/// Parses a float cell; empty or `null` is `None`.
pub fn parse_float_cell(raw: &str) -> Result<Option<f64>> {
    let s = raw.trim();
    if is_null_literal(s) {
        return Ok(None);
    }

    fast_float::parse::<f64, _>(s.as_bytes())
        .map(Some)
        .map_err(|_| EngineError::TypeMismatch(format!("'{s}' is not a number")))
}

/// Splits a `|`-separated list cell. The no-genres sentinel and the empty
/// string both produce an empty list.
pub fn split_list_cell(raw: &str) -> Vec<String> {
    let s = raw.trim();
    if s.is_empty() || s == NO_GENRES {
        return Vec::new();
    }
    s.split('|').map(str::to_string).collect()
}

/// Strips a trailing `(YYYY)` from a title.
///
/// Returns the cleaned title and the year, or the untouched title and
/// [`MISSING_YEAR`] when there is no suffix.
pub fn extract_year(title: &str) -> (String, i64) {
    let Some(caps) = YEAR_SUFFIX.captures(title) else {
        return (title.to_string(), MISSING_YEAR);
    };

    // four ASCII digits always fit
    let year = caps[1].parse::<i64>().unwrap_or(MISSING_YEAR);
    let start = caps.get(0).map_or(title.len(), |m| m.start());
    (title[..start].trim_end().to_string(), year)
}
