use std::collections::{HashMap, HashSet};

use log::debug;

use crate::engine::column::Column;
use crate::engine::frame::Frame;
use crate::engine::value::Value;
use crate::engine::{EngineError, JoinKind, Result};

/// Row pairing produced by the probe; `None` marks the null-filled side
type RowPair = (Option<usize>, Option<usize>);

fn key_of(columns: &[&Column], row: usize) -> Vec<Value> {
    columns.iter().map(|c| c.get(row).unwrap_or_default()).collect()
}

/// Join-key tuple -> right row positions, built fresh for each call
fn build_index(right_keys: &[&Column], row_count: usize) -> HashMap<Vec<Value>, Vec<usize>> {
    let mut index: HashMap<Vec<Value>, Vec<usize>> = HashMap::new();
    for row in 0..row_count {
        index.entry(key_of(right_keys, row)).or_default().push(row);
    }
    index
}

fn pair_rows(left: &Frame, right: &Frame, on: &[&str], how: JoinKind) -> Result<Vec<RowPair>> {
    let mut left_keys = Vec::with_capacity(on.len());
    let mut right_keys = Vec::with_capacity(on.len());
    for name in on {
        let l = left.column(name)?;
        let r = right.column(name)?;
        if l.column_type() != r.column_type() {
            return Err(EngineError::TypeMismatch(format!(
                "join key '{name}' is {} on the left but {} on the right",
                l.column_type(),
                r.column_type()
            )));
        }
        left_keys.push(l);
        right_keys.push(r);
    }

    let index = build_index(&right_keys, right.row_count());
    let mut matched_right = vec![false; right.row_count()];
    let mut pairs: Vec<RowPair> = Vec::with_capacity(left.row_count());

    for l in 0..left.row_count() {
        match index.get(&key_of(&left_keys, l)) {
            Some(rights) => {
                for &r in rights {
                    matched_right[r] = true;
                    pairs.push((Some(l), Some(r)));
                }
            }
            None if how.keeps_unmatched_left() => pairs.push((Some(l), None)),
            None => {}
        }
    }

    if how.keeps_unmatched_right() {
        pairs.extend(
            matched_right
                .iter()
                .enumerate()
                .filter(|(_, matched)| !**matched)
                .map(|(r, _)| (None, Some(r))),
        );
    }

    Ok(pairs)
}

fn unique_name(base: String, taken: &HashSet<String>) -> String {
    if !taken.contains(&base) {
        return base;
    }
    let mut n = 1;
    loop {
        let candidate = format!("{base}_{n}");
        if !taken.contains(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

/// Hash join of `left` and `right` on equal `on` values.
///
/// Output columns are every left column followed by the right columns not
/// in `on`. Key columns are taken from whichever side is present. A right
/// column whose name already exists on the left is dropped; use
/// [`join_with_suffixes`] to keep both.
///
/// Null keys are equal to each other and match.
///
/// # Example
/// ```rust
/// # use reelframe::{Column, Frame, JoinKind, Value, join};
/// let movies = Frame::new(
///     vec!["movieId".into(), "title".into()],
///     vec![Column::from(vec![1_i64, 3]), Column::from(vec!["Heat", "Casino"])],
/// )
/// .unwrap();
/// let ratings = Frame::new(
///     vec!["movieId".into(), "rating".into()],
///     vec![Column::from(vec![1_i64, 1]), Column::from(vec![4.0, 5.0])],
/// )
/// .unwrap();
///
/// let out = join(&movies, &ratings, &["movieId"], JoinKind::Left).unwrap();
/// assert_eq!(out.row_count(), 3);
/// assert_eq!(out.get("rating", 2).unwrap(), Value::Null);
/// ```
pub fn join<S: AsRef<str>>(left: &Frame, right: &Frame, on: &[S], how: JoinKind) -> Result<Frame> {
    join_impl(left, right, on, how, None)
}

/// Like [`join`], but name collisions outside `on` keep both columns,
/// renamed `<name><left_suffix>` and `<name><right_suffix>`. A renamed
/// column that still collides gets `_1`, `_2`, ... appended.
pub fn join_with_suffixes<S: AsRef<str>>(
    left: &Frame,
    right: &Frame,
    on: &[S],
    how: JoinKind,
    left_suffix: &str,
    right_suffix: &str,
) -> Result<Frame> {
    join_impl(left, right, on, how, Some((left_suffix, right_suffix)))
}

fn join_impl<S: AsRef<str>>(
    left: &Frame,
    right: &Frame,
    on: &[S],
    how: JoinKind,
    suffixes: Option<(&str, &str)>,
) -> Result<Frame> {
    let on: Vec<&str> = on.iter().map(AsRef::as_ref).collect();
    let pairs = pair_rows(left, right, &on, how)?;
    let left_rows: Vec<Option<usize>> = pairs.iter().map(|p| p.0).collect();
    let right_rows: Vec<Option<usize>> = pairs.iter().map(|p| p.1).collect();

    let is_key = |name: &str| on.contains(&name);
    let collides = |name: &str| !is_key(name) && left.has_column(name) && right.has_column(name);

    // names that are already final and must not be reused by a rename
    let mut taken: HashSet<String> = left
        .column_names()
        .iter()
        .chain(right.column_names())
        .filter(|n| !collides(n.as_str()))
        .cloned()
        .collect();

    let mut headers = Vec::new();
    let mut columns = Vec::new();

    for (name, col) in left.columns() {
        let column = if is_key(name) {
            col.coalesce(right.column(name)?, &pairs)?
        } else {
            col.take_or_null(&left_rows)
        };
        let header = match suffixes {
            Some((left_suffix, _)) if collides(name) => {
                unique_name(format!("{name}{left_suffix}"), &taken)
            }
            _ => name.to_string(),
        };
        taken.insert(header.clone());
        headers.push(header);
        columns.push(column);
    }

    for (name, col) in right.columns() {
        if is_key(name) {
            continue;
        }
        let header = match suffixes {
            Some((_, right_suffix)) if collides(name) => {
                unique_name(format!("{name}{right_suffix}"), &taken)
            }
            None if collides(name) => continue,
            _ => name.to_string(),
        };
        taken.insert(header.clone());
        headers.push(header);
        columns.push(col.take_or_null(&right_rows));
    }

    debug!(
        "{how:?} join on {on:?}: {} x {} rows -> {}",
        left.row_count(),
        right.row_count(),
        pairs.len()
    );
    Frame::new(headers, columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ErrorKind;

    fn movies() -> Frame {
        Frame::new(
            vec!["movieId".into(), "title".into(), "source".into()],
            vec![
                Column::from(vec![1_i64, 2, 3]),
                Column::from(vec!["Heat", "Jumanji", "Casino"]),
                Column::from(vec!["m", "m", "m"]),
            ],
        )
        .unwrap()
    }

    fn ratings() -> Frame {
        Frame::new(
            vec!["userId".into(), "movieId".into(), "rating".into(), "source".into()],
            vec![
                Column::from(vec![7_i64, 8, 7, 9]),
                Column::from(vec![1_i64, 1, 2, 4]),
                Column::from(vec![4.0, 3.0, 2.5, 1.0]),
                Column::from(vec!["r", "r", "r", "r"]),
            ],
        )
        .unwrap()
    }

    fn ids(frame: &Frame) -> Vec<Value> {
        frame.column("movieId").unwrap().iter().collect()
    }

    #[test]
    fn test_inner_fans_out() {
        let out = join(&movies(), &ratings(), &["movieId"], JoinKind::Inner).unwrap();
        assert_eq!(ids(&out), vec![Value::Int(1), Value::Int(1), Value::Int(2)]);
        // legacy policy: left wins on a name clash
        assert_eq!(out.column_names(), &["movieId", "title", "source", "userId", "rating"]);
        assert_eq!(out.get("source", 0).unwrap(), Value::from("m"));
    }

    #[test]
    fn test_left_null_fills() {
        let out = join(&movies(), &ratings(), &["movieId"], JoinKind::Left).unwrap();
        assert_eq!(out.row_count(), 4);
        assert_eq!(out.get("movieId", 3).unwrap(), Value::Int(3));
        assert_eq!(out.get("userId", 3).unwrap(), Value::Null);
        assert_eq!(out.get("rating", 3).unwrap(), Value::Null);
    }

    #[test]
    fn test_right_keeps_unmatched_right_with_key() {
        let out = join(&movies(), &ratings(), &["movieId"], JoinKind::Right).unwrap();
        assert_eq!(out.row_count(), 4);
        assert_eq!(out.get("movieId", 3).unwrap(), Value::Int(4));
        assert_eq!(out.get("title", 3).unwrap(), Value::Null);
        assert_eq!(out.get("rating", 3).unwrap(), Value::Float(1.0));
    }

    #[test]
    fn test_full() {
        let out = join(&movies(), &ratings(), &["movieId"], JoinKind::Full).unwrap();
        assert_eq!(
            ids(&out),
            vec![1, 1, 2, 3, 4].into_iter().map(Value::Int).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_suffixes() {
        let out =
            join_with_suffixes(&movies(), &ratings(), &["movieId"], JoinKind::Inner, "", "_r")
                .unwrap();
        assert_eq!(
            out.column_names(),
            &["movieId", "title", "source", "userId", "rating", "source_r"]
        );
        assert_eq!(out.get("source_r", 0).unwrap(), Value::from("r"));
    }

    #[test]
    fn test_suffix_collision_is_numbered() {
        let out =
            join_with_suffixes(&movies(), &ratings(), &["movieId"], JoinKind::Inner, "", "")
                .unwrap();
        assert_eq!(
            out.column_names(),
            &["movieId", "title", "source", "userId", "rating", "source_1"]
        );
    }

    #[test]
    fn test_key_type_mismatch() {
        let other = Frame::new(vec!["movieId".into()], vec![Column::from(vec![1.0])]).unwrap();
        let err = join(&movies(), &other, &["movieId"], JoinKind::Inner).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    }

    #[test]
    fn test_unknown_key() {
        let err = join(&movies(), &ratings(), &["title"], JoinKind::Inner).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema);
    }
}
