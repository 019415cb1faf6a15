use lru::LruCache;

use crate::engine::aggregate::{Aggregation, aggregate};
use crate::engine::filter::{Condition, filter};
use crate::engine::frame::Frame;
use crate::engine::join::{join, join_with_suffixes};
use crate::engine::projection::{head, select_columns};
use crate::engine::sort::{SortKey, order_by_keys};
use crate::engine::{AggregateOp, JoinKind, Result};
use log::debug;
use std::cell::RefCell;

#[derive(Debug, Hash, Eq, PartialEq, Clone)]
pub enum QueryKey {
    GroupBy {
        frame: u64,
        group_columns: Vec<String>,
        aggregations: Vec<Aggregation>,
    },
    Join {
        left: u64,
        right: u64,
        on: Vec<String>,
        how: JoinKind,
        suffixes: Option<(String, String)>,
    },
}

use std::num::NonZeroUsize;
use std::rc::Rc;

const DEFAULT_CACHE_ENTRIES: usize = 128;

/// LRU of operator results keyed by input frame identity.
///
/// Frames never change after construction, so an entry stays valid for as
/// long as it is cached.
#[derive(Debug)]
pub struct QueryCache {
    cache: RefCell<LruCache<QueryKey, Rc<Frame>>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CACHE_ENTRIES)
    }

    pub fn with_capacity(entries: usize) -> Self {
        let entries = NonZeroUsize::new(entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: RefCell::new(LruCache::new(entries)),
        }
    }

    pub fn get(&self, key: &QueryKey) -> Option<Rc<Frame>> {
        self.cache.borrow_mut().get(key).cloned()
    }

    pub fn put(&self, key: QueryKey, value: Rc<Frame>) {
        self.cache.borrow_mut().put(key, value);
    }

    pub fn len(&self) -> usize {
        self.cache.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
struct JoinStep {
    right: Rc<Frame>,
    on: Vec<String>,
    how: JoinKind,
    suffixes: Option<(String, String)>,
}

/// Fluent composition of the relational operators over one source frame.
///
/// Steps run in a fixed order: joins, filter, group-by, order-by, select,
/// limit. Each step reads the previous result and builds a new frame.
///
/// # Example
/// ```rust
/// # use std::rc::Rc;
/// # use reelframe::{AggregateOp, Column, Frame, Value};
/// let ratings = Rc::new(
///     Frame::new(
///         vec!["movieId".into(), "rating".into()],
///         vec![Column::from(vec![1_i64, 2, 1]), Column::from(vec![4.0, 3.0, 5.0])],
///     )
///     .unwrap(),
/// );
///
/// let top = ratings
///     .query()
///     .group_by(&["movieId"])
///     .aggregate("rating", AggregateOp::Avg)
///     .order_by("rating_avg", true)
///     .limit(1)
///     .execute()
///     .unwrap();
/// assert_eq!(top.get("movieId", 0).unwrap(), Value::Int(1));
/// ```
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    source: Rc<Frame>,
    cache: Option<Rc<QueryCache>>,
    joins: Vec<JoinStep>,
    filters: Vec<Condition>,
    group_by_columns: Vec<String>,
    aggregations: Vec<Aggregation>,
    sort_keys: Vec<SortKey>,
    select_columns: Vec<String>,
    limit: Option<usize>,
}

impl QueryBuilder {
    pub fn new(source: Rc<Frame>, cache: Option<Rc<QueryCache>>) -> Self {
        Self {
            source,
            cache,
            joins: Vec::new(),
            filters: Vec::new(),
            group_by_columns: Vec::new(),
            aggregations: Vec::new(),
            sort_keys: Vec::new(),
            select_columns: Vec::new(),
            limit: None,
        }
    }

    /// Join the running result with `right`
    pub fn join(mut self, right: &Rc<Frame>, on: &[&str], how: JoinKind) -> Self {
        self.joins.push(JoinStep {
            right: Rc::clone(right),
            on: on.iter().map(|s| s.to_string()).collect(),
            how,
            suffixes: None,
        });
        self
    }

    /// Join keeping both sides of a name clash, renamed with the suffixes
    pub fn join_suffixed(
        mut self,
        right: &Rc<Frame>,
        on: &[&str],
        how: JoinKind,
        left_suffix: &str,
        right_suffix: &str,
    ) -> Self {
        self.joins.push(JoinStep {
            right: Rc::clone(right),
            on: on.iter().map(|s| s.to_string()).collect(),
            how,
            suffixes: Some((left_suffix.to_string(), right_suffix.to_string())),
        });
        self
    }

    /// Add a predicate slot
    pub fn filter(mut self, condition: Condition) -> Self {
        self.filters.push(condition);
        self
    }

    /// Add multiple predicate slots
    pub fn filters(mut self, conditions: Vec<Condition>) -> Self {
        self.filters.extend(conditions);
        self
    }

    /// Group-by columns; with no columns but some aggregations the whole
    /// frame is one group
    pub fn group_by(mut self, columns: &[&str]) -> Self {
        self.group_by_columns
            .extend(columns.iter().map(|s| s.to_string()));
        self
    }

    pub fn aggregate(mut self, column: &str, op: AggregateOp) -> Self {
        self.aggregations.push(Aggregation::new(column, op));
        self
    }

    /// Add another sort key; earlier keys take precedence
    pub fn order_by(mut self, column: &str, descending: bool) -> Self {
        self.sort_keys.push(SortKey {
            column: column.to_string(),
            descending,
        });
        self
    }

    /// Select specific columns to return
    pub fn select(mut self, columns: &[&str]) -> Self {
        self.select_columns = columns.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Limit number of results
    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    /// Disable caching
    pub fn no_cache(mut self) -> Self {
        self.cache = None;
        self
    }

    /// Run the pipeline
    pub fn execute(self) -> Result<Rc<Frame>> {
        let mut current = Rc::clone(&self.source);

        for step in &self.joins {
            current = self.run_join(&current, step)?;
        }

        if !self.filters.is_empty() {
            current = Rc::new(filter(&current, &self.filters)?);
        }

        if !self.group_by_columns.is_empty() || !self.aggregations.is_empty() {
            current = self.run_group_by(&current)?;
        }

        if !self.sort_keys.is_empty() {
            current = Rc::new(order_by_keys(&current, &self.sort_keys, None)?);
        }

        if !self.select_columns.is_empty() {
            current = Rc::new(select_columns(&current, &self.select_columns)?);
        }

        if let Some(n) = self.limit {
            current = Rc::new(head(&current, n, 0));
        }

        Ok(current)
    }

    fn cached(
        &self,
        key: QueryKey,
        compute: impl FnOnce() -> Result<Frame>,
    ) -> Result<Rc<Frame>> {
        let Some(cache) = &self.cache else {
            return Ok(Rc::new(compute()?));
        };

        if let Some(hit) = cache.get(&key) {
            debug!("query cache hit: {key:?}");
            return Ok(hit);
        }

        let result = Rc::new(compute()?);
        cache.put(key, Rc::clone(&result));
        Ok(result)
    }

    fn run_join(&self, left: &Rc<Frame>, step: &JoinStep) -> Result<Rc<Frame>> {
        let key = QueryKey::Join {
            left: left.id(),
            right: step.right.id(),
            on: step.on.clone(),
            how: step.how,
            suffixes: step.suffixes.clone(),
        };

        self.cached(key, || match &step.suffixes {
            Some((ls, rs)) => join_with_suffixes(left, &step.right, &step.on, step.how, ls, rs),
            None => join(left, &step.right, &step.on, step.how),
        })
    }

    fn run_group_by(&self, input: &Rc<Frame>) -> Result<Rc<Frame>> {
        let key = QueryKey::GroupBy {
            frame: input.id(),
            group_columns: self.group_by_columns.clone(),
            aggregations: self.aggregations.clone(),
        };

        self.cached(key, || {
            aggregate(input, &self.group_by_columns, &self.aggregations)
        })
    }
}

impl Frame {
    pub fn query(self: &Rc<Self>) -> QueryBuilder {
        QueryBuilder::new(self.clone(), None)
    }

    pub fn query_with_cache(self: &Rc<Self>, cache: &Rc<QueryCache>) -> QueryBuilder {
        QueryBuilder::new(self.clone(), Some(cache.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::CompareOp;
    use crate::engine::column::Column;
    use crate::engine::value::Value;

    fn movies() -> Rc<Frame> {
        Rc::new(
            Frame::new(
                vec!["movieId".into(), "title".into(), "year".into()],
                vec![
                    Column::from(vec![1_i64, 2, 3]),
                    Column::from(vec!["Heat", "Jumanji", "Casino"]),
                    Column::from(vec![1995_i64, 1995, 1995]),
                ],
            )
            .unwrap(),
        )
    }

    fn ratings() -> Rc<Frame> {
        Rc::new(
            Frame::new(
                vec!["userId".into(), "movieId".into(), "rating".into()],
                vec![
                    Column::from(vec![1_i64, 2, 1, 3, 2]),
                    Column::from(vec![1_i64, 1, 2, 3, 3]),
                    Column::from(vec![4.0, 5.0, 2.0, 3.0, 4.0]),
                ],
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_join_group_sort_pipeline() {
        let out = movies()
            .query()
            .join(&ratings(), &["movieId"], JoinKind::Inner)
            .filter(Condition::new("rating", CompareOp::GtEq, 3.0))
            .group_by(&["movieId", "title"])
            .aggregate("rating", AggregateOp::Avg)
            .aggregate("rating", AggregateOp::Count)
            .order_by("rating_avg", true)
            .select(&["title", "rating_avg", "rating_count"])
            .execute()
            .unwrap();

        assert_eq!(out.column_names(), &["title", "rating_avg", "rating_count"]);
        assert_eq!(out.row_count(), 2);
        assert_eq!(out.get("title", 0).unwrap(), Value::from("Heat"));
        assert_eq!(out.get("rating_avg", 0).unwrap(), Value::Float(4.5));
        assert_eq!(out.get("rating_count", 1).unwrap(), Value::Int(2));
    }

    #[test]
    fn test_cache_reuses_results() {
        let cache = Rc::new(QueryCache::new());
        let movies = movies();
        let ratings = ratings();

        let run = || {
            movies
                .query_with_cache(&cache)
                .join(&ratings, &["movieId"], JoinKind::Inner)
                .group_by(&["movieId"])
                .aggregate("rating", AggregateOp::Sum)
                .execute()
                .unwrap()
        };

        let first = run();
        assert_eq!(cache.len(), 2);
        let second = run();
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_no_steps_returns_source() {
        let movies = movies();
        let out = movies.query().execute().unwrap();
        assert!(Rc::ptr_eq(&movies, &out));
    }

    #[test]
    fn test_limit() {
        let out = ratings().query().order_by("rating", false).limit(2).execute().unwrap();
        assert_eq!(out.row_count(), 2);
        assert_eq!(out.get("rating", 0).unwrap(), Value::Float(2.0));
    }
}
