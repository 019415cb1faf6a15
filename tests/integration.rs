use std::io::Write;
use std::path::Path;
use std::rc::Rc;

use reelframe::{
    AggregateOp, ColumnType, CompareOp, Condition, Dataset, ErrorKind, JoinKind, LoadOptions,
    QueryCache, Value, distinct, filter, filter_text, group_by, head, join, join_with_suffixes,
    load_movies, load_ratings, order_by, select_columns, tail,
};
use tempfile::{NamedTempFile, TempDir};

const MOVIES: &str = "movieId,title,genres\n\
    1,\"Toy Story (1995)\",Adventure|Animation|Children\n\
    2,Jumanji (1995),Adventure|Children|Fantasy\n\
    3,\"American President, The (1996)\",Comedy|Drama|Romance\n\
    \n\
    4,Untitled Project,(no genres listed)\n";

const RATINGS: &str = "userId,movieId,rating,timestamp\n\
    1,1,4.0,964982703\n\
    1,2,3.5,964981247\n\
    2,1,5.0,964982224\n\
    3,2,,964983815\n\
    3,4,2.0,964982931\n";

const TAGS: &str = "userId,movieId,tag,timestamp\n\
    2,1,pixar,1445714994\n\
    3,1,Pixar,1445714996\n\
    3,2,board game,1445715000\n";

fn write_csv(contents: &str) -> NamedTempFile {
    let mut tmp = NamedTempFile::new().unwrap();
    write!(tmp, "{}", contents).unwrap();
    tmp
}

fn dataset_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    for (name, contents) in [("movies.csv", MOVIES), ("ratings.csv", RATINGS), ("tags.csv", TAGS)] {
        std::fs::write(dir.path().join(name), contents).unwrap();
    }
    dir
}

fn load() -> Dataset {
    let dir = dataset_dir();
    Dataset::load(dir.path(), &LoadOptions::default()).unwrap()
}

#[test]
fn test_scenario_a_year_and_genres() {
    let tmp = write_csv(MOVIES);
    let movies = load_movies(tmp.path(), &LoadOptions::default()).unwrap();

    assert_eq!(movies.column_names(), &["movieId", "title", "genres", "year"]);
    assert_eq!(movies.row_count(), 4);
    assert_eq!(
        movies.row(0).unwrap(),
        vec![
            Value::Int(1),
            Value::from("Toy Story"),
            Value::List(vec!["Adventure".into(), "Animation".into(), "Children".into()]),
            Value::Int(1995),
        ]
    );
    assert_eq!(movies.get("title", 2).unwrap(), Value::from("American President, The"));
    assert_eq!(movies.column_type("year").unwrap(), ColumnType::Int64);

    // no year suffix and no genres
    assert_eq!(movies.get("year", 3).unwrap(), Value::Int(0));
    assert_eq!(movies.get("genres", 3).unwrap(), Value::List(vec![]));
}

#[test]
fn test_scenario_b_count_per_year() {
    let tmp = write_csv(
        "movieId,title,genres\n\
         1,Heat (1995),Action\n\
         2,Casino (1995),Crime\n\
         3,Fargo (1996),Crime\n",
    );
    let movies = load_movies(tmp.path(), &LoadOptions::default()).unwrap();

    let out = group_by(&movies, &["year"], &["movieId"], AggregateOp::Count).unwrap();
    assert_eq!(out.column_names(), &["year", "movieId_count"]);
    let rows: Vec<Vec<Value>> = out.rows().collect();
    assert_eq!(
        rows,
        vec![
            vec![Value::Int(1995), Value::Int(2)],
            vec![Value::Int(1996), Value::Int(1)],
        ]
    );
}

#[test]
fn test_scenario_c_left_join_null_fills() {
    let data = load();
    let out = join(&data.movies, &data.ratings, &["movieId"], JoinKind::Left).unwrap();

    let movie_3 = filter(&out, &[Condition::new("movieId", CompareOp::Eq, 3_i64)]).unwrap();
    assert_eq!(movie_3.row_count(), 1);
    assert_eq!(movie_3.get("userId", 0).unwrap(), Value::Null);
    assert_eq!(movie_3.get("rating", 0).unwrap(), Value::Null);
    assert_eq!(movie_3.get("title", 0).unwrap(), Value::from("American President, The"));
}

#[test]
fn test_load_drops_timestamp_and_keeps_null_ratings() {
    let tmp = write_csv(RATINGS);
    let ratings = load_ratings(tmp.path(), &LoadOptions::default()).unwrap();
    assert_eq!(ratings.column_names(), &["userId", "movieId", "rating"]);
    assert_eq!(ratings.get("rating", 3).unwrap(), Value::Null);
}

#[test]
fn test_row_width_is_schema_error() {
    let tmp = write_csv("userId,movieId,rating,timestamp\n1,1,4.0\n");
    let err = load_ratings(tmp.path(), &LoadOptions::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Schema);
    assert!(err.is_fatal());
}

#[test]
fn test_non_numeric_rating_is_type_mismatch() {
    let tmp = write_csv("userId,movieId,rating,timestamp\n1,1,great,0\n");
    let err = load_ratings(tmp.path(), &LoadOptions::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);
}

#[test]
fn test_non_numeric_timestamp_is_type_mismatch() {
    let tmp = write_csv("userId,movieId,rating,timestamp\n1,1,4.0,not-a-time\n");
    let err = load_ratings(tmp.path(), &LoadOptions::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);
}

#[test]
fn test_missing_file() {
    let err = load_movies(Path::new("/definitely/not/here.csv"), &LoadOptions::default())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::FileNotFound);
}

#[test]
fn test_inner_join_cardinality() {
    let data = load();
    let out = join(&data.movies, &data.ratings, &["movieId"], JoinKind::Inner).unwrap();
    // movie 1 and 2 have two ratings each, movie 4 has one, movie 3 none
    assert_eq!(out.row_count(), 5);
}

#[test]
fn test_left_join_covers_every_left_row() {
    let data = load();
    let out = join(&data.movies, &data.ratings, &["movieId"], JoinKind::Left).unwrap();
    let ids = distinct(&out, "movieId").unwrap();
    assert_eq!(ids, distinct(&data.movies, "movieId").unwrap());
}

#[test]
fn test_full_join_with_suffixes() {
    let data = load();
    let out = join_with_suffixes(
        &data.ratings,
        &data.tags,
        &["movieId"],
        JoinKind::Full,
        "",
        "_tag",
    )
    .unwrap();
    assert_eq!(out.column_names(), &["userId", "movieId", "rating", "userId_tag", "tag"]);
    // movie 4 is rated but untagged
    let untagged = filter(&out, &[Condition::new("tag", CompareOp::Eq, Value::Null)]).unwrap();
    assert_eq!(untagged.get("movieId", 0).unwrap(), Value::Int(4));
}

#[test]
fn test_filter_text_or_chain() {
    let data = load();
    let out = filter_text(
        &data.movies,
        &["title", "year"],
        &["=", "="],
        &["JUMANJI", "1996"],
        &["and", "or"],
    )
    .unwrap();
    let ids: Vec<Value> = out.column("movieId").unwrap().iter().collect();
    assert_eq!(ids, vec![Value::Int(2), Value::Int(3)]);
}

#[test]
fn test_filter_unknown_operator() {
    let data = load();
    let err = filter_text(&data.movies, &["year"], &["=>"], &["1995"], &[]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidCondition);
}

#[test]
fn test_average_rating_top_movies() {
    let data = load();
    let stats = group_by(&data.ratings, &["movieId"], &["rating"], AggregateOp::Avg).unwrap();
    let top = order_by(&stats, "rating_avg", true, Some(2)).unwrap();
    assert_eq!(
        top.rows().collect::<Vec<_>>(),
        vec![
            vec![Value::Int(1), Value::Float(4.5)],
            vec![Value::Int(2), Value::Float(3.5)],
        ]
    );
}

#[test]
fn test_windows_and_projection() {
    let data = load();
    let titles = select_columns(&data.movies, &["title", "movieId"]).unwrap();
    assert_eq!(titles.column_names(), &["title", "movieId"]);
    assert_eq!(head(&titles, 2, 1).get("movieId", 0).unwrap(), Value::Int(2));
    assert_eq!(tail(&titles, 10).row_count(), 4);

    let err = select_columns(&data.movies, &["rating"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Schema);
}

#[test]
fn test_operators_leave_input_untouched() {
    let data = load();
    let before = data.movies.clone();
    let _ = filter(&data.movies, &[Condition::new("year", CompareOp::Gt, 1995_i64)]).unwrap();
    let _ = order_by(&data.movies, "title", false, None).unwrap();
    let _ = join(&data.movies, &data.tags, &["movieId"], JoinKind::Full).unwrap();
    assert_eq!(data.movies, before);
}

#[test]
fn test_cached_tag_query() {
    let data = load();
    let tags = Rc::new(data.tags);
    let movies = Rc::new(data.movies);
    let cache = Rc::new(QueryCache::new());

    let run = || {
        tags.query_with_cache(&cache)
            .join(&movies, &["movieId"], JoinKind::Inner)
            .filter(Condition::new("tag", CompareOp::Eq, "PIXAR"))
            .group_by(&["title"])
            .aggregate("tag", AggregateOp::Count)
            .execute()
            .unwrap()
    };

    let first = run();
    let second = run();
    assert_eq!(first.rows().collect::<Vec<_>>(), vec![vec![Value::from("Toy Story"), Value::Int(2)]]);
    assert_eq!(first, second);
}
