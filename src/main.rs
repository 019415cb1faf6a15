use std::path::PathBuf;
use std::process;
use std::rc::Rc;

use clap::{Parser, Subcommand};
use log::info;
use reelframe::{
    AggregateOp, CompareOp, Condition, Connective, Dataset, EngineError, Frame, JoinKind,
    LoadOptions, QueryBuilder, QueryCache, Result, SortKey, Value, distinct,
};

#[cfg(not(target_env = "msvc"))]
use jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

#[derive(Parser, Debug)]
#[command(name = "reelframe")]
#[command(author, version, about = "Query MovieLens CSV files from the command line")]
#[command(after_help = "EXAMPLES:\n  \
    reelframe summary\n  \
    reelframe top --min-count 50 --limit 10\n  \
    reelframe tag funny\n  \
    reelframe query --join ratings:inner --group-by title --agg rating:avg --order-by rating_avg\n  \
    reelframe query --where year '>=' 1995 --where year '=' 1980 --sep and --sep or")]
struct Cli {
    /// Directory holding movies.csv, ratings.csv and tags.csv
    #[arg(long, env = "REELFRAME_DATA_DIR", default_value = "data", value_name = "DIR")]
    data_dir: PathBuf,

    /// Field separator of the CSV files
    #[arg(long, default_value_t = ',', value_name = "CHAR")]
    separator: char,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Table sizes, user count, year span and movies per year
    Summary,

    /// Best rated movies with at least `min-count` ratings
    Top {
        #[arg(long, default_value_t = 50, value_name = "N")]
        min_count: i64,

        #[arg(long, default_value_t = 10, value_name = "N")]
        limit: usize,
    },

    /// Movies carrying a tag, best rated first
    Tag {
        tag: String,

        #[arg(long, default_value_t = 10, value_name = "N")]
        limit: usize,
    },

    /// Ad-hoc join, filter, group, sort and project pipeline
    Query {
        /// Table the pipeline starts from
        #[arg(long, default_value = "movies", value_name = "TABLE")]
        from: String,

        /// Join another table: TABLE:KIND[:SUFFIX]
        #[arg(long, value_name = "SPEC", action = clap::ArgAction::Append)]
        join: Vec<String>,

        /// Join key columns
        #[arg(long, value_delimiter = ',', default_value = "movieId", value_name = "COLS")]
        on: Vec<String>,

        /// Predicate slot: COL OP VALUE
        #[arg(long = "where", num_args = 3, value_names = ["COL", "OP", "VALUE"], action = clap::ArgAction::Append)]
        conditions: Vec<String>,

        /// Connective of the predicate slot at the same position (and|or)
        #[arg(long = "sep", value_name = "and|or", action = clap::ArgAction::Append)]
        separators: Vec<String>,

        #[arg(long, value_delimiter = ',', value_name = "COLS")]
        group_by: Vec<String>,

        /// Aggregation: COL:FN with FN one of count, sum, avg, min, max
        #[arg(long, value_name = "COL:FN", action = clap::ArgAction::Append)]
        agg: Vec<String>,

        /// Sort key: COL[:asc|desc], descending by default
        #[arg(long, value_name = "KEY", action = clap::ArgAction::Append)]
        order_by: Vec<String>,

        #[arg(long, value_delimiter = ',', value_name = "COLS")]
        select: Vec<String>,

        #[arg(long, value_name = "N")]
        limit: Option<usize>,
    },
}

struct Tables {
    movies: Rc<Frame>,
    ratings: Rc<Frame>,
    tags: Rc<Frame>,
}

impl Tables {
    fn get(&self, name: &str) -> Result<&Rc<Frame>> {
        match name {
            "movies" => Ok(&self.movies),
            "ratings" => Ok(&self.ratings),
            "tags" => Ok(&self.tags),
            other => Err(EngineError::UnknownColumn(format!("table '{other}'"))),
        }
    }
}

impl From<Dataset> for Tables {
    fn from(data: Dataset) -> Self {
        Tables {
            movies: Rc::new(data.movies),
            ratings: Rc::new(data.ratings),
            tags: Rc::new(data.tags),
        }
    }
}

fn main() {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn setup_logging(verbosity: u8) {
    let log_level = match verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new().filter_level(log_level).init();
}

fn run(cli: Cli) -> Result<()> {
    let options = LoadOptions {
        separator: cli.separator,
    };
    info!("loading tables from {}", cli.data_dir.display());
    let tables = Tables::from(Dataset::load(&cli.data_dir, &options)?);
    let cache = Rc::new(QueryCache::new());

    match cli.command {
        Command::Summary => summary(&tables),
        Command::Top { min_count, limit } => {
            let stats = rating_stats(&tables, &cache)?;
            let top = stats
                .query()
                .join(&tables.movies, &["movieId"], JoinKind::Inner)
                .filter(Condition::new("rating_count", CompareOp::GtEq, min_count))
                .order_by("rating_avg", true)
                .order_by("rating_count", true)
                .select(&["movieId", "title", "year", "rating_avg", "rating_count"])
                .limit(limit)
                .execute()?;
            print!("{}", render(&top));
            Ok(())
        }
        Command::Tag { tag, limit } => {
            let stats = rating_stats(&tables, &cache)?;
            let tagged = tables
                .tags
                .query()
                .filter(Condition::new("tag", CompareOp::Eq, tag.as_str()))
                .group_by(&["movieId"])
                .aggregate("tag", AggregateOp::Count)
                .execute()?;
            let ranked = tagged
                .query_with_cache(&cache)
                .join(&tables.movies, &["movieId"], JoinKind::Inner)
                .join(&stats, &["movieId"], JoinKind::Left)
                .order_by("rating_avg", true)
                .select(&["movieId", "title", "tag_count", "rating_avg", "rating_count"])
                .limit(limit)
                .execute()?;
            print!("{}", render(&ranked));
            Ok(())
        }
        Command::Query {
            from,
            join,
            on,
            conditions,
            separators,
            group_by,
            agg,
            order_by,
            select,
            limit,
        } => {
            let on: Vec<&str> = on.iter().map(String::as_str).collect();
            let mut joined = tables.get(&from)?.query_with_cache(&cache);
            for spec in &join {
                joined = add_join(joined, &tables, spec, &on)?;
            }
            let joined = joined.execute()?;

            let mut query = joined
                .query_with_cache(&cache)
                .filters(parse_conditions(&joined, &conditions, &separators)?);
            if !group_by.is_empty() {
                let columns: Vec<&str> = group_by.iter().map(String::as_str).collect();
                query = query.group_by(&columns);
            }
            for spec in &agg {
                let (column, op) = parse_aggregation(spec)?;
                query = query.aggregate(column, op);
            }
            for spec in &order_by {
                let key = parse_sort_key(spec)?;
                query = query.order_by(&key.column, key.descending);
            }
            if !select.is_empty() {
                let columns: Vec<&str> = select.iter().map(String::as_str).collect();
                query = query.select(&columns);
            }
            if let Some(n) = limit {
                query = query.limit(n);
            }

            let out = query.execute()?;
            print!("{}", render(&out));
            Ok(())
        }
    }
}

fn summary(tables: &Tables) -> Result<()> {
    println!("movies:  {} rows", tables.movies.row_count());
    println!("ratings: {} rows", tables.ratings.row_count());
    println!("tags:    {} rows", tables.tags.row_count());
    println!("users:   {}", distinct(&tables.ratings, "userId")?.len());

    // year 0 marks titles without a year
    let years: Vec<Value> = distinct(&tables.movies, "year")?
        .into_iter()
        .filter(|y| *y != Value::Int(0))
        .collect();
    if let (Some(first), Some(last)) = (years.first(), years.last()) {
        println!("years:   {first} - {last}");
    }

    let per_year = tables
        .movies
        .query()
        .filter(Condition::new("year", CompareOp::NotEq, 0_i64))
        .group_by(&["year"])
        .aggregate("movieId", AggregateOp::Count)
        .order_by("year", false)
        .execute()?;
    println!();
    print!("{}", render(&per_year));
    Ok(())
}

/// Average and count of ratings per movie
fn rating_stats(tables: &Tables, cache: &Rc<QueryCache>) -> Result<Rc<Frame>> {
    tables
        .ratings
        .query_with_cache(cache)
        .group_by(&["movieId"])
        .aggregate("rating", AggregateOp::Avg)
        .aggregate("rating", AggregateOp::Count)
        .execute()
}

fn add_join(query: QueryBuilder, tables: &Tables, spec: &str, on: &[&str]) -> Result<QueryBuilder> {
    let mut parts = spec.splitn(3, ':');
    let table = tables.get(parts.next().unwrap_or_default())?;
    let how: JoinKind = match parts.next() {
        Some(kind) => kind.parse()?,
        None => JoinKind::Inner,
    };
    Ok(match parts.next() {
        Some(suffix) => query.join_suffixed(table, on, how, "", suffix),
        None => query.join(table, on, how),
    })
}

fn parse_conditions(frame: &Frame, raw: &[String], separators: &[String]) -> Result<Vec<Condition>> {
    raw.chunks(3)
        .enumerate()
        .map(|(i, slot)| {
            let [column, op, value] = slot else {
                return Err(EngineError::InvalidCondition(format!(
                    "incomplete predicate {slot:?}"
                )));
            };
            let value = Value::parse_for(frame.column_type(column)?, value)?;
            let mut condition = Condition::new(column, op.parse()?, value);
            if let Some(sep) = separators.get(i) {
                condition.connective = sep.parse::<Connective>()?;
            }
            Ok(condition)
        })
        .collect()
}

fn parse_aggregation(spec: &str) -> Result<(&str, AggregateOp)> {
    match spec.rsplit_once(':') {
        Some((column, op)) => Ok((column, op.parse()?)),
        None => Err(EngineError::InvalidAggregation(format!(
            "expected COL:FN, got '{spec}'"
        ))),
    }
}

fn parse_sort_key(spec: &str) -> Result<SortKey> {
    match spec.rsplit_once(':') {
        Some((column, "asc")) => Ok(SortKey::asc(column)),
        Some((column, "desc")) => Ok(SortKey::desc(column)),
        Some((_, other)) => Err(EngineError::InvalidCondition(format!(
            "unknown sort direction '{other}'"
        ))),
        None => Ok(SortKey::desc(spec)),
    }
}

/// Transposes `frame` into aligned text rows
fn render(frame: &Frame) -> String {
    let header: Vec<String> = frame.column_names().to_vec();
    let rows: Vec<Vec<String>> = frame
        .rows()
        .map(|row| row.iter().map(Value::to_string).collect())
        .collect();

    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    for line in std::iter::once(&header).chain(&rows) {
        let cells: Vec<String> = line
            .iter()
            .zip(&widths)
            .map(|(cell, &w)| format!("{cell:<w$}"))
            .collect();
        out.push_str(cells.join("  ").trim_end());
        out.push('\n');
    }
    match rows.len() {
        0 => out.push_str("(no rows)\n"),
        n => out.push_str(&format!("({n} rows)\n")),
    }
    out
}
