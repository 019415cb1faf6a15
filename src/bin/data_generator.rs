use clap::Parser;
use rand::Rng;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

const GENRES: [&str; 8] = [
    "Action", "Adventure", "Animation", "Children", "Comedy", "Crime", "Drama", "Sci-Fi",
];
const WORDS: [&str; 10] = [
    "Heat", "Story", "Night", "City", "Return", "Dark", "River", "Empire", "Ghost", "Summer",
];
const TAGS: [&str; 6] = ["funny", "classic", "atmospheric", "twist ending", "dark", "quirky"];

/// Writes synthetic movies.csv, ratings.csv and tags.csv
#[derive(Parser, Debug)]
#[command(name = "data_generator")]
struct Args {
    #[arg(long, default_value = "data", value_name = "DIR")]
    out_dir: PathBuf,

    #[arg(long, default_value_t = 10_000)]
    movies: usize,

    #[arg(long, default_value_t = 1_000_000)]
    ratings: usize,

    #[arg(long, default_value_t = 50_000)]
    tags: usize,

    #[arg(long, default_value_t = 5_000)]
    users: usize,
}

fn main() -> io::Result<()> {
    let args = Args::parse();
    fs::create_dir_all(&args.out_dir)?;

    let mut rng = rand::rng();
    write_movies(&args.out_dir.join("movies.csv"), args.movies, &mut rng)?;
    write_ratings(&args.out_dir.join("ratings.csv"), &args, &mut rng)?;
    write_tags(&args.out_dir.join("tags.csv"), &args, &mut rng)?;

    println!("Sample CSVs generated in {}", args.out_dir.display());
    Ok(())
}

fn write_movies(path: &Path, count: usize, rng: &mut impl Rng) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    writeln!(writer, "movieId,title,genres")?;

    for id in 1..=count {
        let title = format!(
            "{} {}",
            WORDS[rng.random_range(0..WORDS.len())],
            WORDS[rng.random_range(0..WORDS.len())]
        );
        let genres: Vec<&str> = (0..rng.random_range(0..3))
            .map(|_| GENRES[rng.random_range(0..GENRES.len())])
            .collect();
        let genres = if genres.is_empty() {
            "(no genres listed)".to_string()
        } else {
            genres.join("|")
        };

        // some titles carry a comma and need quoting, a few have no year
        match rng.random_range(0..20) {
            0 => writeln!(writer, "{id},{title},{genres}")?,
            1 => writeln!(writer, "{id},\"{title}, The ({})\",{genres}", year(rng))?,
            _ => writeln!(writer, "{id},{title} ({}),{genres}", year(rng))?,
        }
    }
    writer.flush()
}

fn year(rng: &mut impl Rng) -> u32 {
    rng.random_range(1920..2024)
}

fn write_ratings(path: &Path, args: &Args, rng: &mut impl Rng) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    writeln!(writer, "userId,movieId,rating,timestamp")?;

    for _ in 0..args.ratings {
        let user = rng.random_range(1..=args.users);
        let movie = rng.random_range(1..=args.movies);
        let rating = f64::from(rng.random_range(1..=10_u8)) / 2.0;
        let timestamp = rng.random_range(800_000_000..1_700_000_000_u64);
        writeln!(writer, "{user},{movie},{rating:.1},{timestamp}")?;
    }
    writer.flush()
}

fn write_tags(path: &Path, args: &Args, rng: &mut impl Rng) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    writeln!(writer, "userId,movieId,tag,timestamp")?;

    for _ in 0..args.tags {
        let user = rng.random_range(1..=args.users);
        let movie = rng.random_range(1..=args.movies);
        let tag = TAGS[rng.random_range(0..TAGS.len())];
        let timestamp = rng.random_range(800_000_000..1_700_000_000_u64);
        writeln!(writer, "{user},{movie},{tag},{timestamp}")?;
    }
    writer.flush()
}
