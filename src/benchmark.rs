//! Benchmark driver for the instrumented sorters
//!
//! Generates seeded datasets, runs them through the engine and prints JSON to stdout.
//! Logs go to stderr; set `RUST_LOG` to adjust (default `sort_lab=info,benchmark=info`).
//!
//! Run (example):
//!   cargo run --release --bin benchmark -- sort --algorithm merge --order desc --size 100k
//!   cargo run --release --bin benchmark -- sweep --algorithm insertion --sizes 1k,10k,100k
//!   cargo run --release --bin benchmark -- compare --size 5k

use std::sync::mpsc::RecvTimeoutError;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand, ValueEnum};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::Serialize;
use sort_lab::harness::{SpeedRatio, DEFAULT_SIZES};
use sort_lab::{
    compare_algorithms, run_benchmark, Algorithm, BenchmarkReport, CancellationToken, KeyedRecordSorter, Order,
    Sample, Sampling, SessionState, SortError, SortSession,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_SEED: u64 = 12345;
const DEFAULT_SIZE: usize = 10_000;
const MAX_KEY: i64 = 100_000;
/// Quadratic sorters above this size can take minutes
const QUADRATIC_WARN_SIZE: usize = 10_000;
/// Largest dataset the driver will generate
const MAX_COUNT: usize = 100_000_000;
const POLL_INTERVAL: Duration = Duration::from_millis(100);

const FIRST_NAMES: [&str; 8] = ["Ana", "Ben", "Carl", "Dina", "Eli", "Faye", "Gio", "Hana"];
const LAST_NAMES: [&str; 8] = ["Cruz", "Lim", "Reyes", "Santos", "Tan", "Uy", "Villa", "Wong"];

#[derive(Parser)]
#[command(name = "benchmark")]
#[command(about = "Time exchange, insertion and merge sort on seeded data")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sort one dataset in a worker session
    Sort {
        #[arg(short, long, default_value = "merge")]
        algorithm: Algorithm,

        #[arg(short, long, default_value = "asc")]
        order: Order,

        /// Number of keys (e.g., 500, 10k, 1m)
        #[arg(long, value_parser = parse_count, default_value_t = DEFAULT_SIZE)]
        size: usize,

        #[arg(short, long, default_value_t = DEFAULT_SEED)]
        seed: u64,

        /// Log progress samples while sorting
        #[arg(long)]
        progress: bool,

        /// Request cancellation after this many milliseconds
        #[arg(long)]
        cancel_after_ms: Option<u64>,

        /// How many leading keys to include in the output
        #[arg(long, default_value_t = 10)]
        show: usize,
    },

    /// Time one algorithm across increasing sizes
    Sweep {
        #[arg(short, long, default_value = "merge")]
        algorithm: Algorithm,

        /// Sizes to time (e.g., 1k,10k,100k)
        #[arg(long, value_parser = parse_count, value_delimiter = ',')]
        sizes: Vec<usize>,

        /// Keys available to the sweep; larger sizes are skipped (defaults to the largest size)
        #[arg(long, value_parser = parse_count)]
        data: Option<usize>,

        #[arg(short, long, default_value_t = DEFAULT_SEED)]
        seed: u64,
    },

    /// Run every algorithm on the same dataset
    Compare {
        #[arg(long, value_parser = parse_count, default_value_t = DEFAULT_SIZE)]
        size: usize,

        #[arg(short, long, default_value = "asc")]
        order: Order,

        #[arg(short, long, default_value_t = DEFAULT_SEED)]
        seed: u64,
    },

    /// Sort generated student records by one column
    Records {
        #[arg(short, long, default_value = "merge")]
        algorithm: Algorithm,

        #[arg(short, long, default_value = "asc")]
        order: Order,

        #[arg(long, value_enum, default_value_t = Column::Id)]
        by: Column,

        #[arg(long, value_parser = parse_count, default_value_t = 1_000)]
        size: usize,

        #[arg(short, long, default_value_t = DEFAULT_SEED)]
        seed: u64,

        #[arg(long, default_value_t = 10)]
        show: usize,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum, Serialize)]
#[serde(rename_all = "snake_case")]
enum Column {
    Id,
    FirstName,
    LastName,
}

#[derive(Clone, Debug, Serialize)]
struct Student {
    id: u32,
    first_name: &'static str,
    last_name: &'static str,
}

#[derive(Serialize)]
struct SortSummary {
    algorithm: Algorithm,
    order: Order,
    size: usize,
    state: SessionState,
    complete: bool,
    sorted: bool,
    elapsed_seconds: f64,
    elapsed_ms: f64,
    first: Vec<i64>,
}

#[derive(Serialize)]
struct SweepSummary {
    report: BenchmarkReport,
    fastest: Option<(usize, f64)>,
    ratios: Vec<SpeedRatio>,
    total_seconds: f64,
}

#[derive(Serialize)]
struct CompareRow {
    algorithm: Algorithm,
    complexity: &'static str,
    seconds: f64,
    ms: f64,
    first: Vec<i64>,
}

#[derive(Serialize)]
struct CompareSummary {
    size: usize,
    order: Order,
    rows: Vec<CompareRow>,
    fastest: Option<Algorithm>,
    merge_vs_exchange: Option<f64>,
    cancelled: bool,
}

#[derive(Serialize)]
struct RecordsSummary {
    algorithm: Algorithm,
    order: Order,
    column: Column,
    size: usize,
    complete: bool,
    elapsed_seconds: f64,
    first: Vec<Student>,
}

fn parse_count(s: &str) -> Result<usize, SortError> {
    let s = s.trim().to_lowercase();
    let (num_str, multiplier) = if let Some(stripped) = s.strip_suffix('m') {
        (stripped, 1_000_000)
    } else if let Some(stripped) = s.strip_suffix('k') {
        (stripped, 1_000)
    } else {
        (s.as_str(), 1)
    };

    num_str
        .parse::<f64>()
        .ok()
        .map(|n| n * multiplier as f64)
        .filter(|n| n.is_finite() && *n >= 0.0 && *n <= MAX_COUNT as f64)
        .map(|n| n as usize)
        .ok_or_else(|| SortError::InvalidSize(s.clone()))
}

fn generate_random_data(seed: u64, size: usize) -> Vec<i64> {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    (0..size).map(|_| rng.gen_range(1..=MAX_KEY)).collect()
}

/// Shuffled ids with names drawn from small pools, so name columns have many duplicates
fn generate_students(seed: u64, size: usize) -> Result<Vec<Student>, SortError> {
    let count = u32::try_from(size).map_err(|_| SortError::InvalidSize(size.to_string()))?;
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let mut ids: Vec<u32> = (1..=count).collect();
    ids.shuffle(&mut rng);
    let students = ids
        .into_iter()
        .map(|id| Student {
            id,
            first_name: FIRST_NAMES[rng.gen_range(0..FIRST_NAMES.len())],
            last_name: LAST_NAMES[rng.gen_range(0..LAST_NAMES.len())],
        })
        .collect();
    Ok(students)
}

fn warn_if_slow(algorithm: Algorithm, size: usize) {
    if algorithm.is_quadratic() && size > QUADRATIC_WARN_SIZE {
        warn!(%algorithm, size, "{} on this many keys may take a long time", algorithm.complexity());
    }
}

fn run_sort(
    algorithm: Algorithm,
    order: Order,
    size: usize,
    seed: u64,
    progress: bool,
    cancel_after_ms: Option<u64>,
    show: usize,
) -> Result<(), SortError> {
    warn_if_slow(algorithm, size);
    let data = generate_random_data(seed, size);

    let session = SortSession::new();
    let sampling = Sampling {
        progress,
        timer: false,
    };
    let handle = session.start_sort(data, algorithm, order, sampling)?;
    let mut deadline = cancel_after_ms.map(|ms| Instant::now() + Duration::from_millis(ms));

    loop {
        let wait = deadline.map_or(POLL_INTERVAL, |d| {
            d.saturating_duration_since(Instant::now()).min(POLL_INTERVAL)
        });
        match handle.samples().recv_timeout(wait) {
            Ok(sample @ Sample::Progress { done, total }) => {
                let percent = sample.percent().unwrap_or_default();
                info!(done, total, "progress {:.0}%", percent);
            }
            Ok(Sample::Tick { .. }) | Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        if deadline.is_some_and(|d| Instant::now() >= d) {
            info!(%algorithm, "deadline reached, requesting cancellation");
            handle.cancel();
            deadline = None;
        }
    }

    let result = handle.join()?;
    let summary = SortSummary {
        algorithm,
        order,
        size,
        state: session.state(),
        complete: result.complete,
        sorted: order.is_sorted(&result.sequence),
        elapsed_seconds: result.elapsed_seconds,
        elapsed_ms: result.elapsed_ms(),
        first: result.sequence.iter().take(show).copied().collect(),
    };
    println!("{}", serde_json::to_string(&summary)?);
    Ok(())
}

fn run_sweep(algorithm: Algorithm, sizes: Vec<usize>, data: Option<usize>, seed: u64) -> Result<(), SortError> {
    let sizes = if sizes.is_empty() {
        DEFAULT_SIZES.to_vec()
    } else {
        sizes
    };
    let available = data.unwrap_or_else(|| sizes.iter().copied().max().unwrap_or_default());
    warn_if_slow(algorithm, available);

    let keys = generate_random_data(seed, available);
    let report = run_benchmark(algorithm, &sizes, &keys, &CancellationToken::new());

    let summary = SweepSummary {
        fastest: report.fastest(),
        ratios: report.speed_ratios(),
        total_seconds: report.total_seconds(),
        report,
    };
    println!("{}", serde_json::to_string(&summary)?);
    Ok(())
}

fn run_compare(size: usize, order: Order, seed: u64) -> Result<(), SortError> {
    warn_if_slow(Algorithm::ExchangeSort, size);
    let keys = generate_random_data(seed, size);
    let comparison = compare_algorithms(&Algorithm::ALL, &keys, order, &CancellationToken::new());

    let summary = CompareSummary {
        size,
        order,
        fastest: comparison.fastest().map(|e| e.algorithm),
        merge_vs_exchange: comparison.ratio(Algorithm::ExchangeSort, Algorithm::MergeSort),
        cancelled: comparison.cancelled,
        rows: comparison
            .entries
            .iter()
            .map(|e| CompareRow {
                algorithm: e.algorithm,
                complexity: e.algorithm.complexity(),
                seconds: e.elapsed_seconds,
                ms: e.elapsed_seconds * 1000.0,
                first: e.sequence.iter().take(10).copied().collect(),
            })
            .collect(),
    };
    println!("{}", serde_json::to_string(&summary)?);
    Ok(())
}

fn run_records(
    algorithm: Algorithm,
    order: Order,
    column: Column,
    size: usize,
    seed: u64,
    show: usize,
) -> Result<(), SortError> {
    warn_if_slow(algorithm, size);
    let students = generate_students(seed, size)?;
    let sorter = KeyedRecordSorter::new(algorithm, order);
    let cancel = CancellationToken::new();

    let result = match column {
        Column::Id => sorter.sort_by_field(&students, |s| s.id, &cancel),
        Column::FirstName => sorter.sort_by_field(&students, |s| s.first_name, &cancel),
        Column::LastName => sorter.sort_by_field(&students, |s| s.last_name, &cancel),
    };

    let summary = RecordsSummary {
        algorithm,
        order,
        column,
        size,
        complete: result.complete,
        elapsed_seconds: result.elapsed_seconds,
        first: result.sequence.into_iter().take(show).collect(),
    };
    println!("{}", serde_json::to_string(&summary)?);
    Ok(())
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("sort_lab=info,benchmark=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<(), SortError> {
    init_logging();
    let args = Args::parse();

    match args.command {
        Command::Sort {
            algorithm,
            order,
            size,
            seed,
            progress,
            cancel_after_ms,
            show,
        } => run_sort(algorithm, order, size, seed, progress, cancel_after_ms, show),
        Command::Sweep {
            algorithm,
            sizes,
            data,
            seed,
        } => run_sweep(algorithm, sizes, data, seed),
        Command::Compare { size, order, seed } => run_compare(size, order, seed),
        Command::Records {
            algorithm,
            order,
            by,
            size,
            seed,
            show,
        } => run_records(algorithm, order, by, size, seed, show),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_count_suffixes() {
        assert_eq!(parse_count("500").unwrap(), 500);
        assert_eq!(parse_count("10k").unwrap(), 10_000);
        assert_eq!(parse_count("1.5M").unwrap(), 1_500_000);
        assert!(matches!(parse_count("lots"), Err(SortError::InvalidSize(_))));
        assert!(parse_count("-3").is_err());
    }

    #[test]
    fn test_parse_count_rejects_huge_sizes() {
        assert_eq!(parse_count("100m").unwrap(), MAX_COUNT);
        assert!(matches!(parse_count("1e30"), Err(SortError::InvalidSize(_))));
        assert!(matches!(parse_count("101m"), Err(SortError::InvalidSize(_))));
        assert!(parse_count("inf").is_err());
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn test_students_reject_sizes_past_u32() {
        let too_many = u32::MAX as usize + 1;
        assert!(matches!(generate_students(1, too_many), Err(SortError::InvalidSize(_))));
    }

    #[test]
    fn test_generated_data_is_seeded_and_in_range() {
        let a = generate_random_data(7, 200);
        let b = generate_random_data(7, 200);
        assert_eq!(a, b);
        assert!(a.iter().all(|&k| (1..=MAX_KEY).contains(&k)));
    }

    #[test]
    fn test_students_have_unique_ids() {
        let students = generate_students(1, 50).unwrap();
        let mut ids: Vec<u32> = students.iter().map(|s| s.id).collect();
        ids.sort_unstable();
        assert_eq!(ids, (1..=50).collect::<Vec<_>>());
    }
}
