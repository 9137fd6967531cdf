//! Benchmark harness: time one algorithm across growing sizes, or all algorithms on one
//! dataset.
//!
//! Runs are made with instrumentation disabled so the timings measure the sort alone.
//! The shared cancellation token is checked between runs, and a run that comes back
//! incomplete is dropped from the report.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info};

use crate::instrument::ProgressSink;
use crate::{Algorithm, CancellationToken, Instrumentation, Order};

/// Sizes swept when the caller does not pick any
pub const DEFAULT_SIZES: [usize; 3] = [1_000, 10_000, 100_000];

/// Timing ratio between two measured sizes
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SpeedRatio {
    pub from: usize,
    pub to: usize,
    /// `seconds(to) / seconds(from)`
    pub ratio: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BenchmarkReport {
    pub algorithm: Algorithm,
    /// Size to elapsed seconds, completed runs only
    pub timings: BTreeMap<usize, f64>,
    /// Sizes larger than the available data
    pub skipped: Vec<usize>,
    pub cancelled: bool,
}

impl BenchmarkReport {
    fn new(algorithm: Algorithm) -> Self {
        Self {
            algorithm,
            timings: BTreeMap::new(),
            skipped: Vec::new(),
            cancelled: false,
        }
    }

    /// Size with the smallest elapsed time
    pub fn fastest(&self) -> Option<(usize, f64)> {
        self.timings
            .iter()
            .map(|(&size, &seconds)| (size, seconds))
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }

    /// Growth between each consecutive pair of measured sizes
    pub fn speed_ratios(&self) -> Vec<SpeedRatio> {
        let entries: Vec<(usize, f64)> = self.timings.iter().map(|(&s, &t)| (s, t)).collect();
        entries
            .windows(2)
            .filter(|w| w[0].1 > 0.0)
            .map(|w| SpeedRatio {
                from: w[0].0,
                to: w[1].0,
                ratio: w[1].1 / w[0].1,
            })
            .collect()
    }

    pub fn total_seconds(&self) -> f64 {
        self.timings.values().sum()
    }
}

/// Time `algorithm` on the first `size` keys for each of `sizes`, ascending.
///
/// Sizes beyond `source_keys.len()` are skipped and left out of the timings.
pub fn run_benchmark<T: PartialOrd + Clone>(
    algorithm: Algorithm,
    sizes: &[usize],
    source_keys: &[T],
    cancel: &CancellationToken,
) -> BenchmarkReport {
    run_benchmark_with(algorithm, sizes, source_keys, cancel, None)
}

/// Like [`run_benchmark`], reporting `(sizes_done, sizes_total)` between sizes
pub fn run_benchmark_with<T: PartialOrd + Clone>(
    algorithm: Algorithm,
    sizes: &[usize],
    source_keys: &[T],
    cancel: &CancellationToken,
    mut progress: Option<&mut dyn ProgressSink>,
) -> BenchmarkReport {
    let mut report = BenchmarkReport::new(algorithm);
    let total = sizes.len();

    for (idx, &size) in sizes.iter().enumerate() {
        if cancel.is_cancelled() {
            report.cancelled = true;
            break;
        }

        if size > source_keys.len() {
            debug!(size, available = source_keys.len(), "skipping size beyond available data");
            report.skipped.push(size);
        } else {
            let result = algorithm.sort(
                &source_keys[..size],
                Order::Ascending,
                cancel,
                &mut Instrumentation::none(),
            );
            if !result.complete {
                report.cancelled = true;
                break;
            }

            info!(
                algorithm = %algorithm,
                size,
                seconds = result.elapsed_seconds,
                "benchmark size finished"
            );
            report.timings.insert(size, result.elapsed_seconds);
        }

        if let Some(sink) = progress.as_deref_mut() {
            sink.on_progress(idx + 1, total);
        }
    }

    if report.cancelled {
        info!(algorithm = %algorithm, completed = report.timings.len(), "benchmark cancelled");
    }
    report
}

/// One algorithm's run in a comparison
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ComparisonEntry<T> {
    pub algorithm: Algorithm,
    pub elapsed_seconds: f64,
    pub sequence: Vec<T>,
}

/// All algorithms on the same dataset
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Comparison<T> {
    pub order: Order,
    pub len: usize,
    pub entries: Vec<ComparisonEntry<T>>,
    pub cancelled: bool,
}

impl<T> Comparison<T> {
    pub fn timing(&self, algorithm: Algorithm) -> Option<f64> {
        self.entries
            .iter()
            .find(|e| e.algorithm == algorithm)
            .map(|e| e.elapsed_seconds)
    }

    pub fn fastest(&self) -> Option<&ComparisonEntry<T>> {
        self.entries
            .iter()
            .min_by(|a, b| a.elapsed_seconds.total_cmp(&b.elapsed_seconds))
    }

    /// How many times faster `faster` ran than `slower`
    pub fn ratio(&self, slower: Algorithm, faster: Algorithm) -> Option<f64> {
        let slow = self.timing(slower)?;
        let fast = self.timing(faster)?;
        (slow > 0.0 && fast > 0.0).then(|| slow / fast)
    }
}

/// Sort the full key set once with each algorithm, in order
pub fn compare_algorithms<T: PartialOrd + Clone>(
    algorithms: &[Algorithm],
    keys: &[T],
    order: Order,
    cancel: &CancellationToken,
) -> Comparison<T> {
    let mut comparison = Comparison {
        order,
        len: keys.len(),
        entries: Vec::with_capacity(algorithms.len()),
        cancelled: false,
    };

    for &algorithm in algorithms {
        if cancel.is_cancelled() {
            comparison.cancelled = true;
            break;
        }

        let result = algorithm.sort(keys, order, cancel, &mut Instrumentation::none());
        if !result.complete {
            comparison.cancelled = true;
            break;
        }

        info!(algorithm = %algorithm, len = keys.len(), seconds = result.elapsed_seconds, "comparison run finished");
        comparison.entries.push(ComparisonEntry {
            algorithm,
            elapsed_seconds: result.elapsed_seconds,
            sequence: result.sequence,
        });
    }

    comparison
}
