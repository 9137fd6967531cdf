use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::algorithms::{ExchangeSorter, InsertionSorter, MergeSorter};
use crate::error::SortError;
use crate::instrument::{ProgressSink, TimerSink};
use crate::{CancellationToken, Instrumentation, Order, SortResult, Sorter};

/// Runtime selector over the three sorters
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    ExchangeSort,
    InsertionSort,
    MergeSort,
}

impl Algorithm {
    pub const ALL: [Algorithm; 3] = [
        Algorithm::ExchangeSort,
        Algorithm::InsertionSort,
        Algorithm::MergeSort,
    ];

    pub fn complexity(self) -> &'static str {
        match self {
            Algorithm::ExchangeSort | Algorithm::InsertionSort => "O(n²)",
            Algorithm::MergeSort => "O(n log n)",
        }
    }

    /// Quadratic sorters get slow well before merge sort does
    pub fn is_quadratic(self) -> bool {
        !matches!(self, Algorithm::MergeSort)
    }

    pub fn sort<T: PartialOrd + Clone>(
        self,
        data: &[T],
        order: Order,
        cancel: &CancellationToken,
        instrumentation: &mut Instrumentation<'_>,
    ) -> SortResult<T> {
        match self {
            Algorithm::ExchangeSort => ExchangeSorter.sort(data, order, cancel, instrumentation),
            Algorithm::InsertionSort => InsertionSorter.sort(data, order, cancel, instrumentation),
            Algorithm::MergeSort => MergeSorter.sort(data, order, cancel, instrumentation),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Algorithm::ExchangeSort => "Exchange Sort",
            Algorithm::InsertionSort => "Insertion Sort",
            Algorithm::MergeSort => "Merge Sort",
        };
        f.write_str(name)
    }
}

impl FromStr for Algorithm {
    type Err = SortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        let stem = normalized.strip_suffix("sort").unwrap_or(&normalized);

        match stem {
            "exchange" | "bubble" => Ok(Algorithm::ExchangeSort),
            "insertion" => Ok(Algorithm::InsertionSort),
            "merge" => Ok(Algorithm::MergeSort),
            _ => Err(SortError::UnknownAlgorithm(s.to_string())),
        }
    }
}

/// Sort `values` with the chosen algorithm, sampling into the optional sinks.
///
/// The caller's slice is never mutated; the result owns a sorted (or, when
/// cancelled, partially processed) copy.
pub fn sort_sequence<'a, T: PartialOrd + Clone>(
    values: &[T],
    order: Order,
    algorithm: Algorithm,
    cancel: &CancellationToken,
    on_progress: Option<&'a mut dyn ProgressSink>,
    on_tick: Option<&'a mut dyn TimerSink>,
) -> SortResult<T> {
    let mut instrumentation = Instrumentation::new(on_progress, on_tick);
    algorithm.sort(values, order, cancel, &mut instrumentation)
}
