//! Instrumented Sorting Engine
//!
//! Exchange, insertion and merge sort with ascending/descending order, cooperative
//! cancellation, and progress/timer sampling. Structured records are sorted by key
//! with stable reattachment, and a small harness times the sorters across sizes.

pub mod algorithms;
pub mod cancel;
pub mod engine;
pub mod error;
pub mod harness;
pub mod instrument;
pub mod order;
pub mod records;
pub mod session;

use serde::Serialize;

pub use cancel::CancellationToken;
pub use engine::{sort_sequence, Algorithm};
pub use error::SortError;
pub use harness::{compare_algorithms, run_benchmark, BenchmarkReport, Comparison};
pub use instrument::{Instrumentation, ProgressSink, Sample, Throttled, TimerSink};
pub use order::Order;
pub use records::{sort_records, KeyedRecord, KeyedRecordSorter, StableBucket};
pub use session::{RunHandle, Sampling, SessionState, SortSession};

/// Outcome of one sort.
///
/// `complete == false` means the cancellation token fired first; `sequence` then holds
/// whatever the algorithm had reached, which is always a permutation of the input.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SortResult<T> {
    pub sequence: Vec<T>,
    pub complete: bool,
    pub elapsed_seconds: f64,
}

impl<T> SortResult<T> {
    /// Empty and single-element input: nothing to do, nothing to time
    pub(crate) fn trivial(sequence: Vec<T>) -> Self {
        Self::completed(sequence, 0.0)
    }

    pub(crate) fn completed(sequence: Vec<T>, elapsed_seconds: f64) -> Self {
        Self {
            sequence,
            complete: true,
            elapsed_seconds,
        }
    }

    pub(crate) fn cancelled(sequence: Vec<T>, elapsed_seconds: f64) -> Self {
        Self {
            sequence,
            complete: false,
            elapsed_seconds,
        }
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed_seconds * 1000.0
    }
}

/// Trait for sorting implementations
pub trait Sorter {
    fn name(&self) -> &'static str;

    /// Sort a private copy of `data`, checking `cancel` and sampling `instrumentation`
    /// only at the algorithm's safe points
    fn sort<T: PartialOrd + Clone>(
        &self,
        data: &[T],
        order: Order,
        cancel: &CancellationToken,
        instrumentation: &mut Instrumentation<'_>,
    ) -> SortResult<T>;
}
