//! Single-slot run guard.
//!
//! A session runs at most one sort or benchmark sweep at a time on a worker thread.
//! The caller keeps the [`RunHandle`] to watch samples, request cancellation and
//! collect the outcome. Starting a second run while one is in flight is rejected.

use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use serde::Serialize;
use tracing::{debug, warn};

use crate::harness::{run_benchmark_with, BenchmarkReport};
use crate::instrument::{Sample, Throttled};
use crate::{Algorithm, CancellationToken, Instrumentation, Order, SortError, SortResult};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    Idle,
    Running,
    Completed,
    Cancelled,
}

/// Which samples a run forwards to its handle
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Sampling {
    pub progress: bool,
    pub timer: bool,
}

impl Sampling {
    pub fn all() -> Self {
        Self {
            progress: true,
            timer: true,
        }
    }
}

/// Whether a finished run went all the way
pub trait RunOutcome {
    fn finished(&self) -> bool;
}

impl<T> RunOutcome for SortResult<T> {
    fn finished(&self) -> bool {
        self.complete
    }
}

impl RunOutcome for BenchmarkReport {
    fn finished(&self) -> bool {
        !self.cancelled
    }
}

/// State of the session plus the token of the current run.
///
/// Each run gets a fresh token, so a handle kept from an earlier run cannot reach a
/// later one.
#[derive(Debug, Default)]
struct Slot {
    state: SessionState,
    cancel: CancellationToken,
}

type SharedSlot = Arc<Mutex<Slot>>;

fn lock(slot: &SharedSlot) -> MutexGuard<'_, Slot> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Clone, Debug, Default)]
pub struct SortSession {
    slot: SharedSlot,
}

impl SortSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SessionState {
        lock(&self.slot).state
    }

    pub fn is_running(&self) -> bool {
        self.state() == SessionState::Running
    }

    /// Ask the in-flight run, if any, to stop at its next safe point
    pub fn cancel(&self) {
        let slot = lock(&self.slot);
        if slot.state == SessionState::Running {
            slot.cancel.cancel();
        }
    }

    /// Claim the slot and hand out the token for the new run
    fn begin(&self) -> Result<CancellationToken, SortError> {
        let mut slot = lock(&self.slot);
        if slot.state == SessionState::Running {
            warn!("rejecting start request: a run is already in flight");
            return Err(SortError::SessionBusy);
        }
        slot.state = SessionState::Running;
        slot.cancel = CancellationToken::new();
        Ok(slot.cancel.clone())
    }

    /// Sort `data` on a worker thread
    pub fn start_sort<T>(
        &self,
        data: Vec<T>,
        algorithm: Algorithm,
        order: Order,
        sampling: Sampling,
    ) -> Result<RunHandle<SortResult<T>>, SortError>
    where
        T: PartialOrd + Clone + Send + 'static,
    {
        let cancel = self.begin()?;
        debug!(algorithm = %algorithm, %order, len = data.len(), "starting sort");

        self.spawn(cancel, move |tx, cancel| {
            let mut progress_tx = Throttled::new(tx.clone());
            let mut tick_tx = tx;
            let mut instrumentation = Instrumentation::none();
            if sampling.progress {
                instrumentation = instrumentation.with_progress(&mut progress_tx);
            }
            if sampling.timer {
                instrumentation = instrumentation.with_timer(&mut tick_tx);
            }
            algorithm.sort(&data, order, cancel, &mut instrumentation)
        })
    }

    /// Run a benchmark sweep on a worker thread, sampling progress per size
    pub fn start_benchmark<T>(
        &self,
        algorithm: Algorithm,
        sizes: Vec<usize>,
        source_keys: Vec<T>,
    ) -> Result<RunHandle<BenchmarkReport>, SortError>
    where
        T: PartialOrd + Clone + Send + 'static,
    {
        let cancel = self.begin()?;
        debug!(algorithm = %algorithm, sizes = ?sizes, "starting benchmark");

        self.spawn(cancel, move |mut tx, cancel| {
            run_benchmark_with(algorithm, &sizes, &source_keys, cancel, Some(&mut tx))
        })
    }

    fn spawn<O, F>(&self, cancel: CancellationToken, work: F) -> Result<RunHandle<O>, SortError>
    where
        O: RunOutcome + Send + 'static,
        F: FnOnce(mpsc::Sender<Sample>, &CancellationToken) -> O + Send + 'static,
    {
        let (tx, samples) = mpsc::channel();
        let slot = Arc::clone(&self.slot);
        let worker_cancel = cancel.clone();

        let worker = thread::spawn(move || {
            // Falls back to Idle if `work` unwinds
            let mut finish = Finish {
                slot,
                outcome: SessionState::Idle,
            };
            let outcome = work(tx, &worker_cancel);
            finish.outcome = if outcome.finished() {
                SessionState::Completed
            } else {
                SessionState::Cancelled
            };
            outcome
        });

        Ok(RunHandle {
            worker,
            samples,
            cancel,
        })
    }
}

struct Finish {
    slot: SharedSlot,
    outcome: SessionState,
}

impl Drop for Finish {
    fn drop(&mut self) {
        lock(&self.slot).state = self.outcome;
    }
}

/// Caller's side of an in-flight run
pub struct RunHandle<O> {
    worker: JoinHandle<O>,
    samples: Receiver<Sample>,
    cancel: CancellationToken,
}

impl<O> RunHandle<O> {
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Progress and timer samples, in the order the worker produced them
    pub fn samples(&self) -> &Receiver<Sample> {
        &self.samples
    }

    pub fn is_finished(&self) -> bool {
        self.worker.is_finished()
    }

    /// Wait for the worker and take its outcome
    pub fn join(self) -> Result<O, SortError> {
        self.worker.join().map_err(|_| SortError::WorkerPanicked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_begin_is_rejected() {
        let session = SortSession::new();
        assert_eq!(session.state(), SessionState::Idle);
        session.begin().unwrap();
        assert!(matches!(session.begin(), Err(SortError::SessionBusy)));
    }

    #[test]
    fn test_completed_run() {
        let session = SortSession::new();
        let handle = session
            .start_sort(vec![5, 1, 4, 2, 3], Algorithm::MergeSort, Order::Ascending, Sampling::all())
            .unwrap();
        let result = handle.join().unwrap();
        assert!(result.complete);
        assert_eq!(result.sequence, vec![1, 2, 3, 4, 5]);
        assert_eq!(session.state(), SessionState::Completed);
    }

    #[test]
    fn test_samples_reach_the_caller() {
        let session = SortSession::new();
        let handle = session
            .start_sort(vec![3, 2, 1, 0], Algorithm::InsertionSort, Order::Ascending, Sampling::all())
            .unwrap();
        let samples: Vec<Sample> = handle.samples().iter().collect();
        let _ = handle.join().unwrap();

        let progress: Vec<_> = samples
            .iter()
            .filter_map(|s| match *s {
                Sample::Progress { done, total } => Some((done, total)),
                Sample::Tick { .. } => None,
            })
            .collect();
        assert_eq!(progress, vec![(2, 4), (3, 4), (4, 4)]);
        assert_eq!(samples.len(), 6);
    }

    #[test]
    fn test_no_samples_when_disabled() {
        let session = SortSession::new();
        let handle = session
            .start_sort(vec![2, 1], Algorithm::ExchangeSort, Order::Ascending, Sampling::default())
            .unwrap();
        let samples: Vec<Sample> = handle.samples().iter().collect();
        assert!(handle.join().unwrap().complete);
        assert!(samples.is_empty());
    }

    #[test]
    fn test_busy_while_running_then_cancel() {
        let session = SortSession::new();
        let data: Vec<u32> = (0..30_000).rev().collect();
        let handle = session
            .start_sort(data, Algorithm::ExchangeSort, Order::Ascending, Sampling::default())
            .unwrap();

        let second = session.start_sort(vec![1, 2], Algorithm::MergeSort, Order::Ascending, Sampling::default());
        assert!(matches!(second, Err(SortError::SessionBusy)));

        handle.cancel();
        let result = handle.join().unwrap();
        assert!(!result.complete);
        assert_eq!(result.sequence.len(), 30_000);
        assert_eq!(session.state(), SessionState::Cancelled);

        // The slot is free again
        let again = session
            .start_sort(vec![2, 1], Algorithm::MergeSort, Order::Ascending, Sampling::default())
            .unwrap();
        assert_eq!(again.join().unwrap().sequence, vec![1, 2]);
        assert_eq!(session.state(), SessionState::Completed);
    }

    #[test]
    fn test_finished_handle_cannot_cancel_next_run() {
        let session = SortSession::new();
        let first = session
            .start_sort(vec![2, 1], Algorithm::MergeSort, Order::Ascending, Sampling::default())
            .unwrap();
        while !first.is_finished() {
            thread::yield_now();
        }
        assert_eq!(session.state(), SessionState::Completed);

        let data: Vec<u32> = (0..5_000).rev().collect();
        let second = session
            .start_sort(data, Algorithm::ExchangeSort, Order::Ascending, Sampling::default())
            .unwrap();
        first.cancel();

        let result = second.join().unwrap();
        assert!(result.complete);
        assert_eq!(result.sequence, (0..5_000).collect::<Vec<u32>>());
        assert_eq!(session.state(), SessionState::Completed);
        assert!(first.join().unwrap().complete);
    }

    #[test]
    fn test_session_cancel_reaches_current_run() {
        let session = SortSession::new();
        let data: Vec<u32> = (0..30_000).rev().collect();
        let handle = session
            .start_sort(data, Algorithm::ExchangeSort, Order::Ascending, Sampling::default())
            .unwrap();
        session.cancel();
        assert!(!handle.join().unwrap().complete);
        assert_eq!(session.state(), SessionState::Cancelled);
    }

    #[test]
    fn test_benchmark_run() {
        let session = SortSession::new();
        let keys: Vec<u64> = (0..500).rev().collect();
        let handle = session
            .start_benchmark(Algorithm::MergeSort, vec![100, 500, 1000], keys)
            .unwrap();
        let samples: Vec<Sample> = handle.samples().iter().collect();
        let report = handle.join().unwrap();

        assert_eq!(report.timings.keys().copied().collect::<Vec<_>>(), vec![100, 500]);
        assert_eq!(samples.last(), Some(&Sample::Progress { done: 3, total: 3 }));
        assert_eq!(session.state(), SessionState::Completed);
    }
}
