use tracing::debug;

use crate::{CancellationToken, Instrumentation, Order, SortResult, Sorter};

/// Exchange (bubble) sort - O(n²), exits early on a pass with no swaps
pub struct ExchangeSorter;

impl Sorter for ExchangeSorter {
    fn name(&self) -> &'static str {
        "exchange_sort"
    }

    fn sort<T: PartialOrd + Clone>(
        &self,
        data: &[T],
        order: Order,
        cancel: &CancellationToken,
        instrumentation: &mut Instrumentation<'_>,
    ) -> SortResult<T> {
        if data.len() <= 1 {
            return SortResult::trivial(data.to_vec());
        }

        let mut work = data.to_vec();
        let n = work.len();
        instrumentation.restart();

        for pass in 0..n {
            let mut swapped = false;
            for j in 0..n - 1 - pass {
                if order.out_of_order(&work[j], &work[j + 1]) {
                    work.swap(j, j + 1);
                    swapped = true;
                }
            }

            if !swapped {
                break;
            }

            if cancel.is_cancelled() {
                debug!(algorithm = self.name(), pass, n, "cancellation observed");
                return SortResult::cancelled(work, instrumentation.elapsed_seconds());
            }

            instrumentation.tick();
            instrumentation.progress(pass + 1, n);
        }

        SortResult::completed(work, instrumentation.elapsed_seconds())
    }
}

/// Insertion sort - O(n²), O(n) on already-ordered input
pub struct InsertionSorter;

impl Sorter for InsertionSorter {
    fn name(&self) -> &'static str {
        "insertion_sort"
    }

    fn sort<T: PartialOrd + Clone>(
        &self,
        data: &[T],
        order: Order,
        cancel: &CancellationToken,
        instrumentation: &mut Instrumentation<'_>,
    ) -> SortResult<T> {
        if data.len() <= 1 {
            return SortResult::trivial(data.to_vec());
        }

        let mut work = data.to_vec();
        let n = work.len();
        instrumentation.restart();

        for i in 1..n {
            // Walk the sorted prefix, then shift it right by one and drop the key in.
            let mut j = i;
            while j > 0 && order.out_of_order(&work[j - 1], &work[i]) {
                j -= 1;
            }
            work[j..=i].rotate_right(1);

            if cancel.is_cancelled() {
                debug!(algorithm = self.name(), i, n, "cancellation observed");
                return SortResult::cancelled(work, instrumentation.elapsed_seconds());
            }

            instrumentation.tick();
            instrumentation.progress(i + 1, n);
        }

        SortResult::completed(work, instrumentation.elapsed_seconds())
    }
}

/// Top-down merge sort - O(n log n)
///
/// Ascending merges take the left head on `<=` and are stable. Descending merges take it
/// on `>=`; stability of duplicate keys is not part of the descending contract.
pub struct MergeSorter;

impl Sorter for MergeSorter {
    fn name(&self) -> &'static str {
        "merge_sort"
    }

    fn sort<T: PartialOrd + Clone>(
        &self,
        data: &[T],
        order: Order,
        cancel: &CancellationToken,
        instrumentation: &mut Instrumentation<'_>,
    ) -> SortResult<T> {
        if data.len() <= 1 {
            return SortResult::trivial(data.to_vec());
        }

        let mut work = data.to_vec();
        let n = work.len();
        instrumentation.restart();

        let mut run = MergeRun {
            order,
            cancel,
            instrumentation,
            merges: 0,
            // A recursion tree with n leaves has exactly n - 1 merge nodes
            total: n - 1,
            cancelled: false,
        };
        run.sort(&mut work);

        if run.cancelled {
            debug!(algorithm = self.name(), merges = run.merges, n, "cancellation observed");
            let elapsed = run.instrumentation.elapsed_seconds();
            return SortResult::cancelled(work, elapsed);
        }

        let elapsed = run.instrumentation.elapsed_seconds();
        SortResult::completed(work, elapsed)
    }
}

struct MergeRun<'r, 'a> {
    order: Order,
    cancel: &'r CancellationToken,
    instrumentation: &'r mut Instrumentation<'a>,
    merges: usize,
    total: usize,
    cancelled: bool,
}

impl MergeRun<'_, '_> {
    fn sort<T: PartialOrd + Clone>(&mut self, data: &mut [T]) {
        if data.len() <= 1 || self.cancelled {
            return;
        }

        if self.cancel.is_cancelled() {
            self.cancelled = true;
            return;
        }

        let mid = data.len() / 2;
        self.sort(&mut data[..mid]);
        self.sort(&mut data[mid..]);

        // Unwind without merging once a stop was observed below
        if self.cancelled {
            return;
        }

        merge(data, mid, self.order);

        self.merges += 1;
        self.instrumentation.tick();
        self.instrumentation
            .progress(self.merges.min(self.total), self.total);
    }
}

fn merge<T: PartialOrd + Clone>(data: &mut [T], mid: usize, order: Order) {
    let mut merged = Vec::with_capacity(data.len());
    {
        let (left, right) = data.split_at(mid);
        let (mut i, mut j) = (0, 0);

        while i < left.len() && j < right.len() {
            if order.take_left(&left[i], &right[j]) {
                merged.push(left[i].clone());
                i += 1;
            } else {
                merged.push(right[j].clone());
                j += 1;
            }
        }

        merged.extend_from_slice(&left[i..]);
        merged.extend_from_slice(&right[j..]);
    }
    data.clone_from_slice(&merged);
}
