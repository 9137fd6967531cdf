//! Sorting structured records by key.
//!
//! Keys are projected out and sorted on their own. The full records are then
//! reattached through per-key FIFO queues, so records sharing a key come out in the
//! order they went in, whichever algorithm sorted the keys.

use std::collections::VecDeque;
use std::hash::Hash;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Algorithm, CancellationToken, Instrumentation, Order, SortResult};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyedRecord<K, R> {
    pub key: K,
    pub payload: R,
}

impl<K, R> KeyedRecord<K, R> {
    pub fn new(key: K, payload: R) -> Self {
        Self { key, payload }
    }
}

/// Per-key FIFO queues of records, filled in original order and drained front to back
#[derive(Debug)]
pub struct StableBucket<K, R> {
    queues: FxHashMap<K, VecDeque<R>>,
    len: usize,
}

impl<K: Hash + Eq, R> StableBucket<K, R> {
    pub fn new() -> Self {
        Self {
            queues: FxHashMap::default(),
            len: 0,
        }
    }

    pub fn push(&mut self, key: K, record: R) {
        self.queues.entry(key).or_default().push_back(record);
        self.len += 1;
    }

    /// Take the earliest remaining record for `key`
    pub fn pop(&mut self, key: &K) -> Option<R> {
        let record = self.queues.get_mut(key)?.pop_front()?;
        self.len -= 1;
        Some(record)
    }

    /// Records still queued across all keys
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl<K: Hash + Eq, R> Default for StableBucket<K, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Hash + Eq, R> FromIterator<(K, R)> for StableBucket<K, R> {
    fn from_iter<I: IntoIterator<Item = (K, R)>>(iter: I) -> Self {
        let mut bucket = Self::new();
        for (key, record) in iter {
            bucket.push(key, record);
        }
        bucket
    }
}

/// Sorts records by key with one of the engine's algorithms
#[derive(Clone, Copy, Debug)]
pub struct KeyedRecordSorter {
    algorithm: Algorithm,
    order: Order,
}

impl KeyedRecordSorter {
    pub fn new(algorithm: Algorithm, order: Order) -> Self {
        Self { algorithm, order }
    }

    /// Sort payloads by their keys.
    ///
    /// `complete` and `elapsed_seconds` come from the key sort. A cancelled key sort
    /// still gets its records reattached, in whatever order the keys reached.
    pub fn sort_records<K, R>(
        &self,
        records: Vec<KeyedRecord<K, R>>,
        cancel: &CancellationToken,
        instrumentation: &mut Instrumentation<'_>,
    ) -> SortResult<R>
    where
        K: Hash + Eq + Clone + PartialOrd,
    {
        let keys: Vec<K> = records.iter().map(|r| r.key.clone()).collect();
        let sorted = self.algorithm.sort(&keys, self.order, cancel, instrumentation);

        let mut bucket: StableBucket<K, R> = records
            .into_iter()
            .map(|r| (r.key, r.payload))
            .collect();

        let sequence: Vec<R> = sorted.sequence.iter().filter_map(|key| bucket.pop(key)).collect();
        debug!(
            algorithm = %self.algorithm,
            records = sequence.len(),
            complete = sorted.complete,
            "records reattached"
        );

        SortResult {
            sequence,
            complete: sorted.complete,
            elapsed_seconds: sorted.elapsed_seconds,
        }
    }

    /// Sort whole records by the field `field` selects
    pub fn sort_by_field<R, K, F>(
        &self,
        records: &[R],
        field: F,
        cancel: &CancellationToken,
    ) -> SortResult<R>
    where
        R: Clone,
        K: Hash + Eq + Clone + PartialOrd,
        F: Fn(&R) -> K,
    {
        let keyed = records
            .iter()
            .map(|record| KeyedRecord::new(field(record), record.clone()))
            .collect();
        self.sort_records(keyed, cancel, &mut Instrumentation::none())
    }
}

/// Stable sort of `records` by `key_fn`, run to completion
pub fn sort_records<R, K, F>(records: &[R], key_fn: F, order: Order, algorithm: Algorithm) -> Vec<R>
where
    R: Clone,
    K: Hash + Eq + Clone + PartialOrd,
    F: Fn(&R) -> K,
{
    KeyedRecordSorter::new(algorithm, order)
        .sort_by_field(records, key_fn, &CancellationToken::new())
        .sequence
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct Student {
        id: u32,
        first_name: &'static str,
        last_name: &'static str,
    }

    fn roster() -> Vec<Student> {
        vec![
            Student { id: 3, first_name: "Ana", last_name: "Reyes" },
            Student { id: 1, first_name: "Ben", last_name: "Cruz" },
            Student { id: 2, first_name: "Ana", last_name: "Lim" },
            Student { id: 5, first_name: "Carl", last_name: "Cruz" },
            Student { id: 4, first_name: "Ben", last_name: "Tan" },
        ]
    }

    #[test]
    fn test_equal_keys_keep_input_order() {
        let records = vec![
            KeyedRecord::new(1, "a"),
            KeyedRecord::new(2, "b"),
            KeyedRecord::new(1, "c"),
        ];
        for algorithm in Algorithm::ALL {
            let result = KeyedRecordSorter::new(algorithm, Order::Ascending).sort_records(
                records.clone(),
                &CancellationToken::new(),
                &mut Instrumentation::none(),
            );
            assert!(result.complete);
            assert_eq!(result.sequence, vec!["a", "c", "b"], "{}", algorithm);
        }
    }

    #[test]
    fn test_descending_keeps_fifo_per_key() {
        let records = vec![
            KeyedRecord::new(1, "a"),
            KeyedRecord::new(2, "b"),
            KeyedRecord::new(1, "c"),
            KeyedRecord::new(2, "d"),
        ];
        for algorithm in Algorithm::ALL {
            let result = KeyedRecordSorter::new(algorithm, Order::Descending).sort_records(
                records.clone(),
                &CancellationToken::new(),
                &mut Instrumentation::none(),
            );
            assert_eq!(result.sequence, vec!["b", "d", "a", "c"], "{}", algorithm);
        }
    }

    #[test]
    fn test_sort_by_string_field() {
        let sorted = sort_records(&roster(), |s| s.first_name, Order::Ascending, Algorithm::ExchangeSort);
        let ids: Vec<u32> = sorted.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![3, 2, 1, 4, 5]);

        let sorted = sort_records(&roster(), |s| s.last_name, Order::Descending, Algorithm::MergeSort);
        let ids: Vec<u32> = sorted.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![4, 3, 2, 1, 5]);
    }

    #[test]
    fn test_sort_by_numeric_field() {
        let sorted = sort_records(&roster(), |s| s.id, Order::Ascending, Algorithm::InsertionSort);
        let ids: Vec<u32> = sorted.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_cancelled_key_sort_still_reattaches_everything() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let records: Vec<_> = (0..20).rev().map(|k| KeyedRecord::new(k % 7, k)).collect();
        let result = KeyedRecordSorter::new(Algorithm::ExchangeSort, Order::Ascending).sort_records(
            records,
            &cancel,
            &mut Instrumentation::none(),
        );
        assert!(!result.complete);
        assert_eq!(result.sequence.len(), 20);
    }

    #[test]
    fn test_bucket_pops_fifo_and_tracks_len() {
        let mut bucket: StableBucket<&str, u32> =
            vec![("x", 1), ("y", 2), ("x", 3)].into_iter().collect();
        assert_eq!(bucket.len(), 3);
        assert_eq!(bucket.pop(&"x"), Some(1));
        assert_eq!(bucket.pop(&"x"), Some(3));
        assert_eq!(bucket.pop(&"x"), None);
        assert_eq!(bucket.pop(&"z"), None);
        assert_eq!(bucket.len(), 1);
        assert_eq!(bucket.pop(&"y"), Some(2));
        assert!(bucket.is_empty());
    }

    #[test]
    fn test_empty_records() {
        let empty: Vec<Student> = Vec::new();
        let sorted = sort_records(&empty, |s| s.id, Order::Ascending, Algorithm::MergeSort);
        assert!(sorted.is_empty());
    }
}
