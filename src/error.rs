//! Errors raised around the engine.
//!
//! Sorting itself never fails; these cover parsing selectors, the session guard,
//! and the benchmark driver's output.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SortError {
    /// Algorithm name did not match any known sorter
    #[error("Unknown algorithm: {0} (expected exchange, insertion or merge)")]
    UnknownAlgorithm(String),

    /// Order name was neither ascending nor descending
    #[error("Unknown sort order: {0} (expected asc or desc)")]
    UnknownOrder(String),

    /// A run is already in flight on this session
    #[error("A sort is already running in this session")]
    SessionBusy,

    /// The worker thread panicked before producing a result
    #[error("Sort worker panicked")]
    WorkerPanicked,

    /// A size token could not be parsed
    #[error("Invalid size: {0}")]
    InvalidSize(String),

    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },
}
