//! Progress and timer sampling.
//!
//! Sinks are invoked synchronously on the sorting thread at safe points only: once per
//! exchange pass, once per insertion step, once per completed merge. Marshaling samples
//! onto another thread is up to the sink; the `mpsc::Sender` impls cover the common case.

use std::sync::mpsc::Sender;
use std::time::Instant;

use serde::Serialize;

/// Receives `(done, total)` units of work
pub trait ProgressSink {
    fn on_progress(&mut self, done: usize, total: usize);
}

/// Receives seconds elapsed since the sort started
pub trait TimerSink {
    fn on_tick(&mut self, elapsed_seconds: f64);
}

impl<F: FnMut(usize, usize)> ProgressSink for F {
    #[inline]
    fn on_progress(&mut self, done: usize, total: usize) {
        self(done, total)
    }
}

impl<F: FnMut(f64)> TimerSink for F {
    #[inline]
    fn on_tick(&mut self, elapsed_seconds: f64) {
        self(elapsed_seconds)
    }
}

/// One sample forwarded over a channel
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Sample {
    Progress { done: usize, total: usize },
    Tick { elapsed_seconds: f64 },
}

impl Sample {
    /// Completion percentage for progress samples
    pub fn percent(&self) -> Option<f64> {
        match *self {
            Sample::Progress { total: 0, .. } => Some(100.0),
            Sample::Progress { done, total } => Some((done as f64 / total as f64 * 100.0).min(100.0)),
            Sample::Tick { .. } => None,
        }
    }
}

// A dropped receiver just means nobody is watching anymore.
impl ProgressSink for Sender<Sample> {
    fn on_progress(&mut self, done: usize, total: usize) {
        let _ = self.send(Sample::Progress { done, total });
    }
}

impl TimerSink for Sender<Sample> {
    fn on_tick(&mut self, elapsed_seconds: f64) {
        let _ = self.send(Sample::Tick { elapsed_seconds });
    }
}

/// Forwards roughly one progress sample per percent, plus the final one
pub struct Throttled<S> {
    inner: S,
}

impl<S: ProgressSink> Throttled<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: ProgressSink> ProgressSink for Throttled<S> {
    fn on_progress(&mut self, done: usize, total: usize) {
        let step = (total / 100).max(1);
        if done % step == 0 || done >= total {
            self.inner.on_progress(done, total);
        }
    }
}

/// Optional progress and timer sinks plus the run's start instant.
///
/// Absent sinks cost one `Option` check per sampling point.
pub struct Instrumentation<'a> {
    progress: Option<&'a mut dyn ProgressSink>,
    timer: Option<&'a mut dyn TimerSink>,
    started: Instant,
}

impl<'a> Instrumentation<'a> {
    pub fn new(
        progress: Option<&'a mut dyn ProgressSink>,
        timer: Option<&'a mut dyn TimerSink>,
    ) -> Self {
        Self {
            progress,
            timer,
            started: Instant::now(),
        }
    }

    /// No sinks, timing only
    pub fn none() -> Self {
        Self::new(None, None)
    }

    pub fn with_progress(mut self, sink: &'a mut dyn ProgressSink) -> Self {
        self.progress = Some(sink);
        self
    }

    pub fn with_timer(mut self, sink: &'a mut dyn TimerSink) -> Self {
        self.timer = Some(sink);
        self
    }

    /// Mark the start of a sort; elapsed samples are measured from here
    #[inline]
    pub(crate) fn restart(&mut self) {
        self.started = Instant::now();
    }

    #[inline]
    pub fn elapsed_seconds(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    #[inline]
    pub(crate) fn progress(&mut self, done: usize, total: usize) {
        if let Some(sink) = &mut self.progress {
            sink.on_progress(done, total);
        }
    }

    #[inline]
    pub(crate) fn tick(&mut self) {
        if let Some(sink) = &mut self.timer {
            sink.on_tick(self.started.elapsed().as_secs_f64());
        }
    }
}

impl Default for Instrumentation<'_> {
    fn default() -> Self {
        Self::none()
    }
}
