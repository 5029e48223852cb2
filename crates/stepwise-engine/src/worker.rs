//! Multi-worker event processing with explicit hand-off to a master.
//!
//! Each worker thread owns a complete [`EventProcessor`] built by the
//! caller's factory on that thread. Workers share nothing: events arrive
//! over one job channel and finished [`EventRecord`]s travel back over a
//! result channel to the master, which owns the [`MasterCollector`].
//!
//! A record handed to the master takes its trajectory chunks with it; they
//! are not returned to the worker's pool.

use std::error::Error;
use std::fmt;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender};
use stepwise_core::{EventId, StepError, Track};

use crate::config::ConfigError;
use crate::event::{EventProcessor, EventRecord};
use crate::metrics::EventMetrics;

// ── Errors and messages ────────────────────────────────────────────

/// Failures reported by or about a worker.
#[derive(Debug, PartialEq)]
pub enum WorkerError {
    /// The factory could not build the worker's processor.
    Construction(ConfigError),
    /// An event failed with a fatal step error.
    Step {
        /// The abandoned event.
        event: EventId,
        /// The underlying error.
        error: StepError,
    },
    /// Every worker has exited.
    Disconnected,
    /// A worker thread panicked.
    Panicked {
        /// Index of the worker.
        worker: usize,
    },
}

impl fmt::Display for WorkerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Construction(e) => write!(f, "worker construction failed: {e}"),
            Self::Step { event, error } => write!(f, "event {event} failed: {error}"),
            Self::Disconnected => write!(f, "all workers have exited"),
            Self::Panicked { worker } => write!(f, "worker {worker} panicked"),
        }
    }
}

impl Error for WorkerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Construction(e) => Some(e),
            Self::Step { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// What a worker sends back to the master.
#[derive(Debug)]
pub enum WorkerMessage {
    /// An event finished.
    Finished {
        /// Index of the worker that ran it.
        worker: usize,
        /// Its results.
        record: EventRecord,
    },
    /// Construction or an event failed.
    Failed {
        /// Index of the worker.
        worker: usize,
        /// What went wrong.
        error: WorkerError,
    },
}

struct EventJob {
    event: EventId,
    primaries: Vec<Track>,
}

// ── WorkerPool ─────────────────────────────────────────────────────

/// Handle to a set of running workers.
///
/// Dropping the pool closes the job channel and joins every thread.
pub struct WorkerPool {
    jobs: Option<Sender<EventJob>>,
    results: Receiver<WorkerMessage>,
    threads: Vec<JoinHandle<()>>,
}

impl fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerPool")
            .field("workers", &self.threads.len())
            .field("open", &self.jobs.is_some())
            .finish()
    }
}

/// Start `count` workers, each running the processor `factory(i)` builds.
///
/// The factory runs on the worker's own thread.
///
/// # Errors
///
/// [`ConfigError::WorkerCountZero`] for zero workers and
/// [`ConfigError::ThreadSpawnFailed`] if a thread cannot be started.
/// Factory failures are reported later as [`WorkerMessage::Failed`].
pub fn spawn_workers<F>(count: usize, factory: F) -> Result<WorkerPool, ConfigError>
where
    F: Fn(usize) -> Result<EventProcessor, ConfigError> + Send + Sync + 'static,
{
    if count == 0 {
        return Err(ConfigError::WorkerCountZero);
    }
    let (job_tx, job_rx) = crossbeam_channel::unbounded::<EventJob>();
    let (result_tx, result_rx) = crossbeam_channel::unbounded();
    let factory = Arc::new(factory);

    let mut pool = WorkerPool {
        jobs: Some(job_tx),
        results: result_rx,
        threads: Vec::with_capacity(count),
    };
    for i in 0..count {
        let job_rx = job_rx.clone();
        let result_tx = result_tx.clone();
        let factory = Arc::clone(&factory);
        let handle = thread::Builder::new()
            .name(format!("stepwise-worker-{i}"))
            .spawn(move || worker_loop(i, factory.as_ref(), job_rx, result_tx))
            .map_err(|e| ConfigError::ThreadSpawnFailed {
                reason: format!("stepwise-worker-{i}: {e}"),
            })?;
        pool.threads.push(handle);
    }
    tracing::debug!(workers = count, "worker pool started");
    Ok(pool)
}

fn worker_loop<F>(
    worker: usize,
    factory: &F,
    jobs: Receiver<EventJob>,
    results: Sender<WorkerMessage>,
) where
    F: Fn(usize) -> Result<EventProcessor, ConfigError>,
{
    let mut processor = match factory(worker) {
        Ok(p) => p,
        Err(e) => {
            tracing::warn!(worker, error = %e, "worker construction failed");
            let _ = results.send(WorkerMessage::Failed {
                worker,
                error: WorkerError::Construction(e),
            });
            return;
        }
    };
    while let Ok(job) = jobs.recv() {
        let message = match processor.process_event(job.event, job.primaries) {
            Ok(record) => WorkerMessage::Finished { worker, record },
            Err(error) => WorkerMessage::Failed {
                worker,
                error: WorkerError::Step {
                    event: job.event,
                    error,
                },
            },
        };
        if results.send(message).is_err() {
            // Master is gone.
            return;
        }
    }
}

impl WorkerPool {
    /// Number of worker threads.
    pub fn worker_count(&self) -> usize {
        self.threads.len()
    }

    /// Queue an event for the next free worker.
    pub fn submit(&self, event: EventId, primaries: Vec<Track>) -> Result<(), WorkerError> {
        let jobs = self.jobs.as_ref().ok_or(WorkerError::Disconnected)?;
        jobs.send(EventJob { event, primaries })
            .map_err(|_| WorkerError::Disconnected)
    }

    /// Block until the next message. `None` once every worker has exited.
    pub fn recv(&self) -> Option<WorkerMessage> {
        self.results.recv().ok()
    }

    /// Receive `n` messages into `collector`. Returns how many arrived
    /// before the workers disconnected.
    pub fn collect_into(&self, collector: &mut MasterCollector, n: usize) -> usize {
        let mut received = 0;
        while received < n {
            match self.recv() {
                Some(message) => {
                    collector.accept(message);
                    received += 1;
                }
                None => break,
            }
        }
        received
    }

    /// Close the job channel and join every worker.
    ///
    /// Workers finish the events already queued. Idempotent.
    pub fn shutdown(&mut self) -> Result<(), WorkerError> {
        self.jobs = None;
        let mut first_panic = None;
        for (worker, handle) in self.threads.drain(..).enumerate() {
            if handle.join().is_err() && first_panic.is_none() {
                first_panic = Some(WorkerError::Panicked { worker });
            }
        }
        first_panic.map_or(Ok(()), Err)
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            tracing::warn!(error = %e, "worker pool shut down uncleanly");
        }
    }
}

// ── MasterCollector ────────────────────────────────────────────────

/// Master-owned collection of worker results.
#[derive(Debug, Default)]
pub struct MasterCollector {
    /// Finished events, in arrival order.
    pub records: Vec<EventRecord>,
    /// Failures with the index of the reporting worker.
    pub failures: Vec<(usize, WorkerError)>,
    /// Totals over every accepted record.
    pub totals: EventMetrics,
}

impl MasterCollector {
    /// An empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of one worker message.
    pub fn accept(&mut self, message: WorkerMessage) {
        match message {
            WorkerMessage::Finished { record, .. } => {
                self.totals.merge(&record.metrics);
                self.records.push(record);
            }
            WorkerMessage::Failed { worker, error } => {
                tracing::warn!(worker, %error, "worker reported a failure");
                self.failures.push((worker, error));
            }
        }
    }

    /// Order records by event id.
    pub fn sort_by_event(&mut self) {
        self.records.sort_by_key(|r| r.event_id);
    }
}
