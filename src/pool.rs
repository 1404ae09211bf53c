//! Bounded worker pool for batch validation.
//!
//! The pool runs on a dedicated Rayon thread pool with a fixed number of
//! workers. Every submitted batch gets a [`BatchTicket`]; the caller awaits
//! tickets in submission order, so results come back in the order batches were
//! created no matter which worker finishes first.
//!
//! # Failure model
//! - A panic inside a worker is caught and reported through the ticket as
//!   [`PipelineError::WorkerFault`]. It is fatal to the run.
//! - All results share one deadline; missing it is [`PipelineError::Timeout`].
//! - [`WorkerPool::shutdown`] waits for every worker thread to exit.

use crate::batch::Batch;
use crate::error::PipelineError;
use crate::validation::Validator;
use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError};
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

type BatchResult = Result<Batch, String>;

/// Handle to one submitted batch.
#[must_use = "a ticket must be awaited to observe the batch result"]
pub struct BatchTicket {
    index: usize,
    submitted_at: Instant,
    rx: Receiver<BatchResult>,
}

impl BatchTicket {
    /// Submission index of the batch this ticket belongs to.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Block until the batch is processed or `deadline` passes.
    ///
    /// A result that is already available is returned even if the deadline
    /// has passed.
    ///
    /// # Errors
    /// - [`PipelineError::WorkerFault`] if the worker panicked.
    /// - [`PipelineError::Timeout`] if the deadline passed first.
    pub fn wait(self, deadline: Instant) -> Result<Batch, PipelineError> {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match self.rx.recv_timeout(remaining) {
            Ok(Ok(batch)) => Ok(batch),
            Ok(Err(message)) => Err(PipelineError::WorkerFault {
                batch: self.index,
                message,
            }),
            Err(RecvTimeoutError::Timeout) => Err(PipelineError::Timeout {
                waited: self.submitted_at.elapsed(),
                completed: 0,
                total: 1,
            }),
            Err(RecvTimeoutError::Disconnected) => Err(PipelineError::WorkerFault {
                batch: self.index,
                message: "worker exited without reporting a result".to_string(),
            }),
        }
    }
}

/// Fixed-size pool of validation workers.
pub struct WorkerPool {
    pool: ThreadPool,
    workers: usize,
    exits: Receiver<usize>,
}

impl WorkerPool {
    /// Start a pool with exactly `workers` threads.
    ///
    /// # Errors
    /// [`PipelineError::InvalidConfig`] for zero workers,
    /// [`PipelineError::PoolBuild`] if the threads could not be spawned.
    pub fn new(workers: usize) -> Result<Self, PipelineError> {
        if workers == 0 {
            return Err(PipelineError::invalid_config(
                "worker_count",
                "must be a positive integer",
            ));
        }
        let (exit_tx, exits) = unbounded();
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("ironsieve-worker-{i}"))
            .exit_handler(move |i| {
                // receiver gone means nobody is waiting on the drain
                let _ = exit_tx.send(i);
            })
            .build()
            .map_err(|e| PipelineError::PoolBuild(e.to_string()))?;
        debug!(workers, "worker pool started");
        Ok(Self {
            pool,
            workers,
            exits,
        })
    }

    #[must_use]
    pub const fn workers(&self) -> usize {
        self.workers
    }

    /// Hand one batch to the pool.
    ///
    /// The job owns the batch until it reports back through the ticket.
    pub fn submit(&self, batch: Batch, validator: Arc<dyn Validator>) -> BatchTicket {
        let (tx, rx) = bounded::<BatchResult>(1);
        let index = batch.index();
        self.pool.spawn(move || {
            let result = panic::catch_unwind(AssertUnwindSafe(|| {
                batch.annotate_with(validator.as_ref())
            }))
            .map_err(|payload| panic_message(payload.as_ref()));
            // a closed receiver means the run was already abandoned
            let _ = tx.send(result);
        });
        BatchTicket {
            index,
            submitted_at: Instant::now(),
            rx,
        }
    }

    /// Validate every batch and return them in submission order.
    ///
    /// All batches are submitted up front, then awaited one by one in the
    /// order they were given, under a single deadline of `timeout` from now.
    ///
    /// # Errors
    /// The first [`PipelineError::WorkerFault`] or [`PipelineError::Timeout`]
    /// encountered while awaiting, in submission order.
    pub fn process_all(
        &self,
        batches: Vec<Batch>,
        validator: Arc<dyn Validator>,
        timeout: Duration,
    ) -> Result<Vec<Batch>, PipelineError> {
        let total = batches.len();
        let started = Instant::now();
        let deadline = deadline_after(started, timeout);

        let tickets: Vec<BatchTicket> = batches
            .into_iter()
            .map(|batch| self.submit(batch, Arc::clone(&validator)))
            .collect();

        let mut processed = Vec::with_capacity(total);
        for ticket in tickets {
            match ticket.wait(deadline) {
                Ok(batch) => {
                    debug!(
                        batch = batch.index(),
                        offset = batch.offset(),
                        records = batch.len(),
                        "batch validated"
                    );
                    processed.push(batch);
                }
                Err(PipelineError::Timeout { .. }) => {
                    let err = PipelineError::Timeout {
                        waited: started.elapsed(),
                        completed: processed.len(),
                        total,
                    };
                    error!(%err, "abandoning run");
                    return Err(err);
                }
                Err(err) => {
                    error!(%err, "abandoning run");
                    return Err(err);
                }
            }
        }
        Ok(processed)
    }

    /// Stop accepting work and wait for every worker thread to exit.
    ///
    /// Jobs already queued still run to completion before their thread exits.
    ///
    /// # Errors
    /// [`PipelineError::ShutdownTimeout`] if the threads are still alive after
    /// `timeout`.
    pub fn shutdown(self, timeout: Duration) -> Result<(), PipelineError> {
        let Self {
            pool,
            workers,
            exits,
        } = self;
        drop(pool);

        let deadline = deadline_after(Instant::now(), timeout);
        for exited in 0..workers {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if exits.recv_timeout(remaining).is_err() {
                warn!(exited, workers, "worker pool did not drain in time");
                return Err(PipelineError::ShutdownTimeout { waited: timeout });
            }
        }
        debug!(workers, "worker pool drained");
        Ok(())
    }
}

fn deadline_after(start: Instant, timeout: Duration) -> Instant {
    // absurd timeouts saturate to one day
    start
        .checked_add(timeout)
        .unwrap_or_else(|| start + Duration::from_secs(86_400))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked with a non-string payload".to_string()
    }
}
