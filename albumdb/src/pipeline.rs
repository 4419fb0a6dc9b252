//! Bounded fan-out/fan-in worker pool.
//!
//! One producer feeds a bounded job queue, a fixed set of workers applies the
//! work function, and the caller's thread collects results. Each item carries
//! its source index through the pool, so the collected output is in input
//! order no matter which worker finishes first.
//!
//! Memory in flight is bounded by the two queue capacities; the producer blocks
//! when the job queue is full and workers block when the result queue is full.

use crate::{Result, StoreError};
use crossbeam_channel::bounded;
use std::thread;

/// Default job/result queue capacity.
pub const DEFAULT_QUEUE_CAPACITY: usize = 10;

/// Default worker count (half the queue capacity).
pub const DEFAULT_WORKERS: usize = DEFAULT_QUEUE_CAPACITY / 2;

/// Sizing for a [`Pipeline`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Capacity of the job queue and of the result queue
    pub queue_capacity: usize,
    /// Number of worker threads
    pub workers: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            workers: DEFAULT_WORKERS,
        }
    }
}

impl PipelineConfig {
    /// Create a configuration with the given queue capacity and
    /// `capacity / 2` workers (at least one).
    pub fn new(queue_capacity: usize) -> Result<Self> {
        if queue_capacity == 0 {
            return Err(StoreError::config("Queue capacity must be greater than 0"));
        }

        Ok(Self {
            queue_capacity,
            workers: (queue_capacity / 2).max(1),
        })
    }

    /// Set the number of workers
    pub fn with_workers(mut self, workers: usize) -> Result<Self> {
        if workers == 0 {
            return Err(StoreError::config("Number of workers must be greater than 0"));
        }
        if workers > self.queue_capacity {
            return Err(StoreError::config(
                "Number of workers cannot exceed queue capacity",
            ));
        }

        self.workers = workers;
        Ok(self)
    }
}

/// Worker pool applying a function to a stream of items.
#[derive(Debug, Clone, Copy, Default)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run `work` over every item of `source` and return the outputs in
    /// source order.
    ///
    /// `work` receives the 0-based source index with each item. The producer
    /// stops at the first `Err` from `source`; that error is returned once
    /// every thread has been joined.
    pub fn run<S, I, O, F>(&self, source: S, work: F) -> Result<Vec<O>>
    where
        S: IntoIterator<Item = Result<I>>,
        S::IntoIter: Send,
        I: Send,
        O: Send,
        F: Fn(usize, I) -> O + Sync,
    {
        let source = source.into_iter();
        let workers = self.config.workers.max(1);
        let (job_tx, job_rx) = bounded::<(usize, I)>(self.config.queue_capacity);
        let (out_tx, out_rx) = bounded::<(usize, O)>(self.config.queue_capacity);
        let work = &work;

        thread::scope(|scope| {
            let producer = scope.spawn(move || -> Result<usize> {
                let mut produced = 0;
                for item in source {
                    // Receivers only disappear if every worker died.
                    if job_tx.send((produced, item?)).is_err() {
                        break;
                    }
                    produced += 1;
                }
                Ok(produced)
            });

            let handles: Vec<_> = (0..workers)
                .map(|_| {
                    let jobs = job_rx.clone();
                    let results = out_tx.clone();
                    scope.spawn(move || {
                        for (idx, item) in jobs {
                            if results.send((idx, work(idx, item))).is_err() {
                                break;
                            }
                        }
                    })
                })
                .collect();

            // Result channel closes once the last worker drops its sender.
            drop(job_rx);
            drop(out_tx);

            let mut slots: Vec<Option<O>> = Vec::new();
            for (idx, out) in out_rx {
                if idx >= slots.len() {
                    slots.resize_with(idx + 1, || None);
                }
                slots[idx] = Some(out);
            }

            let mut panicked = false;
            for handle in handles {
                panicked |= handle.join().is_err();
            }
            let produced = producer.join().map_err(|_| StoreError::WorkerPanicked)??;
            if panicked {
                trace_warn!(workers, "pipeline worker panicked");
                return Err(StoreError::WorkerPanicked);
            }

            trace_debug!(workers, items = produced, "pipeline drained");
            debug_assert_eq!(slots.len(), produced);
            Ok(slots.into_iter().flatten().collect())
        })
    }
}
