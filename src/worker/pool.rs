//! Worker pool management.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use log::{debug, warn};

use crate::crypto::{KeyError, KeyState};
use crate::matcher::Pattern;

use super::search::{MatchResult, SearchLoop, SearchOutcome, WorkerStats};

/// A match reported by one of the workers.
#[derive(Debug)]
pub struct SearchResult {
    /// Key state positioned on the winning exponent
    pub key_state: Box<KeyState>,
    /// The matching address and the worker's attempt count
    pub result: MatchResult,
    /// The ID of the worker that found this result
    pub worker_id: usize,
}

/// What [`WorkerPool::wait_for_result`] observed.
#[derive(Debug)]
pub enum PoolEvent {
    /// A worker found a match.
    Found(SearchResult),
    /// Nothing happened before the timeout.
    Timeout,
    /// A worker hit an error it could not recover from.
    Failed(KeyError),
    /// Every worker has exited without a match.
    Finished,
}

/// Runs one search loop per thread, each on its own shard of the exponent
/// space.
///
/// Worker `i` of `n` examines `e0 + 2(i + 1)`, `e0 + 2(i + 1) + 2n`, ... so
/// with a single worker the walk is the plain `e0 + 2`, `e0 + 4`, ...
pub struct WorkerPool {
    /// Worker thread handles (Option to allow taking during join)
    handles: Option<Vec<JoinHandle<u64>>>,
    /// Channel receiver for results
    result_rx: Receiver<Result<SearchResult, KeyError>>,
    /// Shared cancellation flag
    stop_flag: Arc<AtomicBool>,
    /// Raised by the first worker to match
    found_flag: Arc<AtomicBool>,
    /// Shared statistics
    stats: Arc<WorkerStats>,
    /// Start time
    start_time: Instant,
}

impl WorkerPool {
    /// Creates a new worker pool searching `key_state` with `num_workers`
    /// threads.
    ///
    /// `max_attempts` is split between the workers so that their shares add
    /// up to exactly `max_attempts`.
    pub fn new(
        num_workers: usize,
        key_state: KeyState,
        pattern: Pattern,
        max_attempts: Option<u64>,
    ) -> Self {
        let (result_tx, result_rx) = bounded(num_workers.max(1));
        let stop_flag = Arc::new(AtomicBool::new(false));
        let found_flag = Arc::new(AtomicBool::new(false));
        let stats = Arc::new(WorkerStats::new());

        let handles = Self::spawn_workers(
            num_workers,
            key_state,
            pattern,
            max_attempts,
            result_tx,
            stop_flag.clone(),
            found_flag.clone(),
            stats.clone(),
        );

        Self {
            handles: Some(handles),
            result_rx,
            stop_flag,
            found_flag,
            stats,
            start_time: Instant::now(),
        }
    }

    /// Spawns worker threads.
    ///
    /// Each thread returns the number of attempts it made.
    #[allow(clippy::too_many_arguments)]
    fn spawn_workers(
        num_workers: usize,
        key_state: KeyState,
        pattern: Pattern,
        max_attempts: Option<u64>,
        result_tx: Sender<Result<SearchResult, KeyError>>,
        stop_flag: Arc<AtomicBool>,
        found_flag: Arc<AtomicBool>,
        stats: Arc<WorkerStats>,
    ) -> Vec<JoinHandle<u64>> {
        let count = num_workers as u64;

        (0..num_workers)
            .filter_map(|id| {
                let shard = key_state.clone().into_shard(id as u64, count);
                let mut search = SearchLoop::new(shard, pattern.clone(), stop_flag.clone())
                    .with_found_flag(found_flag.clone())
                    .with_stats(stats.clone());
                if let Some(max) = max_attempts {
                    search = search.with_max_attempts(worker_cap(max, id as u64, count));
                }
                let result_tx = result_tx.clone();

                let spawned = thread::Builder::new()
                    .name(format!("onion-worker-{}", id))
                    .spawn(move || run_worker(id, search, result_tx));

                match spawned {
                    Ok(handle) => Some(handle),
                    Err(e) => {
                        warn!("failed to spawn worker {}: {}", id, e);
                        None
                    }
                }
            })
            .collect()
    }

    /// Waits for a result with a timeout.
    pub fn wait_for_result(&self, timeout: Duration) -> PoolEvent {
        match self.result_rx.recv_timeout(timeout) {
            Ok(Ok(result)) => PoolEvent::Found(result),
            Ok(Err(e)) => PoolEvent::Failed(e),
            Err(RecvTimeoutError::Timeout) => PoolEvent::Timeout,
            Err(RecvTimeoutError::Disconnected) => PoolEvent::Finished,
        }
    }

    /// Signals all workers to stop.
    pub fn stop(&self) {
        self.stop_flag.store(true, Ordering::Relaxed);
    }

    /// Stops all workers, waits for them, and returns the total number of
    /// attempts they made.
    pub fn join(mut self) -> u64 {
        self.join_workers()
    }

    fn join_workers(&mut self) -> u64 {
        // A winner has already raised `found_flag`, so siblings are on their
        // way out. Otherwise request a stop.
        if !self.found_flag.load(Ordering::Relaxed) {
            self.stop();
        }

        let mut total = 0;
        if let Some(handles) = self.handles.take() {
            for handle in handles {
                match handle.join() {
                    Ok(attempts) => total += attempts,
                    Err(_) => warn!("a worker thread panicked"),
                }
            }
        }
        total
    }

    /// Returns the attempts published by all workers so far.
    ///
    /// Workers publish in batches, so this lags the exact count slightly.
    pub fn total_attempts(&self) -> u64 {
        self.stats.total_attempts()
    }

    /// Returns the elapsed time since the pool was created.
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Returns the current search rate (attempts per second).
    pub fn attempts_per_second(&self) -> f64 {
        let elapsed = self.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.total_attempts() as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Returns a clone of the stop flag for external use (e.g., signal handlers).
    pub fn stop_flag_clone(&self) -> Arc<AtomicBool> {
        self.stop_flag.clone()
    }

    /// Returns true if the pool has been signaled to stop.
    pub fn is_stopped(&self) -> bool {
        self.stop_flag.load(Ordering::Relaxed)
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.join_workers();
    }
}

/// Share of `max` attempts given to worker `id` of `count`.
///
/// The first `max % count` workers take one extra attempt.
fn worker_cap(max: u64, id: u64, count: u64) -> u64 {
    max / count + u64::from(id < max % count)
}

fn run_worker(
    id: usize,
    search: SearchLoop,
    result_tx: Sender<Result<SearchResult, KeyError>>,
) -> u64 {
    let outcome = search.run();
    let attempts = outcome.attempts();

    match outcome {
        SearchOutcome::Found { key_state, result } => {
            debug!("worker {} matched {} after {} attempts", id, result.address, attempts);
            // Ignore if the receiver is gone.
            let _ = result_tx.send(Ok(SearchResult {
                key_state,
                result,
                worker_id: id,
            }));
        }
        SearchOutcome::Failed { error, .. } => {
            warn!("worker {} failed: {}", id, error);
            let _ = result_tx.send(Err(error));
        }
        SearchOutcome::Cancelled { .. } => debug!("worker {} cancelled", id),
        SearchOutcome::Exhausted { .. } => debug!("worker {} reached its attempt cap", id),
        SearchOutcome::Stopped { .. } => debug!("worker {} stopped", id),
    }

    attempts
}
