//! Worker pool management.

use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Sender};
use tracing::{info, warn};

use crate::error::{Result, VanityError};
use crate::keys::{KeyPairSource, OsKeySource};
use crate::matcher::{AddressMatcher, PrefixPattern};

use super::worker::{SearchState, Worker};
use super::{CancelToken, Progress, VanityResult};

/// Combined attempts between two progress notifications
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 1_000_000;

/// Runs a fixed pool of workers until one of them finds a matching address.
///
/// Each call to [`search`](Self::search) spawns the pool, waits for the
/// first match (or cancellation, timeout, entropy failure) and joins every
/// worker before returning.
#[derive(Debug, Clone)]
pub struct SearchCoordinator<S = OsKeySource> {
    workers: usize,
    source: S,
    progress_interval: u64,
    progress_tx: Option<Sender<Progress>>,
    timeout: Option<Duration>,
    cancel: CancelToken,
}

impl SearchCoordinator<OsKeySource> {
    /// Create a coordinator drawing keys from the OS random source
    pub fn new(workers: usize) -> Result<Self> {
        Self::with_source(workers, OsKeySource)
    }

}

/// One worker per logical CPU
pub fn default_workers() -> usize {
    num_cpus::get().max(1)
}

impl<S: KeyPairSource> SearchCoordinator<S> {
    /// Create a coordinator with a custom keypair source
    pub fn with_source(workers: usize, source: S) -> Result<Self> {
        if workers == 0 {
            return Err(VanityError::InvalidWorkerCount);
        }
        Ok(Self::build(workers, source))
    }

    fn build(workers: usize, source: S) -> Self {
        Self {
            workers,
            source,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            progress_tx: None,
            timeout: None,
            cancel: CancelToken::new(),
        }
    }

    /// Send a [`Progress`] snapshot on `tx` every `progress_interval` attempts.
    ///
    /// Updates are dropped rather than blocking a worker when `tx` is full.
    pub fn with_progress(mut self, tx: Sender<Progress>) -> Self {
        self.progress_tx = Some(tx);
        self
    }

    pub fn with_progress_interval(mut self, interval: u64) -> Self {
        self.progress_interval = interval.max(1);
        self
    }

    /// Give up with [`VanityError::TimedOut`] once `timeout` has elapsed
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Share a cancellation token with the caller
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Token that stops a running search with [`VanityError::Stopped`]
    pub fn cancel_handle(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Search for an address starting with `prefix` (case-insensitive).
    ///
    /// The prefix is validated before any worker starts; an empty prefix
    /// accepts the first generated key.
    pub fn search(&self, prefix: &str) -> Result<VanityResult> {
        let pattern = PrefixPattern::new(prefix)?;
        self.search_with(&pattern)
    }

    /// Search for an address accepted by `matcher`
    pub fn search_with<M>(&self, matcher: &M) -> Result<VanityResult>
    where
        M: AddressMatcher + ?Sized,
    {
        let start = Instant::now();
        let deadline = self.timeout.map(|t| start + t);
        let (result_tx, result_rx) = bounded(1);
        let state = SearchState::new(
            &self.cancel,
            deadline,
            start,
            self.progress_interval,
            self.progress_tx.as_ref(),
            result_tx,
        );

        info!(workers = self.workers, timeout = ?self.timeout, "starting vanity search");

        let mut failure: Option<VanityError> = None;
        let outcomes = thread::scope(|scope| {
            let mut handles = Vec::with_capacity(self.workers);
            for id in 0..self.workers {
                let worker = Worker::new(id, &self.source, matcher, &state);
                let spawned = thread::Builder::new()
                    .name(format!("vanity-worker-{}", id))
                    .spawn_scoped(scope, move || worker.run());

                match spawned {
                    Ok(handle) => handles.push(handle),
                    Err(e) => {
                        state.halt();
                        failure = Some(VanityError::WorkerSpawn(e));
                        break;
                    }
                }
            }

            handles
                .into_iter()
                .map(|handle| handle.join())
                .collect::<Vec<_>>()
        });

        for outcome in outcomes {
            let error = match outcome {
                Ok(Ok(_)) => continue,
                Ok(Err(e)) => e,
                Err(_) => VanityError::WorkerPanicked,
            };
            if failure.is_none() {
                failure = Some(error);
            }
        }

        let total = state.attempts.load(std::sync::atomic::Ordering::Relaxed);
        let elapsed = start.elapsed();

        if let Ok(result) = result_rx.try_recv() {
            info!(
                address = %result.onion_address,
                attempts = total,
                elapsed_secs = elapsed.as_secs_f64(),
                "vanity address found"
            );
            return Ok(result);
        }

        if let Some(error) = failure {
            warn!(attempts = total, error = %error, "vanity search aborted");
            return Err(error);
        }

        match self.timeout {
            Some(timeout) if !self.cancel.is_cancelled() => {
                info!(attempts = total, "vanity search timed out");
                Err(VanityError::TimedOut(timeout))
            }
            _ => {
                info!(attempts = total, "vanity search stopped");
                Err(VanityError::Stopped)
            }
        }
    }
}
