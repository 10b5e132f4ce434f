//! CPU worker loop and the state it shares with its siblings.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;

use crossbeam_channel::Sender;
use tracing::{debug, trace};

use crate::error::Result;
use crate::keys::KeyPairSource;
use crate::matcher::AddressMatcher;
use crate::onion;

use super::{CancelToken, Progress, VanityResult};

/// State shared by all workers of one search
pub(super) struct SearchState<'a> {
    pub attempts: AtomicU64,
    stop: AtomicBool,
    cancel: &'a CancelToken,
    deadline: Option<Instant>,
    pub start: Instant,
    progress_interval: u64,
    progress_tx: Option<&'a Sender<Progress>>,
    /// Capacity 1: only the first match is accepted
    result_tx: Sender<VanityResult>,
}

impl<'a> SearchState<'a> {
    pub fn new(
        cancel: &'a CancelToken,
        deadline: Option<Instant>,
        start: Instant,
        progress_interval: u64,
        progress_tx: Option<&'a Sender<Progress>>,
        result_tx: Sender<VanityResult>,
    ) -> Self {
        Self {
            attempts: AtomicU64::new(0),
            stop: AtomicBool::new(false),
            cancel,
            deadline,
            start,
            progress_interval: progress_interval.max(1),
            progress_tx,
            result_tx,
        }
    }

    /// Signal every worker to exit after its current iteration
    pub fn halt(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    fn should_stop(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
            || self.cancel.is_cancelled()
            || self.deadline.map_or(false, |d| Instant::now() >= d)
    }

    fn report_progress(&self, keys_checked: u64) {
        let elapsed = self.start.elapsed().as_secs_f64();
        let keys_per_sec = if elapsed > 0.0 {
            keys_checked as f64 / elapsed
        } else {
            0.0
        };
        debug!(keys_checked, keys_per_sec, "search progress");

        if let Some(tx) = self.progress_tx {
            let _ = tx.try_send(Progress {
                keys_checked,
                keys_per_sec,
                elapsed_secs: elapsed,
            });
        }
    }
}

/// Stops the whole pool when a worker leaves its loop for any reason,
/// including a panic.
struct HaltOnDrop<'s, 'a>(&'s SearchState<'a>);

impl Drop for HaltOnDrop<'_, '_> {
    fn drop(&mut self) {
        self.0.halt();
    }
}

/// A CPU worker that generates and tests keypairs
pub(super) struct Worker<'s, 'a, S, M: ?Sized> {
    id: usize,
    source: &'s S,
    matcher: &'s M,
    state: &'s SearchState<'a>,
}

impl<'s, 'a, S, M> Worker<'s, 'a, S, M>
where
    S: KeyPairSource,
    M: AddressMatcher + ?Sized,
{
    pub fn new(id: usize, source: &'s S, matcher: &'s M, state: &'s SearchState<'a>) -> Self {
        Self {
            id,
            source,
            matcher,
            state,
        }
    }

    /// Runs the worker loop until a match is claimed, the search is
    /// cancelled or the key source fails.
    ///
    /// Returns the number of keypairs this worker tested.
    pub fn run(self) -> Result<u64> {
        let _halt = HaltOnDrop(self.state);
        let mut tested = 0u64;

        loop {
            if self.state.should_stop() {
                debug!(worker = self.id, tested, "worker stopping");
                return Ok(tested);
            }

            let keypair = self.source.next_keypair()?;
            tested += 1;
            let total = self.state.attempts.fetch_add(1, Ordering::Relaxed) + 1;

            let address = onion::encode(&keypair.public_key);
            if self.matcher.matches(&address) {
                // Expand only once the address matches
                let result = VanityResult::from_keypair(&keypair, total);

                if self.state.result_tx.try_send(result).is_ok() {
                    debug!(worker = self.id, attempts = total, "worker claimed match");
                } else {
                    trace!(worker = self.id, "match discarded, already claimed");
                }
                return Ok(tested);
            }

            if total % self.state.progress_interval == 0 {
                self.state.report_progress(total);
            }
        }
    }
}
