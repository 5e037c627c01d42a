//! The exponent search loop.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use log::debug;

use crate::crypto::{KeyError, KeyState, OnionAddress, PublicKeyEncoder};
use crate::matcher::Pattern;

/// Attempts are published to shared stats in batches of this size.
const REPORT_BATCH: u64 = 1000;

/// Statistics shared between search loops and whoever reports progress.
#[derive(Debug, Default)]
pub struct WorkerStats {
    /// Candidate exponents examined
    pub attempts: AtomicU64,
}

impl WorkerStats {
    /// Creates new worker stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the attempts published so far.
    pub fn total_attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }
}

/// A matching address and the attempt count at which it was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchResult {
    pub address: OnionAddress,
    pub attempts: u64,
}

/// How a search ended.
#[derive(Debug)]
pub enum SearchOutcome {
    /// The current exponent of `key_state` produced a matching address.
    Found {
        key_state: Box<KeyState>,
        result: MatchResult,
    },
    /// The cancellation flag was raised.
    Cancelled { attempts: u64 },
    /// The attempt cap was reached without a match.
    Exhausted { attempts: u64 },
    /// Another search sharing the same `found` flag matched first.
    Stopped { attempts: u64 },
    /// A candidate public key could not be encoded.
    Failed { error: KeyError, attempts: u64 },
}

impl SearchOutcome {
    /// Returns the number of candidates this search examined.
    pub fn attempts(&self) -> u64 {
        match self {
            SearchOutcome::Found { result, .. } => result.attempts,
            SearchOutcome::Cancelled { attempts }
            | SearchOutcome::Exhausted { attempts }
            | SearchOutcome::Stopped { attempts }
            | SearchOutcome::Failed { attempts, .. } => *attempts,
        }
    }
}

enum Stop {
    Matched(OnionAddress),
    Cancelled,
    Exhausted,
    Stopped,
    Failed(KeyError),
}

/// Walks public exponents over a fixed modulus until the derived address
/// matches a pattern.
pub struct SearchLoop {
    key_state: KeyState,
    pattern: Pattern,
    encoder: PublicKeyEncoder,
    /// Candidates examined, including degenerate ones
    attempts: u64,
    /// Attempts already added to `stats`
    published: u64,
    cancel: Arc<AtomicBool>,
    found: Option<Arc<AtomicBool>>,
    stats: Option<Arc<WorkerStats>>,
    max_attempts: Option<u64>,
}

impl SearchLoop {
    /// Creates a search over `key_state` that stops when `cancel` is raised.
    pub fn new(key_state: KeyState, pattern: Pattern, cancel: Arc<AtomicBool>) -> Self {
        let encoder = key_state.encoder();
        Self {
            key_state,
            pattern,
            encoder,
            attempts: 0,
            published: 0,
            cancel,
            found: None,
            stats: None,
            max_attempts: None,
        }
    }

    /// Shares a flag that is raised on a match and observed as a stop request.
    pub fn with_found_flag(mut self, found: Arc<AtomicBool>) -> Self {
        self.found = Some(found);
        self
    }

    /// Publishes attempt counts to `stats` while running.
    pub fn with_stats(mut self, stats: Arc<WorkerStats>) -> Self {
        self.stats = Some(stats);
        self
    }

    /// Gives up after `max_attempts` candidates.
    pub fn with_max_attempts(mut self, max_attempts: u64) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Runs the search to completion.
    ///
    /// On a match the key state is handed back with its exponent still on
    /// the winning candidate. Nothing is finalized here.
    pub fn run(mut self) -> SearchOutcome {
        let stop = self.search();
        self.publish();

        let attempts = self.attempts;
        debug!("search loop exiting after {} attempts", attempts);

        match stop {
            Stop::Matched(address) => SearchOutcome::Found {
                key_state: Box::new(self.key_state),
                result: MatchResult { address, attempts },
            },
            Stop::Cancelled => SearchOutcome::Cancelled { attempts },
            Stop::Exhausted => SearchOutcome::Exhausted { attempts },
            Stop::Stopped => SearchOutcome::Stopped { attempts },
            Stop::Failed(error) => SearchOutcome::Failed { error, attempts },
        }
    }

    fn search(&mut self) -> Stop {
        loop {
            if self.cancel.load(Ordering::Relaxed) {
                return Stop::Cancelled;
            }
            if let Some(found) = &self.found {
                if found.load(Ordering::Relaxed) {
                    return Stop::Stopped;
                }
            }
            if let Some(max) = self.max_attempts {
                if self.attempts >= max {
                    return Stop::Exhausted;
                }
            }
            if self.attempts - self.published >= REPORT_BATCH {
                self.publish();
            }

            self.key_state.advance();
            if self.key_state.is_degenerate() {
                self.attempts += 1;
                continue;
            }

            let der = match self.encoder.encode(self.key_state.exponent()) {
                Ok(der) => der,
                Err(e) => return Stop::Failed(e.into()),
            };
            let address = OnionAddress::from_public_key_der(der);
            self.attempts += 1;

            if self.pattern.matches(&address) {
                if let Some(found) = &self.found {
                    found.store(true, Ordering::Relaxed);
                }
                return Stop::Matched(address);
            }
        }
    }

    fn publish(&mut self) {
        if let Some(stats) = &self.stats {
            stats
                .attempts
                .fetch_add(self.attempts - self.published, Ordering::Relaxed);
        }
        self.published = self.attempts;
    }
}
