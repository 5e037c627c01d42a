//! Search execution.
//!
//! This module provides:
//! - The single-threaded exponent search loop
//! - A worker pool that shards the exponent space across threads
//! - Progress tracking and reporting

mod pool;
mod search;

pub use pool::{PoolEvent, SearchResult, WorkerPool};
pub use search::{MatchResult, SearchLoop, SearchOutcome, WorkerStats};
