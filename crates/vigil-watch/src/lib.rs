//! The Vigil watcher — polling orchestration for a support-ticket desk.
//!
//! Ties together the ticket service (fetches and mutations), the persisted
//! client state (seen tickets, notification history), and the pure
//! reconciliation logic from `vigil-core`: every refresh diffs the fresh
//! snapshot against the previously committed one, turns the deltas into
//! notification events, and merges the operator's unread counts.

mod desk;
mod error;
mod poller;

pub use desk::DeskState;
pub use error::{Error, Result};
pub use poller::{Operator, PollerHandle, RefreshOutcome, WatchConfig, Watcher};
