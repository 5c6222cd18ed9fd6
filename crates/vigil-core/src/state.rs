//! The `StateStore` trait — persisted client-side watcher state.
//!
//! Two things survive a restart: the set of ticket ids this client has ever
//! observed (so a ticket that existed before the first load is never
//! announced as new) and the notification feed. Both live behind an injected
//! store object so tests can construct isolated instances instead of
//! sharing ambient persisted state.

use std::{collections::HashSet, future::Future};

use uuid::Uuid;

use crate::notify::NotificationEvent;

/// Abstraction over persisted watcher state (seen-ticket set, notification
/// feed). Implemented by `vigil-store-sqlite`.
///
/// The seen set only ever grows. There is no replace operation: a ticket
/// that drops off the current page through filtering or pagination stays
/// seen, so it is never re-announced when it reappears.
pub trait StateStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// All ticket ids ever recorded as seen.
  fn load_seen(
    &self,
  ) -> impl Future<Output = Result<HashSet<Uuid>, Self::Error>> + Send + '_;

  /// Insert `ids` into the seen set. Ids already present are ignored.
  fn record_seen<'a>(
    &'a self,
    ids: &'a [Uuid],
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Append events to the persisted feed, oldest-first.
  fn append_notifications<'a>(
    &'a self,
    events: &'a [NotificationEvent],
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// The most recent `limit` events, newest-first.
  fn recent_notifications(
    &self,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<NotificationEvent>, Self::Error>> + Send + '_;

  /// Drop everything but the newest `keep` events.
  fn prune_notifications(
    &self,
    keep: usize,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
