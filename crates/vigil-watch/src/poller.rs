//! The watcher: refresh orchestration and the background poll loop.
//!
//! One [`Watcher`] serves one operator. It owns the [`DeskState`] behind a
//! mutex (locked only between awaits, never across one), fetches through the
//! injected [`TicketService`], and mirrors seen ids and notification history
//! into the injected [`StateStore`].
//!
//! Refreshes are single-flight: while one is in progress, further requests
//! set a queued flag and return immediately with
//! [`RefreshOutcome::Coalesced`]. The in-flight refresh drains the flag with
//! one follow-up pass before releasing the guard, so a mutation issued during
//! a slow poll still gets reconciled without ever running two fetches
//! concurrently.

use std::{
  sync::{
    Arc, Mutex, MutexGuard, PoisonError,
    atomic::{AtomicBool, Ordering},
  },
  time::Duration,
};

use tokio::{
  sync::{broadcast, watch},
  task::JoinHandle,
};
use uuid::Uuid;
use vigil_core::{
  notify::{self, DEFAULT_FEED_CAPACITY, NotificationEvent},
  service::{NewMessage, TicketQuery, TicketService, TicketUpdate},
  state::StateStore,
  ticket::{Message, MessageSender, Ticket, TicketPriority, TicketStatus},
};

use crate::{
  desk::DeskState,
  error::{Error, Result},
};

// ─── Configuration ───────────────────────────────────────────────────────────

/// The operator this watcher polls on behalf of.
#[derive(Debug, Clone)]
pub struct Operator {
  pub user_id: Uuid,
  /// Used as the sender name on replies.
  pub name:    String,
}

#[derive(Debug, Clone)]
pub struct WatchConfig {
  /// Interval between background polls.
  pub poll_interval: Duration,
  /// Events retained in memory and in the store.
  pub feed_capacity: usize,
}

impl Default for WatchConfig {
  fn default() -> Self {
    Self {
      poll_interval: Duration::from_secs(30),
      feed_capacity: DEFAULT_FEED_CAPACITY,
    }
  }
}

/// How a [`Watcher::refresh`] call was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
  /// This call performed the fetch.
  Refreshed,
  /// Another refresh was in flight; this one was queued onto it.
  Coalesced,
}

// ─── Watcher ─────────────────────────────────────────────────────────────────

struct Inner<S, P> {
  service:   S,
  store:     P,
  operator:  Operator,
  config:    WatchConfig,
  state:     Mutex<DeskState>,
  in_flight: AtomicBool,
  queued:    AtomicBool,
  events_tx: broadcast::Sender<NotificationEvent>,
}

pub struct Watcher<S, P> {
  inner: Arc<Inner<S, P>>,
}

impl<S, P> Clone for Watcher<S, P> {
  fn clone(&self) -> Self { Self { inner: Arc::clone(&self.inner) } }
}

impl<S, P> Watcher<S, P>
where
  S: TicketService,
  P: StateStore,
{
  pub fn new(service: S, store: P, operator: Operator, config: WatchConfig) -> Self {
    let (events_tx, _) = broadcast::channel(64);
    let state = Mutex::new(DeskState::new(config.feed_capacity));
    Self {
      inner: Arc::new(Inner {
        service,
        store,
        operator,
        config,
        state,
        in_flight: AtomicBool::new(false),
        queued: AtomicBool::new(false),
        events_tx,
      }),
    }
  }

  fn state(&self) -> MutexGuard<'_, DeskState> {
    self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Read the desk state under the lock.
  pub fn desk<R>(&self, f: impl FnOnce(&DeskState) -> R) -> R {
    f(&self.state())
  }

  /// Live stream of notification events as they are emitted.
  pub fn subscribe(&self) -> broadcast::Receiver<NotificationEvent> {
    self.inner.events_tx.subscribe()
  }

  pub fn operator(&self) -> &Operator { &self.inner.operator }

  // ── Convenience accessors ─────────────────────────────────────────────

  pub fn tickets(&self) -> Vec<Ticket> { self.desk(|d| d.tickets.clone()) }

  /// Feed contents, newest-first.
  pub fn notifications(&self) -> Vec<NotificationEvent> {
    self.desk(|d| d.feed.iter().cloned().collect())
  }

  pub fn has_new_messages(&self) -> bool {
    self.desk(|d| d.has_new_messages)
  }

  // ── Lifecycle ─────────────────────────────────────────────────────────

  /// Restore persisted state, fetch the directory listings, and take the
  /// first snapshot. With no persisted baseline the snapshot only seeds the
  /// seen set; with one, tickets that arrived while the watcher was offline
  /// are announced as new.
  pub async fn load_initial(&self) -> Result<()> {
    let seen = self.inner.store.load_seen().await.map_err(Error::store)?;
    let history = self
      .inner
      .store
      .recent_notifications(self.inner.config.feed_capacity)
      .await
      .map_err(Error::store)?;

    let (users, clients) = tokio::join!(
      self.inner.service.support_users(),
      self.inner.service.client_accounts(),
    );
    {
      let mut state = self.state();
      state.seen = seen;
      state.feed.hydrate(history);
      state.support_users = users.map_err(Error::service)?;
      state.clients = clients.map_err(Error::service)?;
    }

    self.refresh().await?;
    Ok(())
  }

  // ── Refreshing ────────────────────────────────────────────────────────

  /// Fetch the current page, stats, and unread counts, then reconcile.
  ///
  /// Concurrent calls coalesce: the guard is taken by one caller, everyone
  /// else queues onto it and returns immediately.
  pub async fn refresh(&self) -> Result<RefreshOutcome> {
    if self
      .inner
      .in_flight
      .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
      .is_err()
    {
      self.inner.queued.store(true, Ordering::Release);
      return Ok(RefreshOutcome::Coalesced);
    }

    let result = self.refresh_once().await;

    // Drain requests queued while we were fetching, then release the guard.
    // A request can coalesce between the final swap and the release; if one
    // did, reacquire and drain it too, so every queued retry runs as part of
    // some holder's drain rather than waiting for the next timer tick.
    loop {
      while self.inner.queued.swap(false, Ordering::AcqRel) {
        if let Err(error) = self.refresh_once().await {
          tracing::warn!(%error, "queued refresh failed");
          break;
        }
      }
      self.inner.in_flight.store(false, Ordering::Release);

      if self.inner.queued.load(Ordering::Acquire)
        && self
          .inner
          .in_flight
          .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
          .is_ok()
      {
        continue;
      }
      break;
    }

    result.map(|()| RefreshOutcome::Refreshed)
  }

  /// Jump back to page one, clear the header indicator, and refresh.
  pub async fn manual_refresh(&self) -> Result<RefreshOutcome> {
    {
      let mut state = self.state();
      state.query.page = 1;
      state.has_new_messages = false;
    }
    self.refresh().await
  }

  /// Replace the list query (filters, search, page) and refresh.
  pub async fn apply_query(&self, query: TicketQuery) -> Result<RefreshOutcome> {
    self.state().query = query;
    self.refresh().await
  }

  async fn refresh_once(&self) -> Result<()> {
    let query = self.state().query.clone();

    let (page, stats, unread) = tokio::join!(
      self.inner.service.list_tickets(&query),
      self.inner.service.stats(),
      self.inner.service.unread_counts(self.inner.operator.user_id),
    );
    let page = page.map_err(Error::service)?;
    let stats = stats.map_err(Error::service)?;
    let unread = unread.map_err(Error::service)?;

    let (events, newly_seen) = {
      let mut state = self.state();
      let outcome = state.apply_snapshot(page, stats);
      state.apply_unread(unread);
      state.feed.extend(outcome.events.iter().cloned());
      (outcome.events, outcome.newly_seen)
    };

    for event in &events {
      // Nobody listening is fine.
      let _ = self.inner.events_tx.send(event.clone());
    }

    // Persistence is a side channel; a failed write never fails the refresh.
    if !newly_seen.is_empty() {
      if let Err(error) = self.inner.store.record_seen(&newly_seen).await {
        tracing::warn!(%error, "failed to persist seen tickets");
      }
    }
    self.persist_events(&events).await;

    Ok(())
  }

  /// Reconcile after a mutation. The mutation already succeeded, so a failed
  /// follow-up refresh is only logged.
  async fn reconcile(&self) {
    if let Err(error) = self.refresh().await {
      tracing::warn!(%error, "post-mutation refresh failed");
    }
  }

  async fn publish(&self, event: NotificationEvent) {
    self.state().feed.push(event.clone());
    let _ = self.inner.events_tx.send(event.clone());
    self.persist_events(std::slice::from_ref(&event)).await;
  }

  async fn persist_events(&self, events: &[NotificationEvent]) {
    if events.is_empty() {
      return;
    }
    if let Err(error) = self.inner.store.append_notifications(events).await {
      tracing::warn!(%error, "failed to persist notifications");
      return;
    }
    if let Err(error) = self
      .inner
      .store
      .prune_notifications(self.inner.config.feed_capacity)
      .await
    {
      tracing::warn!(%error, "failed to prune notification history");
    }
  }

  // ── Operator actions ──────────────────────────────────────────────────

  /// Open the detail view: fetch the full conversation, record the view,
  /// and clear the ticket's activity flag.
  pub async fn open_ticket(&self, ticket_id: Uuid) -> Result<Ticket> {
    let ticket = self
      .inner
      .service
      .ticket_detail(ticket_id)
      .await
      .map_err(Error::service)?
      .ok_or(Error::TicketNotFound(ticket_id))?;

    // View tracking is eventually consistent; the next poll reflects it.
    if let Err(error) = self
      .inner
      .service
      .mark_viewed(ticket_id, self.inner.operator.user_id)
      .await
    {
      tracing::warn!(%error, %ticket_id, "failed to record view");
    }

    self.state().open_detail(ticket.clone());
    Ok(ticket)
  }

  pub fn close_ticket_view(&self) { self.state().close_detail(); }

  pub async fn set_status(
    &self,
    ticket_id: Uuid,
    status: TicketStatus,
  ) -> Result<Ticket> {
    let update = TicketUpdate { status: Some(status), ..Default::default() };
    let ticket = self
      .inner
      .service
      .update_ticket(ticket_id, update)
      .await
      .map_err(Error::service)?;
    self.publish(notify::status_changed(&ticket)).await;
    self.reconcile().await;
    Ok(ticket)
  }

  pub async fn set_priority(
    &self,
    ticket_id: Uuid,
    priority: TicketPriority,
  ) -> Result<Ticket> {
    let update = TicketUpdate { priority: Some(priority), ..Default::default() };
    let ticket = self
      .inner
      .service
      .update_ticket(ticket_id, update)
      .await
      .map_err(Error::service)?;
    self.publish(notify::priority_changed(&ticket)).await;
    self.reconcile().await;
    Ok(ticket)
  }

  /// Assign the ticket to a support user, or unassign with `None`.
  pub async fn assign(
    &self,
    ticket_id: Uuid,
    assignee: Option<Uuid>,
  ) -> Result<Ticket> {
    let update = TicketUpdate { assignee: Some(assignee), ..Default::default() };
    let ticket = self
      .inner
      .service
      .update_ticket(ticket_id, update)
      .await
      .map_err(Error::service)?;
    self.publish(notify::assignee_changed(&ticket)).await;
    self.reconcile().await;
    Ok(ticket)
  }

  /// Delete a ticket. If its detail view is open it is closed.
  pub async fn delete_ticket(&self, ticket_id: Uuid) -> Result<()> {
    let subject = self.desk(|d| {
      d.ticket(ticket_id)
        .or(d.selected.as_ref().filter(|t| t.ticket_id == ticket_id))
        .map(|t| t.subject.clone())
    });

    self
      .inner
      .service
      .delete_ticket(ticket_id)
      .await
      .map_err(Error::service)?;

    self.state().remove_ticket(ticket_id);
    let subject = subject.unwrap_or_else(|| ticket_id.to_string());
    self.publish(notify::ticket_deleted(&subject)).await;
    self.reconcile().await;
    Ok(())
  }

  /// Post a staff reply as the operator.
  ///
  /// The returned message is folded into the local snapshot before the
  /// follow-up refresh so the operator's own reply is never announced back
  /// to them as new activity.
  pub async fn reply(&self, ticket_id: Uuid, content: String) -> Result<Message> {
    let message = self
      .inner
      .service
      .create_message(NewMessage {
        ticket_id,
        content,
        sender: MessageSender::Staff,
        sender_name: self.inner.operator.name.clone(),
        attachments: vec![],
      })
      .await
      .map_err(Error::service)?;

    let event = {
      let mut state = self.state();
      state.record_own_message(ticket_id, message.clone());
      // The ticket may have paged out of the list while its detail view
      // stayed open; the reply still gets its event.
      state
        .ticket(ticket_id)
        .or(state.selected.as_ref().filter(|t| t.ticket_id == ticket_id))
        .map(notify::reply_posted)
    };
    if let Some(event) = event {
      self.publish(event).await;
    }
    self.reconcile().await;
    Ok(message)
  }
}

// ─── Poll loop ───────────────────────────────────────────────────────────────

/// Handle to the background poll task. Dropping it stops the loop at the
/// next tick; [`PollerHandle::stop`] waits for the task to wind down.
pub struct PollerHandle {
  shutdown: watch::Sender<bool>,
  task:     JoinHandle<()>,
}

impl PollerHandle {
  pub async fn stop(self) {
    let _ = self.shutdown.send(true);
    let _ = self.task.await;
  }

  pub fn is_finished(&self) -> bool { self.task.is_finished() }
}

impl<S, P> Watcher<S, P>
where
  S: TicketService + 'static,
  P: StateStore + 'static,
{
  /// Spawn the background poll loop at the configured interval.
  ///
  /// Failed polls are logged and the previous state stays on screen; the
  /// loop keeps going. Missed ticks (a fetch slower than the interval) are
  /// skipped rather than bursted.
  pub fn start_polling(&self) -> PollerHandle {
    let watcher = self.clone();
    let (shutdown, mut shutdown_rx) = watch::channel(false);

    let task = tokio::spawn(async move {
      let mut interval =
        tokio::time::interval(watcher.inner.config.poll_interval);
      interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
      // The first tick is immediate; the initial load already fetched.
      interval.tick().await;

      loop {
        tokio::select! {
          _ = interval.tick() => {
            if let Err(error) = watcher.refresh().await {
              tracing::warn!(%error, "background poll failed");
            }
          }
          _ = shutdown_rx.changed() => break,
        }
      }
      tracing::debug!("poll loop stopped");
    });

    PollerHandle { shutdown, task }
  }
}
