//! In-memory desk state and its pure transitions.
//!
//! `DeskState` is everything the dashboard renders: the current ticket page,
//! aggregates, the operator's unread counts, the new-activity marks, and the
//! notification feed. All transitions here are synchronous and side-effect
//! free; the watcher in [`crate::poller`] owns the I/O and feeds results in.
//!
//! New-activity tracking per ticket is a small lifecycle:
//!
//! | state   | meaning                                        |
//! |---------|------------------------------------------------|
//! | unseen  | id not yet in the seen set (first observation) |
//! | seen    | observed before, no pending activity           |
//! | flagged | in `with_new_messages`, awaiting a view        |
//!
//! Opening the detail view moves a flagged ticket back to seen. The seen set
//! itself only grows; it is mirrored to the [`vigil_core::state::StateStore`]
//! by the watcher.

use std::collections::HashSet;

use uuid::Uuid;
use vigil_core::{
  diff::detect_activity,
  notify::{NotificationEvent, NotificationFeed, refresh_events},
  service::{TicketPage, TicketQuery},
  ticket::{
    ClientAccount, Message, Pagination, SupportUser, Ticket, TicketStats,
  },
  unread::{UnreadMap, has_new_unread, newly_unread},
};

/// What [`DeskState::apply_snapshot`] produced: the events to publish and the
/// ids that still need to be persisted into the seen set.
#[derive(Debug, Default)]
pub struct SnapshotOutcome {
  pub events:     Vec<NotificationEvent>,
  pub newly_seen: Vec<Uuid>,
}

/// The state of one operator's ticket desk.
#[derive(Debug)]
pub struct DeskState {
  /// Last committed ticket page, in server order.
  pub tickets:           Vec<Ticket>,
  pub pagination:        Option<Pagination>,
  pub stats:             TicketStats,
  pub support_users:     Vec<SupportUser>,
  pub clients:           Vec<ClientAccount>,
  /// Latest unread counts, replaced wholesale on every fetch.
  pub unread:            UnreadMap,
  /// Tickets flagged with unviewed activity since the operator last looked.
  pub with_new_messages: HashSet<Uuid>,
  /// Coarse header indicator, cleared by a manual refresh.
  pub has_new_messages:  bool,
  /// Every ticket id ever observed. Grows, never shrinks.
  pub seen:              HashSet<Uuid>,
  pub feed:              NotificationFeed,
  pub query:             TicketQuery,
  /// Currently open detail view, if any.
  pub selected:          Option<Ticket>,
}

impl DeskState {
  pub fn new(feed_capacity: usize) -> Self {
    Self {
      tickets:           Vec::new(),
      pagination:        None,
      stats:             TicketStats::default(),
      support_users:     Vec::new(),
      clients:           Vec::new(),
      unread:            UnreadMap::new(),
      with_new_messages: HashSet::new(),
      has_new_messages:  false,
      seen:              HashSet::new(),
      feed:              NotificationFeed::with_capacity(feed_capacity),
      query:             TicketQuery::default(),
      selected:          None,
    }
  }

  /// Commit a freshly fetched page, diffing it against the previous one.
  ///
  /// A true first load (no previous page, no persisted baseline) only seeds
  /// the seen set; the detector reports nothing and no events fire. With a
  /// non-empty baseline, tickets that appeared while the watcher was away
  /// are announced like any other new activity. Ids not yet in the seen set
  /// are reported back for persistence.
  pub fn apply_snapshot(
    &mut self,
    page: TicketPage,
    stats: TicketStats,
  ) -> SnapshotOutcome {
    let diff = detect_activity(&self.tickets, &page.tickets, &self.seen);
    let events = refresh_events(&diff, &self.tickets, &page.tickets);

    if !events.is_empty() {
      self.has_new_messages = true;
    }
    self.with_new_messages.extend(diff.flagged());

    let newly_seen: Vec<Uuid> = page
      .tickets
      .iter()
      .map(|t| t.ticket_id)
      .filter(|id| self.seen.insert(*id))
      .collect();

    // A deleted or filtered-out ticket drops its flag with it.
    let current: HashSet<Uuid> =
      page.tickets.iter().map(|t| t.ticket_id).collect();
    self.with_new_messages.retain(|id| current.contains(id));

    self.tickets = page.tickets;
    self.pagination = Some(page.pagination);
    self.stats = stats;

    SnapshotOutcome { events, newly_seen }
  }

  /// Replace the unread map, raising the header flag if any ticket's count
  /// strictly increased. Decreases and disappearances never raise it.
  pub fn apply_unread(&mut self, after: UnreadMap) {
    if has_new_unread(&self.unread, &after) {
      self.has_new_messages = true;
      self.with_new_messages.extend(newly_unread(&self.unread, &after));
    }
    self.unread = after;
  }

  /// Open the detail view for a ticket, clearing its activity flag and its
  /// local unread entry.
  ///
  /// The service records the view separately; the local zero keeps the list
  /// consistent until the next poll confirms it.
  pub fn open_detail(&mut self, ticket: Ticket) {
    self.with_new_messages.remove(&ticket.ticket_id);
    self.unread.remove(&ticket.ticket_id);
    self.selected = Some(ticket);
  }

  pub fn close_detail(&mut self) { self.selected = None; }

  /// Forget a ticket locally after a successful delete. Returns `true` when
  /// the deleted ticket was open in the detail view (which is closed).
  pub fn remove_ticket(&mut self, ticket_id: Uuid) -> bool {
    self.tickets.retain(|t| t.ticket_id != ticket_id);
    self.with_new_messages.remove(&ticket_id);
    self.unread.remove(&ticket_id);

    let was_open = self
      .selected
      .as_ref()
      .is_some_and(|t| t.ticket_id == ticket_id);
    if was_open {
      self.selected = None;
    }
    was_open
  }

  /// Fold the operator's own reply into the committed snapshot so the next
  /// diff does not announce it as someone else's new message.
  pub fn record_own_message(&mut self, ticket_id: Uuid, message: Message) {
    if let Some(ticket) = self
      .tickets
      .iter_mut()
      .find(|t| t.ticket_id == ticket_id)
    {
      ticket.messages.insert(0, message.clone());
      ticket.updated_at = message.created_at;
    }
    if let Some(selected) = self
      .selected
      .as_mut()
      .filter(|t| t.ticket_id == ticket_id)
    {
      selected.messages.insert(0, message);
    }
  }

  pub fn ticket(&self, ticket_id: Uuid) -> Option<&Ticket> {
    self.tickets.iter().find(|t| t.ticket_id == ticket_id)
  }

  pub fn has_new_activity(&self, ticket_id: Uuid) -> bool {
    self.with_new_messages.contains(&ticket_id)
  }
}
